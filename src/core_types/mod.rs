//! Core vocabulary shared by errors, collectors and responses
//!
//! ## Organization
//! - `errors` - Action hints and information classification
//! - `keys` - Reserved keys used in projections and bodies

pub mod errors;
pub mod keys;

// Re-export commonly used types
pub use errors::{ErrorAction, InfoClassification};
