//! Serialization of structured bodies at the response boundary.

use crate::error::{DomainError, PwResult};
use serde_json::Value;

/// Turns a structured body into its wire text.
pub trait BodyEncoder: Send + Sync {
    /// # Errors
    ///
    /// Returns an internal error when the value cannot be encoded.
    fn encode(&self, body: &Value) -> PwResult<String>;
}

/// Compact JSON encoder. Domain errors nested in values are already plain maps
/// (see [`DomainError::to_dict`]), so plain `serde_json` suffices.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyEncoder;

impl BodyEncoder for JsonBodyEncoder {
    fn encode(&self, body: &Value) -> PwResult<String> {
        serde_json::to_string(body)
            .map_err(|e| DomainError::internal(format!("Failed to encode response body: {e}")))
    }
}

/// Pretty-printed JSON, handy for local debugging.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyJsonBodyEncoder;

impl BodyEncoder for PrettyJsonBodyEncoder {
    fn encode(&self, body: &Value) -> PwResult<String> {
        serde_json::to_string_pretty(body)
            .map_err(|e| DomainError::internal(format!("Failed to encode response body: {e}")))
    }
}
