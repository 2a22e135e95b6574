//! # pwext
//!
//! Error collection and response assembly for request handlers.
//!
//! ## Key Features
//!
//! - **Structured errors**: [`DomainError`] carries status code, action, classification and details
//! - **Scoped collection**: a root [`CollectingInvoker`] installs a collector shared by nested calls
//! - **Partial failures**: `Continue` errors are recorded and absorbed, `Raise` errors propagate
//! - **Response assembly**: [`ResponseAssembler`] folds collected errors into one gateway response
//!
//! ## Example
//!
//! ```rust
//! use http::StatusCode;
//! use pwext::{
//!     CollectingInvoker, DomainError, ErrorAction, Fault, OutboundResponse, Reply,
//!     ResponseAssembler, ResponseOptions,
//! };
//!
//! fn update(customer: &str) -> Result<String, Fault> {
//!     if customer == "mario@example.com" {
//!         return Err(DomainError::http(StatusCode::NOT_FOUND, "Customer not found")
//!             .with_action(ErrorAction::Continue)
//!             .into());
//!     }
//!     Ok(customer.to_string())
//! }
//!
//! let leaf = CollectingInvoker::new();
//! let assembler = ResponseAssembler::gateway(ResponseOptions::default()).rooted();
//!
//! let reply = assembler
//!     .respond(|| {
//!         let mut updated = Vec::new();
//!         for customer in ["mario@example.com", "nisse@example.com"] {
//!             if let Some(c) = leaf.invoke(|| update(customer))?.value() {
//!                 updated.push(c);
//!             }
//!         }
//!         Ok(OutboundResponse::ok().with_field("updated", updated))
//!     })
//!     .unwrap();
//!
//! let response = reply.into_gateway().unwrap();
//! assert_eq!(response.status_code, 404);
//! assert_eq!(response.body, r#"{"updated":["nisse@example.com"]}"#);
//! ```

#![allow(clippy::missing_errors_doc)]

// Error actions, classifications and reserved keys
pub mod core_types;

// Logging utilities (re-exports tracing with log_* naming) and the exception sink
pub mod logging;

pub mod assembler;
pub mod collector;
pub mod config;
pub mod encoder;
pub mod error;
pub mod invoker;
pub mod response;
pub mod scope;

#[cfg(test)]
pub mod tests;

pub use assembler::{GatewayResponse, HandlerResult, Reply, ResponseAssembler, ResponseFormat};
pub use collector::ErrorCollector;
pub use config::{ResponseOptions, ServiceConfig};
pub use core_types::{keys, ErrorAction, InfoClassification};
pub use encoder::{BodyEncoder, JsonBodyEncoder, PrettyJsonBodyEncoder};
pub use error::{DomainError, Fault, PwResult};
pub use invoker::{Collected, CollectingInvoker};
pub use logging::{ExceptionSink, TracingSink};
pub use response::{Body, OutboundResponse, JSON_CONTENT_TYPE};
pub use scope::{CollectorHandle, ScopeGuard};
