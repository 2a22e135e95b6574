//! Domain error types.
//!
//! This module provides the structured error used throughout request handling.
//! A [`DomainError`] carries everything needed to both steer control flow and
//! shape an outbound response:
//! - an HTTP status code doubling as error code
//! - an [`ErrorAction`] hint (raise vs. continue)
//! - a human readable message
//! - an [`InfoClassification`] of the data it carries
//! - optional free-form details and an optional inner cause
//!
//! # Error Handling Example
//!
//! ```rust
//! use http::StatusCode;
//! use pwext::{DomainError, ErrorAction, InfoClassification};
//!
//! let err = DomainError::http(StatusCode::NOT_FOUND, "Failed to find record")
//!     .with_action(ErrorAction::Continue)
//!     .with_classification(InfoClassification::CorporateSensitiveInfo)
//!     .with_detail("route", "to_path_2");
//!
//! assert_eq!(err.code(), StatusCode::NOT_FOUND);
//! assert_eq!(err.to_dict()["msg"], "Failed to find record");
//! ```
//!
//! # Faults
//!
//! Wrapped units of work return [`Fault`], which distinguishes domain errors
//! (subject to collection) from any other failure (never collected):
//!
//! ```rust
//! use pwext::{DomainError, Fault};
//!
//! fn lookup(id: u32) -> Result<String, Fault> {
//!     if id == 0 {
//!         return Err(DomainError::new("Missing id").into());
//!     }
//!     Ok(format!("record-{id}"))
//! }
//! ```

use crate::core_types::keys;
use crate::core_types::{ErrorAction, InfoClassification};
use crate::logging::{log_debug, log_error};
use http::StatusCode;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Result type for the crate's own fallible operations.
///
/// Failures are internal construction errors expressed as [`DomainError`]s
/// (status 500, action `Raise`).
pub type PwResult<T> = std::result::Result<T, DomainError>;

/// A structured, classified failure.
///
/// Immutable once built: every `with_*` method consumes the error and returns
/// the updated value. The `inner` cause chain is owned and therefore finite.
///
/// # Flavours
///
/// | Constructor | Code | Action |
/// |-------------|------|--------|
/// | [`new`](Self::new) | 400 | `Raise` |
/// | [`http`](Self::http) | given | `Raise` |
/// | [`internal`](Self::internal) | 500 | `Raise` |
/// | [`with_return`](Self::with_return) | 400 | `Continue` |
///
/// The "with-return" flavour carries an opaque value that callers still
/// receive when the error is absorbed. It never appears in [`to_dict`](Self::to_dict).
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct DomainError {
    code: StatusCode,
    action: ErrorAction,
    message: String,
    classification: InfoClassification,
    details: Option<Map<String, Value>>,
    #[source]
    inner: Option<Box<DomainError>>,
    return_value: Option<Value>,
    /// Root scope this error was already recorded in.
    recorded_in: Option<Uuid>,
}

impl PartialEq for DomainError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
            && self.action == other.action
            && self.message == other.message
            && self.classification == other.classification
            && self.details == other.details
            && self.inner == other.inner
            && self.return_value == other.return_value
    }
}

impl DomainError {
    // =========================================================================
    // Constructor methods with automatic logging
    // =========================================================================

    /// Standard error: `400 Bad Request`, action `Raise`, classification `NA`.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        log_debug!(
            error_type = "domain_error",
            message = %message,
            "Domain error created"
        );
        Self::build(StatusCode::BAD_REQUEST, ErrorAction::Raise, message)
    }

    /// Error originating from an HTTP exchange, with an explicit status code.
    pub fn http(code: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        log_debug!(
            error_type = "http_error",
            code = code.as_u16(),
            message = %message,
            "HTTP error created"
        );
        Self::build(code, ErrorAction::Raise, message)
    }

    /// Internal error of this crate or its caller's wiring (logs at ERROR level).
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "internal_error",
            message = %message,
            "Internal construction error"
        );
        Self::build(StatusCode::INTERNAL_SERVER_ERROR, ErrorAction::Raise, message)
    }

    /// Error that still hands a value back to the caller when absorbed.
    ///
    /// Defaults to action `Continue`.
    pub fn with_return(message: impl Into<String>, return_value: impl Into<Value>) -> Self {
        let message = message.into();
        let return_value = return_value.into();
        log_debug!(
            error_type = "domain_error_with_return",
            message = %message,
            has_return = !return_value.is_null(),
            "Domain error with return value created"
        );
        let mut err = Self::build(StatusCode::BAD_REQUEST, ErrorAction::Continue, message);
        err.return_value = Some(return_value);
        err
    }

    fn build(code: StatusCode, action: ErrorAction, message: String) -> Self {
        Self {
            code,
            action,
            message,
            classification: InfoClassification::Na,
            details: None,
            inner: None,
            return_value: None,
            recorded_in: None,
        }
    }

    // =========================================================================
    // Builders
    // =========================================================================

    #[must_use]
    pub fn with_code(mut self, code: StatusCode) -> Self {
        self.code = code;
        self
    }

    /// Set the code from a raw integer.
    ///
    /// # Errors
    ///
    /// Returns an internal error if `code` is not a valid HTTP status code.
    pub fn with_code_u16(self, code: u16) -> PwResult<Self> {
        let status = StatusCode::from_u16(code).map_err(|e| {
            Self::internal(format!("Invalid status code {code}: {e}"))
                .with_detail("code", code)
        })?;
        Ok(self.with_code(status))
    }

    #[must_use]
    pub fn with_action(mut self, action: ErrorAction) -> Self {
        self.action = action;
        self
    }

    #[must_use]
    pub fn with_classification(mut self, classification: InfoClassification) -> Self {
        self.classification = classification;
        self
    }

    /// Replace all details.
    #[must_use]
    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = Some(details);
        self
    }

    /// Add a single detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Encapsulate the error that caused this one.
    #[must_use]
    pub fn with_inner(mut self, inner: DomainError) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn action(&self) -> ErrorAction {
        self.action
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn classification(&self) -> InfoClassification {
        self.classification
    }

    pub fn details(&self) -> Option<&Map<String, Value>> {
        self.details.as_ref()
    }

    pub fn inner(&self) -> Option<&DomainError> {
        self.inner.as_deref()
    }

    /// The opaque return value of the "with-return" flavour.
    pub fn return_value(&self) -> Option<&Value> {
        self.return_value.as_ref()
    }

    /// Whether this is the "with-return" flavour.
    pub fn has_return(&self) -> bool {
        self.return_value.is_some()
    }

    /// Take the return value out of the error.
    pub fn into_return_value(self) -> Option<Value> {
        self.return_value
    }

    /// Whether the error must escape the local scope (`Raise` or `Indecisive`).
    pub fn propagates(&self) -> bool {
        self.action.propagates()
    }

    pub(crate) fn is_recorded_in(&self, scope_id: Uuid) -> bool {
        self.recorded_in == Some(scope_id)
    }

    pub(crate) fn mark_recorded(&mut self, scope_id: Uuid) {
        self.recorded_in = Some(scope_id);
    }

    /// Iterate over this error followed by every inner cause.
    pub fn chain(&self) -> impl Iterator<Item = &DomainError> {
        std::iter::successors(Some(self), |e| e.inner())
    }

    // =========================================================================
    // Projections
    // =========================================================================

    /// Map representation, in field order `code`, `action`, `msg`,
    /// `classification`, `details`, `inner`.
    ///
    /// `details` and `inner` are omitted when absent. The return value is
    /// never included.
    pub fn to_dict(&self) -> Map<String, Value> {
        let mut dict = Map::new();
        dict.insert("code".to_string(), Value::from(self.code.as_u16()));
        dict.insert("action".to_string(), Value::from(self.action.name()));
        dict.insert(keys::MESSAGE.to_string(), Value::from(self.message.clone()));
        dict.insert(
            keys::CLASSIFICATION.to_string(),
            Value::from(self.classification.name()),
        );

        if let Some(details) = self.details.as_ref().filter(|d| !d.is_empty()) {
            dict.insert("details".to_string(), Value::Object(details.clone()));
        }
        if let Some(inner) = &self.inner {
            dict.insert("inner".to_string(), Value::Object(inner.to_dict()));
        }

        dict
    }

    /// JSON text of [`to_dict`](Self::to_dict).
    pub fn to_json(&self) -> String {
        Value::Object(self.to_dict()).to_string()
    }
}

impl Serialize for DomainError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_dict().serialize(serializer)
    }
}

/// Failure of a wrapped unit of work.
///
/// Only [`Fault::Domain`] takes part in collection; [`Fault::Other`] is always
/// propagated unchanged and, at the outer boundary, mapped to a generic
/// internal error response.
#[derive(Error, Debug)]
pub enum Fault {
    /// A classified domain error.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Any failure not expressed as a domain error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Fault {
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain(_))
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Other(_) => None,
        }
    }

    pub fn into_domain(self) -> Option<DomainError> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Other(_) => None,
        }
    }
}
