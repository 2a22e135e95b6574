//! Ordered aggregation of domain errors.
//!
//! An [`ErrorCollector`] gathers errors that did not stop execution so they can
//! all be presented in the final response. Its projection follows one rule
//! everywhere errors reach a boundary: a single error renders as an object,
//! several render as an array, none renders as nothing.
//!
//! ```rust
//! use http::StatusCode;
//! use pwext::{DomainError, ErrorCollector};
//!
//! let mut collector = ErrorCollector::new();
//! collector
//!     .add(DomainError::new("Missing parameters"))
//!     .add(DomainError::http(StatusCode::PARTIAL_CONTENT, "Partial result"));
//!
//! assert!(collector.has_matching(|e| e.code() == StatusCode::BAD_REQUEST));
//! assert_eq!(collector.highest().map(|e| e.code()), Some(StatusCode::BAD_REQUEST));
//! ```

use crate::error::DomainError;
use serde_json::Value;

/// Append-only (plus explicit [`clear`](Self::clear)) sequence of domain errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorCollector {
    errors: Vec<DomainError>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error. Never fails.
    pub fn add(&mut self, err: DomainError) -> &mut Self {
        self.errors.push(err);
        self
    }

    /// Remove every collected error.
    pub fn clear(&mut self) -> &mut Self {
        self.errors.clear();
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[DomainError] {
        &self.errors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DomainError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<DomainError> {
        self.errors
    }

    /// The error with the highest status code; the first inserted wins ties.
    pub fn highest(&self) -> Option<&DomainError> {
        highest_of(&self.errors)
    }

    /// All errors satisfying `matcher`, in insertion order.
    pub fn matching<F>(&self, mut matcher: F) -> Vec<&DomainError>
    where
        F: FnMut(&DomainError) -> bool,
    {
        self.errors.iter().filter(|e| matcher(e)).collect()
    }

    /// Whether any error satisfies `matcher`.
    pub fn has_matching<F>(&self, matcher: F) -> bool
    where
        F: FnMut(&DomainError) -> bool,
    {
        self.errors.iter().any(matcher)
    }

    /// Boundary projection: object for one error, array for several, `None` when empty.
    pub fn to_value(&self) -> Option<Value> {
        project(&self.errors)
    }

    /// JSON text of [`to_value`](Self::to_value).
    pub fn to_json(&self) -> Option<String> {
        self.to_value().map(|v| v.to_string())
    }
}

impl Extend<DomainError> for ErrorCollector {
    fn extend<I: IntoIterator<Item = DomainError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl FromIterator<DomainError> for ErrorCollector {
    fn from_iter<I: IntoIterator<Item = DomainError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ErrorCollector {
    type Item = &'a DomainError;
    type IntoIter = std::slice::Iter<'a, DomainError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Highest status code in `errors`, first inserted among equals.
///
/// `Iterator::max_by_key` keeps the last maximum, so the fold is explicit.
pub(crate) fn highest_of(errors: &[DomainError]) -> Option<&DomainError> {
    errors.iter().fold(None, |best: Option<&DomainError>, e| match best {
        Some(b) if b.code().as_u16() >= e.code().as_u16() => Some(b),
        _ => Some(e),
    })
}

/// Single-vs-list projection shared by the collector and the response.
pub(crate) fn project(errors: &[DomainError]) -> Option<Value> {
    match errors {
        [] => None,
        [single] => Some(Value::Object(single.to_dict())),
        many => Some(Value::Array(
            many.iter().map(|e| Value::Object(e.to_dict())).collect(),
        )),
    }
}
