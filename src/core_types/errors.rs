//! Action hints and information classification for domain errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Suggests how a caller should handle a domain error once it has been recorded.
///
/// Follow the hint strictly so that readers can reason about the error flow:
/// raise when the operation cannot fulfil its purpose, continue when it still can.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorAction {
    /// No recommendation. Callers decide; the collecting machinery treats it as `Raise`.
    Indecisive = 0,

    /// Propagate the error or return immediately.
    #[default]
    Raise = 1,

    /// Execution may continue; the error is recorded for the response.
    Continue = 2,
}

impl ErrorAction {
    /// Wire name used in error projections (`"RAISE"`, `"CONTINUE"`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Indecisive => "INDECISIVE",
            Self::Raise => "RAISE",
            Self::Continue => "CONTINUE",
        }
    }

    /// Whether an error carrying this action must escape the local scope.
    ///
    /// `Indecisive` propagates: nothing guesses on the caller's behalf.
    pub const fn propagates(self) -> bool {
        matches!(self, Self::Raise | Self::Indecisive)
    }
}

impl fmt::Display for ErrorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classification of the information an error (or log entry) carries.
///
/// Determines how and where the information may be presented, stored or
/// transmitted. Ordered by sensitivity; it never influences control flow.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InfoClassification {
    /// Not applicable.
    #[default]
    Na = 0,

    /// Information that may be presented to a peer to pass an invocation,
    /// such as an OAuth2 access token.
    AuthorizationInfo = 50,

    /// Corporate sensitive data. Handle with care.
    CorporateSensitiveInfo = 70,

    /// Personal identifiable information, regulated by GDPR.
    Pii = 100,
}

impl InfoClassification {
    /// Wire name used in error projections (`"NA"`, `"PII"`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Self::Na => "NA",
            Self::AuthorizationInfo => "AUTHORIZATION_INFO",
            Self::CorporateSensitiveInfo => "CORPORATE_SENSITIVE_INFO",
            Self::Pii => "PII",
        }
    }

    /// Numeric sensitivity level.
    pub const fn level(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for InfoClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
