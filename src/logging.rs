//! Logging utilities for pwext
//!
//! Re-exports tracing macros with log_* naming convention for consistency,
//! and provides the exception sink consulted when a non-domain failure is caught.

use crate::config::ServiceConfig;
use std::error::Error as StdError;

// Re-export tracing macros with log_* naming
#[allow(unused_imports)]
pub(crate) use tracing::{
    debug as log_debug,
    error as log_error,
    info as log_info,
    trace as log_trace,
    warn as log_warn,
};

/// Receiver for failures that carry no classification or action.
///
/// Fire-and-forget: implementations must not fail and their outcome is ignored.
pub trait ExceptionSink: Send + Sync {
    /// Report `error`, caught while running the unit of work named `label`.
    fn log_exception(&self, label: &str, error: &(dyn StdError + 'static));
}

/// Default sink that writes the failure and its source chain through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ExceptionSink for TracingSink {
    fn log_exception(&self, label: &str, error: &(dyn StdError + 'static)) {
        let causes = source_chain(error);

        log_error!(
            label = %label,
            error = %error,
            causes = ?causes,
            "Function: {label} raised an error"
        );
    }
}

/// Messages of every cause below `error`, outermost first.
pub(crate) fn source_chain(error: &(dyn StdError + 'static)) -> Vec<String> {
    std::iter::successors(error.source(), |&e| e.source())
        .map(ToString::to_string)
        .collect()
}

/// Install a JSON formatted `tracing` subscriber for the service.
///
/// The filter comes from the configured log level (falling back to `info`).
/// Returns `false` when a global subscriber was already installed, which is
/// not treated as an error.
pub fn init(config: &ServiceConfig) -> bool {
    use tracing_subscriber::EnvFilter;

    let directive = config
        .level()
        .map_or_else(|| "info".to_string(), |level| level.to_string().to_lowercase());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .try_init()
        .is_ok();

    if installed {
        log_debug!(
            service = %config.service_name,
            level = %directive,
            "Structured logging initialized"
        );
    }

    installed
}
