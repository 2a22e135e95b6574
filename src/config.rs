use crate::error::{DomainError, PwResult};
use crate::logging::log_debug;
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Policy knobs of the response assembler.
///
/// Missing fields deserialize to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseOptions {
    /// Always produce a response, even for `Raise` errors and non-domain failures.
    pub always_return: bool,
    /// Derive the status code from the worst attached error when the handler kept `200 OK`.
    pub code_from_error: bool,
    /// Embed errors in the body under `error`. When off only the status code reflects them.
    pub errors_in_body: bool,
}

impl Default for ResponseOptions {
    fn default() -> Self {
        Self {
            always_return: true,
            code_from_error: true,
            errors_in_body: false,
        }
    }
}

impl ResponseOptions {
    /// Defaults with errors embedded in the body.
    pub fn with_errors_in_body() -> Self {
        Self {
            errors_in_body: true,
            ..Self::default()
        }
    }
}

/// Service-wide configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Name reported in structured logs.
    pub service_name: String,
    /// Log level by name (`debug`, `INFO`, `warning`, ...) or number (`10`..`50`).
    pub log_level: Option<String>,
    /// Response assembly policy.
    pub response: ResponseOptions,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: "service_undefined".to_string(),
            log_level: None,
            response: ResponseOptions::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables
    /// This is the ONLY method that should access environment variables
    ///
    /// `SERVICE_NAME` wins over `POWERTOOLS_SERVICE_NAME` and `LOGGING_LEVEL`
    /// over `LOG_LEVEL`.
    ///
    /// # Errors
    ///
    /// Returns an internal [`DomainError`] if the log level cannot be parsed.
    pub fn from_env() -> PwResult<Self> {
        let mut config = Self::default();

        if let Some(name) = env_with_alias("SERVICE_NAME", "POWERTOOLS_SERVICE_NAME") {
            config.service_name = name;
        }
        config.log_level = env_with_alias("LOGGING_LEVEL", "LOG_LEVEL");

        config.validate()?;

        log_debug!(
            service = %config.service_name,
            log_level = ?config.log_level,
            "Service configuration loaded from environment"
        );

        Ok(config)
    }

    /// Validate the configuration is complete
    ///
    /// # Errors
    ///
    /// Returns an internal [`DomainError`] if the log level is set but unparseable.
    pub fn validate(&self) -> PwResult<()> {
        if let Some(level) = &self.log_level {
            if parse_log_level(level).is_none() {
                return Err(
                    DomainError::internal(format!("Invalid log level: {level}"))
                        .with_detail("log_level", level.as_str()),
                );
            }
        }
        Ok(())
    }

    /// The configured level, if set and valid.
    pub fn level(&self) -> Option<Level> {
        self.log_level.as_deref().and_then(parse_log_level)
    }
}

/// Parse a log level given by name or by numeric value.
///
/// Names are case-insensitive; `warn`/`warning` and `critical`/`fatal` are
/// accepted. Numeric values follow the usual 10-step scale (10 = debug,
/// 20 = info, 30 = warning, 40 = error, 50 = critical); values below 10 map
/// to trace and values above 50 to error.
pub fn parse_log_level(value: &str) -> Option<Level> {
    let value = value.trim();

    if let Ok(number) = value.parse::<u32>() {
        return Some(match number {
            0..=9 => Level::TRACE,
            10..=19 => Level::DEBUG,
            20..=29 => Level::INFO,
            30..=39 => Level::WARN,
            _ => Level::ERROR,
        });
    }

    match value.to_ascii_uppercase().as_str() {
        "TRACE" | "VERBOSE" => Some(Level::TRACE),
        "DEBUG" => Some(Level::DEBUG),
        "INFO" => Some(Level::INFO),
        "WARN" | "WARNING" => Some(Level::WARN),
        "ERROR" | "CRITICAL" | "FATAL" => Some(Level::ERROR),
        _ => None,
    }
}

fn env_with_alias(primary: &str, alias: &str) -> Option<String> {
    let lookup = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
    lookup(primary).or_else(|| lookup(alias))
}
