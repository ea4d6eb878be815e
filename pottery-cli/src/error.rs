//! CLI error type.

use std::fmt;

use pottery::config::ConfigError;
use pottery::logging::LoggingError;
use pottery::resolver::ResolveError;

/// Errors reported by CLI commands. Printed to stderr with exit code 1.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file or settings problem.
    Config(String),
    /// Resolution could not run.
    Resolve(ResolveError),
    /// A dependency argument is not `group:artifact[:version]`.
    InvalidDependency(String),
    /// Failed to clear the cache.
    CacheClear(String),
    /// Failed to read cache statistics.
    CacheStats(String),
    /// Failed to render output.
    Output(String),
    /// Failed to set up logging.
    Logging(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Resolve(e) => write!(f, "Resolution failed: {}", e),
            CliError::InvalidDependency(dep) => write!(
                f,
                "Invalid dependency '{}', expected group:artifact[:version]",
                dep
            ),
            CliError::CacheClear(msg) => write!(f, "Failed to clear cache: {}", msg),
            CliError::CacheStats(msg) => write!(f, "Failed to read cache statistics: {}", msg),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
            CliError::Logging(msg) => write!(f, "Failed to initialize logging: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Resolve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ResolveError> for CliError {
    fn from(e: ResolveError) -> Self {
        CliError::Resolve(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e.to_string())
    }
}
