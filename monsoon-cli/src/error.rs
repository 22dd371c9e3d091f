//! CLI error type.

use std::fmt;

use monsoon::app::AppError;
use monsoon::config::ConfigError;
use monsoon::logging::LoggingError;

/// Errors reported by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config(String),

    /// Logging could not be initialized.
    Logging(String),

    /// The application failed to start.
    Startup(String),

    /// The async runtime could not be created.
    Runtime(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Logging(_) | CliError::Startup(_) | CliError::Runtime(_) => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(msg) => write!(f, "Logging error: {}", msg),
            CliError::Startup(msg) => write!(f, "Startup failed: {}", msg),
            CliError::Runtime(msg) => write!(f, "Failed to create runtime: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e.to_string())
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        match e {
            AppError::Config(e) => CliError::Config(e.to_string()),
            other => CliError::Startup(other.to_string()),
        }
    }
}
