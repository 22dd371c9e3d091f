//! Application error types.

use std::fmt;

use crate::backend::{BackendError, HttpError};
use crate::catalog::CatalogError;
use crate::config::ConfigError;

/// Errors that can occur while starting the application.
#[derive(Debug)]
pub enum AppError {
    /// The configuration file could not be read.
    Config(ConfigError),

    /// The table catalog could not be loaded.
    Catalog(CatalogError),

    /// The HTTP client could not be created.
    HttpClient(HttpError),

    /// A backend rejected its settings.
    Backend(BackendError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::Catalog(e) => write!(f, "Failed to load catalog: {}", e),
            AppError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            AppError::Backend(e) => write!(f, "Failed to create backend: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Catalog(e) => Some(e),
            AppError::HttpClient(e) => Some(e),
            AppError::Backend(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        AppError::Catalog(e)
    }
}

impl From<HttpError> for AppError {
    fn from(e: HttpError) -> Self {
        AppError::HttpClient(e)
    }
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        AppError::Backend(e)
    }
}
