//! Tracing subscriber setup.
//!
//! Output goes to stderr, or to a daily-rolling file when
//! `[logging] file` is configured. `RUST_LOG` replaces the configured level.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

pub use tracing_appender::non_blocking::WorkerGuard;

/// Third-party targets capped below the configured level.
const NOISY_TARGETS: &[(&str, &str)] = &[("hyper", "warn"), ("reqwest", "warn"), ("h2", "warn")];

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("Invalid log file path: {0}")]
    InvalidPath(PathBuf),

    #[error("Failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Installs the global subscriber.
///
/// The returned guard flushes buffered output when dropped and must be held
/// for the lifetime of the program.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard, LoggingError> {
    let level = std::env::var(EnvFilter::DEFAULT_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.level.clone());
    let filter = build_env_filter(&level)?;

    let (writer, guard) = match &config.file {
        Some(path) => {
            let (directory, file_name) = split_log_path(path)?;
            std::fs::create_dir_all(&directory).map_err(|source| LoggingError::CreateDir {
                path: directory.clone(),
                source,
            })?;
            tracing_appender::non_blocking(tracing_appender::rolling::daily(directory, file_name))
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(config.file.is_none())
        .with_timer(LocalTime::rfc_3339())
        .with_target(true)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))?;

    tracing::debug!(level = %level, file = ?config.file, "Logging initialized");
    Ok(guard)
}

/// Filter for `level` with noisy dependencies capped.
fn build_env_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    let mut directives = vec![level.to_string()];
    directives.extend(
        NOISY_TARGETS
            .iter()
            .map(|(target, cap)| format!("{}={}", target, cap)),
    );

    let filter = directives.join(",");
    EnvFilter::try_new(&filter).map_err(|e| LoggingError::Filter {
        filter,
        reason: e.to_string(),
    })
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(path.to_path_buf()))?;
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((directory.to_path_buf(), PathBuf::from(file_name)))
}
