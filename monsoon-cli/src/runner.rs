//! Shared setup for commands: configuration, logging, runtime and app.

use std::future::Future;
use std::path::PathBuf;

use monsoon::app::{AppConfig, MonsoonApp};
use monsoon::config::{config_file_path, ConfigFile};
use monsoon::logging::{init_logging, WorkerGuard};
use tokio::runtime::Runtime;
use tracing::info;

use crate::error::CliError;

/// Global options from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    pub config_path: Option<PathBuf>,
    pub verbose: bool,
}

impl RunnerOptions {
    /// Configuration file in effect.
    pub fn config_path(&self) -> PathBuf {
        self.config_path.clone().unwrap_or_else(config_file_path)
    }
}

/// Loaded configuration, installed logging and an async runtime.
pub struct CliRunner {
    config: ConfigFile,
    config_path: PathBuf,
    runtime: Runtime,
    _log_guard: WorkerGuard,
}

impl CliRunner {
    pub fn new(options: &RunnerOptions) -> Result<Self, CliError> {
        let config_path = options.config_path();
        let config = ConfigFile::load_from(&config_path)?;

        let mut logging = config.logging.clone();
        if options.verbose {
            logging.level = "debug".to_string();
        }
        let log_guard = init_logging(&logging)?;

        let runtime = Runtime::new().map_err(|e| CliError::Runtime(e.to_string()))?;

        Ok(Self {
            config,
            config_path,
            runtime,
            _log_guard: log_guard,
        })
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = monsoon::VERSION,
            config = %self.config_path.display(),
            "Monsoon CLI starting"
        );
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Builds the application from the loaded configuration.
    pub fn start_app(&self) -> Result<MonsoonApp, CliError> {
        let app_config = AppConfig::from_config_file(&self.config);
        Ok(MonsoonApp::start(app_config)?)
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
