//! Configuration commands.

use std::path::Path;

use monsoon::config::ConfigFile;
use tracing::info;

use crate::error::CliError;
use crate::runner::{CliRunner, RunnerOptions};

/// Show the configuration file path.
pub fn run_path(options: &RunnerOptions) -> Result<(), CliError> {
    println!("{}", options.config_path().display());
    Ok(())
}

/// Write the effective configuration, every key included, to the
/// configuration file.
pub fn run_init(options: &RunnerOptions, force: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("config-init");

    let path = options.config_path();
    write_config(runner.config(), &path, force)?;
    info!(path = %path.display(), "Configuration written");
    println!("Wrote {}", path.display());
    Ok(())
}

fn write_config(config: &ConfigFile, path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    config.save_to(path)?;
    Ok(())
}
