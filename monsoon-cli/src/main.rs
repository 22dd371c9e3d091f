//! Monsoon CLI - Command-line interface
//!
//! Drives the Monsoon request handler from the shell. Envelopes are printed
//! to stdout as single JSON lines; logs go to stderr or the configured file.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{config, query, stats, tables};
use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(name = "monsoon", version, about = "Cached access to crop and climate tables")]
struct Cli {
    /// Configuration file (defaults to ~/.monsoon/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the table catalog envelope
    Tables,

    /// Fetch rows from a table
    Query {
        /// Table id (e.g. umn.Crops_2005)
        #[arg(long)]
        table: String,

        /// Field to fetch
        #[arg(long)]
        field: String,

        /// Bounding box as sw_lat,sw_lon,ne_lat,ne_lon
        #[arg(long, allow_hyphen_values = true)]
        bounds: Option<String>,

        /// Simple filter condition such as crop="maize"
        #[arg(long)]
        cond: Option<String>,

        /// Maximum number of rows
        #[arg(long)]
        limit: Option<String>,

        /// Send the same request this many times
        #[arg(long, default_value_t = 1)]
        repeat: u32,

        /// Print the stats envelope after the requests
        #[arg(long)]
        show_stats: bool,
    },

    /// Print the stats envelope of this process
    Stats,

    /// Show the configuration file path
    ConfigPath,

    /// Write the effective configuration, with every key, to the config file
    ConfigInit {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let options = runner::RunnerOptions {
        config_path: cli.config,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Tables => tables::run(&options),
        Commands::Query {
            table,
            field,
            bounds,
            cond,
            limit,
            repeat,
            show_stats,
        } => query::run(
            &options,
            query::QueryArgs {
                table,
                field,
                bounds,
                cond,
                limit,
                repeat,
                show_stats,
            },
        ),
        Commands::Stats => stats::run(&options),
        Commands::ConfigPath => config::run_path(&options),
        Commands::ConfigInit { force } => config::run_init(&options, force),
    }
}
