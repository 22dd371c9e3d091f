//! Stats command - print the stats envelope.
//!
//! The cache lives in this process, so a fresh process reports an empty
//! buffer. Use `query --show-stats` to see stats for a run.

use monsoon::api::RequestParams;

use crate::error::CliError;
use crate::runner::{CliRunner, RunnerOptions};

pub fn run(options: &RunnerOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("stats");
    let app = runner.start_app()?;

    let body = runner.block_on(app.handle(&stats_request()));
    println!("{}", body);
    Ok(())
}

pub fn stats_request() -> RequestParams {
    RequestParams::new().with("stats", "")
}
