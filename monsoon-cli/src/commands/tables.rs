//! Tables command - print the catalog envelope.

use monsoon::api::RequestParams;

use crate::error::CliError;
use crate::runner::{CliRunner, RunnerOptions};

pub fn run(options: &RunnerOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("tables");
    let app = runner.start_app()?;

    let body = runner.block_on(app.handle(&RequestParams::new()));
    println!("{}", body);
    Ok(())
}
