//! Query command - fetch rows from a table.

use monsoon::api::RequestParams;
use tracing::info;

use super::stats::stats_request;
use crate::error::CliError;
use crate::runner::{CliRunner, RunnerOptions};

/// Arguments for the query command.
#[derive(Debug, Clone)]
pub struct QueryArgs {
    pub table: String,
    pub field: String,
    pub bounds: Option<String>,
    pub cond: Option<String>,
    pub limit: Option<String>,
    pub repeat: u32,
    pub show_stats: bool,
}

impl QueryArgs {
    /// Request parameters equivalent to these arguments.
    pub fn to_params(&self) -> RequestParams {
        let mut params = RequestParams::new()
            .with("table", self.table.as_str())
            .with("field", self.field.as_str());
        if let Some(bounds) = &self.bounds {
            params = params.with("mapBounds", bounds.as_str());
        }
        if let Some(cond) = &self.cond {
            params = params.with("cond", cond.as_str());
        }
        if let Some(limit) = &self.limit {
            params = params.with("limit", limit.as_str());
        }
        params
    }
}

pub fn run(options: &RunnerOptions, args: QueryArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("query");
    let app = runner.start_app()?;

    let params = args.to_params();
    runner.block_on(async {
        for _ in 0..args.repeat.max(1) {
            println!("{}", app.handle(&params).await);
        }
        if args.show_stats {
            println!("{}", app.handle(&stats_request()).await);
        }
    });
    info!(cached_entries = app.cached_entries(), "Query complete");
    Ok(())
}
