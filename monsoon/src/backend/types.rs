//! Backend abstraction shared by both remote query services.

use thiserror::Error;

use crate::cache::BoxFuture;
use crate::catalog::{BackendKind, TableDescriptor};
use crate::query::QueryPlan;
use crate::schema::{Row, SchemaError};

/// Errors returned by backends.
///
/// The message of each variant is the status text reported to callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Fusion Tables transport failure, e.g. `HTTPError: 500`.
    #[error("{0}")]
    Transport(String),

    /// Any BigQuery API or transport failure.
    #[error("{0}")]
    Service(String),

    /// The payload did not match the expected columns or types.
    #[error("Malformed response: {0}")]
    Format(#[from] SchemaError),

    /// The backend client could not be constructed.
    #[error("{kind} client unavailable: {reason}")]
    Unavailable { kind: BackendKind, reason: String },
}

/// A remote tabular query service.
///
/// Implementations derive the cache key for a plan and fetch converted rows.
/// The rows returned start with a header row of column names.
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Deterministic cache key for `plan`.
    fn cache_key(&self, plan: &QueryPlan) -> String;

    /// Runs `plan` and converts the result using `table`'s metadata.
    fn fetch_rows<'a>(
        &'a self,
        table: &'a TableDescriptor,
        field_name: &'a str,
        plan: &'a QueryPlan,
    ) -> BoxFuture<'a, Result<Vec<Row>, BackendError>>;
}
