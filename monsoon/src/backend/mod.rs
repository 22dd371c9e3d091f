//! Remote query backends.
//!
//! Tables live in one of two services with different protocols:
//!
//! - [`FusionTablesBackend`]: HTTP GET, CSV response, keyed by request URL
//! - [`BigQueryBackend`]: JSON POST, typed schema, keyed by query text
//!
//! Both implement [`Backend`], and [`BackendRegistry`] picks one by the
//! table's [`BackendKind`](crate::catalog::BackendKind).
//!
//! # Example
//!
//! ```ignore
//! use monsoon::backend::{BackendRegistry, FusionTablesBackend, LazyBackend, ReqwestClient};
//!
//! let fusion = FusionTablesBackend::new(ReqwestClient::new()?);
//! let registry = BackendRegistry::new(Arc::new(fusion), LazyBackend::new(make_bigquery));
//! let backend = registry.resolve(table.backend)?;
//! ```

mod bigquery;
mod fusion_tables;
mod http;
mod registry;
mod types;

pub use bigquery::{
    parse_query_response, BigQueryBackend, BigQuerySettings, QueryResult,
    DEFAULT_BIGQUERY_ENDPOINT, DEFAULT_PROJECT_ID, DEFAULT_TIMEOUT_MS,
};
pub use fusion_tables::{
    parse_response, status_text, FusionTablesBackend, DEFAULT_FUSION_TABLES_URL,
};
pub use http::{HttpClient, HttpError, ReqwestClient, DEFAULT_HTTP_TIMEOUT_SECS};
pub use registry::{BackendRegistry, LazyBackend};
pub use types::{Backend, BackendError};

#[cfg(test)]
pub use http::tests::MockHttpClient;
