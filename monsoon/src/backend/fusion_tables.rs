//! Fusion Tables backend.
//!
//! Queries are sent as an HTTP GET with the SQL text in the `sql` query
//! parameter. The response is CSV: a header line followed by one line per
//! row (`lat,lon,value` for bounding-box queries).
//!
//! # Cache Key
//!
//! The fully percent-encoded request URL, e.g.
//! `http://www.google.com/fusiontables/api/query?sql=SELECT%20area%20FROM%20588453%20WHERE%20TRUE%20LIMIT%201`

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, info, warn};
use url::Url;

use super::http::{HttpClient, HttpError};
use super::types::{Backend, BackendError};
use crate::cache::BoxFuture;
use crate::catalog::{BackendKind, TableDescriptor};
use crate::query::QueryPlan;
use crate::schema::{convert_text_row, header_row, Row};

/// Default query endpoint.
pub const DEFAULT_FUSION_TABLES_URL: &str = "http://www.google.com/fusiontables/api/query";

/// Bytes left unescaped in the `sql` parameter: ASCII letters, digits and `_.-/`.
const SQL_PARAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'/');

/// Status text reported for timeouts.
const DOWNLOAD_ERROR: &str = "DownloadError (most likely a timeout)";

/// Fusion Tables query client.
pub struct FusionTablesBackend<C: HttpClient> {
    http_client: C,
    base_url: Url,
}

impl<C: HttpClient> FusionTablesBackend<C> {
    /// Creates a backend using the default endpoint.
    pub fn new(http_client: C) -> Self {
        Self {
            http_client,
            base_url: Url::parse(DEFAULT_FUSION_TABLES_URL).expect("default endpoint is a valid URL"),
        }
    }

    /// Creates a backend querying `base_url`.
    pub fn with_base_url(http_client: C, base_url: &str) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            BackendError::Transport(format!("URLError: invalid endpoint {}: {}", base_url, e))
        })?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn http_client(&self) -> &C {
        &self.http_client
    }

    /// Full request URL for a query.
    pub fn request_url(&self, plan: &QueryPlan) -> String {
        let mut url = self.base_url.clone();
        let sql = utf8_percent_encode(&plan.query_text, SQL_PARAM);
        url.set_query(Some(&format!("sql={}", sql)));
        url.to_string()
    }

    /// Issues the GET request.
    ///
    /// Returns the body and an empty status on success, or no body and a
    /// short description of the failure.
    pub async fn fetch_url(&self, url: &str) -> (Option<String>, String) {
        info!(url, "Issuing Fusion Tables request");
        match self.http_client.get(url).await {
            Ok(body) => (Some(body), String::new()),
            Err(e) => {
                let status_text = status_text(&e);
                warn!(url, status = %status_text, "Error in HTTP request");
                (None, status_text)
            }
        }
    }
}

/// Maps a transport failure to the status text shown to callers.
pub fn status_text(error: &HttpError) -> String {
    match error {
        HttpError::Status { code, .. } => format!("HTTPError: {}", code),
        HttpError::Url(reason) => format!("URLError: {}", reason),
        HttpError::Body(reason) => format!("URLError: {}", reason),
        HttpError::Timeout => DOWNLOAD_ERROR.to_string(),
    }
}

/// Parses a CSV response into a header row followed by converted rows.
pub fn parse_response(
    table: &TableDescriptor,
    field_name: &str,
    plan: &QueryPlan,
    body: &str,
) -> Result<Vec<Row>, BackendError> {
    let mut lines = body.lines();
    let header = lines
        .next()
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| BackendError::Transport("Empty response".to_string()))?;

    let names: Vec<&str> = header.split(',').collect();
    let mut rows = vec![header_row(&names)];
    for line in lines.filter(|line| !line.trim().is_empty()) {
        let columns: Vec<&str> = line.split(',').collect();
        rows.push(convert_text_row(table, field_name, &plan.fields, &columns)?);
    }

    debug!(rows = rows.len() - 1, "Parsed Fusion Tables response");
    Ok(rows)
}

impl<C: HttpClient> Backend for FusionTablesBackend<C> {
    fn kind(&self) -> BackendKind {
        BackendKind::FusionTables
    }

    fn cache_key(&self, plan: &QueryPlan) -> String {
        self.request_url(plan)
    }

    fn fetch_rows<'a>(
        &'a self,
        table: &'a TableDescriptor,
        field_name: &'a str,
        plan: &'a QueryPlan,
    ) -> BoxFuture<'a, Result<Vec<Row>, BackendError>> {
        Box::pin(async move {
            let url = self.request_url(plan);
            match self.fetch_url(&url).await {
                (Some(body), _) => parse_response(table, field_name, plan, &body),
                (None, status_text) => Err(BackendError::Transport(status_text)),
            }
        })
    }
}
