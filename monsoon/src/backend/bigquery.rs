//! BigQuery v2 backend.
//!
//! Queries go through the synchronous `jobs.query` REST method:
//!
//! ```text
//! POST {endpoint}/projects/{projectId}/queries
//! {"query": "...", "timeoutMs": 100000}
//! ```
//!
//! The response carries a schema (`{"fields": [{"name", "type"}]}`) and rows
//! of untyped cells (`{"f": [{"v": "665.6"}, {"v": null}]}`), which are
//! converted with [`Schema::convert_row`].
//!
//! Authorization is out of scope: an OAuth access token obtained elsewhere is
//! passed in and sent as a bearer token. A client cannot be constructed
//! without one.

use serde::Deserialize;
use tracing::info;

use super::http::{HttpClient, HttpError};
use super::types::{Backend, BackendError};
use crate::cache::BoxFuture;
use crate::catalog::{BackendKind, TableDescriptor};
use crate::query::QueryPlan;
use crate::schema::{header_row, Row, Schema};

/// Default REST endpoint.
pub const DEFAULT_BIGQUERY_ENDPOINT: &str = "https://www.googleapis.com/bigquery/v2";

/// Default billing project.
pub const DEFAULT_PROJECT_ID: &str = "google.com:monsoon";

/// Default server-side query timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 100_000;

/// Connection settings for [`BigQueryBackend`].
#[derive(Clone, PartialEq)]
pub struct BigQuerySettings {
    pub endpoint: String,
    pub project_id: String,
    pub timeout_ms: u64,
    pub access_token: Option<String>,
}

impl std::fmt::Debug for BigQuerySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigQuerySettings")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("timeout_ms", &self.timeout_ms)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for BigQuerySettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_BIGQUERY_ENDPOINT.to_string(),
            project_id: DEFAULT_PROJECT_ID.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            access_token: None,
        }
    }
}

/// Converted result of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub total_rows: u64,
    pub schema: Schema,
    pub rows: Vec<Row>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: Option<bool>,
    #[serde(default)]
    total_rows: Option<String>,
    #[serde(default)]
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<TableRow>,
}

#[derive(Deserialize)]
struct TableSchema {
    fields: Vec<TableField>,
}

#[derive(Deserialize)]
struct TableField {
    #[serde(rename = "type")]
    field_type: String,
}

#[derive(Deserialize)]
struct TableRow {
    f: Vec<TableCell>,
}

#[derive(Deserialize)]
struct TableCell {
    #[serde(default)]
    v: serde_json::Value,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl TableCell {
    fn as_text(&self) -> Option<String> {
        match &self.v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// BigQuery query client.
pub struct BigQueryBackend<C: HttpClient> {
    http_client: C,
    settings: BigQuerySettings,
    access_token: String,
}

impl<C: HttpClient> std::fmt::Debug for BigQueryBackend<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigQueryBackend")
            .field("endpoint", &self.settings.endpoint)
            .field("project_id", &self.settings.project_id)
            .finish_non_exhaustive()
    }
}

impl<C: HttpClient> BigQueryBackend<C> {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// [`BackendError::Unavailable`] when no access token is configured.
    pub fn new(http_client: C, settings: BigQuerySettings) -> Result<Self, BackendError> {
        let access_token = settings
            .access_token
            .clone()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| BackendError::Unavailable {
                kind: BackendKind::BigQuery,
                reason: "needed credentials are missing".to_string(),
            })?;

        info!(project_id = %settings.project_id, "Authorizing BigQuery client");
        Ok(Self {
            http_client,
            settings,
            access_token,
        })
    }

    pub fn settings(&self) -> &BigQuerySettings {
        &self.settings
    }

    pub fn http_client(&self) -> &C {
        &self.http_client
    }

    fn query_url(&self, project_id: &str) -> String {
        format!(
            "{}/projects/{}/queries",
            self.settings.endpoint.trim_end_matches('/'),
            project_id
        )
    }

    /// Runs a query and converts its rows using the returned schema.
    ///
    /// Every failure, whether transport, API or decoding, is reported as
    /// [`BackendError::Service`].
    pub async fn query(
        &self,
        query_text: &str,
        project_id: &str,
        timeout_ms: u64,
    ) -> Result<QueryResult, BackendError> {
        info!(query = %query_text, "Issuing BigQuery query");
        let body = serde_json::json!({
            "query": query_text,
            "timeoutMs": timeout_ms,
        });

        let text = self
            .http_client
            .post_json(&self.query_url(project_id), body, Some(&self.access_token))
            .await
            .map_err(|e| BackendError::Service(service_message(&e)))?;

        let result = parse_query_response(&text)?;
        info!(
            total_rows = result.total_rows,
            returned = result.rows.len(),
            "BigQuery query complete"
        );
        Ok(result)
    }
}

fn service_message(error: &HttpError) -> String {
    match error {
        HttpError::Status { code, body } => match serde_json::from_str::<ErrorResponse>(body) {
            Ok(response) => format!("HTTP {}: {}", code, response.error.message),
            Err(_) => format!("HTTP {}", code),
        },
        other => other.to_string(),
    }
}

/// Decodes a `jobs.query` response body.
pub fn parse_query_response(text: &str) -> Result<QueryResult, BackendError> {
    let response: QueryResponse = serde_json::from_str(text)
        .map_err(|e| BackendError::Service(format!("Invalid query response: {}", e)))?;

    if response.job_complete == Some(false) {
        return Err(BackendError::Service(
            "Query did not complete before the timeout".to_string(),
        ));
    }

    let schema = response
        .schema
        .map(|s| Schema::from_tags(s.fields.iter().map(|f| f.field_type.as_str())))
        .ok_or_else(|| BackendError::Service("Query response has no schema".to_string()))?;

    let total_rows = response
        .total_rows
        .as_deref()
        .and_then(|n| n.parse().ok())
        .unwrap_or(response.rows.len() as u64);

    let rows = response
        .rows
        .iter()
        .map(|row| {
            let cells: Vec<Option<String>> = row.f.iter().map(TableCell::as_text).collect();
            let refs: Vec<Option<&str>> = cells.iter().map(|c| c.as_deref()).collect();
            schema
                .convert_row(&refs)
                .map_err(|e| BackendError::Service(e.to_string()))
        })
        .collect::<Result<Vec<Row>, BackendError>>()?;

    Ok(QueryResult {
        total_rows,
        schema,
        rows,
    })
}

impl<C: HttpClient> Backend for BigQueryBackend<C> {
    fn kind(&self) -> BackendKind {
        BackendKind::BigQuery
    }

    fn cache_key(&self, plan: &QueryPlan) -> String {
        plan.query_text.clone()
    }

    fn fetch_rows<'a>(
        &'a self,
        _table: &'a TableDescriptor,
        _field_name: &'a str,
        plan: &'a QueryPlan,
    ) -> BoxFuture<'a, Result<Vec<Row>, BackendError>> {
        Box::pin(async move {
            let result = self
                .query(
                    &plan.query_text,
                    &self.settings.project_id,
                    self.settings.timeout_ms,
                )
                .await?;

            let mut rows = Vec::with_capacity(result.rows.len() + 1);
            rows.push(header_row(&plan.fields));
            rows.extend(result.rows);
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::http::tests::MockHttpClient;
    use crate::query::{build_query, Bounds};
    use crate::schema::CellValue;

    const RESPONSE: &str = r#"{
        "kind": "bigquery#queryResponse",
        "jobComplete": true,
        "totalRows": "2",
        "schema": {"fields": [
            {"name": "latitude", "type": "FLOAT", "mode": "REQUIRED"},
            {"name": "longitude", "type": "FLOAT"},
            {"name": "maize_yield", "type": "FLOAT"}
        ]},
        "rows": [
            {"f": [{"v": "36.5"}, {"v": "-122.5"}, {"v": "9.25"}]},
            {"f": [{"v": "37.5"}, {"v": "-121.5"}, {"v": null}]}
        ]
    }"#;

    fn settings() -> BigQuerySettings {
        BigQuerySettings {
            access_token: Some("token".to_string()),
            ..BigQuerySettings::default()
        }
    }

    fn crops() -> TableDescriptor {
        TableDescriptor::new("umn.Crops_2005", "Crops 2005", BackendKind::BigQuery)
    }

    #[test]
    fn test_missing_credentials() {
        let result = BigQueryBackend::new(
            MockHttpClient::new(Ok(String::new())),
            BigQuerySettings::default(),
        );
        assert!(matches!(
            result,
            Err(BackendError::Unavailable {
                kind: BackendKind::BigQuery,
                ..
            })
        ));
    }

    #[test]
    fn test_blank_token_is_missing() {
        let settings = BigQuerySettings {
            access_token: Some("  ".to_string()),
            ..BigQuerySettings::default()
        };
        assert!(BigQueryBackend::new(MockHttpClient::new(Ok(String::new())), settings).is_err());
    }

    #[test]
    fn test_parse_response() {
        let result = parse_query_response(RESPONSE).unwrap();
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.schema, Schema::from_tags(["FLOAT", "FLOAT", "FLOAT"]));
        assert_eq!(
            result.rows[0],
            vec![
                CellValue::Float(36.5),
                CellValue::Float(-122.5),
                CellValue::Float(9.25)
            ]
        );
        assert_eq!(result.rows[1][2], CellValue::Null);
    }

    #[test]
    fn test_parse_response_integer_and_string() {
        let text = r#"{"jobComplete": true, "totalRows": "1",
            "schema": {"fields": [{"name": "year", "type": "INTEGER"}, {"name": "crop_name", "type": "STRING"}]},
            "rows": [{"f": [{"v": "2005"}, {"v": "maize"}]}]}"#;
        let result = parse_query_response(text).unwrap();
        assert_eq!(
            result.rows[0],
            vec![CellValue::Integer(2005), CellValue::from("maize")]
        );
    }

    #[test]
    fn test_parse_response_without_rows() {
        let text = r#"{"jobComplete": true, "totalRows": "0",
            "schema": {"fields": [{"name": "x", "type": "FLOAT"}]}}"#;
        let result = parse_query_response(text).unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.total_rows, 0);
    }

    #[test]
    fn test_parse_response_incomplete_job() {
        let text = r#"{"jobComplete": false}"#;
        assert!(matches!(
            parse_query_response(text),
            Err(BackendError::Service(msg)) if msg.contains("timeout")
        ));
    }

    #[test]
    fn test_parse_response_row_shorter_than_schema() {
        let text = r#"{"jobComplete": true,
            "schema": {"fields": [{"name": "a", "type": "FLOAT"}, {"name": "b", "type": "FLOAT"}]},
            "rows": [{"f": [{"v": "1.0"}]}]}"#;
        assert!(matches!(
            parse_query_response(text),
            Err(BackendError::Service(_))
        ));
    }

    #[test]
    fn test_parse_response_garbage() {
        assert!(matches!(
            parse_query_response("<html>"),
            Err(BackendError::Service(_))
        ));
    }

    #[tokio::test]
    async fn test_query_sends_request() {
        let backend =
            BigQueryBackend::new(MockHttpClient::new(Ok(RESPONSE.to_string())), settings()).unwrap();

        backend
            .query("SELECT 1", "my-project", 5_000)
            .await
            .unwrap();

        let seen = backend.http_client.last_request().unwrap();
        assert_eq!(
            seen.url,
            "https://www.googleapis.com/bigquery/v2/projects/my-project/queries"
        );
        assert_eq!(
            seen.body,
            Some(serde_json::json!({"query": "SELECT 1", "timeoutMs": 5000}))
        );
        assert_eq!(seen.bearer_token.as_deref(), Some("token"));
    }

    #[tokio::test]
    async fn test_query_wraps_http_errors() {
        let backend = BigQueryBackend::new(
            MockHttpClient::new(Err(HttpError::Status {
                code: 400,
                body: r#"{"error": {"code": 400, "message": "Not found: Table umn.Nope"}}"#
                    .to_string(),
            })),
            settings(),
        )
        .unwrap();

        let err = backend.query("SELECT 1", "p", 1).await.unwrap_err();
        assert_eq!(
            err,
            BackendError::Service("HTTP 400: Not found: Table umn.Nope".to_string())
        );
    }

    #[tokio::test]
    async fn test_query_wraps_transport_errors() {
        let backend =
            BigQueryBackend::new(MockHttpClient::new(Err(HttpError::Timeout)), settings()).unwrap();

        let err = backend.query("SELECT 1", "p", 1).await.unwrap_err();
        assert_eq!(err, BackendError::Service("timed out".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_rows_prepends_header() {
        let backend =
            BigQueryBackend::new(MockHttpClient::new(Ok(RESPONSE.to_string())), settings()).unwrap();
        let bounds = Bounds::default();
        let plan = build_query(&crops(), "maize_yield", Some(&bounds), "", 2);

        let rows = backend.fetch_rows(&crops(), "maize_yield", &plan).await.unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], header_row(&["latitude", "longitude", "maize_yield"]));
        assert_eq!(backend.cache_key(&plan), plan.query_text);

        let seen = backend.http_client.last_request().unwrap();
        assert_eq!(
            seen.body,
            Some(serde_json::json!({"query": plan.query_text, "timeoutMs": 100000}))
        );
        assert!(seen.url.contains("/projects/google.com:monsoon/queries"));
    }
}
