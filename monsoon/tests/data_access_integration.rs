//! Integration tests for the request path.
//!
//! These tests drive `MonsoonApp` through its public request boundary with
//! scripted HTTP clients standing in for Fusion Tables and BigQuery:
//! - query text reaching each backend
//! - caching of successful results only
//! - the stats buffer and its envelope
//!
//! Run with: `cargo test --test data_access_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use monsoon::api::RequestParams;
use monsoon::app::{AppConfig, MonsoonApp};
use monsoon::backend::{
    BackendError, BigQueryBackend, BigQuerySettings, FusionTablesBackend, HttpClient, HttpError,
    LazyBackend,
};
use monsoon::cache::BoxFuture;
use monsoon::catalog::BackendKind;
use monsoon::stats::MAX_STATS_ENTRIES;

// ============================================================================
// Helper Functions
// ============================================================================

/// HTTP client answering every request with the same scripted response.
#[derive(Clone)]
struct ScriptedClient {
    response: Result<String, HttpError>,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<(String, Option<Value>)>>>,
}

impl ScriptedClient {
    fn new(response: Result<String, HttpError>) -> Self {
        Self {
            response,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_body(&self) -> Option<Value> {
        self.seen.lock().unwrap().last().and_then(|(_, body)| body.clone())
    }

    fn last_url(&self) -> Option<String> {
        self.seen.lock().unwrap().last().map(|(url, _)| url.clone())
    }

    fn answer(&self, url: &str, body: Option<Value>) -> BoxFuture<'_, Result<String, HttpError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((url.to_string(), body));
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

impl HttpClient for ScriptedClient {
    fn get(&self, url: &str) -> BoxFuture<'_, Result<String, HttpError>> {
        self.answer(url, None)
    }

    fn post_json(
        &self,
        url: &str,
        body: Value,
        _bearer_token: Option<&str>,
    ) -> BoxFuture<'_, Result<String, HttpError>> {
        self.answer(url, Some(body))
    }
}

const CROPS_RESPONSE: &str = r#"{
    "kind": "bigquery#queryResponse",
    "jobComplete": true,
    "totalRows": "2",
    "schema": {"fields": [
        {"name": "latitude", "type": "FLOAT"},
        {"name": "longitude", "type": "FLOAT"},
        {"name": "maize_yield", "type": "FLOAT"}
    ]},
    "rows": [
        {"f": [{"v": "36.125"}, {"v": "-122.875"}, {"v": "8.5"}]},
        {"f": [{"v": "37.5"}, {"v": "-121.5"}, {"v": null}]}
    ]
}"#;

const CROP_AREA_CSV: &str = "latitude,longitude,area\n37.5,-122.25,0.75\n36.5,-121.75,0.25\n";

/// App over the built-in catalog with scripted backends.
fn app_with(ft: &ScriptedClient, bq: &ScriptedClient) -> MonsoonApp {
    let settings = BigQuerySettings {
        access_token: Some("test-token".to_string()),
        ..BigQuerySettings::default()
    };
    let bigquery = BigQueryBackend::new(bq.clone(), settings).unwrap();
    MonsoonApp::start_with_backends(
        AppConfig::default(),
        Arc::new(FusionTablesBackend::new(ft.clone())),
        LazyBackend::ready(Arc::new(bigquery)),
    )
    .unwrap()
}

async fn request(app: &MonsoonApp, query: &str) -> Value {
    let line = app.handle(&RequestParams::from_query_string(query)).await;
    assert!(!line.contains('\n'), "envelope must be a single line");
    serde_json::from_str(&line).unwrap()
}

// ============================================================================
// Integration Tests
// ============================================================================

/// A bounding-box request against a BigQuery table produces strict
/// comparisons and typed rows with nulls preserved.
#[tokio::test]
async fn test_bigquery_bounding_box_request() {
    let ft = ScriptedClient::new(Ok(CROP_AREA_CSV.to_string()));
    let bq = ScriptedClient::new(Ok(CROPS_RESPONSE.to_string()));
    let app = app_with(&ft, &bq);

    let body = request(
        &app,
        "table=umn.Crops_2005&field=maize_yield&mapBounds=36,-123,38,-121&limit=1",
    )
    .await;

    assert_eq!(body["status"], "OK");
    assert_eq!(
        body["payload"],
        json!([
            ["latitude", "longitude", "maize_yield"],
            [36.125, -122.875, 8.5],
            [37.5, -121.5, null]
        ])
    );
    assert_eq!(
        bq.last_body().unwrap(),
        json!({
            "query": "SELECT latitude,longitude,maize_yield FROM umn.Crops_2005 WHERE \
                      latitude > 36.000000 AND latitude < 38.000000 AND \
                      longitude > -123.000000 AND longitude < -121.000000 LIMIT 1",
            "timeoutMs": 100000
        })
    );
    assert!(bq
        .last_url()
        .unwrap()
        .ends_with("/projects/google.com:monsoon/queries"));
    assert_eq!(ft.calls(), 0);
}

/// Repeating a request within the TTL is served from cache.
#[tokio::test]
async fn test_repeated_request_hits_cache() {
    let ft = ScriptedClient::new(Ok(CROP_AREA_CSV.to_string()));
    let bq = ScriptedClient::new(Ok(CROPS_RESPONSE.to_string()));
    let app = app_with(&ft, &bq);

    let query = "table=588453&field=area&mapBounds=36,-123,38,-121";
    let first = request(&app, query).await;
    let second = request(&app, query).await;

    assert_eq!(first, second);
    assert_eq!(ft.calls(), 1);
    assert_eq!(first["payload"][2], json!([36.5, -121.75, 0.25]));

    let stats = request(&app, "stats").await;
    let entries = stats["payload"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["hit"], false);
    assert_eq!(entries[1]["hit"], true);
    assert_eq!(entries[0]["kind"], "HTTP");
    assert_eq!(entries[0]["hash"].as_str().unwrap().len(), 8);

    let url = ft.last_url().unwrap();
    assert!(url.contains("?sql=SELECT%20latitude%2Clongitude%2Carea%20FROM%20588453%20WHERE%20"));
    assert!(!url.contains('+'));
    assert_eq!(entries[0]["key"], url.as_str());
}

/// Failed Fusion Tables requests report the HTTP status and are retried.
#[tokio::test]
async fn test_fusion_tables_error_is_not_cached() {
    let ft = ScriptedClient::new(Err(HttpError::Status {
        code: 500,
        body: "backend error".to_string(),
    }));
    let bq = ScriptedClient::new(Ok(CROPS_RESPONSE.to_string()));
    let app = app_with(&ft, &bq);

    let query = "table=588453&field=area&mapBounds=36,-123,38,-121";
    let body = request(&app, query).await;
    assert_eq!(body["status"], "FT request error: \"HTTPError: 500\"");
    assert_eq!(body["payload"], json!([]));

    request(&app, query).await;
    assert_eq!(ft.calls(), 2);
}

/// An invalid condition degrades to the permissive predicate.
#[tokio::test]
async fn test_invalid_condition_is_downgraded() {
    let ft = ScriptedClient::new(Ok(CROP_AREA_CSV.to_string()));
    let bq = ScriptedClient::new(Ok(CROPS_RESPONSE.to_string()));
    let app = app_with(&ft, &bq);

    request(
        &app,
        "table=umn.Crops_2005&field=maize_yield&cond=1%3D1%3B+DROP+TABLE+x&limit=3",
    )
    .await;

    assert_eq!(
        bq.last_body().unwrap()["query"],
        "SELECT maize_yield FROM umn.Crops_2005 WHERE TRUE LIMIT 3"
    );
}

/// The stats buffer keeps only the most recent entries.
#[tokio::test]
async fn test_stats_buffer_is_bounded() {
    let ft = ScriptedClient::new(Ok(CROP_AREA_CSV.to_string()));
    let bq = ScriptedClient::new(Ok(CROPS_RESPONSE.to_string()));
    let app = app_with(&ft, &bq);

    for limit in 1..=(MAX_STATS_ENTRIES + 1) {
        request(
            &app,
            &format!("table=umn.Crops_2005&field=maize_yield&limit={}", limit),
        )
        .await;
    }

    let recent = app.service().stats().recent().await;
    assert_eq!(recent.len(), MAX_STATS_ENTRIES);
    assert!(recent.iter().all(|entry| !entry.hit));
    assert_eq!(
        recent[0].key.as_deref(),
        Some("SELECT maize_yield FROM umn.Crops_2005 WHERE TRUE LIMIT 2")
    );
}

/// Catalog and unknown-table envelopes.
#[tokio::test]
async fn test_catalog_and_unknown_table() {
    let ft = ScriptedClient::new(Ok(CROP_AREA_CSV.to_string()));
    let bq = ScriptedClient::new(Ok(CROPS_RESPONSE.to_string()));
    let app = app_with(&ft, &bq);

    let catalog = request(&app, "").await;
    assert_eq!(catalog["status"], "OK");
    let ids: Vec<&String> = catalog["payload"].as_object().unwrap().keys().collect();
    assert_eq!(ids[0], "588453");
    assert_eq!(catalog["payload"]["umn.Crops_2005"]["backend"]["id"], "BQ");

    let unknown = request(&app, "table=does.not.exist&field=x").await;
    assert_eq!(unknown["status"], "Could not load table does.not.exist");
    assert_eq!(unknown["payload"], json!({}));
    assert_eq!(ft.calls() + bq.calls(), 0);
}

/// Without credentials, BigQuery tables fail per request while Fusion
/// Tables keep working.
#[tokio::test]
async fn test_missing_bigquery_credentials() {
    let ft = ScriptedClient::new(Ok(CROP_AREA_CSV.to_string()));
    let app = MonsoonApp::start_with_backends(
        AppConfig::default(),
        Arc::new(FusionTablesBackend::new(ft.clone())),
        LazyBackend::new(|| {
            Err(BackendError::Unavailable {
                kind: BackendKind::BigQuery,
                reason: "needed credentials are missing".to_string(),
            })
        }),
    )
    .unwrap();

    let bq = request(&app, "table=umn.Crops_2005&field=maize_yield").await;
    assert_eq!(
        bq["status"],
        "Backend error: \"BigQuery client unavailable: needed credentials are missing\" \
         when accessing table \"umn.Crops_2005\""
    );
    assert_eq!(bq["payload"], json!([]));
    assert!(!app.bigquery_initialized());

    let stats = request(&app, "stats").await;
    assert_eq!(stats["payload"][0]["hit"], false);
    assert_eq!(stats["payload"][0]["kind"], "BQ");
    assert_eq!(
        stats["payload"][0]["key"],
        "SELECT maize_yield FROM umn.Crops_2005 WHERE TRUE LIMIT 1"
    );

    let ft_body = request(&app, "table=588453&field=area").await;
    assert_eq!(ft_body["status"], "OK");
}
