//! The data access orchestrator.
//!
//! Per request:
//!
//! ```text
//! BuildQuery ─► ResolveBackend ─┬─ ok ──► CheckCache ─┬─ hit ──► Decode ───────────────┐
//!                                │                     └─ miss ─► BackendCall ─┬─ ok ──► Store
//!                                │                                             └─ err ─► (skip store)
//!                                └─ err ─► (miss) ─────────────────────────────────────────┤
//!                                                              ─► RecordStats ─► Return
//! ```
//!
//! Every request is recorded in the stats buffer, whatever its outcome.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendError, BackendRegistry};
use crate::cache::{Cache, RESULT_TTL};
use crate::catalog::{BackendKind, TableDescriptor};
use crate::query::{build_query, Bounds};
use crate::schema::Row;
use crate::stats::{StatsEntry, StatsRecorder};

/// Status reported for successful requests.
pub const STATUS_OK: &str = "OK";

/// Number of leading characters of cached payloads written to the log.
const LOGGED_PAYLOAD_PREFIX: usize = 200;

/// Outcome of a fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult {
    /// `"OK"` or a human-readable error description.
    pub status: String,

    /// Header row followed by data rows; empty on failure.
    pub rows: Vec<Row>,
}

impl FetchResult {
    fn ok(rows: Vec<Row>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            rows,
        }
    }

    fn failed(status: String) -> Self {
        Self {
            status,
            rows: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Cached, backend-agnostic access to catalog tables.
pub struct DataAccessService {
    cache: Arc<dyn Cache>,
    backends: Arc<BackendRegistry>,
    stats: StatsRecorder,
    result_ttl: Duration,
}

impl DataAccessService {
    pub fn new(cache: Arc<dyn Cache>, backends: Arc<BackendRegistry>) -> Self {
        let stats = StatsRecorder::new(Arc::clone(&cache));
        Self::with_stats(cache, backends, stats)
    }

    pub fn with_stats(
        cache: Arc<dyn Cache>,
        backends: Arc<BackendRegistry>,
        stats: StatsRecorder,
    ) -> Self {
        Self {
            cache,
            backends,
            stats,
            result_ttl: RESULT_TTL,
        }
    }

    /// Overrides how long successful results stay cached.
    pub fn with_result_ttl(mut self, ttl: Duration) -> Self {
        self.result_ttl = ttl;
        self
    }

    pub fn stats(&self) -> &StatsRecorder {
        &self.stats
    }

    /// Fetches `field_name` from `table`.
    ///
    /// With `bounds` the rows inside the rectangle are returned as
    /// `lat, lon, value`; otherwise rows matching `raw_condition` (or all
    /// rows, if the condition is not a simple filter). At most `limit` rows
    /// are requested.
    pub async fn fetch(
        &self,
        table: &TableDescriptor,
        field_name: &str,
        bounds: Option<&Bounds>,
        raw_condition: &str,
        limit: u32,
    ) -> FetchResult {
        let plan = build_query(table, field_name, bounds, raw_condition, limit);
        debug!(table = %table.id, backend = %table.backend, "Fetching data");

        let started = Instant::now();
        let (hit, key, result) = match self.backends.resolve(table.backend) {
            Ok(backend) => {
                let key = backend.cache_key(&plan);
                match self.cached_rows(&key).await {
                    Some(rows) => (true, key, FetchResult::ok(rows)),
                    None => {
                        let result = self
                            .fetch_and_store(backend.as_ref(), table, field_name, &plan, &key)
                            .await;
                        (false, key, result)
                    }
                }
            }
            // No client, so no client-specific key: fall back to the query text.
            Err(e) => (
                false,
                plan.query_text.clone(),
                FetchResult::failed(failure_status(table, &e)),
            ),
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        self.stats
            .record(StatsEntry::for_request(
                hit,
                latency_ms,
                table.backend.into(),
                Some(&key),
            ))
            .await;

        if !result.is_ok() {
            info!(table = %table.id, status = %result.status, "Data request failed");
        }
        result
    }

    /// Decoded rows stored under `key`, if any.
    async fn cached_rows(&self, key: &str) -> Option<Vec<Row>> {
        debug!(key, "Looking in cache");
        let payload = match self.cache.get(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!(key, "Not found in cache");
                return None;
            }
            Err(e) => {
                warn!(error = %e, key, "Cache lookup failed, fetching from backend");
                return None;
            }
        };

        match serde_json::from_slice::<Vec<Row>>(&payload) {
            Ok(rows) => {
                debug!(
                    key,
                    bytes = payload.len(),
                    prefix = %log_prefix(&payload),
                    "Found in cache"
                );
                Some(rows)
            }
            Err(e) => {
                warn!(error = %e, key, "Discarding undecodable cache entry");
                None
            }
        }
    }

    async fn fetch_and_store(
        &self,
        backend: &dyn Backend,
        table: &TableDescriptor,
        field_name: &str,
        plan: &crate::query::QueryPlan,
        key: &str,
    ) -> FetchResult {
        match backend.fetch_rows(table, field_name, plan).await {
            Ok(rows) => {
                self.store(key, &rows).await;
                FetchResult::ok(rows)
            }
            Err(e) => FetchResult::failed(failure_status(table, &e)),
        }
    }

    async fn store(&self, key: &str, rows: &[Row]) {
        let payload = match serde_json::to_vec(rows) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, key, "Failed to encode rows for cache");
                return;
            }
        };
        debug!(
            key,
            ttl_secs = self.result_ttl.as_secs(),
            bytes = payload.len(),
            prefix = %log_prefix(&payload),
            "Saving result in cache"
        );
        if let Err(e) = self.cache.set(key, payload, self.result_ttl).await {
            warn!(error = %e, key, "Cache store failed");
        }
    }
}

/// Status text for a failed request against `table`.
fn failure_status(table: &TableDescriptor, error: &BackendError) -> String {
    match (error, table.backend) {
        (BackendError::Unavailable { .. }, _) => format!(
            "Backend error: \"{}\" when accessing table \"{}\"",
            error, table.id
        ),
        (_, BackendKind::FusionTables) => format!("FT request error: \"{}\"", error),
        (_, BackendKind::BigQuery) => format!(
            "BQ database error: \"{}\" when accessing table \"{}\"",
            error, table.id
        ),
    }
}

fn log_prefix(payload: &[u8]) -> String {
    let end = payload.len().min(LOGGED_PAYLOAD_PREFIX);
    String::from_utf8_lossy(&payload[..end]).into_owned()
}
