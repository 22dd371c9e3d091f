//! Parameter handling and response envelopes.

use std::num::IntErrorKind;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::RequestParams;
use crate::catalog::Catalog;
use crate::query::Bounds;
use crate::service::{DataAccessService, STATUS_OK};

/// Row limit used when the request does not name a usable one.
pub const DEFAULT_LIMIT: u32 = 1;

/// Upper bound applied to requested limits.
pub const DEFAULT_MAX_LIMIT: u32 = 100_000;

/// Response body: a payload and a status string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub payload: Value,
    pub status: String,
}

impl Envelope {
    pub fn ok(payload: Value) -> Self {
        Self {
            payload,
            status: STATUS_OK.to_string(),
        }
    }

    /// Single-line JSON encoding.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to encode response");
            format!(r#"{{"payload": {{}}, "status": "Failed to encode response: {}"}}"#, e)
        })
    }
}

/// Serves data, catalog and stats requests.
pub struct AccessHandler {
    catalog: Arc<Catalog>,
    service: Arc<DataAccessService>,
    max_limit: u32,
}

impl AccessHandler {
    pub fn new(catalog: Arc<Catalog>, service: Arc<DataAccessService>) -> Self {
        Self {
            catalog,
            service,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }

    pub fn with_max_limit(mut self, max_limit: u32) -> Self {
        self.max_limit = max_limit.max(1);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Handles a request and returns the encoded envelope.
    pub async fn handle(&self, params: &RequestParams) -> String {
        self.respond(params).await.to_json()
    }

    /// Handles a request.
    ///
    /// `stats` takes precedence over everything else; without `table` the
    /// catalog is returned.
    pub async fn respond(&self, params: &RequestParams) -> Envelope {
        if params.contains("stats") {
            return self.stats_envelope().await;
        }

        let Some(table_id) = params.get("table") else {
            return self.catalog_envelope();
        };

        let Some(table) = self.catalog.get(table_id) else {
            debug!(table = table_id, "Request for unknown table");
            return Envelope {
                payload: Value::Object(Default::default()),
                status: format!("Could not load table {}", table_id),
            };
        };

        let field = params
            .get("field")
            .or_else(|| params.get("fields"))
            .unwrap_or_default();
        let bounds = params.get("mapBounds").map(Bounds::parse);
        let condition = params.get("cond").unwrap_or_default();
        let limit = self.clamp_limit(params.get("limit"));

        let result = self
            .service
            .fetch(table, field, bounds.as_ref(), condition, limit)
            .await;

        let payload = serde_json::to_value(&result.rows).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to encode rows");
            Value::Array(Vec::new())
        });
        Envelope {
            payload,
            status: result.status,
        }
    }

    fn catalog_envelope(&self) -> Envelope {
        match serde_json::to_value(self.catalog.as_ref()) {
            Ok(payload) => Envelope::ok(payload),
            Err(e) => Envelope {
                payload: Value::Object(Default::default()),
                status: format!("Failed to encode catalog: {}", e),
            },
        }
    }

    /// The stored stats buffer, embedded as is, or `""` when nothing was
    /// recorded yet.
    async fn stats_envelope(&self) -> Envelope {
        let Some(raw) = self.service.stats().raw().await else {
            return Envelope::ok(Value::String(String::new()));
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(payload) => Envelope::ok(payload),
            Err(e) => {
                warn!(error = %e, "Stored stats buffer is not valid JSON");
                Envelope {
                    payload: Value::String(String::new()),
                    status: format!("Failed to decode stats: {}", e),
                }
            }
        }
    }

    fn clamp_limit(&self, raw: Option<&str>) -> u32 {
        let max = i64::from(self.max_limit);
        let requested = match raw.map(|value| value.trim().parse::<i64>()) {
            Some(Ok(value)) => value,
            Some(Err(e)) if *e.kind() == IntErrorKind::PosOverflow => max,
            _ => i64::from(DEFAULT_LIMIT),
        };
        requested.clamp(1, max) as u32
    }
}
