//! Recent-request statistics.
//!
//! Each data request appends one [`StatsEntry`] (hit/miss, latency, backend
//! kind) to a bounded FIFO buffer kept in the shared cache as a single JSON
//! list. The read-modify-write is uncoordinated: concurrent recorders may
//! overwrite each other's entries, and lost updates are not reported.
//!
//! # Example
//!
//! ```ignore
//! let recorder = StatsRecorder::new(cache);
//! recorder
//!     .record(StatsEntry::for_request(false, 412, RequestKind::Bq, Some(query)))
//!     .await;
//! let recent = recorder.recent().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224};
use tracing::{debug, warn};

use crate::cache::{Cache, STATS_TTL};
use crate::catalog::BackendKind;

/// Cache key holding the serialized buffer.
pub const STATS_KEY: &str = "recent_latencies";

/// Maximum number of entries kept.
pub const MAX_STATS_ENTRIES: usize = 100;

/// Length of the key digest stored with each entry.
const KEY_HASH_LENGTH: usize = 8;

/// Transport used by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "BQ")]
    Bq,
}

impl From<BackendKind> for RequestKind {
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::FusionTables => RequestKind::Http,
            BackendKind::BigQuery => RequestKind::Bq,
        }
    }
}

/// Outcome of one data request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsEntry {
    pub hit: bool,

    /// Elapsed time in milliseconds.
    #[serde(rename = "latency")]
    pub latency_ms: u64,

    pub kind: RequestKind,

    /// First 8 hex characters of the SHA-224 digest of `key`.
    #[serde(rename = "hash", default, skip_serializing_if = "Option::is_none")]
    pub key_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl StatsEntry {
    /// Creates an entry, hashing `key` when present.
    pub fn for_request(hit: bool, latency_ms: u64, kind: RequestKind, key: Option<&str>) -> Self {
        Self {
            hit,
            latency_ms,
            kind,
            key_hash: key.map(key_hash),
            key: key.map(str::to_string),
        }
    }
}

/// Short digest identifying a request key.
pub fn key_hash(key: &str) -> String {
    let digest = format!("{:x}", Sha224::digest(key.as_bytes()));
    digest[..KEY_HASH_LENGTH].to_string()
}

/// Appends entries to the cached buffer.
pub struct StatsRecorder {
    cache: Arc<dyn Cache>,
    capacity: usize,
    ttl: Duration,
}

impl StatsRecorder {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self::with_ttl(cache, STATS_TTL)
    }

    pub fn with_ttl(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self {
            cache,
            capacity: MAX_STATS_ENTRIES,
            ttl,
        }
    }

    /// Appends `entry`, evicting the oldest entries beyond capacity.
    ///
    /// Best effort: cache failures are logged and otherwise ignored.
    pub async fn record(&self, entry: StatsEntry) {
        debug!(
            hit = entry.hit,
            latency_ms = entry.latency_ms,
            kind = ?entry.kind,
            "Recording request stats"
        );

        let mut entries = self.recent().await;
        entries.push(entry);
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }

        let payload = match serde_json::to_vec(&entries) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Failed to encode stats buffer");
                return;
            }
        };
        if let Err(e) = self.cache.set(STATS_KEY, payload, self.ttl).await {
            warn!(error = %e, "Failed to store stats buffer");
        }
    }

    /// Current buffer, oldest first. Missing or unreadable buffers are empty.
    pub async fn recent(&self) -> Vec<StatsEntry> {
        let Some(raw) = self.load().await else {
            return Vec::new();
        };
        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable stats buffer");
            Vec::new()
        })
    }

    /// The stored buffer as JSON text, if any entries were recorded.
    pub async fn raw(&self) -> Option<String> {
        self.load()
            .await
            .and_then(|raw| String::from_utf8(raw).ok())
    }

    async fn load(&self) -> Option<Vec<u8>> {
        match self.cache.get(STATS_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Stats buffer unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCacheProvider, UnavailableCache};

    fn recorder() -> (Arc<MemoryCacheProvider>, StatsRecorder) {
        let cache = Arc::new(MemoryCacheProvider::new(1_000_000));
        let recorder = StatsRecorder::new(cache.clone());
        (cache, recorder)
    }

    #[test]
    fn test_key_hash_is_eight_hex_chars() {
        let hash = key_hash("SELECT x FROM t WHERE TRUE LIMIT 1");
        assert_eq!(hash.len(), 8);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_hash_known_value() {
        // SHA-224("abc") = 23097d22 3405d822 ...
        assert_eq!(key_hash("abc"), "23097d22");
    }

    #[test]
    fn test_entry_serialization_field_names() {
        let entry = StatsEntry::for_request(true, 12, RequestKind::Http, Some("abc"));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["hit"], true);
        assert_eq!(value["latency"], 12);
        assert_eq!(value["kind"], "HTTP");
        assert_eq!(value["hash"], "23097d22");
        assert_eq!(value["key"], "abc");
    }

    #[test]
    fn test_entry_without_key_omits_hash() {
        let entry = StatsEntry::for_request(false, 0, RequestKind::Bq, None);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"hit":false,"latency":0,"kind":"BQ"}"#);
    }

    #[test]
    fn test_request_kind_from_backend() {
        assert_eq!(RequestKind::from(BackendKind::FusionTables), RequestKind::Http);
        assert_eq!(RequestKind::from(BackendKind::BigQuery), RequestKind::Bq);
    }

    #[tokio::test]
    async fn test_empty_buffer() {
        let (_, recorder) = recorder();
        assert!(recorder.recent().await.is_empty());
        assert!(recorder.raw().await.is_none());
    }

    #[tokio::test]
    async fn test_record_appends_in_order() {
        let (_, recorder) = recorder();
        recorder
            .record(StatsEntry::for_request(false, 10, RequestKind::Bq, Some("a")))
            .await;
        recorder
            .record(StatsEntry::for_request(true, 1, RequestKind::Bq, Some("a")))
            .await;

        let entries = recorder.recent().await;
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].hit);
        assert!(entries[1].hit);
    }

    #[tokio::test]
    async fn test_buffer_is_bounded_fifo() {
        let (_, recorder) = recorder();
        for i in 0..101u64 {
            recorder
                .record(StatsEntry::for_request(false, i, RequestKind::Http, None))
                .await;
        }

        let entries = recorder.recent().await;
        assert_eq!(entries.len(), MAX_STATS_ENTRIES);
        let latencies: Vec<u64> = entries.iter().map(|e| e.latency_ms).collect();
        assert_eq!(latencies, (1..101).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_raw_is_json_list() {
        let (_, recorder) = recorder();
        recorder
            .record(StatsEntry::for_request(true, 3, RequestKind::Bq, None))
            .await;

        let raw = recorder.raw().await.unwrap();
        assert_eq!(raw, r#"[{"hit":true,"latency":3,"kind":"BQ"}]"#);
    }

    #[tokio::test]
    async fn test_unreadable_buffer_is_replaced() {
        let (cache, recorder) = recorder();
        cache
            .set(STATS_KEY, b"not json".to_vec(), STATS_TTL)
            .await
            .unwrap();

        recorder
            .record(StatsEntry::for_request(true, 3, RequestKind::Bq, None))
            .await;

        assert_eq!(recorder.recent().await.len(), 1);
    }

    #[tokio::test]
    async fn test_record_survives_unavailable_cache() {
        let cache = Arc::new(UnavailableCache::default());
        let recorder = StatsRecorder::new(cache.clone());

        recorder
            .record(StatsEntry::for_request(false, 5, RequestKind::Http, Some("k")))
            .await;

        assert!(recorder.recent().await.is_empty());
        assert_eq!(
            cache
                .set_attempts
                .load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }
}
