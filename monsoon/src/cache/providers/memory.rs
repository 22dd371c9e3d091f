//! In-memory cache provider using moka.
//!
//! This provider wraps `moka::future::Cache` to provide an async-safe,
//! lock-free in-memory cache with per-entry expiry and byte-weighted
//! LRU eviction.
//!
//! Each stored value carries its own TTL, which a moka `Expiry` policy
//! reads on insert and on overwrite. Expired entries are invisible to
//! `get` immediately, even before moka's maintenance removes them.

use std::time::{Duration, Instant};

use moka::future::Cache as MokaCache;
use moka::Expiry;

use crate::cache::traits::{BoxFuture, Cache, ServiceCacheError};

/// Default capacity: 256 MiB.
pub const DEFAULT_MEMORY_CACHE_BYTES: u64 = 256 * 1024 * 1024;

#[derive(Clone)]
struct Entry {
    data: Vec<u8>,
    ttl: Duration,
}

/// Expiry policy reading the TTL stored with each entry.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory cache provider using moka.
pub struct MemoryCacheProvider {
    cache: MokaCache<String, Entry>,
    max_size_bytes: u64,
}

impl MemoryCacheProvider {
    /// Create a new memory cache provider.
    ///
    /// # Arguments
    ///
    /// * `max_size_bytes` - Maximum total size of keys and values in bytes
    pub fn new(max_size_bytes: u64) -> Self {
        let cache = MokaCache::builder()
            // Weight each entry by its key and data size
            .weigher(|key: &String, value: &Entry| -> u32 {
                (key.len() + value.data.len()).min(u32::MAX as usize) as u32
            })
            .max_capacity(max_size_bytes)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            max_size_bytes,
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Runs pending maintenance (expiry, eviction) so counts are current.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Default for MemoryCacheProvider {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_CACHE_BYTES)
    }
}

impl Cache for MemoryCacheProvider {
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> BoxFuture<'_, Result<(), ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move {
            if value.len() as u64 > self.max_size_bytes {
                return Err(ServiceCacheError::ValueTooLarge {
                    size: value.len(),
                    max: self.max_size_bytes as usize,
                });
            }
            self.cache.insert(key, Entry { data: value, ttl }).await;
            Ok(())
        })
    }

    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.get(&key).await.map(|entry| entry.data)) })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.remove(&key).await.is_some()) })
    }

    fn contains(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.contains_key(&key)) })
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}
