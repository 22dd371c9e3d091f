//! Core trait for the shared response cache.
//!
//! The `Cache` trait is the access contract toward whatever shared
//! key/value store backs the service. Query results and the stats buffer
//! both go through it.
//!
//! # Design Principles
//!
//! - **String keys**: query text or a fully encoded URL, human-readable in logs
//! - **Vec<u8> values**: raw bytes, no serialization opinions imposed
//! - **Per-entry TTL**: every write carries its own time-to-live
//! - **Last write wins**: no transactional guarantees
//! - **Dyn-compatible**: uses `Pin<Box<dyn Future>>` for trait object support
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use monsoon::cache::{Cache, MemoryCacheProvider};
//!
//! let cache = MemoryCacheProvider::new(64 * 1024 * 1024);
//! cache.set("key", b"value".to_vec(), Duration::from_secs(60)).await?;
//! let value = cache.get("key").await?;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

/// Time-to-live for cached query results.
pub const RESULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Time-to-live for the stats buffer.
pub const STATS_TTL: Duration = Duration::from_secs(60 * 60);

/// Errors that can occur during cache operations.
///
/// Callers treat every variant as a miss (on read) or a dropped write; none
/// of them is surfaced to users.
#[derive(Debug, Error)]
pub enum ServiceCacheError {
    /// The backing store cannot be reached.
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// Value exceeds maximum allowed size.
    #[error("Value too large: {size} bytes (max: {max})")]
    ValueTooLarge { size: usize, max: usize },

    /// Provider-specific error.
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Generic cache interface for key-value storage with expiry.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` for use across async tasks.
pub trait Cache: Send + Sync {
    /// Store a value that expires after `ttl`.
    ///
    /// Replaces any existing value and restarts its expiry.
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> BoxFuture<'_, Result<(), ServiceCacheError>>;

    /// Retrieve a value by key.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(data))` if the key exists and has not expired
    /// - `Ok(None)` if the key is not found
    /// - `Err(_)` if the store could not be queried
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, ServiceCacheError>>;

    /// Delete a value by key, returning whether it existed.
    fn delete(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>>;

    /// Check if a key exists without retrieving the value.
    fn contains(&self, key: &str) -> BoxFuture<'_, Result<bool, ServiceCacheError>>;

    /// Approximate number of live entries.
    fn entry_count(&self) -> u64;
}
