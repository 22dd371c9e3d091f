//! Response cache.
//!
//! The service talks to the cache only through the [`Cache`] trait so the
//! in-process [`MemoryCacheProvider`] can be swapped for a shared store.

mod providers;
mod traits;

pub use providers::{MemoryCacheProvider, DEFAULT_MEMORY_CACHE_BYTES};
pub use traits::{BoxFuture, Cache, ServiceCacheError, RESULT_TTL, STATS_TTL};

#[cfg(test)]
pub use traits::tests::UnavailableCache;
