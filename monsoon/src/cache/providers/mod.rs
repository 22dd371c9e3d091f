//! Cache provider implementations.
//!
//! # Available Providers
//!
//! - [`MemoryCacheProvider`]: In-process cache with per-entry TTL using moka
//!
//! A networked store only needs to implement [`Cache`](crate::cache::Cache)
//! to be used in its place.

mod memory;

pub use memory::{MemoryCacheProvider, DEFAULT_MEMORY_CACHE_BYTES};
