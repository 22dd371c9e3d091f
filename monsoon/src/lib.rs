//! Monsoon - cached access to tabular geospatial datasets
//!
//! This library answers requests for a rectangular or filtered slice of a
//! dataset (crop yields, climate grids, fertilizer use) without the caller
//! knowing which remote query service holds the table. Tables backed by
//! Fusion Tables are queried over HTTP and return CSV; tables backed by
//! BigQuery are queried through the `jobs.query` REST API. Both results are
//! converted to typed rows, cached for a day and reported to a small
//! latency buffer.
//!
//! # Modules
//!
//! - [`catalog`]: table descriptors
//! - [`query`]: condition validation, bounds and query text
//! - [`schema`]: typed cells and row conversion
//! - [`cache`]: TTL cache contract and the in-memory provider
//! - [`backend`]: the two remote services and backend dispatch
//! - [`stats`]: recent request latencies
//! - [`service`]: the cached fetch orchestrator
//! - [`api`]: request parameters to response envelope
//! - [`config`], [`logging`], [`app`]: configuration, tracing setup, wiring

pub mod api;
pub mod app;
pub mod backend;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod query;
pub mod schema;
pub mod service;
pub mod stats;

/// Version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
