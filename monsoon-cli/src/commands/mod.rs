//! CLI command implementations.

pub mod config;
pub mod query;
pub mod stats;
pub mod tables;
