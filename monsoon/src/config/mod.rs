//! Configuration file handling.
//!
//! Settings live in an INI file at `~/.monsoon/config.ini`:
//!
//! ```ini
//! [cache]
//! memory_size = 256MB
//! result_ttl_secs = 86400
//! stats_ttl_secs = 3600
//!
//! [fusion_tables]
//! base_url = http://www.google.com/fusiontables/api/query
//! timeout_secs = 30
//!
//! [bigquery]
//! project_id = google.com:monsoon
//! timeout_ms = 100000
//! access_token = ya29....
//!
//! [catalog]
//! path = /srv/monsoon/catalog.json
//!
//! [request]
//! max_limit = 100000
//!
//! [logging]
//! level = info
//! file = /var/log/monsoon/monsoon.log
//! ```
//!
//! A missing file yields the defaults; missing keys keep their default.

mod file;
mod size;

use std::path::PathBuf;

pub use file::{
    BigQueryConfig, CacheConfig, CatalogConfig, ConfigError, ConfigFile, FusionTablesConfig,
    LoggingConfig, RequestConfig,
};
pub use size::{format_size, parse_size};

/// Directory holding the configuration file.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".monsoon")
}

/// Default configuration file path.
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
