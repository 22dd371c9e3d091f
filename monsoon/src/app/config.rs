//! Application configuration for MonsoonApp.
//!
//! `AppConfig` gathers everything needed to wire the service graph. It is
//! usually derived from the configuration file with
//! [`AppConfig::from_config_file`].

use std::path::PathBuf;
use std::time::Duration;

use crate::backend::BigQuerySettings;
use crate::config::{ConfigFile, FusionTablesConfig};

/// Application configuration combining all component configs.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Memory cache capacity in bytes.
    pub memory_cache_bytes: u64,

    /// Lifetime of cached query results.
    pub result_ttl: Duration,

    /// Lifetime of the stats buffer.
    pub stats_ttl: Duration,

    pub fusion_tables: FusionTablesConfig,

    pub bigquery: BigQuerySettings,

    /// JSON catalog file; the built-in catalog when `None`.
    pub catalog_path: Option<PathBuf>,

    /// Largest row limit a request may ask for.
    pub max_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_config_file(&ConfigFile::default())
    }
}

impl AppConfig {
    /// Create application config from the configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            memory_cache_bytes: config.cache.memory_size as u64,
            result_ttl: config.cache.result_ttl,
            stats_ttl: config.cache.stats_ttl,
            fusion_tables: config.fusion_tables.clone(),
            bigquery: BigQuerySettings {
                endpoint: config.bigquery.endpoint.clone(),
                project_id: config.bigquery.project_id.clone(),
                timeout_ms: config.bigquery.timeout_ms,
                access_token: config.bigquery.access_token.clone(),
            },
            catalog_path: config.catalog.path.clone(),
            max_limit: config.request.max_limit,
        }
    }

    /// Set the memory cache size.
    pub fn with_memory_cache_size(mut self, size_bytes: u64) -> Self {
        self.memory_cache_bytes = size_bytes;
        self
    }

    /// Set the BigQuery access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.bigquery.access_token = Some(token.into());
        self
    }

    /// HTTP timeout for BigQuery requests: the server-side query timeout
    /// plus the regular transport allowance.
    pub(crate) fn bigquery_http_timeout_secs(&self) -> u64 {
        self.bigquery.timeout_ms.div_ceil(1000) + self.fusion_tables.timeout_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DEFAULT_MEMORY_CACHE_BYTES, RESULT_TTL};

    #[test]
    fn test_default_matches_config_file_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.memory_cache_bytes, DEFAULT_MEMORY_CACHE_BYTES);
        assert_eq!(config.result_ttl, RESULT_TTL);
        assert_eq!(config.bigquery, BigQuerySettings::default());
        assert_eq!(config.catalog_path, None);
        assert_eq!(config.max_limit, 100_000);
    }

    #[test]
    fn test_from_config_file() {
        let mut file = ConfigFile::default();
        file.cache.memory_size = 1024;
        file.bigquery.access_token = Some("token".to_string());
        file.request.max_limit = 10;

        let config = AppConfig::from_config_file(&file);
        assert_eq!(config.memory_cache_bytes, 1024);
        assert_eq!(config.bigquery.access_token.as_deref(), Some("token"));
        assert_eq!(config.max_limit, 10);
    }

    #[test]
    fn test_bigquery_http_timeout() {
        let config = AppConfig::default();
        assert_eq!(config.bigquery_http_timeout_secs(), 100 + 30);
    }
}
