//! The INI configuration file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use super::size::{format_size, parse_size};
use crate::api::DEFAULT_MAX_LIMIT;
use crate::backend::{
    DEFAULT_BIGQUERY_ENDPOINT, DEFAULT_FUSION_TABLES_URL, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_PROJECT_ID, DEFAULT_TIMEOUT_MS,
};
use crate::cache::{DEFAULT_MEMORY_CACHE_BYTES, RESULT_TTL, STATS_TTL};

/// Errors raised while reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for {section}.{key}: '{value}'")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Memory cache capacity in bytes.
    pub memory_size: usize,
    pub result_ttl: Duration,
    pub stats_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_CACHE_BYTES as usize,
            result_ttl: RESULT_TTL,
            stats_ttl: STATS_TTL,
        }
    }
}

/// `[fusion_tables]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionTablesConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for FusionTablesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FUSION_TABLES_URL.to_string(),
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

/// `[bigquery]` section.
#[derive(Clone, PartialEq)]
pub struct BigQueryConfig {
    pub project_id: String,
    pub timeout_ms: u64,
    pub access_token: Option<String>,
    pub endpoint: String,
}

impl Default for BigQueryConfig {
    fn default() -> Self {
        Self {
            project_id: DEFAULT_PROJECT_ID.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            access_token: None,
            endpoint: DEFAULT_BIGQUERY_ENDPOINT.to_string(),
        }
    }
}

// Keeps the token out of logs.
impl std::fmt::Debug for BigQueryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigQueryConfig")
            .field("project_id", &self.project_id)
            .field("timeout_ms", &self.timeout_ms)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// `[catalog]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogConfig {
    /// JSON catalog file; the built-in catalog is used when unset.
    pub path: Option<PathBuf>,
}

/// `[request]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub max_limit: u32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,

    /// Log file; logs go to stderr when unset.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub cache: CacheConfig,
    pub fusion_tables: FusionTablesConfig,
    pub bigquery: BigQueryConfig,
    pub catalog: CatalogConfig,
    pub request: RequestConfig,
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Loads `path`, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        self.to_ini().write_to_file(path).map_err(write_error)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let reader = SectionReader { ini };

        let memory_size = match reader.get("cache", "memory_size") {
            Some(raw) => parse_size(raw).ok_or_else(|| invalid("cache", "memory_size", raw))?,
            None => defaults.cache.memory_size,
        };

        Ok(Self {
            cache: CacheConfig {
                memory_size,
                result_ttl: Duration::from_secs(reader.parse(
                    "cache",
                    "result_ttl_secs",
                    defaults.cache.result_ttl.as_secs(),
                )?),
                stats_ttl: Duration::from_secs(reader.parse(
                    "cache",
                    "stats_ttl_secs",
                    defaults.cache.stats_ttl.as_secs(),
                )?),
            },
            fusion_tables: FusionTablesConfig {
                base_url: reader.string("fusion_tables", "base_url", defaults.fusion_tables.base_url),
                timeout_secs: reader.parse(
                    "fusion_tables",
                    "timeout_secs",
                    defaults.fusion_tables.timeout_secs,
                )?,
            },
            bigquery: BigQueryConfig {
                project_id: reader.string("bigquery", "project_id", defaults.bigquery.project_id),
                timeout_ms: reader.parse("bigquery", "timeout_ms", defaults.bigquery.timeout_ms)?,
                access_token: reader.get("bigquery", "access_token").map(str::to_string),
                endpoint: reader.string("bigquery", "endpoint", defaults.bigquery.endpoint),
            },
            catalog: CatalogConfig {
                path: reader.get("catalog", "path").map(PathBuf::from),
            },
            request: RequestConfig {
                max_limit: reader.parse("request", "max_limit", defaults.request.max_limit)?,
            },
            logging: LoggingConfig {
                level: reader.string("logging", "level", defaults.logging.level),
                file: reader.get("logging", "file").map(PathBuf::from),
            },
        })
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("cache"))
            .set("memory_size", format_size(self.cache.memory_size))
            .set("result_ttl_secs", self.cache.result_ttl.as_secs().to_string())
            .set("stats_ttl_secs", self.cache.stats_ttl.as_secs().to_string());
        ini.with_section(Some("fusion_tables"))
            .set("base_url", self.fusion_tables.base_url.as_str())
            .set("timeout_secs", self.fusion_tables.timeout_secs.to_string());
        ini.with_section(Some("bigquery"))
            .set("project_id", self.bigquery.project_id.as_str())
            .set("timeout_ms", self.bigquery.timeout_ms.to_string())
            .set("endpoint", self.bigquery.endpoint.as_str());
        if let Some(token) = &self.bigquery.access_token {
            ini.with_section(Some("bigquery"))
                .set("access_token", token.as_str());
        }
        if let Some(path) = &self.catalog.path {
            ini.with_section(Some("catalog"))
                .set("path", path.display().to_string());
        }
        ini.with_section(Some("request"))
            .set("max_limit", self.request.max_limit.to_string());
        ini.with_section(Some("logging"))
            .set("level", self.logging.level.as_str());
        if let Some(file) = &self.logging.file {
            ini.with_section(Some("logging"))
                .set("file", file.display().to_string());
        }
        ini
    }
}

/// Typed lookups; blank values count as unset.
struct SectionReader<'a> {
    ini: &'a Ini,
}

impl SectionReader<'_> {
    fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini
            .get_from(Some(section), key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn string(&self, section: &str, key: &str, default: String) -> String {
        self.get(section, key).map(str::to_string).unwrap_or(default)
    }

    fn parse<T: FromStr>(&self, section: &str, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get(section, key) {
            Some(raw) => raw.parse().map_err(|_| invalid(section, key, raw)),
            None => Ok(default),
        }
    }
}

fn invalid(section: &str, key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    }
}
