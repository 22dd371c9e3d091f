//! Application bootstrap implementation.
//!
//! This module contains `MonsoonApp` which builds the service graph in
//! dependency order: catalog, cache, backends, data access service, and
//! finally the request handler.

use std::sync::Arc;

use tracing::info;

use super::config::AppConfig;
use super::error::AppError;
use crate::api::{AccessHandler, RequestParams};
use crate::backend::{
    Backend, BackendError, BackendRegistry, BigQueryBackend, BigQuerySettings, FusionTablesBackend,
    HttpClient, LazyBackend, ReqwestClient,
};
use crate::cache::{Cache, MemoryCacheProvider};
use crate::catalog::{BackendKind, Catalog};
use crate::service::DataAccessService;
use crate::stats::StatsRecorder;

/// Monsoon application: one catalog, one cache, one handler.
///
/// # Example
///
/// ```ignore
/// use monsoon::app::{AppConfig, MonsoonApp};
/// use monsoon::api::RequestParams;
///
/// let app = MonsoonApp::start(AppConfig::default())?;
/// let body = app.handle(&RequestParams::from_query_string("table=588453&field=area")).await;
/// ```
pub struct MonsoonApp {
    catalog: Arc<Catalog>,
    cache: Arc<MemoryCacheProvider>,
    backends: Arc<BackendRegistry>,
    service: Arc<DataAccessService>,
    handler: AccessHandler,
}

impl MonsoonApp {
    /// Start the application with real HTTP clients.
    ///
    /// The BigQuery client is created on first use; a missing access token
    /// is reported per request rather than here.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded, the HTTP client
    /// cannot be created or the Fusion Tables endpoint is not a valid URL.
    pub fn start(config: AppConfig) -> Result<Self, AppError> {
        let ft_client = ReqwestClient::with_timeout(config.fusion_tables.timeout_secs)?;
        let fusion_tables =
            FusionTablesBackend::with_base_url(ft_client, &config.fusion_tables.base_url)?;

        let bq_settings = config.bigquery.clone();
        let bq_timeout_secs = config.bigquery_http_timeout_secs();
        let bigquery = LazyBackend::new(move || {
            let client = ReqwestClient::with_timeout(bq_timeout_secs).map_err(|e| {
                BackendError::Unavailable {
                    kind: BackendKind::BigQuery,
                    reason: e.to_string(),
                }
            })?;
            create_bigquery(client, bq_settings.clone())
        });

        Self::start_with_backends(config, Arc::new(fusion_tables), bigquery)
    }

    /// Start the application with the given backends.
    pub fn start_with_backends(
        config: AppConfig,
        fusion_tables: Arc<dyn Backend>,
        bigquery: LazyBackend,
    ) -> Result<Self, AppError> {
        info!("Starting Monsoon data access service");

        let catalog = match &config.catalog_path {
            Some(path) => Catalog::load(path)?,
            None => Catalog::builtin()?,
        };
        info!(tables = catalog.len(), "Table catalog ready");
        let catalog = Arc::new(catalog);

        let cache = Arc::new(MemoryCacheProvider::new(config.memory_cache_bytes));
        info!(
            max_size_bytes = config.memory_cache_bytes,
            result_ttl_secs = config.result_ttl.as_secs(),
            "Memory cache ready"
        );

        let backends = Arc::new(BackendRegistry::new(fusion_tables, bigquery));
        let shared_cache: Arc<dyn Cache> = cache.clone();
        let stats = StatsRecorder::with_ttl(Arc::clone(&shared_cache), config.stats_ttl);
        let service = Arc::new(
            DataAccessService::with_stats(shared_cache, Arc::clone(&backends), stats)
                .with_result_ttl(config.result_ttl),
        );

        let handler = AccessHandler::new(Arc::clone(&catalog), Arc::clone(&service))
            .with_max_limit(config.max_limit);

        Ok(Self {
            catalog,
            cache,
            backends,
            service,
            handler,
        })
    }

    /// Handles a request, returning the one-line JSON envelope.
    pub async fn handle(&self, params: &RequestParams) -> String {
        self.handler.handle(params).await
    }

    pub fn handler(&self) -> &AccessHandler {
        &self.handler
    }

    pub fn service(&self) -> Arc<DataAccessService> {
        Arc::clone(&self.service)
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    /// Whether the BigQuery client has been created yet.
    pub fn bigquery_initialized(&self) -> bool {
        self.backends.bigquery_initialized()
    }

    /// Memory cache capacity in bytes.
    pub fn memory_cache_size_bytes(&self) -> u64 {
        self.cache.max_size_bytes()
    }

    /// Approximate number of live cache entries.
    pub fn cached_entries(&self) -> u64 {
        self.cache.entry_count()
    }
}

fn create_bigquery<C: HttpClient + 'static>(
    client: C,
    settings: BigQuerySettings,
) -> Result<Arc<dyn Backend>, BackendError> {
    Ok(Arc::new(BigQueryBackend::new(client, settings)?))
}
