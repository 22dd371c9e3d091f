//! Dispatch from a table's backend kind to a backend client.
//!
//! The BigQuery client is created on first use and kept for the life of the
//! registry. Two requests racing on first use may each build a client; the
//! first one stored wins and the other is dropped. Construction failures are
//! not stored, so a later request tries again.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use super::types::{Backend, BackendError};
use crate::catalog::BackendKind;

type BackendFactory = Box<dyn Fn() -> Result<Arc<dyn Backend>, BackendError> + Send + Sync>;

/// A backend built on first use.
pub struct LazyBackend {
    cell: OnceLock<Arc<dyn Backend>>,
    factory: BackendFactory,
}

impl LazyBackend {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Backend>, BackendError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceLock::new(),
            factory: Box::new(factory),
        }
    }

    /// Wraps an already constructed backend.
    pub fn ready(backend: Arc<dyn Backend>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Arc::clone(&backend));
        Self {
            cell,
            factory: Box::new(move || Ok(Arc::clone(&backend))),
        }
    }

    /// Returns the stored backend, building it if needed.
    pub fn get(&self) -> Result<Arc<dyn Backend>, BackendError> {
        if let Some(backend) = self.cell.get() {
            debug!("Reusing existing backend client");
            return Ok(Arc::clone(backend));
        }

        info!("Creating a new backend client");
        let backend = (self.factory)()?;
        match self.cell.set(Arc::clone(&backend)) {
            Ok(()) => Ok(backend),
            // Another caller stored one first; use theirs.
            Err(_) => Ok(self.cell.get().cloned().unwrap_or(backend)),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

/// Maps every [`BackendKind`] to a backend client.
pub struct BackendRegistry {
    fusion_tables: Arc<dyn Backend>,
    bigquery: LazyBackend,
}

impl BackendRegistry {
    pub fn new(fusion_tables: Arc<dyn Backend>, bigquery: LazyBackend) -> Self {
        Self {
            fusion_tables,
            bigquery,
        }
    }

    /// Client for `kind`.
    pub fn resolve(&self, kind: BackendKind) -> Result<Arc<dyn Backend>, BackendError> {
        let backend = match kind {
            BackendKind::FusionTables => Arc::clone(&self.fusion_tables),
            BackendKind::BigQuery => self.bigquery.get().map_err(|e| {
                warn!(error = %e, "BigQuery client construction failed");
                e
            })?,
        };
        debug_assert_eq!(backend.kind(), kind);
        Ok(backend)
    }

    /// Whether the BigQuery client has been built yet.
    pub fn bigquery_initialized(&self) -> bool {
        self.bigquery.is_initialized()
    }
}
