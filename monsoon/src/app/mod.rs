//! Application bootstrap.
//!
//! [`MonsoonApp`] wires the catalog, the shared memory cache, the backend
//! registry, the data access service and the request handler from an
//! [`AppConfig`].
//!
//! ```text
//! ConfigFile ─► AppConfig ─► MonsoonApp
//!                             ├── Catalog (built-in or JSON file)
//!                             ├── MemoryCacheProvider ──┬─► DataAccessService ─► AccessHandler
//!                             ├── BackendRegistry ──────┘
//!                             │     ├── FusionTablesBackend
//!                             │     └── BigQueryBackend (lazy)
//!                             └── StatsRecorder
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::MonsoonApp;
pub use config::AppConfig;
pub use error::AppError;
