//! Table catalog.
//!
//! The catalog is loaded once at startup, either from the built-in dataset
//! list or from a JSON file with the same shape, and is shared read-only
//! (`Arc<Catalog>`) by every request.
//!
//! # File Format
//!
//! ```json
//! {
//!   "umn.Precip": {
//!     "id": "umn.Precip",
//!     "name": "WorldClim annual mean precipitation",
//!     "backend": {"id": "BQ", "name": "BigQuery"},
//!     "fields": {"precip": {"name": "Precipitation [mm/y]", "type": "float"}},
//!     "lat_delta": 0.08334,
//!     "lon_delta": 0.08334
//!   }
//! }
//! ```

mod types;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::info;

pub use types::{
    BackendKind, FieldDescriptor, FieldSet, TableDescriptor, ValueType, DEFAULT_LAT_FIELD,
    DEFAULT_LON_FIELD,
};

const BUILTIN_CATALOG: &str = include_str!("../../resources/catalog.json");

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A table references a backend identifier other than `FT` or `BQ`.
    #[error("Unknown data backend: {0}")]
    UnknownBackend(String),

    #[error("Failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// The map key of an entry differs from the entry's `id`.
    #[error("Catalog key '{key}' does not match table id '{id}'")]
    IdMismatch { key: String, id: String },
}

/// Immutable set of table descriptors, in load order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tables: Vec<TableDescriptor>,
}

impl Catalog {
    /// Creates a catalog from descriptors. Later duplicates replace earlier ones.
    pub fn new(tables: impl IntoIterator<Item = TableDescriptor>) -> Self {
        let mut catalog = Catalog::default();
        for table in tables {
            match catalog.tables.iter_mut().find(|t| t.id == table.id) {
                Some(existing) => *existing = table,
                None => catalog.tables.push(table),
            }
        }
        catalog
    }

    /// The catalog bundled with the library.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let entries: CatalogEntries = serde_json::from_str(json)?;
        let mut tables = Vec::with_capacity(entries.0.len());
        for (key, table) in entries.0 {
            if key != table.id {
                return Err(CatalogError::IdMismatch { key, id: table.id });
            }
            tables.push(table);
        }
        Ok(Self::new(tables))
    }

    /// Loads a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;
        info!(path = %path.display(), tables = catalog.len(), "Loaded table catalog");
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableDescriptor> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for table in &self.tables {
            map.serialize_entry(&table.id, table)?;
        }
        map.end()
    }
}

/// Keyed entries as they appear in a catalog file, in file order.
struct CatalogEntries(Vec<(String, TableDescriptor)>);

impl<'de> Deserialize<'de> for CatalogEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = CatalogEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of table ids to table descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = access.next_entry::<String, TableDescriptor>()? {
                    entries.push(entry);
                }
                Ok(CatalogEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
