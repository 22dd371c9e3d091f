//! Strongly typed table and field descriptors.

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::CatalogError;

/// Default name of the latitude column.
pub const DEFAULT_LAT_FIELD: &str = "latitude";

/// Default name of the longitude column.
pub const DEFAULT_LON_FIELD: &str = "longitude";

/// Remote service that stores a table.
///
/// The identifiers used in catalog files are the short codes `"FT"` and
/// `"BQ"`. Anything else is rejected when the catalog is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Fusion Tables HTTP GET query API.
    FusionTables,
    /// BigQuery v2 jobs.query API.
    BigQuery,
}

impl BackendKind {
    /// Short identifier used in catalog files.
    pub fn id(&self) -> &'static str {
        match self {
            BackendKind::FusionTables => "FT",
            BackendKind::BigQuery => "BQ",
        }
    }

    /// Human-readable backend name.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::FusionTables => "Fusion Tables",
            BackendKind::BigQuery => "BigQuery",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FT" => Ok(BackendKind::FusionTables),
            "BQ" => Ok(BackendKind::BigQuery),
            other => Err(CatalogError::UnknownBackend(other.to_string())),
        }
    }
}

/// Catalog representation: `{"id": "BQ", "name": "BigQuery"}`.
#[derive(Serialize, Deserialize)]
struct BackendRef {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

impl Serialize for BackendKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        BackendRef {
            id: self.id().to_string(),
            name: Some(self.name().to_string()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BackendKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let backend = BackendRef::deserialize(deserializer)?;
        backend.id.parse().map_err(serde::de::Error::custom)
    }
}

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Float,
    Integer,
    String,
}

/// Metadata for a single column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Display name shown to users.
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(rename = "type")]
    pub value_type: ValueType,

    #[serde(rename = "min", default, skip_serializing_if = "Option::is_none")]
    pub display_min: Option<f64>,

    #[serde(rename = "max", default, skip_serializing_if = "Option::is_none")]
    pub display_max: Option<f64>,

    /// Rendering hint, e.g. `"grid"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl FieldDescriptor {
    /// Creates a field with only a type.
    pub fn new(value_type: ValueType) -> Self {
        Self {
            display_name: None,
            value_type,
            display_min: None,
            display_max: None,
            display: None,
        }
    }

    /// Creates a gridded float field with a display range.
    pub fn grid(display_name: &str, min: f64, max: f64) -> Self {
        Self {
            display_name: Some(display_name.to_string()),
            value_type: ValueType::Float,
            display_min: Some(min),
            display_max: Some(max),
            display: Some("grid".to_string()),
        }
    }
}

/// Fields of a table in declaration order.
///
/// Serialized as a JSON object; the order of keys in the source is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet(Vec<(String, FieldDescriptor)>);

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing an existing one with the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, field: FieldDescriptor) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = field,
            None => self.0.push((name, field)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, FieldDescriptor)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (S, FieldDescriptor)>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for (name, field) in iter {
            set.insert(name, field);
        }
        set
    }
}

impl Serialize for FieldSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, field) in &self.0 {
            map.serialize_entry(name, field)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldSetVisitor;

        impl<'de> Visitor<'de> for FieldSetVisitor {
            type Value = FieldSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to field descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldSet, A::Error> {
                let mut set = FieldSet::new();
                while let Some((name, field)) =
                    access.next_entry::<String, FieldDescriptor>()?
                {
                    set.insert(name, field);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(FieldSetVisitor)
    }
}

fn default_lat_field() -> String {
    DEFAULT_LAT_FIELD.to_string()
}

fn default_lon_field() -> String {
    DEFAULT_LON_FIELD.to_string()
}

/// Immutable description of a queryable dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub backend: BackendKind,

    #[serde(rename = "latitude", default = "default_lat_field")]
    pub lat_field: String,

    #[serde(rename = "longitude", default = "default_lon_field")]
    pub lon_field: String,

    /// Grid cell height in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat_delta: Option<f64>,

    /// Grid cell width in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon_delta: Option<f64>,

    pub fields: FieldSet,

    /// Attribution and description, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl TableDescriptor {
    /// Creates a descriptor with default lat/lon column names.
    pub fn new(id: impl Into<String>, name: impl Into<String>, backend: BackendKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            backend,
            lat_field: default_lat_field(),
            lon_field: default_lon_field(),
            lat_delta: None,
            lon_delta: None,
            fields: FieldSet::new(),
            metadata: None,
        }
    }

    /// Adds a field.
    pub fn with_field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.fields.insert(name, field);
        self
    }

    /// Adds the standard float latitude/longitude fields.
    pub fn with_coordinate_fields(self) -> Self {
        let lat = self.lat_field.clone();
        let lon = self.lon_field.clone();
        self.with_field(lat, FieldDescriptor::new(ValueType::Float))
            .with_field(lon, FieldDescriptor::new(ValueType::Float))
    }

    /// Declared type of a field, if the field is known.
    pub fn field_type(&self, name: &str) -> Option<ValueType> {
        self.fields.get(name).map(|f| f.value_type)
    }
}
