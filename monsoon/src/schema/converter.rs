//! Schema-driven conversion of untyped backend values.

use thiserror::Error;

use super::value::{CellValue, Row};
use crate::catalog::{TableDescriptor, ValueType};

/// Errors raised while converting raw values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// A row has a different number of values than the schema has columns.
    #[error("Row has {actual} values but schema has {expected} columns")]
    ColumnMismatch { expected: usize, actual: usize },

    /// A numeric column holds a value that does not parse.
    #[error("Cannot convert '{value}' to {column_type}")]
    Parse { value: String, column_type: String },
}

/// Type tag of a result column as reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Float,
    Integer,
    /// Any other tag; values pass through as text.
    Other(String),
}

impl ColumnType {
    /// Parses a BigQuery type tag (`FLOAT`, `INTEGER`, ...).
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "FLOAT" => ColumnType::Float,
            "INTEGER" => ColumnType::Integer,
            other => ColumnType::Other(other.to_string()),
        }
    }

    fn name(&self) -> &str {
        match self {
            ColumnType::Float => "FLOAT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Other(tag) => tag,
        }
    }
}

/// Converts a single value according to its column type.
///
/// Absent values become [`CellValue::Null`] regardless of type.
pub fn convert(value: Option<&str>, column: &ColumnType) -> Result<CellValue, SchemaError> {
    let Some(raw) = value else {
        return Ok(CellValue::Null);
    };

    let parse_error = || SchemaError::Parse {
        value: raw.to_string(),
        column_type: column.name().to_string(),
    };

    match column {
        ColumnType::Float => raw
            .trim()
            .parse::<f64>()
            .map(CellValue::Float)
            .map_err(|_| parse_error()),
        ColumnType::Integer => raw
            .trim()
            .parse::<i64>()
            .map(CellValue::Integer)
            .map_err(|_| parse_error()),
        ColumnType::Other(_) => Ok(CellValue::Text(raw.to_string())),
    }
}

/// Ordered column types of a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnType>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnType>) -> Self {
        Self { columns }
    }

    /// Builds a schema from backend type tags.
    pub fn from_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(tags.into_iter().map(ColumnType::from_tag).collect())
    }

    pub fn columns(&self) -> &[ColumnType] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Converts a raw row positionally.
    pub fn convert_row(&self, raw: &[Option<&str>]) -> Result<Row, SchemaError> {
        if raw.len() != self.columns.len() {
            return Err(SchemaError::ColumnMismatch {
                expected: self.columns.len(),
                actual: raw.len(),
            });
        }
        raw.iter()
            .zip(&self.columns)
            .map(|(value, column)| convert(*value, column))
            .collect()
    }
}

/// Converts one text row returned for `plan_fields` of `table`.
///
/// The table's latitude and longitude columns are always floats. The
/// requested field is a float only when declared `float` and text
/// otherwise; any other column is text.
pub fn convert_text_row(
    table: &TableDescriptor,
    field_name: &str,
    plan_fields: &[String],
    raw: &[&str],
) -> Result<Row, SchemaError> {
    if raw.len() < plan_fields.len() {
        return Err(SchemaError::ColumnMismatch {
            expected: plan_fields.len(),
            actual: raw.len(),
        });
    }

    let float = ColumnType::Float;
    let text = ColumnType::Other("STRING".to_string());
    plan_fields
        .iter()
        .zip(raw)
        .map(|(name, value)| {
            let column = if *name == table.lat_field || *name == table.lon_field {
                &float
            } else if name == field_name && table.field_type(field_name) == Some(ValueType::Float)
            {
                &float
            } else {
                &text
            };
            convert(Some(value), column)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BackendKind, FieldDescriptor};

    #[test]
    fn test_convert_null_for_any_type() {
        assert_eq!(convert(None, &ColumnType::Float).unwrap(), CellValue::Null);
        assert_eq!(convert(None, &ColumnType::Integer).unwrap(), CellValue::Null);
        assert_eq!(
            convert(None, &ColumnType::from_tag("STRING")).unwrap(),
            CellValue::Null
        );
    }

    #[test]
    fn test_convert_float() {
        assert_eq!(
            convert(Some("3.14"), &ColumnType::Float).unwrap(),
            CellValue::Float(3.14)
        );
        assert_eq!(
            convert(Some("665.60329999999999"), &ColumnType::Float).unwrap(),
            CellValue::Float(665.6033)
        );
    }

    #[test]
    fn test_convert_integer() {
        assert_eq!(
            convert(Some("5"), &ColumnType::Integer).unwrap(),
            CellValue::Integer(5)
        );
    }

    #[test]
    fn test_convert_other_passes_through() {
        assert_eq!(
            convert(Some("x"), &ColumnType::from_tag("STRING")).unwrap(),
            CellValue::from("x")
        );
        assert_eq!(
            convert(Some("2.5"), &ColumnType::from_tag("TIMESTAMP")).unwrap(),
            CellValue::from("2.5")
        );
    }

    #[test]
    fn test_convert_parse_error() {
        let err = convert(Some("abc"), &ColumnType::Integer).unwrap_err();
        assert_eq!(
            err,
            SchemaError::Parse {
                value: "abc".to_string(),
                column_type: "INTEGER".to_string()
            }
        );
    }

    #[test]
    fn test_convert_row() {
        let schema = Schema::from_tags(["FLOAT", "INTEGER", "STRING"]);
        let row = schema
            .convert_row(&[Some("665.5"), Some("1"), None])
            .unwrap();
        assert_eq!(
            row,
            vec![CellValue::Float(665.5), CellValue::Integer(1), CellValue::Null]
        );
    }

    #[test]
    fn test_convert_row_too_short() {
        let schema = Schema::from_tags(["FLOAT", "INTEGER"]);
        assert_eq!(
            schema.convert_row(&[Some("1.0")]),
            Err(SchemaError::ColumnMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    fn area_table(value_type: ValueType) -> TableDescriptor {
        TableDescriptor::new("588453", "Crop area", BackendKind::FusionTables)
            .with_coordinate_fields()
            .with_field("area", FieldDescriptor::new(value_type))
    }

    fn bbox_fields() -> Vec<String> {
        vec!["latitude".into(), "longitude".into(), "area".into()]
    }

    #[test]
    fn test_text_row_float_field() {
        let table = area_table(ValueType::Float);
        let row = convert_text_row(&table, "area", &bbox_fields(), &["37.5", "-122.25", "0.75"])
            .unwrap();
        assert_eq!(
            row,
            vec![
                CellValue::Float(37.5),
                CellValue::Float(-122.25),
                CellValue::Float(0.75)
            ]
        );
    }

    #[test]
    fn test_text_row_non_float_field_stays_text() {
        let table = area_table(ValueType::Integer);
        let row =
            convert_text_row(&table, "area", &bbox_fields(), &["37.5", "-122.25", "7"]).unwrap();
        assert_eq!(row[2], CellValue::from("7"));
    }

    #[test]
    fn test_text_row_single_column() {
        let table = area_table(ValueType::Float);
        let row = convert_text_row(&table, "area", &["area".to_string()], &["0.5"]).unwrap();
        assert_eq!(row, vec![CellValue::Float(0.5)]);
    }

    #[test]
    fn test_text_row_too_short() {
        let table = area_table(ValueType::Float);
        let err = convert_text_row(&table, "area", &bbox_fields(), &["37.5", "-122.25"]);
        assert!(matches!(err, Err(SchemaError::ColumnMismatch { expected: 3, actual: 2 })));
    }

    #[test]
    fn test_text_row_bad_latitude() {
        let table = area_table(ValueType::Float);
        let err = convert_text_row(&table, "area", &bbox_fields(), &["north", "-122", "1"]);
        assert!(matches!(err, Err(SchemaError::Parse { .. })));
    }
}
