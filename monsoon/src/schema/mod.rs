//! Typed rows and schema-driven conversion of backend payloads.

mod converter;
mod value;

pub use converter::{convert, convert_text_row, ColumnType, Schema, SchemaError};
pub use value::{header_row, CellValue, Row};
