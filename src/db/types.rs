//! MySQL type mappings.
//!
//! This module converts MySQL result rows into JSON maps.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Per-category decoders handle the actual value extraction
//!
//! Decoders never fail: a value that cannot be decoded is logged and
//! rendered as `null`, so a single odd column does not fail the whole query.

use crate::models::JsonRow;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::{Column, Decode, Row, Type, TypeInfo};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    UnsignedInteger,
    Float,
    Decimal,
    Boolean,
    Date,
    Time,
    DateTime,
    Timestamp,
    Binary,
    Json,
    Text,
}

/// Classify a MySQL type name (as reported by the driver) into a logical category.
///
/// Only the leading keyword is significant, except for the `UNSIGNED` suffix.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    let upper = type_name.to_ascii_uppercase();
    let base = upper.split_whitespace().next().unwrap_or("");
    let unsigned = upper.contains("UNSIGNED");

    match base {
        "BOOLEAN" | "BOOL" => TypeCategory::Boolean,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" | "YEAR" => {
            if unsigned || base == "YEAR" {
                TypeCategory::UnsignedInteger
            } else {
                TypeCategory::Integer
            }
        }
        "DECIMAL" | "NUMERIC" => TypeCategory::Decimal,
        "FLOAT" | "DOUBLE" | "REAL" => TypeCategory::Float,
        "DATE" => TypeCategory::Date,
        "TIME" => TypeCategory::Time,
        "DATETIME" => TypeCategory::DateTime,
        "TIMESTAMP" => TypeCategory::Timestamp,
        "JSON" => TypeCategory::Json,
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => TypeCategory::Binary,
        // CHAR, VARCHAR, TEXT variants, ENUM, SET and anything unknown
        _ => TypeCategory::Text,
    }
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_ascii_uppercase();
        name.starts_with("DECIMAL") || name.starts_with("NUMERIC")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Binary Encoding
// =============================================================================

/// Decode binary data to a JSON string.
///
/// Valid UTF-8 is returned as text; anything else is base64 encoded.
pub fn decode_binary_value(bytes: &[u8]) -> JsonValue {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => JsonValue::String(s.to_string()),
        Err(_) => JsonValue::String(STANDARD.encode(bytes)),
    }
}

// =============================================================================
// Row to JSON Trait
// =============================================================================

/// Trait for converting database rows to JSON maps.
pub trait RowToJson {
    fn to_json_map(&self) -> JsonRow;
}

impl RowToJson for MySqlRow {
    fn to_json_map(&self) -> JsonRow {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_type(type_name);
                let value = decode_column(self, idx, category);
                (col.name().to_string(), value)
            })
            .collect()
    }
}

// =============================================================================
// Column Decoders
// =============================================================================

fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> JsonValue {
    match category {
        TypeCategory::Decimal => decode_decimal(row, idx),
        TypeCategory::Integer => decode_integer(row, idx),
        TypeCategory::UnsignedInteger => decode_unsigned(row, idx),
        TypeCategory::Boolean => decode_boolean(row, idx),
        TypeCategory::Float => decode_float(row, idx),
        TypeCategory::Date => decode_with::<NaiveDate>(row, idx, |v| v.to_string()),
        TypeCategory::Time => decode_with::<NaiveTime>(row, idx, |v| v.to_string()),
        TypeCategory::DateTime => decode_with::<NaiveDateTime>(row, idx, |v| {
            v.format("%Y-%m-%d %H:%M:%S%.f").to_string()
        }),
        TypeCategory::Timestamp => decode_with::<DateTime<Utc>>(row, idx, |v| v.to_rfc3339()),
        TypeCategory::Binary => decode_binary_col(row, idx),
        TypeCategory::Json => decode_json(row, idx),
        TypeCategory::Text => decode_text(row, idx),
    }
}

fn decode_decimal(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<RawDecimal>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v.0),
        Ok(None) => JsonValue::Null,
        Err(e) => {
            tracing::error!("Failed to decode DECIMAL: {:?}", e);
            JsonValue::Null
        }
    }
}

fn decode_integer(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<i64>, _>(idx) {
        Ok(Some(v)) => JsonValue::Number(v.into()),
        Ok(None) => JsonValue::Null,
        // Some drivers report signedness differently; retry unsigned
        Err(_) => decode_unsigned(row, idx),
    }
}

fn decode_unsigned(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(v) = row.try_get::<Option<u64>, _>(idx) {
        return v.map(|v| JsonValue::Number(v.into())).unwrap_or(JsonValue::Null);
    }
    if let Ok(v) = row.try_get::<Option<u16>, _>(idx) {
        return v.map(|v| JsonValue::Number(v.into())).unwrap_or(JsonValue::Null);
    }
    tracing::error!(column = idx, "Failed to decode integer column");
    JsonValue::Null
}

fn decode_boolean(row: &MySqlRow, idx: usize) -> JsonValue {
    row.try_get::<Option<bool>, _>(idx)
        .ok()
        .flatten()
        .map(JsonValue::Bool)
        .unwrap_or(JsonValue::Null)
}

fn decode_float(row: &MySqlRow, idx: usize) -> JsonValue {
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return serde_json::Number::from_f64(v)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string()));
    }
    if let Ok(Some(v)) = row.try_get::<Option<f32>, _>(idx) {
        return serde_json::Number::from_f64(v as f64)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(v.to_string()));
    }
    JsonValue::Null
}

/// Decode a chrono-backed column and render it as a string.
fn decode_with<'r, T>(row: &'r MySqlRow, idx: usize, render: impl Fn(T) -> String) -> JsonValue
where
    T: Decode<'r, sqlx::MySql> + Type<sqlx::MySql>,
{
    match row.try_get::<Option<T>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(render(v)),
        Ok(None) => JsonValue::Null,
        Err(e) => {
            // Zero dates and out-of-range TIME values land here
            tracing::warn!(column = idx, error = %e, "Failed to decode temporal value");
            JsonValue::Null
        }
    }
}

fn decode_binary_col(row: &MySqlRow, idx: usize) -> JsonValue {
    row.try_get::<Option<Vec<u8>>, _>(idx)
        .ok()
        .flatten()
        .map(|v| decode_binary_value(&v))
        .unwrap_or(JsonValue::Null)
}

fn decode_json(row: &MySqlRow, idx: usize) -> JsonValue {
    // MySQL JSON type should be decoded as serde_json::Value directly
    row.try_get::<Option<JsonValue>, _>(idx)
        .ok()
        .flatten()
        .unwrap_or(JsonValue::Null)
}

fn decode_text(row: &MySqlRow, idx: usize) -> JsonValue {
    match row.try_get::<Option<String>, _>(idx) {
        Ok(Some(v)) => JsonValue::String(v),
        Ok(None) => JsonValue::Null,
        // Binary collations surface as bytes
        Err(_) => decode_binary_col(row, idx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(categorize_type("INT"), TypeCategory::Integer);
        assert_eq!(categorize_type("BIGINT"), TypeCategory::Integer);
        assert_eq!(categorize_type("TINYINT"), TypeCategory::Integer);
        assert_eq!(
            categorize_type("BIGINT UNSIGNED"),
            TypeCategory::UnsignedInteger
        );
        assert_eq!(categorize_type("YEAR"), TypeCategory::UnsignedInteger);
    }

    #[test]
    fn test_categorize_type_decimal_and_float() {
        assert_eq!(categorize_type("DECIMAL"), TypeCategory::Decimal);
        assert_eq!(categorize_type("decimal"), TypeCategory::Decimal);
        assert_eq!(categorize_type("DOUBLE"), TypeCategory::Float);
        assert_eq!(categorize_type("FLOAT"), TypeCategory::Float);
    }

    #[test]
    fn test_categorize_type_temporal() {
        assert_eq!(categorize_type("DATE"), TypeCategory::Date);
        assert_eq!(categorize_type("TIME"), TypeCategory::Time);
        assert_eq!(categorize_type("DATETIME"), TypeCategory::DateTime);
        assert_eq!(categorize_type("TIMESTAMP"), TypeCategory::Timestamp);
    }

    #[test]
    fn test_categorize_type_other() {
        assert_eq!(categorize_type("BOOLEAN"), TypeCategory::Boolean);
        assert_eq!(categorize_type("JSON"), TypeCategory::Json);
        assert_eq!(categorize_type("VARBINARY"), TypeCategory::Binary);
        assert_eq!(categorize_type("BLOB"), TypeCategory::Binary);
        assert_eq!(categorize_type("VARCHAR"), TypeCategory::Text);
        assert_eq!(categorize_type("ENUM"), TypeCategory::Text);
        assert_eq!(categorize_type(""), TypeCategory::Text);
    }

    #[test]
    fn test_decode_binary_value_with_valid_utf8() {
        let result = decode_binary_value(b"hello world");
        assert_eq!(result, JsonValue::String("hello world".to_string()));
    }

    #[test]
    fn test_decode_binary_value_with_invalid_utf8() {
        let bytes: &[u8] = &[0xFF, 0xFE, 0x00, 0x01];
        let result = decode_binary_value(bytes);
        assert_eq!(result, JsonValue::String("//4AAQ==".to_string()));
    }

    #[test]
    fn test_decode_binary_value_empty() {
        let result = decode_binary_value(&[]);
        assert_eq!(result, JsonValue::String("".to_string()));
    }
}
