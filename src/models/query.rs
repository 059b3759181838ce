//! Query-related data models.
//!
//! This module defines the row and parameter types passed between the guards,
//! the driver and the protocol layer.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One result row: column name to JSON value, in column order.
pub type JsonRow = serde_json::Map<String, JsonValue>;

/// A positional parameter value for parameterized statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// JSON document, bound as a JSON column value
    Json(JsonValue),
}

impl QueryParam {
    /// Check if this parameter is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Json(_) => "json",
        }
    }
}

impl From<&str> for QueryParam {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param_deserialize_untagged() {
        let params: Vec<QueryParam> =
            serde_json::from_str(r#"[null, true, 42, 1.5, "abc"]"#).unwrap();
        assert_eq!(
            params,
            vec![
                QueryParam::Null,
                QueryParam::Bool(true),
                QueryParam::Int(42),
                QueryParam::Float(1.5),
                QueryParam::String("abc".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_param_objects_fall_through_to_json() {
        let param: QueryParam = serde_json::from_str(r#"{"a": 1}"#).unwrap();
        assert_eq!(param.type_name(), "json");
    }

    #[test]
    fn test_query_param_from_str() {
        let param = QueryParam::from("users");
        assert_eq!(param, QueryParam::String("users".to_string()));
        assert!(!param.is_null());
        assert!(QueryParam::Null.is_null());
    }
}
