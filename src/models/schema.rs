//! Schema-related data models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One column of a table schema resource.
///
/// Serialized exactly as `{"column_name": ..., "data_type": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    pub column_name: String,
    /// Data type as reported by `information_schema`, e.g. "varchar", "int"
    pub data_type: String,
}

impl ColumnInfo {
    pub fn new(column_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into(),
        }
    }
}
