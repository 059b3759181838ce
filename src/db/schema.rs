//! Schema introspection module.
//!
//! Table and column listings for the current database, read from
//! `information_schema` through a [`PlainQueryGuard`].

use crate::db::guard::PlainQueryGuard;
use crate::db::session::SessionPool;
use crate::error::{DbError, DbResult};
use crate::models::{ColumnInfo, JsonRow, QueryParam};
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// SQL Query Templates
// =============================================================================
//
// information_schema columns may come back with a binary collation depending on
// server version; CONVERT keeps them decodable as text.

mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT CONVERT(TABLE_NAME USING utf8mb4) AS table_name
        FROM information_schema.TABLES
        WHERE TABLE_SCHEMA = DATABASE()
        ORDER BY TABLE_NAME
        "#;

    pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            CONVERT(COLUMN_NAME USING utf8mb4) AS column_name,
            CONVERT(DATA_TYPE USING utf8mb4) AS data_type
        FROM information_schema.COLUMNS
        WHERE TABLE_NAME = ? AND TABLE_SCHEMA = DATABASE()
        ORDER BY ORDINAL_POSITION
        "#;
}

/// Schema inspector for the configured database.
#[derive(Debug)]
pub struct SchemaInspector<P> {
    guard: PlainQueryGuard<P>,
}

impl<P> Clone for SchemaInspector<P> {
    fn clone(&self) -> Self {
        Self {
            guard: self.guard.clone(),
        }
    }
}

impl<P: SessionPool> SchemaInspector<P> {
    pub fn new(pool: Arc<P>) -> Self {
        Self {
            guard: PlainQueryGuard::new(pool),
        }
    }

    /// List all tables (and views) in the current database.
    pub async fn list_tables(&self) -> DbResult<Vec<String>> {
        let rows = self.guard.execute(queries::LIST_TABLES, &[]).await?;
        let tables = rows
            .iter()
            .map(|row| get_string(row, "table_name"))
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// Describe a table's columns in ordinal order.
    ///
    /// Fails with `TableNotFound` if the current database has no such table.
    pub async fn describe_table(&self, table_name: &str) -> DbResult<Vec<ColumnInfo>> {
        let rows = self
            .guard
            .execute(
                queries::DESCRIBE_COLUMNS,
                &[QueryParam::from(table_name)],
            )
            .await?;

        if rows.is_empty() {
            return Err(DbError::table_not_found(table_name));
        }

        let columns = rows
            .iter()
            .map(|row| {
                Ok(ColumnInfo::new(
                    get_string(row, "column_name")?,
                    get_string(row, "data_type")?,
                ))
            })
            .collect::<DbResult<Vec<_>>>()?;

        debug!(table = %table_name, columns = columns.len(), "Described table");
        Ok(columns)
    }
}

/// Read a required string column from an introspection row.
fn get_string(row: &JsonRow, key: &str) -> DbResult<String> {
    match row.get(key) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(DbError::internal(format!(
            "Expected string for column '{}', got {}",
            key, other
        ))),
        None => Err(DbError::internal(format!("Missing column '{}'", key))),
    }
}
