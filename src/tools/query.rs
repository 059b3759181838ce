//! Query execution tool.
//!
//! This module implements the `mysql_query` MCP tool. Every statement runs
//! through the [`ReadOnlyQueryGuard`], so the server itself rejects writes.

use crate::db::{ReadOnlyQueryGuard, SessionPool};
use crate::error::{DbError, DbResult};
use crate::models::JsonRow;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Input for the mysql_query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// SQL statement to run. It executes inside a read-only transaction that is always rolled back.
    pub sql: String,
}

/// Handler for the query tool.
#[derive(Debug)]
pub struct QueryToolHandler<P> {
    guard: ReadOnlyQueryGuard<P>,
}

impl<P: SessionPool> QueryToolHandler<P> {
    /// Create a new query tool handler.
    pub fn new(pool: Arc<P>) -> Self {
        Self {
            guard: ReadOnlyQueryGuard::new(pool),
        }
    }

    /// Run the query and return its rows.
    pub async fn query(&self, input: QueryInput) -> DbResult<Vec<JsonRow>> {
        if input.sql.trim().is_empty() {
            return Err(DbError::invalid_input("sql must not be empty"));
        }

        info!(sql_len = input.sql.len(), "Executing read-only query");
        self.guard.execute(&input.sql).await
    }

    /// Run the query and render its rows as a pretty-printed JSON array.
    pub async fn query_text(&self, input: QueryInput) -> DbResult<String> {
        let rows = self.query(input).await?;
        render_rows(&rows)
    }
}

/// Render rows as a pretty-printed JSON array.
pub fn render_rows(rows: &[JsonRow]) -> DbResult<String> {
    serde_json::to_string_pretty(rows)
        .map_err(|e| DbError::internal(format!("Failed to serialize rows: {}", e)))
}
