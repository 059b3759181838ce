//! Table schema resources.
//!
//! Each table in the current database is exposed as
//! `mysql://<host>:<port>/<table>/schema`. Reading it returns the table's
//! columns as a JSON array of `{column_name, data_type}`.

use crate::db::{SchemaInspector, SessionPool};
use crate::error::{DbError, DbResult};
use std::sync::Arc;
use tracing::debug;
use url::Url;

pub const SCHEMA_PATH: &str = "schema";
pub const SCHEMA_MIME_TYPE: &str = "application/json";

/// A listed schema resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaResource {
    pub uri: String,
    pub name: String,
    pub table: String,
}

/// Contents of a read schema resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaResourceContents {
    pub uri: String,
    pub text: String,
}

/// Build the resource URI for a table.
pub fn schema_uri(authority: &str, table: &str) -> String {
    format!(
        "mysql://{}/{}/{}",
        authority,
        urlencoding::encode(table),
        SCHEMA_PATH
    )
}

/// Extract the table name from a schema resource URI.
///
/// The path must end in `<table>/schema`; host and port are not checked.
pub fn parse_schema_uri(uri: &str) -> DbResult<String> {
    let url = Url::parse(uri).map_err(|e| DbError::invalid_resource(uri, e.to_string()))?;

    let mut segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.collect())
        .unwrap_or_default();

    if segments.pop() != Some(SCHEMA_PATH) {
        return Err(DbError::invalid_resource(uri, "path must end in <table>/schema"));
    }

    let encoded = segments
        .pop()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DbError::invalid_resource(uri, "missing table name"))?;

    let table = urlencoding::decode(encoded)
        .map_err(|e| DbError::invalid_resource(uri, format!("bad table name encoding: {}", e)))?;
    Ok(table.into_owned())
}

/// Handler for schema resources.
#[derive(Debug)]
pub struct SchemaResourceHandler<P> {
    inspector: SchemaInspector<P>,
    authority: String,
}

impl<P: SessionPool> SchemaResourceHandler<P> {
    /// Create a handler whose URIs use `authority` (`host:port`).
    pub fn new(pool: Arc<P>, authority: impl Into<String>) -> Self {
        Self {
            inspector: SchemaInspector::new(pool),
            authority: authority.into(),
        }
    }

    /// One resource per table in the current database.
    pub async fn list(&self) -> DbResult<Vec<SchemaResource>> {
        let tables = self.inspector.list_tables().await?;
        Ok(tables
            .into_iter()
            .map(|table| SchemaResource {
                uri: schema_uri(&self.authority, &table),
                name: format!("\"{}\" database schema", table),
                table,
            })
            .collect())
    }

    /// Read the column list for the table named in `uri`.
    pub async fn read(&self, uri: &str) -> DbResult<SchemaResourceContents> {
        let table = parse_schema_uri(uri)?;
        debug!(table = %table, "Reading schema resource");

        let columns = self.inspector.describe_table(&table).await?;
        let text = serde_json::to_string_pretty(&columns)
            .map_err(|e| DbError::internal(format!("Failed to serialize schema: {}", e)))?;

        Ok(SchemaResourceContents {
            uri: uri.to_string(),
            text,
        })
    }
}
