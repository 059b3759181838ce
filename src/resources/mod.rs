//! MCP resource implementations.
//!
//! - `schema`: one JSON column listing per table of the current database

pub mod schema;

pub use schema::{
    SCHEMA_MIME_TYPE, SchemaResource, SchemaResourceContents, SchemaResourceHandler,
    parse_schema_uri, schema_uri,
};
