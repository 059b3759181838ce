//! MySQL MCP Server Library
//!
//! This library exposes a MySQL database to AI assistants over MCP: table
//! schemas as resources and a `mysql_query` tool that runs SQL inside a
//! read-only transaction.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod resources;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::DbService;
