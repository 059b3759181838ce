//! MCP tool implementations.
//!
//! - `query`: Run a read-only SQL statement (`mysql_query`)

pub mod query;

pub use query::{QueryInput, QueryToolHandler};
