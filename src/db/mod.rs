//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool management
//! - Borrowed-connection sessions and query guards
//! - Schema introspection
//! - Type mappings

#[cfg(test)]
pub mod fake;
pub mod guard;
pub mod mysql;
pub mod pool;
pub mod schema;
pub mod session;
pub mod types;

pub use guard::{PlainQueryGuard, ReadOnlyQueryGuard};
pub use pool::ConnectionPool;
pub use schema::SchemaInspector;
pub use session::{ControlStatement, Lease, SessionConnection, SessionPool, SessionState};
