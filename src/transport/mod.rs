//! Transport layer for the MCP server.
//!
//! The server speaks MCP over standard input/output only.

pub mod stdio;

pub use stdio::StdioTransport;

use crate::error::DbResult;
use std::future::Future;

/// Trait for MCP transport implementations.
///
/// Transports handle the low-level communication between the MCP server
/// and clients, abstracting away the protocol details.
pub trait Transport: Send + Sync {
    /// Start the transport and begin handling requests.
    ///
    /// Resolves once the transport has shut down, with the shutdown outcome.
    fn run(&self) -> impl Future<Output = DbResult<ShutdownOutcome>> + Send;

    /// Get the name of this transport for logging.
    fn name(&self) -> &'static str;
}

/// How the server stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The client closed the connection.
    ClientClosed,
    /// A signal was received and the pool closed in time.
    Signalled,
    /// A signal was received but the pool did not close within the timeout.
    PoolCloseTimedOut,
}

impl ShutdownOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ClientClosed | Self::Signalled => 0,
            Self::PoolCloseTimedOut => 1,
        }
    }
}
