//! Stdio transport for the MCP server.
//!
//! This transport uses standard input/output for communication,
//! which is the standard mode for CLI-based MCP integrations.

use crate::db::ConnectionPool;
use crate::error::{DbError, DbResult};
use crate::mcp::DbService;
use crate::transport::{ShutdownOutcome, Transport};
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

/// Stdio transport implementation.
///
/// This transport reads JSON-RPC messages from stdin and writes
/// responses to stdout, following the MCP protocol specification.
pub struct StdioTransport {
    pool: Arc<ConnectionPool>,
    authority: String,
    shutdown_timeout: Duration,
}

impl StdioTransport {
    /// Create a new stdio transport.
    ///
    /// # Arguments
    ///
    /// * `pool` - Shared connection pool for database operations
    /// * `authority` - `host:port` used in resource URIs
    /// * `shutdown_timeout` - How long to wait for the pool to close on a signal
    pub fn new(
        pool: Arc<ConnectionPool>,
        authority: impl Into<String>,
        shutdown_timeout: Duration,
    ) -> Self {
        Self {
            pool,
            authority: authority.into(),
            shutdown_timeout,
        }
    }

    /// Close the pool, giving up after the shutdown timeout.
    async fn close_pool(&self) -> bool {
        info!("Closing database connection pool");
        match tokio::time::timeout(self.shutdown_timeout, self.pool.close()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    timeout_secs = self.shutdown_timeout.as_secs(),
                    "Timed out closing connection pool"
                );
                false
            }
        }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<ShutdownOutcome> {
        info!("Starting MCP server with stdio transport");

        let service = DbService::new(self.pool.clone(), self.authority.clone());

        // Create the stdio transport and run the service
        let transport = stdio();
        let running_service = service.serve(transport).await.map_err(|e| {
            DbError::internal(format!("Failed to start stdio transport: {}", e))
        })?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => {
                        info!("Stdio transport completed normally");
                    }
                    Err(e) => {
                        warn!(error = %e, "Stdio transport error");
                        self.close_pool().await;
                        return Err(DbError::internal(format!(
                            "Stdio transport error: {}",
                            e
                        )));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            // Spawn a task to listen for second signal and force exit
            tokio::spawn(async {
                wait_for_signal().await;
                warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        let closed = self.close_pool().await;

        Ok(match (shutdown_requested, closed) {
            (false, _) => ShutdownOutcome::ClientClosed,
            (true, true) => ShutdownOutcome::Signalled,
            (true, false) => ShutdownOutcome::PoolCloseTimedOut,
        })
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
///
/// If a handler cannot be installed, that signal is never reported.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn create_transport(shutdown_timeout: Duration) -> StdioTransport {
        let config = Config::default();
        let pool = Arc::new(ConnectionPool::connect_lazy(&config));
        StdioTransport::new(pool, config.authority(), shutdown_timeout)
    }

    #[tokio::test]
    async fn test_stdio_transport_creation() {
        let transport = create_transport(Duration::from_secs(1));
        assert_eq!(transport.name(), "stdio");
        assert_eq!(transport.authority, "127.0.0.1:3306");
    }

    #[tokio::test]
    async fn test_close_idle_pool_within_timeout() {
        let transport = create_transport(Duration::from_secs(1));
        assert!(transport.close_pool().await);
        assert!(transport.pool.is_closed());
    }
}
