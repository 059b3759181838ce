//! MySQL MCP Server - Main entry point.
//!
//! This server provides MCP (Model Context Protocol) resources and tools for
//! AI assistants to inspect and query a MySQL database.

use clap::Parser;
use mysql_mcp_server::config::Config;
use mysql_mcp_server::db::ConnectionPool;
use mysql_mcp_server::transport::{StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries the MCP protocol.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    // Initialize logging
    init_tracing(&config);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    info!(
        config = ?config,
        "Starting MySQL MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let pool = Arc::new(ConnectionPool::connect_lazy(&config));

    // Best effort, off the startup path: the server still starts if MySQL is down
    pool.spawn_server_version_log();

    let transport = StdioTransport::new(
        pool,
        config.authority(),
        config.shutdown_timeout_duration(),
    );
    info!(transport = transport.name(), "Using stdio transport");

    match transport.run().await {
        Ok(outcome) => {
            info!(outcome = ?outcome, "Server shutdown complete");
            // stdin may still be blocking a runtime thread
            std::process::exit(outcome.exit_code());
        }
        Err(e) => {
            error!(error = %e, "Server error");
            Err(e.into())
        }
    }
}
