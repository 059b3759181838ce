//! Configuration handling for the MySQL MCP Server.
//!
//! This module provides configuration management via CLI arguments and environment variables.

use clap::Parser;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::fmt;
use std::net::Ipv6Addr;
use std::time::Duration;

pub const DEFAULT_MYSQL_HOST: &str = "127.0.0.1";
pub const DEFAULT_MYSQL_PORT: u16 = 3306;
pub const DEFAULT_MYSQL_USER: &str = "root";
pub const DEFAULT_CHARSET: &str = "utf8mb4";

// Pool configuration defaults
pub const DEFAULT_POOL_SIZE: u32 = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

/// Configuration for the MySQL MCP Server.
#[derive(Clone, Parser)]
#[command(
    name = "mysql-mcp-server",
    about = "MCP server exposing MySQL table schemas and a read-only query tool",
    version,
    author
)]
pub struct Config {
    /// MySQL server host
    #[arg(long, default_value = DEFAULT_MYSQL_HOST, env = "MYSQL_HOST")]
    pub host: String,

    /// MySQL server port
    #[arg(long, default_value_t = DEFAULT_MYSQL_PORT, env = "MYSQL_PORT")]
    pub port: u16,

    /// MySQL user name
    #[arg(short, long, default_value = DEFAULT_MYSQL_USER, env = "MYSQL_USER")]
    pub user: String,

    /// MySQL password (never logged)
    #[arg(long, default_value = "", env = "MYSQL_PASS", hide_env_values = true)]
    pub password: String,

    /// Database to use. Empty means the server default for the user.
    #[arg(short, long, default_value = "", env = "MYSQL_DB")]
    pub database: String,

    /// Allow the mysql_clear_password auth plugin (LDAP, PAM, RDS IAM)
    #[arg(
        long = "enable-cleartext-plugin",
        env = "MYSQL_ENABLE_CLEARTEXT_PLUGIN",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub cleartext_plugin: bool,

    /// Maximum number of pooled connections
    #[arg(long, default_value_t = DEFAULT_POOL_SIZE, env = "MYSQL_POOL_SIZE")]
    pub pool_size: u32,

    /// Seconds to wait for a free pooled connection
    #[arg(
        long,
        default_value_t = DEFAULT_ACQUIRE_TIMEOUT_SECS,
        env = "MYSQL_ACQUIRE_TIMEOUT"
    )]
    pub acquire_timeout: u64,

    /// Seconds to wait for the pool to close on shutdown
    #[arg(
        long,
        default_value_t = DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        env = "MCP_SHUTDOWN_TIMEOUT"
    )]
    pub shutdown_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            host: DEFAULT_MYSQL_HOST.to_string(),
            port: DEFAULT_MYSQL_PORT,
            user: DEFAULT_MYSQL_USER.to_string(),
            password: String::new(),
            database: String::new(),
            cleartext_plugin: true,
            pool_size: DEFAULT_POOL_SIZE,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Validate values clap cannot check on its own.
    pub fn validate(&self) -> Result<(), String> {
        if self.pool_size == 0 {
            return Err("pool_size must be greater than 0".to_string());
        }
        if self.acquire_timeout == 0 {
            return Err("acquire_timeout must be greater than 0".to_string());
        }
        Ok(())
    }

    /// The database name, if one was configured.
    pub fn database_name(&self) -> Option<&str> {
        Some(self.database.as_str()).filter(|db| !db.is_empty())
    }

    /// Build driver connect options from the configured credentials.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .charset(DEFAULT_CHARSET)
            .enable_cleartext_plugin(self.cleartext_plugin);

        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        if let Some(db) = self.database_name() {
            options = options.database(db);
        }
        options
    }

    /// Build pool options from the configured limits.
    pub fn pool_options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(self.pool_size)
            .min_connections(0)
            .acquire_timeout(self.acquire_timeout_duration())
            .idle_timeout(Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)))
            .test_before_acquire(true)
    }

    /// Get the pool acquire timeout as a Duration.
    pub fn acquire_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout)
    }

    /// Get the shutdown timeout as a Duration.
    pub fn shutdown_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// Authority used in resource URIs, e.g. `127.0.0.1:3306` or `[::1]:3306`.
    pub fn authority(&self) -> String {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

// Password is redacted; everything else is printed as-is.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field(
                "password",
                &if self.password.is_empty() { "" } else { "***" },
            )
            .field("database", &self.database)
            .field("cleartext_plugin", &self.cleartext_plugin)
            .field("pool_size", &self.pool_size)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("log_level", &self.log_level)
            .field("json_logs", &self.json_logs)
            .finish()
    }
}
