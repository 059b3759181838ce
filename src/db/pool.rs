//! Connection pool management.
//!
//! `ConnectionPool` owns the `MySqlPool` shared by every request. It is
//! constructed once in `main` and passed around behind an `Arc`.

use crate::config::Config;
use crate::db::session::SessionPool;
use crate::error::{DbError, DbResult};
use sqlx::MySqlPool;
use sqlx::pool::PoolConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ConnectionPool {
    pool: MySqlPool,
    acquire_timeout: Duration,
}

impl ConnectionPool {
    /// Create the pool without opening any connection.
    ///
    /// Connections are opened on first use, so the server starts even when
    /// MySQL is not reachable yet.
    pub fn connect_lazy(config: &Config) -> Self {
        let pool = config
            .pool_options()
            .connect_lazy_with(config.connect_options());

        info!(
            host = %config.host,
            port = config.port,
            user = %config.user,
            database = config.database_name().unwrap_or("<server default>"),
            pool_size = config.pool_size,
            "Created MySQL connection pool"
        );

        Self {
            pool,
            acquire_timeout: config.acquire_timeout_duration(),
        }
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        let acquire_timeout = pool.options().get_acquire_timeout();
        Self {
            pool,
            acquire_timeout,
        }
    }

    /// Get the underlying sqlx pool.
    pub fn inner(&self) -> &MySqlPool {
        &self.pool
    }

    /// Get the server version, logging a warning if it cannot be read.
    pub async fn server_version(&self) -> Option<String> {
        match sqlx::query_scalar::<_, String>("SELECT version()")
            .fetch_one(&self.pool)
            .await
        {
            Ok(version) => {
                debug!(version = %version, "Got server version");
                Some(version)
            }
            Err(e) => {
                warn!(error = %e, "Failed to get server version");
                None
            }
        }
    }

    /// Log the server version from a background task.
    ///
    /// Does not wait for MySQL, so an unreachable host cannot delay startup.
    pub fn spawn_server_version_log(self: &Arc<Self>) -> JoinHandle<Option<String>> {
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            let version = pool.server_version().await;
            if let Some(version) = &version {
                info!(version = %version, "Connected to MySQL");
            }
            version
        })
    }

    /// Close the pool, waiting for connections on loan to be given back.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Map an acquire failure into the error taxonomy.
    fn acquire_error(&self, error: sqlx::Error) -> DbError {
        match error {
            sqlx::Error::PoolTimedOut => DbError::timeout(
                "connection pool acquire",
                self.acquire_timeout.as_secs() as u32,
            ),
            sqlx::Error::PoolClosed => DbError::from(error),
            other => DbError::connection(
                format!("Failed to connect: {}", other),
                connection_suggestion(&other),
            ),
        }
    }
}

impl SessionPool for ConnectionPool {
    type Conn = PoolConnection<sqlx::MySql>;

    async fn acquire_session(&self) -> DbResult<Self::Conn> {
        self.pool
            .acquire()
            .await
            .map_err(|e| self.acquire_error(e))
    }
}

/// Generate a helpful suggestion for a failed connection attempt.
fn connection_suggestion(error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return "Check that the MySQL server is running and MYSQL_HOST/MYSQL_PORT are correct"
            .to_string();
    }

    if error_str.contains("access denied") || error_str.contains("password") {
        return "Verify MYSQL_USER and MYSQL_PASS".to_string();
    }

    if error_str.contains("unknown database") {
        return "Check that the database named in MYSQL_DB exists".to_string();
    }

    if error_str.contains("tls") || error_str.contains("ssl") {
        return "Check TLS/SSL configuration or try disabling it".to_string();
    }

    "Verify MYSQL_HOST, MYSQL_PORT, MYSQL_USER, MYSQL_PASS and MYSQL_DB".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_suggestion_refused() {
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused",
        ));
        assert!(connection_suggestion(&err).contains("MYSQL_HOST"));
    }

    #[test]
    fn test_connection_suggestion_fallback() {
        let err = sqlx::Error::Protocol("unexpected packet".to_string());
        assert!(connection_suggestion(&err).contains("MYSQL_USER"));
    }

    #[tokio::test]
    async fn test_connect_lazy_does_not_connect() {
        let config = Config {
            port: 1,
            ..Config::default()
        };
        let pool = ConnectionPool::connect_lazy(&config);
        assert!(!pool.is_closed());
        assert_eq!(pool.acquire_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_acquire_timeout_maps_to_timeout_error() {
        let config = Config {
            port: 1,
            acquire_timeout: 7,
            ..Config::default()
        };
        let pool = ConnectionPool::connect_lazy(&config);
        let err = pool.acquire_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::Timeout { elapsed_secs: 7, .. }));
    }

    #[tokio::test]
    async fn test_server_version_log_does_not_block_caller() {
        let config = Config {
            port: 1,
            acquire_timeout: 1,
            ..Config::default()
        };
        let pool = Arc::new(ConnectionPool::connect_lazy(&config));

        let handle = pool.spawn_server_version_log();
        // Current-thread runtime: the task cannot have run before we yield
        assert!(!handle.is_finished());

        assert_eq!(handle.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_acquire_after_close_fails() {
        let pool = ConnectionPool::connect_lazy(&Config::default());
        pool.close().await;
        assert!(pool.is_closed());
        let result = pool.acquire_session().await;
        assert!(matches!(result, Err(DbError::Connection { .. })));
    }
}
