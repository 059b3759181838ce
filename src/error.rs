//! Error types for the MySQL MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Each error variant provides actionable messages to help AI assistants understand
//! and recover from error conditions.

use thiserror::Error;

/// MySQL error number for "Cannot execute statement in a READ ONLY transaction".
pub const ER_CANT_EXECUTE_IN_READ_ONLY_TRANSACTION: u16 = 1792;

/// SQLSTATE class reported for read-only transaction violations.
const SQLSTATE_READ_ONLY_TRANSACTION: &str = "25006";

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        /// e.g., "42S02" for unknown table
        sql_state: Option<String>,
        /// MySQL server error number, e.g. 1792
        error_number: Option<u16>,
        suggestion: String,
    },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u32,
    },

    #[error("Invalid resource URI: {uri} ({reason})")]
    InvalidResource { uri: String, reason: String },

    #[error("Table '{table}' not found in the current database")]
    TableNotFound { table: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a database error with optional SQL state and server error number.
    pub fn database(
        message: impl Into<String>,
        sql_state: Option<String>,
        error_number: Option<u16>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            sql_state,
            error_number,
            suggestion: suggestion.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u32) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create an invalid resource URI error.
    pub fn invalid_resource(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResource {
            uri: uri.into(),
            reason: reason.into(),
        }
    }

    /// Create a table not found error.
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Database { suggestion, .. } => Some(suggestion),
            Self::TableNotFound { .. } => Some("Call resources/list to see the available tables"),
            _ => None,
        }
    }

    /// True if the server rejected a statement because the transaction is read-only.
    pub fn is_read_only_violation(&self) -> bool {
        match self {
            Self::Database {
                sql_state,
                error_number,
                ..
            } => {
                *error_number == Some(ER_CANT_EXECUTE_IN_READ_ONLY_TRANSACTION)
                    || sql_state.as_deref() == Some(SQLSTATE_READ_ONLY_TRANSACTION)
            }
            _ => false,
        }
    }
}

/// Convert sqlx errors to DbError.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => DbError::connection(
                msg.to_string(),
                "Check MYSQL_HOST, MYSQL_PORT, MYSQL_USER and MYSQL_PASS",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                let number = db_err
                    .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
                    .map(|e| e.number());
                let suggestion = if number == Some(ER_CANT_EXECUTE_IN_READ_ONLY_TRANSACTION)
                    || code.as_deref() == Some(SQLSTATE_READ_ONLY_TRANSACTION)
                {
                    "Only read-only statements are allowed; writes are rejected by the server"
                } else {
                    "Check the SQL syntax and referenced objects"
                };
                DbError::database(db_err.message(), code, number, suggestion)
            }
            sqlx::Error::RowNotFound => DbError::database(
                "No rows returned",
                None,
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => DbError::timeout("connection pool acquire", 30),
            sqlx::Error::PoolClosed => DbError::connection(
                "Connection pool is closed",
                "The server is shutting down",
            ),
            sqlx::Error::Io(io_err) => DbError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => DbError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => DbError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => {
                DbError::internal(format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => DbError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => DbError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => DbError::internal("Database worker crashed"),
            _ => DbError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Build suggestion data as JSON value.
fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert DbError to MCP ErrorData for semantic error categorization.
/// Includes the suggestion field in the `data` object when available.
impl From<DbError> for rmcp::ErrorData {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::InvalidInput { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), suggestion_data(err.suggestion()))
            }

            // Bad URIs and unknown tables -> resource_not_found
            DbError::InvalidResource { .. } | DbError::TableNotFound { .. } => {
                rmcp::ErrorData::resource_not_found(
                    err.to_string(),
                    suggestion_data(err.suggestion()),
                )
            }

            DbError::Connection { suggestion, .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), suggestion_data(Some(suggestion)))
            }
            DbError::Timeout { .. } => rmcp::ErrorData::internal_error(
                err.to_string(),
                suggestion_data(Some("The connection pool is saturated; try again later")),
            ),

            // Database errors -> invalid_params with sql_state in message
            DbError::Database {
                message,
                sql_state,
                suggestion,
                ..
            } => {
                let msg = match sql_state {
                    Some(code) => format!("{} (SQLSTATE: {})", message, code),
                    None => message.clone(),
                };
                rmcp::ErrorData::invalid_params(msg, suggestion_data(Some(suggestion)))
            }

            DbError::Internal { .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), suggestion_data(err.suggestion()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::connection("Failed to connect", "Check credentials");
        assert!(err.to_string().contains("Connection failed"));
    }

    #[test]
    fn test_error_suggestion() {
        let err = DbError::database(
            "Syntax error",
            Some("42000".to_string()),
            Some(1064),
            "Check SQL syntax",
        );
        assert_eq!(err.suggestion(), Some("Check SQL syntax"));
    }

    #[test]
    fn test_read_only_violation_by_error_number() {
        let err = DbError::database(
            "Cannot execute statement in a READ ONLY transaction.",
            None,
            Some(ER_CANT_EXECUTE_IN_READ_ONLY_TRANSACTION),
            "read-only",
        );
        assert!(err.is_read_only_violation());
    }

    #[test]
    fn test_read_only_violation_by_sql_state() {
        let err = DbError::database("read only", Some("25006".to_string()), None, "read-only");
        assert!(err.is_read_only_violation());
    }

    #[test]
    fn test_syntax_error_is_not_read_only_violation() {
        let err = DbError::database("syntax", Some("42000".to_string()), Some(1064), "syntax");
        assert!(!err.is_read_only_violation());
        assert!(!DbError::internal("boom").is_read_only_violation());
    }

    #[test]
    fn test_invalid_input_maps_to_invalid_params() {
        let err = DbError::invalid_input("bad input");
        let mcp_err: rmcp::ErrorData = err.into();
        // invalid_params uses -32602
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_invalid_resource_maps_to_resource_not_found() {
        let err = DbError::invalid_resource("mysql://h:1/t/data", "expected <table>/schema");
        let mcp_err: rmcp::ErrorData = err.into();
        // resource_not_found uses -32002 in rmcp
        assert_eq!(mcp_err.code.0, -32002);
        assert!(mcp_err.message.contains("Invalid resource URI"));
    }

    #[test]
    fn test_table_not_found_includes_suggestion() {
        let err = DbError::table_not_found("ghosts");
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32002);
        assert!(mcp_err.data.is_some());
    }

    #[test]
    fn test_connection_maps_to_internal_error() {
        let err = DbError::connection("failed", "try again");
        let mcp_err: rmcp::ErrorData = err.into();
        // internal_error uses -32603
        assert_eq!(mcp_err.code.0, -32603);
    }

    #[test]
    fn test_timeout_maps_to_internal_error() {
        let err = DbError::timeout("connection pool acquire", 30);
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32603);
    }

    #[test]
    fn test_database_error_includes_sql_state() {
        let err = DbError::database(
            "syntax error",
            Some("42000".to_string()),
            Some(1064),
            "check syntax",
        );
        let mcp_err: rmcp::ErrorData = err.into();
        assert!(mcp_err.message.contains("42000"));
        let data = mcp_err.data.unwrap();
        assert_eq!(data["suggestion"], "check syntax");
    }

    #[test]
    fn test_internal_maps_to_internal_error() {
        let err = DbError::internal("unknown error");
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32603);
    }
}
