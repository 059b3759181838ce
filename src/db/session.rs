//! Borrowed-connection sessions.
//!
//! A [`Lease`] is the scoped loan of one pooled connection. It tracks the
//! session state the connection may be in and, when dropped, gives the
//! connection back: to the pool if it is clean, otherwise closed
//! ("poisoned") so that no later borrower inherits a read-only session or an
//! open transaction.
//!
//! The traits here are the seam between the guards and the driver. The
//! production implementation lives in `db::mysql`; tests use `db::fake`.

use crate::error::DbResult;
use crate::models::{JsonRow, QueryParam};
use std::fmt;
use std::future::Future;
use tracing::{debug, warn};

/// Fixed session and transaction control statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlStatement {
    SetReadOnly,
    SetReadWrite,
    Begin,
    Rollback,
}

impl ControlStatement {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::SetReadOnly => "SET SESSION TRANSACTION READ ONLY",
            Self::SetReadWrite => "SET SESSION TRANSACTION READ WRITE",
            Self::Begin => "START TRANSACTION",
            Self::Rollback => "ROLLBACK",
        }
    }
}

impl fmt::Display for ControlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// State of a borrowed connection.
///
/// The state is pessimistic: `ReadOnlySet` and `TxOpen` are entered before
/// the command is sent, `TxRolledBack` and `ReadWriteRestored` only after it
/// succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Acquired,
    ReadOnlySet,
    TxOpen,
    QueryOk,
    QueryFailed,
    TxRolledBack,
    ReadWriteRestored,
}

impl SessionState {
    /// A clean connection is read-write with no open transaction.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Acquired | Self::ReadWriteRestored)
    }

    /// True if a transaction may still be open on the connection.
    pub fn in_transaction(&self) -> bool {
        matches!(self, Self::TxOpen | Self::QueryOk | Self::QueryFailed)
    }

    /// True if the session may be read-only but no transaction is open.
    pub fn needs_restore(&self) -> bool {
        matches!(self, Self::ReadOnlySet | Self::TxRolledBack)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Acquired => "acquired",
            Self::ReadOnlySet => "read_only_set",
            Self::TxOpen => "tx_open",
            Self::QueryOk => "query_ok",
            Self::QueryFailed => "query_failed",
            Self::TxRolledBack => "tx_rolled_back",
            Self::ReadWriteRestored => "read_write_restored",
        };
        f.write_str(name)
    }
}

/// A connection that can run control statements and row-returning queries.
pub trait SessionConnection: Send {
    /// Run a fixed control statement.
    fn execute_control(
        &mut self,
        statement: ControlStatement,
    ) -> impl Future<Output = DbResult<()>> + Send;

    /// Run one statement and collect all of its rows.
    fn fetch_rows(
        &mut self,
        sql: &str,
        params: &[QueryParam],
    ) -> impl Future<Output = DbResult<Vec<JsonRow>>> + Send;

    /// Mark the connection so it is closed instead of returned to the pool.
    fn poison(&mut self);
}

/// A pool that hands out [`SessionConnection`]s.
pub trait SessionPool: Send + Sync {
    type Conn: SessionConnection;

    /// Acquire a connection, waiting while the pool is saturated.
    fn acquire_session(&self) -> impl Future<Output = DbResult<Self::Conn>> + Send;
}

/// Scoped loan of one connection.
pub struct Lease<C: SessionConnection> {
    conn: C,
    state: SessionState,
}

impl<C: SessionConnection> fmt::Debug for Lease<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<C: SessionConnection> Lease<C> {
    /// Acquire a connection from the pool.
    pub async fn acquire<P>(pool: &P) -> DbResult<Self>
    where
        P: SessionPool<Conn = C>,
    {
        let conn = pool.acquire_session().await?;
        debug!("Connection acquired");
        Ok(Self {
            conn,
            state: SessionState::Acquired,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, "Session state transition");
        self.state = next;
    }

    /// Run a control statement, recording the state it leaves the session in.
    pub async fn control(&mut self, statement: ControlStatement) -> DbResult<()> {
        match statement {
            ControlStatement::SetReadOnly => self.transition(SessionState::ReadOnlySet),
            ControlStatement::Begin => self.transition(SessionState::TxOpen),
            ControlStatement::Rollback | ControlStatement::SetReadWrite => {}
        }

        self.conn.execute_control(statement).await?;

        match statement {
            ControlStatement::Rollback => self.transition(SessionState::TxRolledBack),
            // Restoring the mode inside a transaction leaves the transaction open
            ControlStatement::SetReadWrite if !self.state.in_transaction() => {
                self.transition(SessionState::ReadWriteRestored)
            }
            _ => {}
        }
        Ok(())
    }

    /// Run a row-returning statement.
    ///
    /// Inside a transaction, the outcome is recorded as `QueryOk` or `QueryFailed`.
    pub async fn fetch(&mut self, sql: &str, params: &[QueryParam]) -> DbResult<Vec<JsonRow>> {
        let result = self.conn.fetch_rows(sql, params).await;
        if self.state.in_transaction() {
            let next = if result.is_ok() {
                SessionState::QueryOk
            } else {
                SessionState::QueryFailed
            };
            self.transition(next);
        }
        result
    }
}

impl<C: SessionConnection> Drop for Lease<C> {
    fn drop(&mut self) {
        if self.state.is_clean() {
            debug!("Connection released");
            return;
        }

        warn!(
            state = %self.state,
            "Discarding connection that may hold a read-only session or open transaction"
        );
        self.conn.poison();
    }
}
