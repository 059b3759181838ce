//! Query guards.
//!
//! - [`ReadOnlyQueryGuard`] runs untrusted SQL inside a read-only transaction
//!   that is always rolled back.
//! - [`PlainQueryGuard`] runs trusted internal statements with no mode switching.
//!
//! Both borrow one connection through a [`Lease`], so the connection is given
//! back on every exit path, including cancellation of the calling future.

use crate::db::session::{ControlStatement, Lease, SessionConnection, SessionPool};
use crate::error::DbResult;
use crate::models::{JsonRow, QueryParam};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs arbitrary SQL so that it cannot persist side effects.
#[derive(Debug)]
pub struct ReadOnlyQueryGuard<P> {
    pool: Arc<P>,
}

impl<P> Clone for ReadOnlyQueryGuard<P> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
        }
    }
}

impl<P: SessionPool> ReadOnlyQueryGuard<P> {
    pub fn new(pool: Arc<P>) -> Self {
        Self { pool }
    }

    /// Execute `sql` in a read-only transaction and return its rows.
    ///
    /// The transaction is rolled back even when the statement succeeds. On
    /// failure the first error is returned; cleanup failures are only logged.
    pub async fn execute(&self, sql: &str) -> DbResult<Vec<JsonRow>> {
        let start = Instant::now();
        let mut lease = Lease::acquire(self.pool.as_ref()).await?;

        match run_read_only(&mut lease, sql).await {
            Ok(rows) => {
                info!(
                    rows = rows.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Read-only query completed"
                );
                Ok(rows)
            }
            Err(e) => {
                debug!(error = %e, state = %lease.state(), "Read-only query failed");
                cleanup(&mut lease).await;
                Err(e)
            }
        }
    }
}

async fn run_read_only<C: SessionConnection>(
    lease: &mut Lease<C>,
    sql: &str,
) -> DbResult<Vec<JsonRow>> {
    lease.control(ControlStatement::SetReadOnly).await?;
    lease.control(ControlStatement::Begin).await?;
    let rows = lease.fetch(sql, &[]).await?;
    lease.control(ControlStatement::Rollback).await?;
    lease.control(ControlStatement::SetReadWrite).await?;
    Ok(rows)
}

/// Best-effort rollback and mode restoration after a failed step.
///
/// Failures are logged and swallowed. Whatever is left dirty is discarded
/// when the lease drops.
async fn cleanup<C: SessionConnection>(lease: &mut Lease<C>) {
    if lease.state().in_transaction() {
        if let Err(e) = lease.control(ControlStatement::Rollback).await {
            warn!(error = %e, "Rollback failed during cleanup");
            return;
        }
    }

    if lease.state().needs_restore() {
        if let Err(e) = lease.control(ControlStatement::SetReadWrite).await {
            warn!(error = %e, "Failed to restore read-write mode during cleanup");
        }
    }
}

/// Runs trusted statements with optional positional parameters.
#[derive(Debug)]
pub struct PlainQueryGuard<P> {
    pool: Arc<P>,
}

impl<P> Clone for PlainQueryGuard<P> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
        }
    }
}

impl<P: SessionPool> PlainQueryGuard<P> {
    pub fn new(pool: Arc<P>) -> Self {
        Self { pool }
    }

    pub async fn execute(&self, sql: &str, params: &[QueryParam]) -> DbResult<Vec<JsonRow>> {
        let mut lease = Lease::acquire(self.pool.as_ref()).await?;
        lease.fetch(sql, params).await
    }
}
