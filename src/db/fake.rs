//! Scripted in-memory session pool for tests.
//!
//! Records every statement a connection receives and how it was given back,
//! and can be told to fail specific steps.

use crate::db::session::{ControlStatement, SessionConnection, SessionPool};
use crate::error::{DbError, DbResult, ER_CANT_EXECUTE_IN_READ_ONLY_TRANSACTION};
use crate::models::{JsonRow, QueryParam};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone, PartialEq)]
pub enum FakeEvent {
    Acquired,
    Control(ControlStatement),
    Query(String, Vec<QueryParam>),
    Released,
    Poisoned,
}

#[derive(Debug, Default)]
struct Script {
    rows: Vec<JsonRow>,
    failing_controls: HashSet<ControlStatement>,
    query_error: Option<String>,
    reject_writes: bool,
    hang_queries: bool,
    query_delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct Inner {
    script: Mutex<Script>,
    events: Mutex<Vec<FakeEvent>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl Inner {
    fn record(&self, event: FakeEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Pool of at most `size` fake connections.
#[derive(Debug, Clone)]
pub struct FakePool {
    inner: Arc<Inner>,
    permits: Arc<Semaphore>,
}

impl FakePool {
    pub fn new(size: usize) -> Self {
        Self {
            inner: Arc::new(Inner::default()),
            permits: Arc::new(Semaphore::new(size)),
        }
    }

    /// Rows returned by every successful query.
    pub fn with_rows(self, rows: Vec<JsonRow>) -> Self {
        self.inner.script.lock().unwrap().rows = rows;
        self
    }

    /// Make every execution of `statement` fail.
    pub fn fail_control(self, statement: ControlStatement) -> Self {
        self.inner
            .script
            .lock()
            .unwrap()
            .failing_controls
            .insert(statement);
        self
    }

    /// Make every query fail with a syntax error carrying `message`.
    pub fn fail_query(self, message: &str) -> Self {
        self.inner.script.lock().unwrap().query_error = Some(message.to_string());
        self
    }

    /// Reject statements that do not start with SELECT the way a read-only
    /// transaction would.
    pub fn reject_writes(self) -> Self {
        self.inner.script.lock().unwrap().reject_writes = true;
        self
    }

    /// Queries never complete.
    pub fn hang_queries(self) -> Self {
        self.inner.script.lock().unwrap().hang_queries = true;
        self
    }

    /// Queries sleep before returning.
    pub fn with_query_delay(self, delay: Duration) -> Self {
        self.inner.script.lock().unwrap().query_delay = Some(delay);
        self
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        self.inner.events.lock().unwrap().clone()
    }

    /// Control statements sent so far, in order.
    pub fn controls(&self) -> Vec<ControlStatement> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FakeEvent::Control(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &FakeEvent) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    /// Highest number of connections on loan at the same time.
    pub fn max_active(&self) -> usize {
        self.inner.max_active.load(Ordering::SeqCst)
    }
}

impl SessionPool for FakePool {
    type Conn = FakeConnection;

    async fn acquire_session(&self) -> DbResult<FakeConnection> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| DbError::connection("Connection pool is closed", "test pool closed"))?;

        let active = self.inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_active.fetch_max(active, Ordering::SeqCst);
        self.inner.record(FakeEvent::Acquired);

        Ok(FakeConnection {
            inner: Arc::clone(&self.inner),
            _permit: permit,
            poisoned: false,
        })
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    inner: Arc<Inner>,
    _permit: OwnedSemaphorePermit,
    poisoned: bool,
}

impl SessionConnection for FakeConnection {
    async fn execute_control(&mut self, statement: ControlStatement) -> DbResult<()> {
        self.inner.record(FakeEvent::Control(statement));
        let fails = self
            .inner
            .script
            .lock()
            .unwrap()
            .failing_controls
            .contains(&statement);
        if fails {
            return Err(DbError::connection(
                format!("{} failed", statement),
                "scripted failure",
            ));
        }
        Ok(())
    }

    async fn fetch_rows(&mut self, sql: &str, params: &[QueryParam]) -> DbResult<Vec<JsonRow>> {
        self.inner
            .record(FakeEvent::Query(sql.to_string(), params.to_vec()));

        let (rows, query_error, reject_writes, hang, delay) = {
            let script = self.inner.script.lock().unwrap();
            (
                script.rows.clone(),
                script.query_error.clone(),
                script.reject_writes,
                script.hang_queries,
                script.query_delay,
            )
        };

        if hang {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = query_error {
            return Err(DbError::database(
                message,
                Some("42000".to_string()),
                Some(1064),
                "scripted failure",
            ));
        }
        if reject_writes && !sql.trim_start().to_ascii_uppercase().starts_with("SELECT") {
            return Err(DbError::database(
                "Cannot execute statement in a READ ONLY transaction.",
                Some("25006".to_string()),
                Some(ER_CANT_EXECUTE_IN_READ_ONLY_TRANSACTION),
                "scripted failure",
            ));
        }
        Ok(rows)
    }

    fn poison(&mut self) {
        self.poisoned = true;
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.inner.active.fetch_sub(1, Ordering::SeqCst);
        let event = if self.poisoned {
            FakeEvent::Poisoned
        } else {
            FakeEvent::Released
        };
        self.inner.record(event);
    }
}
