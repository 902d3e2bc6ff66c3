//! In-memory pool for tests.
//!
//! [`MockPool`] answers every statement through a caller-supplied handler and
//! records what happened: statements sent, connections acquired and
//! released, commits and rollbacks. Clones share the same state, so a test
//! can keep one clone for assertions while a `Database` owns another.
//!
//! ```ignore
//! use lazyorm::testing::{MockPool, Reply};
//!
//! let pool = MockPool::new(|sql, _params| {
//!     assert!(sql.starts_with("SELECT"));
//!     Ok(Reply::rows(vec![vec![1.into(), "Alice".into()]]))
//! });
//! let db = Database::new(pool.clone());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::session::{Connection, ConnectionPool};
use crate::value::Value;

/// What the handler answers for one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Rows(Vec<Row>),
    Affected(u64),
}

impl Reply {
    pub fn rows(rows: Vec<Vec<Value>>) -> Self {
        Reply::Rows(rows.into_iter().map(Row::new).collect())
    }

    pub fn empty() -> Self {
        Reply::Rows(Vec::new())
    }
}

type Handler = dyn Fn(&str, &[Value]) -> OrmResult<Reply> + Send + Sync;

/// Counters and statement log of a [`MockPool`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockStats {
    pub statements: Vec<(String, Vec<Value>)>,
    pub acquired: usize,
    pub released: usize,
    pub commits: usize,
    pub rollbacks: usize,
    /// Calls to `Connection::execute_batch`.
    pub batches: usize,
    /// Connections currently checked out.
    pub open: usize,
}

struct Inner {
    handler: Box<Handler>,
    fail_commit: AtomicBool,
    fail_rollback: AtomicBool,
    stats: Mutex<MockStats>,
}

impl Inner {
    fn stats(&self) -> MutexGuard<'_, MockStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run(&self, sql: &str, params: &[Value]) -> OrmResult<Reply> {
        self.stats()
            .statements
            .push((sql.to_string(), params.to_vec()));
        (self.handler)(sql, params)
    }
}

/// Scripted connection pool.
#[derive(Clone)]
pub struct MockPool {
    inner: Arc<Inner>,
    dialect: Dialect,
    max_connections: Option<usize>,
}

impl std::fmt::Debug for MockPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPool")
            .field("dialect", &self.dialect)
            .field("stats", &self.stats())
            .finish()
    }
}

impl MockPool {
    /// Answer every statement with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &[Value]) -> OrmResult<Reply> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                handler: Box::new(handler),
                fail_commit: AtomicBool::new(false),
                fail_rollback: AtomicBool::new(false),
                stats: Mutex::new(MockStats::default()),
            }),
            dialect: Dialect::MySql,
            max_connections: None,
        }
    }

    /// Return `rows` for every query and one affected row per write.
    pub fn with_rows(rows: Vec<Vec<Value>>) -> Self {
        let reply = Reply::rows(rows);
        Self::new(move |sql, _| {
            if sql.trim_start().to_ascii_uppercase().starts_with("SELECT") {
                Ok(reply.clone())
            } else {
                Ok(Reply::Affected(1))
            }
        })
    }

    /// Report `dialect` to the builders.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Fail `acquire` with `PoolExhausted` once `n` connections are out.
    pub fn max_connections(mut self, n: usize) -> Self {
        self.max_connections = Some(n);
        self
    }

    /// Make every commit fail.
    pub fn fail_commit(&self, fail: bool) {
        self.inner.fail_commit.store(fail, Ordering::SeqCst);
    }

    /// Make every rollback fail.
    pub fn fail_rollback(&self, fail: bool) {
        self.inner.fail_rollback.store(fail, Ordering::SeqCst);
    }

    pub fn stats(&self) -> MockStats {
        self.inner.stats().clone()
    }

    /// SQL text of every statement sent so far.
    pub fn statements(&self) -> Vec<String> {
        self.inner
            .stats()
            .statements
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    /// Borrow a connection outside of a `Database`, e.g. to hold the pool busy.
    pub fn checkout(&self) -> OrmResult<MockConnection> {
        let mut stats = self.inner.stats();
        if let Some(max) = self.max_connections {
            if stats.open >= max {
                return Err(OrmError::PoolExhausted(format!(
                    "all {max} connections are in use"
                )));
            }
        }
        stats.acquired += 1;
        stats.open += 1;
        Ok(MockConnection {
            inner: self.inner.clone(),
        })
    }
}

impl ConnectionPool for MockPool {
    type Conn = MockConnection;

    async fn acquire(&self) -> OrmResult<MockConnection> {
        self.checkout()
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }
}

/// Connection handed out by [`MockPool`].
pub struct MockConnection {
    inner: Arc<Inner>,
}

impl Connection for MockConnection {
    async fn query(&mut self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        match self.inner.run(sql, params)? {
            Reply::Rows(rows) => Ok(rows),
            Reply::Affected(_) => Ok(Vec::new()),
        }
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        match self.inner.run(sql, params)? {
            Reply::Affected(n) => Ok(n),
            Reply::Rows(rows) => Ok(rows.len() as u64),
        }
    }

    async fn execute_batch(&mut self, sql: &str, rows: &[Vec<Value>]) -> OrmResult<u64> {
        self.inner.stats().batches += 1;
        let mut total = 0;
        for params in rows {
            total += self.execute(sql, params).await?;
        }
        Ok(total)
    }

    async fn commit(&mut self) -> OrmResult<()> {
        if self.inner.fail_commit.load(Ordering::SeqCst) {
            return Err(OrmError::query("commit failed"));
        }
        self.inner.stats().commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> OrmResult<()> {
        self.inner.stats().rollbacks += 1;
        if self.inner.fail_rollback.load(Ordering::SeqCst) {
            return Err(OrmError::query("rollback failed"));
        }
        Ok(())
    }

    fn release(self) {
        let mut stats = self.inner.stats();
        stats.released += 1;
        stats.open = stats.open.saturating_sub(1);
    }
}
