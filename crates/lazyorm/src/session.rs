//! Pool / connection seams and the per-statement execution session.
//!
//! A [`Session`] owns exactly one pooled connection for the duration of one
//! statement (or one chunked insert). The connection goes back to the pool
//! when the session is dropped, on every path.

use std::future::Future;

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;

/// A source of database connections.
pub trait ConnectionPool: Send + Sync {
    type Conn: Connection;

    /// Borrow a connection.
    ///
    /// Fails with [`OrmError::PoolExhausted`] when nothing is available and
    /// [`OrmError::Connection`] when the database cannot be reached.
    fn acquire(&self) -> impl Future<Output = OrmResult<Self::Conn>> + Send;

    /// Placeholder / paging syntax used when compiling for this pool.
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }
}

/// One borrowed database connection.
pub trait Connection: Send + Sized {
    fn query(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Run a write statement and return the affected row count.
    fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<u64>> + Send;

    /// Run one statement once per parameter row.
    fn execute_batch(
        &mut self,
        sql: &str,
        rows: &[Vec<Value>],
    ) -> impl Future<Output = OrmResult<u64>> + Send {
        async move {
            let mut total = 0;
            for params in rows {
                total += self.execute(sql, params).await?;
            }
            Ok(total)
        }
    }

    fn commit(&mut self) -> impl Future<Output = OrmResult<()>> + Send;

    fn rollback(&mut self) -> impl Future<Output = OrmResult<()>> + Send;

    /// Hand the connection back to its pool.
    fn release(self);
}

/// Scoped ownership of one pooled connection.
pub struct Session<C: Connection> {
    conn: Option<C>,
}

impl<C: Connection> Session<C> {
    /// Acquire a connection from `pool`.
    pub async fn begin<P>(pool: &P) -> OrmResult<Self>
    where
        P: ConnectionPool<Conn = C>,
    {
        let conn = pool.acquire().await?;
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> OrmResult<&mut C> {
        self.conn
            .as_mut()
            .ok_or_else(|| OrmError::Connection("session connection already released".into()))
    }

    pub async fn query(&mut self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.conn()?.query(sql, params).await
    }

    /// Execute and commit. Any failure triggers one rollback attempt.
    pub async fn execute(&mut self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        let conn = self.conn()?;
        let result = match conn.execute(sql, params).await {
            Ok(affected) => conn.commit().await.map(|()| affected),
            Err(err) => Err(err),
        };
        if result.is_err() {
            self.rollback_quietly().await;
        }
        result
    }

    /// Execute `sql` for every parameter row, committing after each chunk.
    ///
    /// Chunks committed before a failure stay committed; the failing chunk is
    /// rolled back and its error returned.
    pub async fn execute_batch(
        &mut self,
        sql: &str,
        rows: &[Vec<Value>],
        chunk_size: usize,
    ) -> OrmResult<u64> {
        if chunk_size == 0 {
            return Err(OrmError::validation("batch size must be greater than zero"));
        }
        let mut total = 0;
        for (idx, chunk) in rows.chunks(chunk_size).enumerate() {
            let conn = self.conn()?;
            let result = match conn.execute_batch(sql, chunk).await {
                Ok(affected) => conn.commit().await.map(|()| affected),
                Err(err) => Err(err),
            };
            match result {
                Ok(affected) => {
                    total += affected;
                    tracing::debug!(
                        target: "lazyorm.sql",
                        chunk = idx + 1,
                        rows = chunk.len(),
                        total,
                        "committed insert batch"
                    );
                }
                Err(err) => {
                    self.rollback_quietly().await;
                    return Err(err);
                }
            }
        }
        Ok(total)
    }

    async fn rollback_quietly(&mut self) {
        let Some(conn) = self.conn.as_mut() else {
            return;
        };
        if let Err(err) = conn.rollback().await {
            tracing::warn!(target: "lazyorm.sql", error = %err, "rollback failed");
        }
    }

    /// Return the connection now instead of at drop.
    pub fn release(mut self) {
        if let Some(conn) = self.conn.take() {
            conn.release();
        }
    }
}

impl<C: Connection> Drop for Session<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            conn.release();
        }
    }
}
