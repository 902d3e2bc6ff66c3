//! The database handle every terminal builder call runs against.

use std::sync::Arc;

use crate::cache::{CacheKey, ResultCache};
use crate::config::OrmConfig;
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::logging::{StatementKind, log_failure, log_statement};
use crate::qb::CompiledStatement;
use crate::row::{Record, Row, map_rows};
use crate::session::{ConnectionPool, Session};
use crate::value::Value;

/// Owns a connection pool, a result cache and runtime configuration.
///
/// # Example
/// ```ignore
/// use lazyorm::prelude::*;
///
/// let db = Database::new(pool);
/// let active = qb::select::<User>()
///     .filter("status", "active")
///     .order_by("age", "DESC")
///     .cached()
///     .to_list(&db)
///     .await?;
/// ```
#[derive(Debug)]
pub struct Database<P> {
    pool: P,
    cache: Arc<ResultCache>,
    config: OrmConfig,
}

impl<P: ConnectionPool> Database<P> {
    pub fn new(pool: P) -> Self {
        Self::with_config(pool, OrmConfig::default())
    }

    pub fn with_config(pool: P, config: OrmConfig) -> Self {
        Self::with_cache(pool, config, Arc::new(ResultCache::new()))
    }

    /// Build a handle that shares `cache` with other handles.
    pub fn with_cache(pool: P, config: OrmConfig, cache: Arc<ResultCache>) -> Self {
        Self {
            pool,
            cache,
            config,
        }
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn config(&self) -> &OrmConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.pool.dialect()
    }

    /// Borrow a connection, run `SELECT 1` and give it back.
    pub async fn ping(&self) -> OrmResult<()> {
        self.run_query(StatementKind::Select, &CompiledStatement::new("SELECT 1", Vec::new()))
            .await
            .map(|_| ())
    }

    /// Drop cached results for one record type name, or all of them.
    pub fn clear_cache(&self, type_name: Option<&str>) -> usize {
        self.cache.clear(type_name)
    }

    pub fn clear_cache_for<T: Record>(&self) -> usize {
        self.cache.clear(Some(T::NAME))
    }

    /// Borrow a connection, logging a failed acquire like a failed statement.
    async fn begin(&self, kind: StatementKind, sql: &str) -> OrmResult<Session<P::Conn>> {
        Session::begin(&self.pool)
            .await
            .inspect_err(|err| log_failure(&self.config, kind, sql, err))
    }

    pub(crate) async fn run_query(
        &self,
        kind: StatementKind,
        stmt: &CompiledStatement,
    ) -> OrmResult<Vec<Row>> {
        log_statement(&self.config, kind, &stmt.sql, &stmt.params);
        let mut session = self.begin(kind, &stmt.sql).await?;
        let result = session.query(&stmt.sql, &stmt.params).await;
        session.release();
        result.inspect_err(|err| log_failure(&self.config, kind, &stmt.sql, err))
    }

    pub(crate) async fn run_mutation(
        &self,
        kind: StatementKind,
        stmt: &CompiledStatement,
    ) -> OrmResult<u64> {
        log_statement(&self.config, kind, &stmt.sql, &stmt.params);
        let mut session = self.begin(kind, &stmt.sql).await?;
        let result = session.execute(&stmt.sql, &stmt.params).await;
        session.release();
        result.inspect_err(|err| log_failure(&self.config, kind, &stmt.sql, err))
    }

    /// Run `sql` once per row on a single connection, committing per chunk.
    pub(crate) async fn run_batch(
        &self,
        sql: &str,
        rows: &[Vec<Value>],
        chunk_size: usize,
    ) -> OrmResult<u64> {
        log_statement(&self.config, StatementKind::Insert, sql, &[]);
        let mut session = self.begin(StatementKind::Insert, sql).await?;
        let result = session.execute_batch(sql, rows, chunk_size).await;
        session.release();
        result.inspect_err(|err| log_failure(&self.config, StatementKind::Insert, sql, err))
    }

    /// Run a SELECT and map it, going through the cache when `cached`.
    ///
    /// Only a fully mapped result is stored.
    pub(crate) async fn fetch_records<T: Record>(
        &self,
        stmt: &CompiledStatement,
        cached: bool,
    ) -> OrmResult<Arc<Vec<T>>> {
        if !cached {
            let rows = self.run_query(StatementKind::Select, stmt).await?;
            return Ok(Arc::new(map_rows::<T>(rows)?));
        }

        let key = CacheKey::for_statement(T::NAME, stmt);
        if let Some(hit) = self.cache.get::<T>(&key) {
            return Ok(hit);
        }
        let rows = self.run_query(StatementKind::Select, stmt).await?;
        let records = map_rows::<T>(rows)?;
        Ok(self.cache.put(key, records))
    }
}
