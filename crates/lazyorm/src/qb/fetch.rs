//! Hand-written SELECT with bound parameters, cached by default.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::db::Database;
use crate::error::{OrmError, OrmResult};
use crate::qb::compile::CompiledStatement;
use crate::row::Record;
use crate::session::ConnectionPool;
use crate::value::Value;

/// Runs caller-supplied SELECT text and maps the rows to `T`.
///
/// Placeholders must already match the pool's dialect (`?` for MySQL, `$n`
/// for Postgres). Values are always bound, never spliced into the text.
pub struct FetchQb<T> {
    sql: String,
    params: Vec<Value>,
    cached: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for FetchQb<T> {
    fn clone(&self) -> Self {
        Self {
            sql: self.sql.clone(),
            params: self.params.clone(),
            cached: self.cached,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for FetchQb<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchQb")
            .field("sql", &self.sql)
            .field("params", &self.params)
            .field("cached", &self.cached)
            .finish()
    }
}

impl<T: Record> FetchQb<T> {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            cached: true,
            _marker: PhantomData,
        }
    }

    /// Bind the next positional parameter.
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    /// Always hit the database.
    pub fn no_cache(mut self) -> Self {
        self.cached = false;
        self
    }

    pub fn compile(&self) -> OrmResult<CompiledStatement> {
        if self.sql.trim().is_empty() {
            return Err(OrmError::validation("Query cannot be empty"));
        }
        Ok(CompiledStatement::new(self.sql.clone(), self.params.clone()))
    }

    pub async fn get<P: ConnectionPool>(&self, db: &Database<P>) -> OrmResult<Arc<Vec<T>>> {
        let stmt = self.compile()?;
        db.fetch_records::<T>(&stmt, self.cached).await
    }
}
