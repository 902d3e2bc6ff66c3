//! SELECT builder for typed records.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::db::Database;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::IntoIdent;
use crate::logging::StatementKind;
use crate::qb::compile::{CompiledStatement, compile_count, compile_select};
use crate::qb::draft::Draft;
use crate::qb::traits::FilterQb;
use crate::row::{Record, map_rows};
use crate::session::ConnectionPool;
use crate::value::FromValue;

/// SELECT query builder returning `T` records.
///
/// The table defaults to `T::TABLE`. Results are not cached unless
/// [`cached`](Self::cached) is called.
pub struct SelectQb<T> {
    draft: Draft,
    cached: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for SelectQb<T> {
    fn clone(&self) -> Self {
        Self {
            draft: self.draft.clone(),
            cached: self.cached,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SelectQb<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectQb")
            .field("draft", &self.draft)
            .field("cached", &self.cached)
            .finish()
    }
}

impl<T: Record> Default for SelectQb<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> SelectQb<T> {
    pub fn new() -> Self {
        Self {
            draft: Draft::new(T::TABLE),
            cached: false,
            _marker: PhantomData,
        }
    }

    /// Read from another table than `T::TABLE`.
    pub fn table(mut self, table: impl IntoIdent) -> Self {
        self.draft.set_table(table);
        self
    }

    /// Select an explicit column list. An empty list is an error.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoIdent,
    {
        self.draft.set_columns(columns);
        self
    }

    /// Go back to `SELECT *`.
    pub fn select_all(mut self) -> Self {
        self.draft.columns = None;
        self
    }

    /// Append an ORDER BY term. `direction` is `ASC` or `DESC`, any case.
    pub fn order_by(mut self, column: impl IntoIdent, direction: &str) -> Self {
        self.draft.add_order(column, direction);
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.draft.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.draft.offset = Some(n);
        self
    }

    /// Serve `to_list` from the handle's result cache.
    pub fn cached(mut self) -> Self {
        self.cached = true;
        self
    }

    /// Compile for MySQL (`?` placeholders).
    pub fn compile(&self) -> OrmResult<CompiledStatement> {
        self.compile_for(Dialect::MySql)
    }

    pub fn compile_for(&self, dialect: Dialect) -> OrmResult<CompiledStatement> {
        compile_select(&self.draft, dialect)
    }

    /// Compile the matching `SELECT COUNT(*)`.
    pub fn compile_count(&self) -> OrmResult<CompiledStatement> {
        compile_count(&self.draft, Dialect::MySql)
    }

    /// Fetch every matching record.
    pub async fn to_list<P: ConnectionPool>(&self, db: &Database<P>) -> OrmResult<Arc<Vec<T>>> {
        let stmt = self.compile_for(db.dialect())?;
        db.fetch_records::<T>(&stmt, self.cached).await
    }

    /// Fetch the first matching record, adding `LIMIT 1` unless a limit is set.
    pub async fn first<P: ConnectionPool>(&self, db: &Database<P>) -> OrmResult<Option<T>> {
        let mut draft = self.draft.clone();
        draft.limit.get_or_insert(1);
        let stmt = compile_select(&draft, db.dialect())?;
        let rows = db.run_query(StatementKind::Select, &stmt).await?;
        Ok(map_rows::<T>(rows)?.into_iter().next())
    }

    /// Count matching rows. Ordering, limit and offset are ignored.
    pub async fn count<P: ConnectionPool>(&self, db: &Database<P>) -> OrmResult<u64> {
        let stmt = compile_count(&self.draft, db.dialect())?;
        let rows = db.run_query(StatementKind::Select, &stmt).await?;
        let value = rows
            .into_iter()
            .next()
            .and_then(|row| row.into_values().into_iter().next())
            .ok_or_else(|| OrmError::data_mapping("COUNT(*)", "query returned no value"))?;
        u64::from_value(value).map_err(|e| OrmError::data_mapping("COUNT(*)", e.to_string()))
    }
}

impl<T> FilterQb for SelectQb<T> {
    fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }
}
