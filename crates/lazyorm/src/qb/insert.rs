//! Bulk INSERT builder for typed records.

use crate::db::Database;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::{Ident, IntoIdent};
use crate::qb::compile::compile_insert;
use crate::row::{Record, check_arity};
use crate::session::ConnectionPool;
use crate::value::Value;

/// Inserts a list of records in chunks over one connection.
///
/// The statement is generated from `T::TABLE` and `T::FIELDS` unless a fixed
/// parameterized statement is given with [`statement`](Self::statement).
/// Each chunk is committed on its own; the total inserted row count is
/// returned.
#[derive(Clone, Debug)]
pub struct InsertQb<T> {
    table: Option<Ident>,
    records: Vec<T>,
    statement: Option<String>,
    batch_size: Option<usize>,
    build_error: Option<String>,
}

impl<T: Record> Default for InsertQb<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> InsertQb<T> {
    pub fn new() -> Self {
        Self {
            table: None,
            records: Vec::new(),
            statement: None,
            batch_size: None,
            build_error: None,
        }
    }

    fn record_error(&mut self, message: String) {
        self.build_error.get_or_insert(message);
    }

    /// Insert into another table than `T::TABLE`.
    pub fn table(mut self, table: impl IntoIdent) -> Self {
        match table.into_ident() {
            Ok(t) => self.table = Some(t),
            Err(OrmError::Validation(msg)) => self.record_error(msg),
            Err(err) => self.record_error(err.to_string()),
        }
        self
    }

    pub fn records(mut self, records: impl IntoIterator<Item = T>) -> Self {
        self.records.extend(records);
        self
    }

    pub fn record(mut self, record: T) -> Self {
        self.records.push(record);
        self
    }

    /// Use a fixed statement instead of the generated one.
    ///
    /// Its placeholders must match `T::to_values()` in order.
    pub fn statement(mut self, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        if sql.trim().is_empty() {
            self.record_error("INSERT statement cannot be empty".into());
        } else {
            self.statement = Some(sql);
        }
        self
    }

    /// Rows per chunk (and per commit). Must be greater than zero.
    pub fn batch_size(mut self, n: usize) -> Self {
        if n == 0 {
            self.record_error("batch size must be greater than zero".into());
        } else {
            self.batch_size = Some(n);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn compile(&self) -> OrmResult<String> {
        self.compile_for(Dialect::MySql)
    }

    /// The single-row statement run for every record.
    pub fn compile_for(&self, dialect: Dialect) -> OrmResult<String> {
        if let Some(err) = &self.build_error {
            return Err(OrmError::Validation(err.clone()));
        }
        if let Some(sql) = &self.statement {
            return Ok(sql.clone());
        }
        let table = match &self.table {
            Some(t) => t.clone(),
            None => Ident::parse(T::TABLE)?,
        };
        let columns = T::FIELDS
            .iter()
            .map(|f| Ident::parse(f))
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(compile_insert(&table, &columns, dialect))
    }

    /// Insert every record and return the total row count.
    pub async fn execute<P: ConnectionPool>(&self, db: &Database<P>) -> OrmResult<u64> {
        let sql = self.compile_for(db.dialect())?;
        if self.records.is_empty() {
            return Err(OrmError::validation("No records to insert"));
        }
        let batch_size = self.batch_size.unwrap_or(db.config().insert_batch_size);
        if batch_size == 0 {
            return Err(OrmError::validation("batch size must be greater than zero"));
        }

        let rows: Vec<Vec<Value>> = self.records.iter().map(T::to_values).collect();
        if self.statement.is_none() {
            for row in &rows {
                check_arity(T::NAME, T::FIELDS.len(), row.len())?;
            }
        }

        db.run_batch(&sql, &rows, batch_size).await
    }
}
