//! Result rows and the typed-record binding.

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};

/// One result row: column values in SELECT order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

/// A typed record bound to a table.
///
/// Rows are mapped positionally: column `i` of a result row feeds
/// `FIELDS[i]`. Usually derived with `#[derive(Record)]`.
///
/// # Example
///
/// ```ignore
/// use lazyorm::Record;
///
/// #[derive(Record)]
/// #[orm(table = "users")]
/// struct User {
///     id: i64,
///     name: String,
///     email: Option<String>,
/// }
/// ```
pub trait Record: Sized + Send + Sync + 'static {
    /// Type name used in errors and as the cache namespace.
    const NAME: &'static str;
    /// Default table for SELECT and INSERT builders.
    const TABLE: &'static str;
    /// Column names in declaration order.
    const FIELDS: &'static [&'static str];

    /// Build a record from one row's values (already arity-checked).
    fn from_values(values: Vec<Value>) -> OrmResult<Self>;

    /// Values in `FIELDS` order, for INSERT.
    fn to_values(&self) -> Vec<Value>;
}

/// Fail with `DataMapping` unless a row has exactly `expected` columns.
pub fn check_arity(record: &str, expected: usize, actual: usize) -> OrmResult<()> {
    if expected == actual {
        return Ok(());
    }
    Err(OrmError::data_mapping(
        record,
        format!("expected {expected} columns, row has {actual}"),
    ))
}

/// Convert one column value into a field type, naming the field on failure.
pub fn decode_field<V: FromValue>(
    record: &'static str,
    field: &'static str,
    value: Option<Value>,
) -> OrmResult<V> {
    let value = value
        .ok_or_else(|| OrmError::data_mapping(record, format!("missing column for field '{field}'")))?;
    V::from_value(value)
        .map_err(|e| OrmError::data_mapping(record, format!("field '{field}': {e}")))
}

/// Map one row into `T`.
pub fn map_row<T: Record>(row: Row) -> OrmResult<T> {
    check_arity(T::NAME, T::FIELDS.len(), row.len())?;
    T::from_values(row.into_values())
}

/// Map every row into `T`, stopping at the first failure.
pub fn map_rows<T: Record>(rows: Vec<Row>) -> OrmResult<Vec<T>> {
    rows.into_iter().map(map_row::<T>).collect()
}
