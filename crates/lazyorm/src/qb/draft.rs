//! Accumulated builder state shared by the SELECT / UPDATE / DELETE builders.

use crate::condition::{Predicate, PredicateList, SortDirection};
use crate::error::{OrmError, OrmResult};
use crate::ident::{Ident, IntoIdent};
use crate::value::Value;

/// Everything a statement is compiled from.
///
/// Setters never fail. The first invalid input is kept in `build_error` and
/// reported when the draft is compiled.
#[derive(Clone, Debug, Default)]
pub struct Draft {
    pub(crate) table: Option<Ident>,
    /// `None` selects `*`.
    pub(crate) columns: Option<Vec<Ident>>,
    pub(crate) predicates: PredicateList,
    pub(crate) order: Vec<(Ident, SortDirection)>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) set: Vec<(Ident, Value)>,
    build_error: Option<String>,
}

impl Draft {
    pub(crate) fn new(table: impl IntoIdent) -> Self {
        let mut draft = Self::default();
        draft.set_table(table);
        draft
    }

    /// Keep the first error; later ones are usually consequences of it.
    pub(crate) fn record_error(&mut self, err: OrmError) {
        if self.build_error.is_some() {
            return;
        }
        let message = match err {
            OrmError::Validation(message) => message,
            other => other.to_string(),
        };
        self.build_error = Some(message);
    }

    pub(crate) fn build_error(&self) -> Option<&str> {
        self.build_error.as_deref()
    }

    pub(crate) fn set_table(&mut self, table: impl IntoIdent) {
        match table.into_ident() {
            Ok(table) => self.table = Some(table),
            Err(err) => self.record_error(err),
        }
    }

    pub(crate) fn set_columns<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: IntoIdent,
    {
        let parsed: OrmResult<Vec<Ident>> = columns.into_iter().map(IntoIdent::into_ident).collect();
        match parsed {
            Ok(cols) if cols.is_empty() => {
                self.record_error(OrmError::validation("select() requires at least one column"));
            }
            Ok(cols) => self.columns = Some(cols),
            Err(err) => self.record_error(err),
        }
    }

    pub(crate) fn add_predicate(&mut self, predicate: OrmResult<Predicate>) {
        match predicate {
            Ok(p) => self.predicates.push(p),
            Err(err) => self.record_error(err),
        }
    }

    pub(crate) fn add_order(&mut self, column: impl IntoIdent, direction: &str) {
        let parsed = column
            .into_ident()
            .and_then(|col| SortDirection::parse(direction).map(|dir| (col, dir)));
        match parsed {
            Ok(pair) => self.order.push(pair),
            Err(err) => self.record_error(err),
        }
    }

    /// Setting a column twice keeps its first position and its latest value.
    pub(crate) fn set_value(&mut self, column: impl IntoIdent, value: Value) {
        let column = match column.into_ident() {
            Ok(c) => c,
            Err(err) => return self.record_error(err),
        };
        match self.set.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.set.push((column, value)),
        }
    }

    /// Some predicate can narrow the affected rows. Predicates that always
    /// hold (an empty `NOT IN`) do not count.
    pub(crate) fn restricts_rows(&self) -> bool {
        self.predicates.restricts_rows()
    }

    /// The table to compile against, or the recorded validation error.
    pub(crate) fn checked_table(&self) -> OrmResult<&Ident> {
        if let Some(err) = &self.build_error {
            return Err(OrmError::Validation(err.clone()));
        }
        self.table
            .as_ref()
            .ok_or_else(|| OrmError::validation("No table specified"))
    }
}
