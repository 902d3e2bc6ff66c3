//! UPDATE builder.

use crate::db::Database;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::IntoIdent;
use crate::logging::StatementKind;
use crate::qb::compile::{CompiledStatement, compile_update};
use crate::qb::draft::Draft;
use crate::qb::traits::FilterQb;
use crate::session::ConnectionPool;
use crate::value::Value;

/// UPDATE query builder.
///
/// Renders `UPDATE t SET a = ?, b = ? WHERE ...`; SET parameters come before
/// WHERE parameters. Without a predicate that narrows the rows (an empty
/// `NOT IN` does not), `execute` refuses to run unless `confirm_all` is `true`.
#[derive(Clone, Debug)]
pub struct UpdateQb {
    draft: Draft,
}

impl UpdateQb {
    pub fn new(table: impl IntoIdent) -> Self {
        Self {
            draft: Draft::new(table),
        }
    }

    /// Add `column = value` to the SET list.
    pub fn set(mut self, column: impl IntoIdent, value: impl Into<Value>) -> Self {
        self.draft.set_value(column, value.into());
        self
    }

    /// Add several SET assignments in order.
    pub fn set_many<I, C, V>(mut self, assignments: I) -> Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: IntoIdent,
        V: Into<Value>,
    {
        for (column, value) in assignments {
            self.draft.set_value(column, value.into());
        }
        self
    }

    pub fn compile(&self) -> OrmResult<CompiledStatement> {
        self.compile_for(Dialect::MySql)
    }

    pub fn compile_for(&self, dialect: Dialect) -> OrmResult<CompiledStatement> {
        compile_update(&self.draft, dialect)
    }

    /// Run the update and return the affected row count.
    pub async fn execute<P: ConnectionPool>(
        &self,
        db: &Database<P>,
        confirm_all: bool,
    ) -> OrmResult<u64> {
        let stmt = self.compile_for(db.dialect())?;
        if !self.draft.restricts_rows() {
            if !confirm_all {
                return Err(OrmError::validation(
                    "UPDATE without WHERE conditions would affect every row; pass confirm_all = true",
                ));
            }
            tracing::warn!(target: "lazyorm.sql", sql = %stmt.sql, "updating every row of the table");
        }
        db.run_mutation(StatementKind::Update, &stmt).await
    }
}

impl FilterQb for UpdateQb {
    fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }
}
