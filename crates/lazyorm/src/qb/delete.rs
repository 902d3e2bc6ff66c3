//! DELETE builder.

use crate::db::Database;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::IntoIdent;
use crate::logging::StatementKind;
use crate::qb::compile::{CompiledStatement, compile_delete};
use crate::qb::draft::Draft;
use crate::qb::traits::FilterQb;
use crate::session::ConnectionPool;

/// DELETE query builder.
///
/// Without a predicate that narrows the rows (an empty `NOT IN` does not),
/// `execute` refuses to run unless `confirm_all` is `true`.
#[derive(Clone, Debug)]
pub struct DeleteQb {
    draft: Draft,
}

impl DeleteQb {
    pub fn new(table: impl IntoIdent) -> Self {
        Self {
            draft: Draft::new(table),
        }
    }

    /// Cap the number of deleted rows (MySQL only).
    pub fn limit(mut self, n: u64) -> Self {
        self.draft.limit = Some(n);
        self
    }

    pub fn compile(&self) -> OrmResult<CompiledStatement> {
        self.compile_for(Dialect::MySql)
    }

    pub fn compile_for(&self, dialect: Dialect) -> OrmResult<CompiledStatement> {
        compile_delete(&self.draft, dialect)
    }

    /// Run the delete and return the affected row count.
    pub async fn execute<P: ConnectionPool>(
        &self,
        db: &Database<P>,
        confirm_all: bool,
    ) -> OrmResult<u64> {
        let stmt = self.compile_for(db.dialect())?;
        if !self.draft.restricts_rows() {
            if !confirm_all {
                return Err(OrmError::validation(
                    "DELETE without WHERE conditions would remove every row; pass confirm_all = true",
                ));
            }
            tracing::warn!(target: "lazyorm.sql", sql = %stmt.sql, "deleting every row of the table");
        }
        db.run_mutation(StatementKind::Delete, &stmt).await
    }
}

impl FilterQb for DeleteQb {
    fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }
}
