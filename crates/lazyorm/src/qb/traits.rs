//! Shared WHERE-building methods for the SELECT / UPDATE / DELETE builders.

use crate::condition::{IntoOperand, Op, Predicate};
use crate::ident::IntoIdent;
use crate::qb::draft::Draft;

/// Builders that accumulate `AND`-joined predicates.
///
/// Every method validates its input immediately. An invalid column, operator
/// or operand shape does not panic; the first such error is kept and returned
/// by the next `compile()` or terminal call, before a connection is borrowed.
pub trait FilterQb: Sized {
    #[doc(hidden)]
    fn draft_mut(&mut self) -> &mut Draft;

    /// Add `column <op> value`, with `op` given as text (`">="`, `"NOT IN"`, ...).
    fn filter_op(mut self, column: impl IntoIdent, op: &str, value: impl IntoOperand) -> Self {
        let predicate = Op::parse(op).and_then(|op| Predicate::new(column, op, value));
        self.draft_mut().add_predicate(predicate);
        self
    }

    /// Add `column <op> value` with an already parsed operator.
    fn where_op(mut self, column: impl IntoIdent, op: Op, value: impl IntoOperand) -> Self {
        self.draft_mut()
            .add_predicate(Predicate::new(column, op, value));
        self
    }

    /// Add `column = value`.
    fn filter(self, column: impl IntoIdent, value: impl IntoOperand) -> Self {
        self.where_op(column, Op::Eq, value)
    }

    fn eq(self, column: impl IntoIdent, value: impl IntoOperand) -> Self {
        self.where_op(column, Op::Eq, value)
    }

    fn ne(self, column: impl IntoIdent, value: impl IntoOperand) -> Self {
        self.where_op(column, Op::Ne, value)
    }

    fn gt(self, column: impl IntoIdent, value: impl IntoOperand) -> Self {
        self.where_op(column, Op::Gt, value)
    }

    fn gte(self, column: impl IntoIdent, value: impl IntoOperand) -> Self {
        self.where_op(column, Op::Gte, value)
    }

    fn lt(self, column: impl IntoIdent, value: impl IntoOperand) -> Self {
        self.where_op(column, Op::Lt, value)
    }

    fn lte(self, column: impl IntoIdent, value: impl IntoOperand) -> Self {
        self.where_op(column, Op::Lte, value)
    }

    fn like(self, column: impl IntoIdent, pattern: impl IntoOperand) -> Self {
        self.where_op(column, Op::Like, pattern)
    }

    /// Add `column IN (...)`. An empty list matches nothing.
    fn in_list(self, column: impl IntoIdent, values: impl IntoOperand) -> Self {
        self.where_op(column, Op::In, values)
    }

    /// Add `column NOT IN (...)`. An empty list matches everything.
    fn not_in(self, column: impl IntoIdent, values: impl IntoOperand) -> Self {
        self.where_op(column, Op::NotIn, values)
    }
}
