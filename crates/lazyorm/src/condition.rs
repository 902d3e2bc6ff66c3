//! Comparison operators, sort directions and WHERE predicates.
//!
//! Operators and directions arrive as caller strings (`">="`, `"not in"`,
//! `"desc"`) and are checked against a closed allow-list before anything is
//! rendered. Values never reach SQL text; they become bound parameters.

use crate::error::{OrmError, OrmResult};
use crate::ident::{Ident, IntoIdent};
use crate::qb::param::ParamList;
use crate::value::Value;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Allowed comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Like,
    In,
    NotIn,
}

impl Op {
    /// Parse a caller-supplied operator.
    ///
    /// Matching is case-insensitive, ignores surrounding whitespace and
    /// collapses the gap inside `NOT IN`. `<>` is not accepted.
    pub fn parse(op: &str) -> OrmResult<Self> {
        let normalized = op
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        match normalized.as_str() {
            "=" => Ok(Op::Eq),
            "!=" => Ok(Op::Ne),
            ">" => Ok(Op::Gt),
            "<" => Ok(Op::Lt),
            ">=" => Ok(Op::Gte),
            "<=" => Ok(Op::Lte),
            "LIKE" => Ok(Op::Like),
            "IN" => Ok(Op::In),
            "NOT IN" => Ok(Op::NotIn),
            _ => Err(OrmError::validation(format!(
                "Invalid operator '{op}'. Allowed operators: =, !=, >, <, >=, <=, LIKE, IN, NOT IN"
            ))),
        }
    }

    /// Canonical SQL spelling.
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::Gte => ">=",
            Op::Lte => "<=",
            Op::Like => "LIKE",
            Op::In => "IN",
            Op::NotIn => "NOT IN",
        }
    }

    /// `IN` / `NOT IN` take a list operand.
    pub fn takes_list(self) -> bool {
        matches!(self, Op::In | Op::NotIn)
    }
}

impl FromStr for Op {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Op::parse(s)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// ORDER BY direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(direction: &str) -> OrmResult<Self> {
        match direction.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(OrmError::validation(format!(
                "Invalid sort direction '{direction}'. Use ASC or DESC"
            ))),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = OrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortDirection::parse(s)
    }
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Value),
    List(Vec<Value>),
}

/// Conversion of filter arguments into an [`Operand`].
///
/// Scalars (numbers, strings, dates, `Value`, `Option<T>`) become
/// [`Operand::Scalar`]; `Vec<T>`, arrays and slices become [`Operand::List`].
pub trait IntoOperand {
    fn into_operand(self) -> Operand;
}

macro_rules! impl_scalar_operand {
    ($($t:ty),* $(,)?) => {
        $(impl IntoOperand for $t {
            fn into_operand(self) -> Operand {
                Operand::Scalar(Value::from(self))
            }
        })*
    };
}

impl_scalar_operand!(
    i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, bool,
    &str, String, &String,
    NaiveDate, NaiveDateTime, chrono::DateTime<chrono::Utc>,
    Uuid, serde_json::Value,
);

impl IntoOperand for Value {
    fn into_operand(self) -> Operand {
        Operand::Scalar(self)
    }
}

impl<T: Into<Value>> IntoOperand for Option<T> {
    fn into_operand(self) -> Operand {
        Operand::Scalar(Value::from(self))
    }
}

impl<T: Into<Value>> IntoOperand for Vec<T> {
    fn into_operand(self) -> Operand {
        Operand::List(self.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> IntoOperand for [T; N] {
    fn into_operand(self) -> Operand {
        Operand::List(self.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> IntoOperand for &[T] {
    fn into_operand(self) -> Operand {
        Operand::List(self.iter().cloned().map(Into::into).collect())
    }
}

impl IntoOperand for Operand {
    fn into_operand(self) -> Operand {
        self
    }
}

/// A validated `column op operand` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    column: Ident,
    op: Op,
    operand: Operand,
}

impl Predicate {
    /// Build a predicate, checking the column name and the operand shape.
    pub fn new(column: impl IntoIdent, op: Op, operand: impl IntoOperand) -> OrmResult<Self> {
        let column = column.into_ident()?;
        let operand = operand.into_operand();
        match (&operand, op.takes_list()) {
            (Operand::Scalar(_), true) => {
                return Err(OrmError::validation(format!(
                    "{op} on '{column}' requires a list of values"
                )));
            }
            (Operand::List(_), false) => {
                return Err(OrmError::validation(format!(
                    "Operator {op} on '{column}' does not accept a list"
                )));
            }
            _ => {}
        }
        Ok(Self {
            column,
            op,
            operand,
        })
    }

    pub fn column(&self) -> &Ident {
        &self.column
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// `NOT IN ()` renders as `1=1` and matches every row.
    pub fn is_always_true(&self) -> bool {
        self.op == Op::NotIn && matches!(&self.operand, Operand::List(values) if values.is_empty())
    }

    /// Render into `out`, pushing bound values into `params`.
    pub(crate) fn build(&self, out: &mut String, params: &mut ParamList) {
        match &self.operand {
            Operand::List(values) if values.is_empty() => {
                out.push_str(if self.op == Op::In { "1=0" } else { "1=1" });
            }
            Operand::List(values) => {
                self.column.write_sql(out);
                out.push(' ');
                out.push_str(self.op.as_sql());
                out.push_str(" (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    params.push_placeholder(out, value.clone());
                }
                out.push(')');
            }
            Operand::Scalar(value) => {
                self.column.write_sql(out);
                out.push(' ');
                out.push_str(self.op.as_sql());
                out.push(' ');
                params.push_placeholder(out, value.clone());
            }
        }
    }
}

/// Ordered predicates joined with `AND`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateList {
    items: Vec<Predicate>,
}

impl PredicateList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.items.push(predicate);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.items.iter()
    }

    /// At least one predicate can narrow the matched rows.
    pub fn restricts_rows(&self) -> bool {
        self.items.iter().any(|p| !p.is_always_true())
    }

    /// Append ` WHERE p1 AND p2 ...` (nothing when empty).
    pub(crate) fn write_where(&self, out: &mut String, params: &mut ParamList) {
        for (i, predicate) in self.items.iter().enumerate() {
            out.push_str(if i == 0 { " WHERE " } else { " AND " });
            predicate.build(out, params);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    #[test]
    fn op_parse_allow_list() {
        assert_eq!(Op::parse("=").unwrap(), Op::Eq);
        assert_eq!(Op::parse(" >= ").unwrap(), Op::Gte);
        assert_eq!(Op::parse("like").unwrap(), Op::Like);
        assert_eq!(Op::parse("not   in").unwrap(), Op::NotIn);
        assert_eq!("In".parse::<Op>().unwrap(), Op::In);
    }

    #[test]
    fn op_parse_rejects_others() {
        for bad in ["<>", "==", "OR 1=1", "ILIKE", "", "NOTIN", "; DROP"] {
            assert!(Op::parse(bad).unwrap_err().is_validation(), "{bad:?}");
        }
    }

    #[test]
    fn sort_direction_parse() {
        assert_eq!(SortDirection::parse("asc").unwrap(), SortDirection::Asc);
        assert_eq!(SortDirection::parse("DESC").unwrap(), SortDirection::Desc);
        assert!(SortDirection::parse("sideways").is_err());
        assert!(SortDirection::parse("DESC; DROP TABLE x").is_err());
    }

    #[test]
    fn predicate_shape_checks() {
        assert!(Predicate::new("id", Op::In, 5).unwrap_err().is_validation());
        assert!(Predicate::new("id", Op::Eq, vec![1, 2]).unwrap_err().is_validation());
        assert!(Predicate::new("id; --", Op::Eq, 1).unwrap_err().is_validation());
        assert!(Predicate::new("id", Op::In, [1, 2]).is_ok());
    }

    #[test]
    fn in_list_expands_placeholders() {
        let mut list = PredicateList::new();
        list.push(Predicate::new("status", Op::Eq, "active").unwrap());
        list.push(Predicate::new("id", Op::In, vec![1, 2, 3]).unwrap());

        let mut sql = String::new();
        let mut params = ParamList::new(Dialect::Postgres);
        list.write_where(&mut sql, &mut params);

        assert_eq!(sql, " WHERE status = $1 AND id IN ($2, $3, $4)");
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn empty_lists_are_constant() {
        let mut list = PredicateList::new();
        list.push(Predicate::new("id", Op::In, Vec::<i64>::new()).unwrap());
        list.push(Predicate::new("id", Op::NotIn, Vec::<i64>::new()).unwrap());

        let mut sql = String::new();
        let mut params = ParamList::new(Dialect::MySql);
        list.write_where(&mut sql, &mut params);

        assert_eq!(sql, " WHERE 1=0 AND 1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn empty_not_in_does_not_restrict() {
        let mut list = PredicateList::new();
        assert!(!list.restricts_rows());
        list.push(Predicate::new("id", Op::NotIn, Vec::<i64>::new()).unwrap());
        assert!(!list.restricts_rows());
        list.push(Predicate::new("id", Op::In, Vec::<i64>::new()).unwrap());
        assert!(list.restricts_rows());
    }

    #[test]
    fn option_none_binds_null() {
        let p = Predicate::new("deleted_at", Op::Eq, None::<NaiveDate>).unwrap();
        assert_eq!(p.operand(), &Operand::Scalar(Value::Null));
    }
}
