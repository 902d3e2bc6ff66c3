//! Placeholder and paging syntax of the target database.

use std::fmt::Write as _;

/// SQL flavour a pool speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// `?` placeholders, `LIMIT n OFFSET m`.
    #[default]
    MySql,
    /// `$1..$n` placeholders.
    Postgres,
}

impl Dialect {
    /// Append the placeholder for the 1-based parameter `idx`.
    pub(crate) fn write_placeholder(self, out: &mut String, idx: usize) {
        match self {
            Dialect::MySql => out.push('?'),
            Dialect::Postgres => {
                let _ = write!(out, "${idx}");
            }
        }
    }

    /// Append `LIMIT` / `OFFSET` clauses.
    ///
    /// MySQL has no bare `OFFSET`, so an offset without a limit uses the
    /// largest unsigned row count as the limit.
    pub(crate) fn write_paging(self, out: &mut String, limit: Option<u64>, offset: Option<u64>) {
        match (self, limit, offset) {
            (_, Some(limit), _) => {
                let _ = write!(out, " LIMIT {limit}");
                if let Some(offset) = offset {
                    let _ = write!(out, " OFFSET {offset}");
                }
            }
            (Dialect::MySql, None, Some(offset)) => {
                let _ = write!(out, " LIMIT {} OFFSET {offset}", u64::MAX);
            }
            (Dialect::Postgres, None, Some(offset)) => {
                let _ = write!(out, " OFFSET {offset}");
            }
            (_, None, None) => {}
        }
    }
}
