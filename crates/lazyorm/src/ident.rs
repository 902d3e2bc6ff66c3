//! Safe SQL identifier handling.
//!
//! [`Ident`] is the only way a table or column name reaches SQL text. Values are
//! always bound as parameters; identifiers cannot be, so they are validated here.
//!
//! - Each dotted part must be non-empty and contain only `[A-Za-z0-9_]`
//! - Parts are joined with `.` (`schema.table`, `t.column`)
//! - Whitespace, quotes, `;`, `-`, `*` and every other character are rejected
//!
//! # Example
//! ```ignore
//! use lazyorm::Ident;
//!
//! let t = Ident::parse("shop.orders")?;
//! assert!(Ident::parse("id; DROP TABLE users;").is_err());
//! # Ok::<(), lazyorm::OrmError>(())
//! ```

use crate::error::{OrmError, OrmResult};
use std::fmt;

/// A validated SQL identifier (table or column name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    parts: Vec<String>,
}

impl Ident {
    /// Parse and validate an identifier, supporting dotted notation.
    pub fn parse(s: &str) -> OrmResult<Self> {
        if s.is_empty() {
            return Err(OrmError::validation("Identifier cannot be empty"));
        }

        let mut parts = Vec::new();
        for segment in s.split('.') {
            if segment.is_empty() {
                return Err(OrmError::validation(format!(
                    "Invalid identifier '{s}': empty segment"
                )));
            }
            if let Some(c) = segment
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
            {
                return Err(OrmError::validation(format!(
                    "Invalid identifier '{s}': character '{c}' is not allowed"
                )));
            }
            parts.push(segment.to_string());
        }

        Ok(Self { parts })
    }

    /// Dotted parts of the identifier.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let cap = self.parts.iter().map(String::len).sum::<usize>() + self.parts.len() - 1;
        let mut out = String::with_capacity(cap);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(part);
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Validate a table or column name.
pub fn validate_identifier(name: &str) -> OrmResult<Ident> {
    Ident::parse(name)
}

/// Convert an input into an [`Ident`].
///
/// This is mainly for ergonomics in builder APIs.
pub trait IntoIdent {
    fn into_ident(self) -> OrmResult<Ident>;
}

impl IntoIdent for Ident {
    fn into_ident(self) -> OrmResult<Ident> {
        Ok(self)
    }
}

impl IntoIdent for &Ident {
    fn into_ident(self) -> OrmResult<Ident> {
        Ok(self.clone())
    }
}

impl IntoIdent for &str {
    fn into_ident(self) -> OrmResult<Ident> {
        Ident::parse(self)
    }
}

impl IntoIdent for String {
    fn into_ident(self) -> OrmResult<Ident> {
        Ident::parse(&self)
    }
}

impl IntoIdent for &String {
    fn into_ident(self) -> OrmResult<Ident> {
        Ident::parse(self)
    }
}
