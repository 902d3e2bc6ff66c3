//! Positional parameter collection used while rendering a statement.

use crate::dialect::Dialect;
use crate::value::Value;

/// Bound values in placeholder order.
#[derive(Clone, Debug)]
pub struct ParamList {
    dialect: Dialect,
    params: Vec<Value>,
}

impl ParamList {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    /// Add a parameter and return its 1-based index.
    pub fn push(&mut self, value: Value) -> usize {
        self.params.push(value);
        self.params.len()
    }

    /// Add a parameter and append its placeholder to `out`.
    pub(crate) fn push_placeholder(&mut self, out: &mut String, value: Value) {
        let idx = self.push(value);
        self.dialect.write_placeholder(out, idx);
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.params
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.params
    }
}
