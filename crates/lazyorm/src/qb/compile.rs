//! Rendering of a [`Draft`] into SQL text plus bound parameters.
//!
//! Every function here is pure: the same draft and dialect always produce the
//! same SQL string and the same parameter order (SET values first, then WHERE
//! values left to right with IN lists expanded in place).

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::Ident;
use crate::qb::draft::Draft;
use crate::qb::param::ParamList;
use crate::value::Value;

/// A statement ready to be sent to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl CompiledStatement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

fn finish(sql: String, params: ParamList) -> CompiledStatement {
    CompiledStatement {
        sql,
        params: params.into_vec(),
    }
}

pub(crate) fn compile_select(draft: &Draft, dialect: Dialect) -> OrmResult<CompiledStatement> {
    let table = draft.checked_table()?;
    let mut params = ParamList::new(dialect);

    let mut sql = String::from("SELECT ");
    match &draft.columns {
        Some(cols) => write_list(&mut sql, cols),
        None => sql.push('*'),
    }
    sql.push_str(" FROM ");
    table.write_sql(&mut sql);

    draft.predicates.write_where(&mut sql, &mut params);

    for (i, (col, dir)) in draft.order.iter().enumerate() {
        sql.push_str(if i == 0 { " ORDER BY " } else { ", " });
        col.write_sql(&mut sql);
        sql.push(' ');
        sql.push_str(dir.as_sql());
    }

    dialect.write_paging(&mut sql, draft.limit, draft.offset);
    Ok(finish(sql, params))
}

pub(crate) fn compile_count(draft: &Draft, dialect: Dialect) -> OrmResult<CompiledStatement> {
    let table = draft.checked_table()?;
    let mut params = ParamList::new(dialect);

    let mut sql = String::from("SELECT COUNT(*) FROM ");
    table.write_sql(&mut sql);
    draft.predicates.write_where(&mut sql, &mut params);
    Ok(finish(sql, params))
}

pub(crate) fn compile_update(draft: &Draft, dialect: Dialect) -> OrmResult<CompiledStatement> {
    let table = draft.checked_table()?;
    if draft.set.is_empty() {
        return Err(OrmError::validation(format!(
            "UPDATE {table} has no SET values; call set() first"
        )));
    }
    let mut params = ParamList::new(dialect);

    let mut sql = String::from("UPDATE ");
    table.write_sql(&mut sql);
    for (i, (col, value)) in draft.set.iter().enumerate() {
        sql.push_str(if i == 0 { " SET " } else { ", " });
        col.write_sql(&mut sql);
        sql.push_str(" = ");
        params.push_placeholder(&mut sql, value.clone());
    }
    draft.predicates.write_where(&mut sql, &mut params);
    Ok(finish(sql, params))
}

pub(crate) fn compile_delete(draft: &Draft, dialect: Dialect) -> OrmResult<CompiledStatement> {
    let table = draft.checked_table()?;
    let mut params = ParamList::new(dialect);

    let mut sql = String::from("DELETE FROM ");
    table.write_sql(&mut sql);
    draft.predicates.write_where(&mut sql, &mut params);

    if let Some(limit) = draft.limit {
        if dialect == Dialect::Postgres {
            return Err(OrmError::validation("DELETE ... LIMIT is not supported by Postgres"));
        }
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    Ok(finish(sql, params))
}

/// `INSERT INTO <table> (c1, ...) VALUES (?, ...)` for one row.
pub(crate) fn compile_insert(table: &Ident, columns: &[Ident], dialect: Dialect) -> String {
    let mut sql = String::from("INSERT INTO ");
    table.write_sql(&mut sql);
    sql.push_str(" (");
    write_list(&mut sql, columns);
    sql.push_str(") VALUES (");
    for idx in 1..=columns.len() {
        if idx > 1 {
            sql.push_str(", ");
        }
        dialect.write_placeholder(&mut sql, idx);
    }
    sql.push(')');
    sql
}

fn write_list(sql: &mut String, idents: &[Ident]) {
    for (i, ident) in idents.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        ident.write_sql(sql);
    }
}
