//! `tracing` events for executed statements (target `lazyorm.sql`).

use tracing::Level;

use crate::config::OrmConfig;
use crate::error::OrmError;
use crate::value::Value;

/// Kind of statement, reported as a field on every SQL event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// Truncate to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

fn display_sql(config: &OrmConfig, sql: &str) -> String {
    match config.max_sql_length {
        Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
        _ => sql.to_string(),
    }
}

fn display_params(config: &OrmConfig, params: &[Value]) -> Option<String> {
    if !config.log_params {
        return None;
    }
    serde_json::to_string(params).ok()
}

/// Emit the per-statement event before it runs.
pub(crate) fn log_statement(config: &OrmConfig, kind: StatementKind, sql: &str, params: &[Value]) {
    macro_rules! emit_at_level {
        ($level:expr, $($field:tt)*) => {
            match $level {
                Level::ERROR => tracing::error!($($field)*),
                Level::WARN => tracing::warn!($($field)*),
                Level::INFO => tracing::info!($($field)*),
                Level::DEBUG => tracing::debug!($($field)*),
                Level::TRACE => tracing::trace!($($field)*),
            }
        };
    }

    let sql = display_sql(config, sql);
    match display_params(config, params) {
        Some(bound) => emit_at_level!(
            config.sql_log_level,
            target: "lazyorm.sql",
            kind = ?kind,
            param_count = params.len(),
            sql = %sql,
            params = %bound,
        ),
        None => emit_at_level!(
            config.sql_log_level,
            target: "lazyorm.sql",
            kind = ?kind,
            param_count = params.len(),
            sql = %sql,
        ),
    }
}

pub(crate) fn log_failure(config: &OrmConfig, kind: StatementKind, sql: &str, err: &OrmError) {
    tracing::error!(
        target: "lazyorm.sql",
        kind = ?kind,
        sql = %display_sql(config, sql),
        error = %err,
        "statement failed"
    );
}
