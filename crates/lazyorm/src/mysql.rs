//! MySQL pool adapter built on `mysql_async`.
//!
//! [`MySqlPool`] implements [`ConnectionPool`] with `?` placeholders. Like the
//! Postgres adapter, writes open a transaction lazily on the first `execute`
//! and the session ends it with an explicit `COMMIT` or `ROLLBACK`.

use mysql_async::consts::ColumnType;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, OptsBuilder, Params, Pool, PoolConstraints, PoolOpts};

use crate::config::ConnectionConfig;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::session::{Connection, ConnectionPool};
use crate::value::Value;

/// Collation id MySQL reports for binary strings (BLOB, VARBINARY).
const BINARY_CHARSET: u16 = 63;

impl From<mysql_async::Error> for OrmError {
    fn from(err: mysql_async::Error) -> Self {
        match err {
            mysql_async::Error::Io(_) => Self::Connection(err.to_string()),
            mysql_async::Error::Url(_) => Self::Configuration(err.to_string()),
            mysql_async::Error::Server(ref server) => {
                let message = format!("{} ({})", server.message, server.code);
                Self::query_with_source(message, err)
            }
            other => Self::query_with_source(other.to_string(), other),
        }
    }
}

/// Build a MySQL pool from a validated [`ConnectionConfig`].
///
/// # Example
///
/// ```ignore
/// let config = ConnectionConfig::new("localhost", "app", "shop").password("secret");
/// let db = Database::new(lazyorm::create_mysql_pool(&config)?);
/// db.ping().await?;
/// ```
pub fn create_mysql_pool(config: &ConnectionConfig) -> OrmResult<MySqlPool> {
    config.validate()?;

    let builder = OptsBuilder::default()
        .ip_or_hostname(config.host.clone())
        .tcp_port(config.port)
        .user(Some(config.user.clone()))
        .pass((!config.password.is_empty()).then(|| config.password.clone()))
        .db_name(Some(config.database.clone()))
        .pool_opts(pool_opts(config.pool_size)?);

    let pool = MySqlPool::new(Pool::new(Opts::from(builder)));
    tracing::info!(
        target: "lazyorm.pool",
        pool = %config.pool_name,
        host = %config.host,
        database = %config.database,
        size = config.pool_size,
        "mysql connection pool created"
    );
    Ok(pool)
}

/// Build a MySQL pool from a `mysql://` URL.
pub fn create_mysql_pool_from_url(database_url: &str, max_size: usize) -> OrmResult<MySqlPool> {
    let opts = Opts::from_url(database_url).map_err(|e| OrmError::configuration(e.to_string()))?;
    let builder = OptsBuilder::from_opts(opts).pool_opts(pool_opts(max_size)?);
    Ok(MySqlPool::new(Pool::new(Opts::from(builder))))
}

fn pool_opts(max_size: usize) -> OrmResult<PoolOpts> {
    let constraints = PoolConstraints::new(0, max_size)
        .filter(|_| max_size > 0)
        .ok_or_else(|| OrmError::configuration("Pool size must be greater than 0"))?;
    Ok(PoolOpts::default().with_constraints(constraints))
}

/// A `mysql_async` pool usable as a [`ConnectionPool`].
#[derive(Clone, Debug)]
pub struct MySqlPool {
    pool: Pool,
}

impl MySqlPool {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn inner(&self) -> &Pool {
        &self.pool
    }
}

impl ConnectionPool for MySqlPool {
    type Conn = MySqlConnection;

    async fn acquire(&self) -> OrmResult<MySqlConnection> {
        let conn = self.pool.get_conn().await?;
        Ok(MySqlConnection { conn, in_tx: false })
    }

    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }
}

/// A pooled MySQL connection.
pub struct MySqlConnection {
    conn: Conn,
    in_tx: bool,
}

fn params(values: &[Value]) -> Params {
    if values.is_empty() {
        Params::Empty
    } else {
        Params::Positional(values.iter().map(to_mysql).collect())
    }
}

impl MySqlConnection {
    async fn begin_if_needed(&mut self) -> OrmResult<()> {
        if !self.in_tx {
            self.conn.query_drop("START TRANSACTION").await?;
            self.in_tx = true;
        }
        Ok(())
    }

    async fn finish(&mut self, sql: &str) -> OrmResult<()> {
        if !self.in_tx {
            return Ok(());
        }
        self.in_tx = false;
        self.conn.query_drop(sql).await?;
        Ok(())
    }
}

impl Connection for MySqlConnection {
    async fn query(&mut self, sql: &str, values: &[Value]) -> OrmResult<Vec<Row>> {
        let rows: Vec<mysql_async::Row> = self.conn.exec(sql, params(values)).await?;
        rows.into_iter().map(decode_row).collect()
    }

    async fn execute(&mut self, sql: &str, values: &[Value]) -> OrmResult<u64> {
        self.begin_if_needed().await?;
        self.conn.exec_drop(sql, params(values)).await?;
        Ok(self.conn.affected_rows())
    }

    async fn execute_batch(&mut self, sql: &str, rows: &[Vec<Value>]) -> OrmResult<u64> {
        self.begin_if_needed().await?;
        let stmt = self.conn.prep(sql).await?;
        let mut total = 0;
        for values in rows {
            self.conn.exec_drop(stmt.clone(), params(values)).await?;
            total += self.conn.affected_rows();
        }
        Ok(total)
    }

    async fn commit(&mut self) -> OrmResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(&mut self) -> OrmResult<()> {
        self.finish("ROLLBACK").await
    }

    // Dropping a `Conn` returns it to the pool, which resets the session
    // (`COM_RESET_CONNECTION`) and so discards any open transaction.
    fn release(self) {}
}

fn to_mysql(value: &Value) -> mysql_async::Value {
    use mysql_async::Value as My;
    use chrono::{Datelike, Timelike};

    match value {
        Value::Null => My::NULL,
        Value::Bool(v) => My::Int(i64::from(*v)),
        Value::Int(v) => My::Int(*v),
        Value::UInt(v) => My::UInt(*v),
        Value::Float(v) => My::Double(*v),
        Value::Text(v) => My::Bytes(v.as_bytes().to_vec()),
        Value::Bytes(v) => My::Bytes(v.clone()),
        Value::Date(d) => My::Date(year(d.year()), d.month() as u8, d.day() as u8, 0, 0, 0, 0),
        Value::DateTime(dt) => My::Date(
            year(dt.year()),
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            dt.and_utc().timestamp_subsec_micros(),
        ),
        Value::Uuid(v) => My::Bytes(v.hyphenated().to_string().into_bytes()),
        Value::Json(v) => My::Bytes(v.to_string().into_bytes()),
    }
}

/// MySQL DATE/DATETIME cover years 0..=9999.
fn year(y: i32) -> u16 {
    y.clamp(0, 9999) as u16
}

fn decode_row(mut row: mysql_async::Row) -> OrmResult<Row> {
    let columns = row.columns();
    (0..columns.len())
        .map(|idx| {
            let column = &columns[idx];
            let raw = row.take::<mysql_async::Value, _>(idx).unwrap_or(mysql_async::Value::NULL);
            from_mysql(raw, column.column_type(), column.character_set() == BINARY_CHARSET)
                .map_err(|message| {
                    OrmError::data_mapping("row", format!("column '{}': {message}", column.name_str()))
                })
        })
        .collect::<OrmResult<Vec<_>>>()
        .map(Row::new)
}

fn from_mysql(raw: mysql_async::Value, ty: ColumnType, binary: bool) -> Result<Value, String> {
    use mysql_async::Value as My;

    let value = match raw {
        My::NULL => Value::Null,
        My::Int(v) => Value::Int(v),
        My::UInt(v) => Value::UInt(v),
        My::Float(v) => Value::Float(f64::from(v)),
        My::Double(v) => Value::Float(v),
        My::Bytes(bytes) if ty == ColumnType::MYSQL_TYPE_JSON => {
            let json = serde_json::from_slice(&bytes).map_err(|e| e.to_string())?;
            Value::Json(json)
        }
        My::Bytes(bytes) if binary => Value::Bytes(bytes),
        My::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(text) => Value::Text(text),
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        My::Date(y, m, d, h, mi, s, us) => {
            let date = chrono::NaiveDate::from_ymd_opt(i32::from(y), u32::from(m), u32::from(d))
                .ok_or_else(|| format!("invalid date {y:04}-{m:02}-{d:02}"))?;
            if ty == ColumnType::MYSQL_TYPE_DATE {
                Value::Date(date)
            } else {
                let dt = date
                    .and_hms_micro_opt(u32::from(h), u32::from(mi), u32::from(s), us)
                    .ok_or_else(|| format!("invalid time {h:02}:{mi:02}:{s:02}"))?;
                Value::DateTime(dt)
            }
        }
        My::Time(negative, days, h, mi, s, us) => {
            let hours = u64::from(days) * 24 + u64::from(h);
            let sign = if negative { "-" } else { "" };
            let text = if us == 0 {
                format!("{sign}{hours:02}:{mi:02}:{s:02}")
            } else {
                format!("{sign}{hours:02}:{mi:02}:{s:02}.{us:06}")
            };
            Value::Text(text)
        }
    };
    Ok(value)
}
