//! Postgres pool adapter built on `deadpool-postgres`.
//!
//! [`PgPool`] implements [`ConnectionPool`] with `$n` placeholders. Writes run
//! inside a transaction opened lazily on the first `execute` and closed by the
//! session's commit / rollback; reads run outside a transaction.

use std::error::Error as StdError;

use bytes::BytesMut;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::NoTls;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

use crate::config::ConnectionConfig;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::session::{Connection, ConnectionPool};
use crate::value::Value;

type BoxError = Box<dyn StdError + Sync + Send>;

/// Build a pool from a validated [`ConnectionConfig`] (plain TCP, no TLS).
///
/// # Example
///
/// ```ignore
/// let config = ConnectionConfig::new("localhost", "app", "shop").password("secret").port(5432);
/// let db = Database::new(lazyorm::create_pool(&config)?);
/// db.ping().await?;
/// ```
pub fn create_pool(config: &ConnectionConfig) -> OrmResult<PgPool> {
    config.validate()?;

    let mut pg_config = tokio_postgres::Config::new();
    pg_config
        .host(&config.host)
        .port(config.port)
        .user(&config.user)
        .dbname(&config.database)
        .application_name(&config.pool_name);
    if !config.password.is_empty() {
        pg_config.password(&config.password);
    }

    let pool = build_pool(pg_config, config.pool_size)?;
    tracing::info!(
        target: "lazyorm.pool",
        pool = %config.pool_name,
        host = %config.host,
        database = %config.database,
        size = config.pool_size,
        "connection pool created"
    );
    Ok(pool)
}

/// Build a pool from a `postgres://` URL.
pub fn create_pool_from_url(database_url: &str, max_size: usize) -> OrmResult<PgPool> {
    if max_size == 0 {
        return Err(OrmError::configuration("Pool size must be greater than 0"));
    }
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| OrmError::configuration(e.to_string()))?;
    build_pool(pg_config, max_size)
}

fn build_pool(pg_config: tokio_postgres::Config, max_size: usize) -> OrmResult<PgPool> {
    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, manager_config);
    let pool = Pool::builder(mgr)
        .max_size(max_size)
        .build()
        .map_err(|e| OrmError::configuration(e.to_string()))?;
    Ok(PgPool { pool })
}

/// A `deadpool-postgres` pool usable as a [`ConnectionPool`].
#[derive(Clone)]
pub struct PgPool {
    pool: Pool,
}

impl PgPool {
    /// Wrap an existing deadpool pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn inner(&self) -> &Pool {
        &self.pool
    }
}

impl std::fmt::Debug for PgPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.pool.status();
        f.debug_struct("PgPool")
            .field("max_size", &status.max_size)
            .field("size", &status.size)
            .field("available", &status.available)
            .finish()
    }
}

impl ConnectionPool for PgPool {
    type Conn = PgConnection;

    async fn acquire(&self) -> OrmResult<PgConnection> {
        let client = self.pool.get().await?;
        Ok(PgConnection {
            client,
            in_tx: false,
        })
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }
}

/// A pooled Postgres connection.
pub struct PgConnection {
    client: Object,
    in_tx: bool,
}

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

impl PgConnection {
    async fn begin_if_needed(&mut self) -> OrmResult<()> {
        if !self.in_tx {
            self.client
                .batch_execute("BEGIN")
                .await
                .map_err(OrmError::from_db_error)?;
            self.in_tx = true;
        }
        Ok(())
    }

    async fn finish(&mut self, sql: &str) -> OrmResult<()> {
        if !self.in_tx {
            return Ok(());
        }
        self.in_tx = false;
        self.client
            .batch_execute(sql)
            .await
            .map_err(OrmError::from_db_error)
    }
}

impl Connection for PgConnection {
    async fn query(&mut self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        let rows = self
            .client
            .query(sql, &param_refs(params))
            .await
            .map_err(OrmError::from_db_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.begin_if_needed().await?;
        self.client
            .execute(sql, &param_refs(params))
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn execute_batch(&mut self, sql: &str, rows: &[Vec<Value>]) -> OrmResult<u64> {
        self.begin_if_needed().await?;
        let stmt = self
            .client
            .prepare_cached(sql)
            .await
            .map_err(OrmError::from_db_error)?;
        let mut total = 0;
        for params in rows {
            total += self
                .client
                .execute(&stmt, &param_refs(params))
                .await
                .map_err(OrmError::from_db_error)?;
        }
        Ok(total)
    }

    async fn commit(&mut self) -> OrmResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(&mut self) -> OrmResult<()> {
        self.finish("ROLLBACK").await
    }

    fn release(self) {
        if self.in_tx {
            // An open transaction must not go back to the pool.
            drop(Object::take(self.client));
        }
    }
}

fn write_int(v: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::INT2 {
        i16::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::OID {
        u32::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::FLOAT4 {
        (v as f32).to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        (v as f64).to_sql(ty, out)
    } else {
        v.to_sql(ty, out)
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::Int(v) => write_int(*v, ty, out),
            Value::UInt(v) => write_int(i64::try_from(*v)?, ty, out),
            Value::Float(v) if *ty == Type::FLOAT4 => (*v as f32).to_sql(ty, out),
            Value::Float(v) => v.to_sql(ty, out),
            Value::Text(v) => v.to_sql(ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Date(v) => v.to_sql(ty, out),
            Value::DateTime(v) if *ty == Type::TIMESTAMPTZ => v.and_utc().to_sql(ty, out),
            Value::DateTime(v) => v.to_sql(ty, out),
            Value::Uuid(v) => v.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn decode_row(row: &tokio_postgres::Row) -> OrmResult<Row> {
    (0..row.len())
        .map(|idx| decode_column(row, idx))
        .collect::<OrmResult<Vec<_>>>()
        .map(Row::new)
}

fn decode_column(row: &tokio_postgres::Row, idx: usize) -> OrmResult<Value> {
    let column = &row.columns()[idx];
    let ty = column.type_();

    macro_rules! get {
        ($t:ty) => {
            row.try_get::<_, Option<$t>>(idx)
                .map_err(|e| {
                    OrmError::data_mapping("row", format!("column '{}': {e}", column.name()))
                })?
                .map(Value::from)
        };
    }

    let value = if *ty == Type::BOOL {
        get!(bool)
    } else if *ty == Type::INT2 {
        get!(i16)
    } else if *ty == Type::INT4 {
        get!(i32)
    } else if *ty == Type::INT8 {
        get!(i64)
    } else if *ty == Type::OID {
        get!(u32)
    } else if *ty == Type::FLOAT4 {
        get!(f32)
    } else if *ty == Type::FLOAT8 {
        get!(f64)
    } else if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME, Type::UNKNOWN].contains(ty) {
        get!(String)
    } else if *ty == Type::BYTEA {
        row.try_get::<_, Option<Vec<u8>>>(idx)
            .map_err(|e| OrmError::data_mapping("row", format!("column '{}': {e}", column.name())))?
            .map(Value::Bytes)
    } else if *ty == Type::DATE {
        get!(chrono::NaiveDate)
    } else if *ty == Type::TIMESTAMP {
        get!(chrono::NaiveDateTime)
    } else if *ty == Type::TIMESTAMPTZ {
        get!(chrono::DateTime<chrono::Utc>)
    } else if *ty == Type::UUID {
        get!(uuid::Uuid)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        get!(serde_json::Value)
    } else {
        return Err(OrmError::data_mapping(
            "row",
            format!("unsupported type {ty} for column '{}'", column.name()),
        ));
    };

    Ok(value.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Value, ty: &Type) -> Result<(IsNull, Vec<u8>), BoxError> {
        let mut buf = BytesMut::new();
        let is_null = value.to_sql(ty, &mut buf)?;
        Ok((is_null, buf.to_vec()))
    }

    #[test]
    fn null_encodes_as_null() {
        let (is_null, _) = encode(&Value::Null, &Type::INT4).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
    }

    #[test]
    fn int_narrows_to_column_width() {
        let (_, bytes) = encode(&Value::Int(7), &Type::INT4).unwrap();
        assert_eq!(bytes, 7i32.to_be_bytes());
        let (_, bytes) = encode(&Value::Int(7), &Type::INT2).unwrap();
        assert_eq!(bytes, 7i16.to_be_bytes());
        let (_, bytes) = encode(&Value::UInt(7), &Type::INT8).unwrap();
        assert_eq!(bytes, 7i64.to_be_bytes());
    }

    #[test]
    fn int_overflow_is_an_error() {
        assert!(encode(&Value::Int(i64::from(i32::MAX) + 1), &Type::INT4).is_err());
        assert!(encode(&Value::UInt(u64::MAX), &Type::INT8).is_err());
    }

    #[test]
    fn text_encodes_utf8() {
        let (_, bytes) = encode(&Value::from("héllo"), &Type::TEXT).unwrap();
        assert_eq!(bytes, "héllo".as_bytes());
    }

    #[test]
    fn url_pool_rejects_zero_size() {
        let err = create_pool_from_url("postgres://u@localhost/db", 0).unwrap_err();
        assert!(matches!(err, OrmError::Configuration(_)));
    }

    #[test]
    fn config_pool_validates_first() {
        let config = ConnectionConfig::new("", "u", "db");
        assert!(matches!(
            create_pool(&config).unwrap_err(),
            OrmError::Configuration(_)
        ));
    }
}
