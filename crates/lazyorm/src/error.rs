//! Error types for lazyorm

use thiserror::Error;

/// Result type alias for lazyorm operations
pub type OrmResult<T> = Result<T, OrmError>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for query building and execution.
///
/// The variants split along the point where a failure happens:
/// `Validation` never reaches the database, `Connection` / `PoolExhausted`
/// happen while borrowing a connection, `Query` is a dispatched statement the
/// driver rejected, and `DataMapping` is a result that does not fit the record.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Bad identifier, operator or argument shape (caught before any I/O)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Statement was dispatched but the driver/database failed it
    #[error("Query error: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Row shape or column value does not match the target record
    #[error("Data mapping error for {record}: {message}")]
    DataMapping { record: String, message: String },

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// No pooled connection was available
    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(String),

    /// Invalid connection configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl OrmError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a query error without an underlying driver error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            source: None,
        }
    }

    /// Create a query error that keeps the driver error as its source
    pub fn query_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Query {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a data mapping error for a record type
    pub fn data_mapping(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataMapping {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a query error
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }

    /// Check if this is a data mapping error
    pub fn is_data_mapping(&self) -> bool {
        matches!(self, Self::DataMapping { .. })
    }

    /// Check if this is a connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is a pool exhaustion error
    pub fn is_pool_exhausted(&self) -> bool {
        matches!(self, Self::PoolExhausted(_))
    }

    /// Parse a tokio_postgres error into a query error, keeping the driver error as source.
    #[cfg(feature = "pool")]
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let message = match err.as_db_error() {
            Some(db_err) => format!("{} ({})", db_err.message(), db_err.code().code()),
            None => err.to_string(),
        };
        if err.is_closed() {
            return Self::Connection(message);
        }
        Self::query_with_source(message, err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        let message = err.to_string();
        match err {
            deadpool_postgres::PoolError::Timeout(_) => Self::PoolExhausted(message),
            _ => Self::Connection(message),
        }
    }
}
