//! Convenient imports for typical `lazyorm` usage.
//!
//! ```ignore
//! use lazyorm::prelude::*;
//! ```

pub use crate::qb::{self, FilterQb};
pub use crate::{
    ConnectionConfig, ConnectionPool, Database, Dialect, OrmConfig, OrmError, OrmResult, Record,
    Value,
};

#[cfg(feature = "pool")]
pub use crate::{PgPool, create_pool, create_pool_from_url};

#[cfg(feature = "mysql")]
pub use crate::{MySqlPool, create_mysql_pool, create_mysql_pool_from_url};
