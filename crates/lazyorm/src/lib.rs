//! # lazyorm
//!
//! A fluent query builder with pooled execution, typed row mapping and a
//! read-through result cache.
//!
//! ## Features
//!
//! - **Injection-safe**: table/column names, operators and sort directions are
//!   validated against allow-lists; values are always bound parameters
//! - **Deferred validation**: chaining never panics; the first bad input fails
//!   the terminal call before a connection is borrowed
//! - **Scoped connections**: one pooled connection per statement, released on
//!   every path; writes commit on success and roll back on failure
//! - **Safe defaults**: UPDATE/DELETE without WHERE need `confirm_all = true`
//! - **Typed records**: `#[derive(Record)]` maps rows positionally
//! - **Result cache**: opt-in on SELECT, default on raw fetches, cleared
//!   explicitly by record type
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use lazyorm::prelude::*;
//!
//! #[derive(Debug, Clone, Record)]
//! #[orm(table = "users")]
//! struct User {
//!     id: i64,
//!     name: String,
//!     email: String,
//!     age: i32,
//! }
//!
//! let db = Database::new(create_pool(&ConnectionConfig::new("localhost", "app", "shop"))?);
//!
//! // SELECT
//! let users = qb::select::<User>()
//!     .filter("status", "active")
//!     .order_by("age", "DESC")
//!     .cached()
//!     .to_list(&db)
//!     .await?;
//!
//! // UPDATE
//! qb::update("users")
//!     .set("age", 29)
//!     .filter("name", "Alice Johnson")
//!     .execute(&db, false)
//!     .await?;
//!
//! // Writes do not invalidate cached reads.
//! db.clear_cache_for::<User>();
//! ```

// Lets `#[derive(Record)]` output (which names `::lazyorm`) compile inside this crate.
extern crate self as lazyorm;

pub mod cache;
pub mod condition;
pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod ident;
mod logging;
pub mod qb;
pub mod row;
pub mod session;
pub mod testing;
pub mod value;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "pool")]
pub mod pool;

pub mod prelude;

pub use cache::{CacheKey, CacheStats, ResultCache};
pub use condition::{IntoOperand, Op, Operand, Predicate, SortDirection};
pub use config::{ConnectionConfig, OrmConfig};
pub use db::Database;
pub use dialect::Dialect;
pub use error::{OrmError, OrmResult};
pub use ident::{Ident, IntoIdent, validate_identifier};
pub use logging::StatementKind;
pub use qb::{
    CompiledStatement, DeleteQb, FetchQb, FilterQb, InsertQb, SelectQb, UpdateQb,
};
pub use row::{Record, Row, map_rows};
pub use session::{Connection, ConnectionPool, Session};
pub use value::{ConversionError, FromValue, Value, parse_date};

#[cfg(feature = "mysql")]
pub use mysql::{MySqlConnection, MySqlPool, create_mysql_pool, create_mysql_pool_from_url};
#[cfg(feature = "pool")]
pub use pool::{PgConnection, PgPool, create_pool, create_pool_from_url};

#[cfg(feature = "derive")]
pub use lazyorm_derive::Record;
