//! Fluent query builders.
//!
//! Builders collect state through chained calls and compile it into one
//! parameterized statement when a terminal method runs. Identifiers,
//! operators and sort directions are validated as they are added; values are
//! always bound as parameters.
//!
//! # Usage
//!
//! ```ignore
//! use lazyorm::prelude::*;
//!
//! // SELECT
//! let users = qb::select::<User>()
//!     .filter("status", "active")
//!     .order_by("age", "DESC")
//!     .limit(20)
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
//! // DELETE
//! qb::delete("users")
//!     .in_list("id", vec![1, 2, 3])
//!     .execute(&db, false)
//!     .await?;
//!
//! // Bulk INSERT, 1000 rows per commit
//! let inserted = qb::insert::<User>()
//!     .records(new_users)
//!     .execute(&db)
//!     .await?;
//!
//! // Raw SELECT, cached
//! let rows = qb::fetch::<User>("SELECT id, name, email, age FROM users WHERE age > ?")
//!     .bind(30)
//!     .get(&db)
//!     .await?;
//! ```

mod compile;
mod delete;
mod draft;
mod fetch;
mod insert;
pub(crate) mod param;
mod select;
mod traits;
mod update;

pub use compile::CompiledStatement;
pub use delete::DeleteQb;
pub use draft::Draft;
pub use fetch::FetchQb;
pub use insert::InsertQb;
pub use param::ParamList;
pub use select::SelectQb;
pub use traits::FilterQb;
pub use update::UpdateQb;

use crate::ident::IntoIdent;
use crate::row::Record;

/// Create a SELECT builder reading `T` from `T::TABLE`.
pub fn select<T: Record>() -> SelectQb<T> {
    SelectQb::new()
}

/// Create an UPDATE builder for `table`.
pub fn update(table: impl IntoIdent) -> UpdateQb {
    UpdateQb::new(table)
}

/// Create a DELETE builder for `table`.
pub fn delete(table: impl IntoIdent) -> DeleteQb {
    DeleteQb::new(table)
}

/// Create a bulk INSERT builder for `T`.
pub fn insert<T: Record>() -> InsertQb<T> {
    InsertQb::new()
}

/// Create a raw SELECT builder mapping rows to `T`.
pub fn fetch<T: Record>(sql: impl Into<String>) -> FetchQb<T> {
    FetchQb::new(sql)
}
