//! Derive macros for lazyorm
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod record;

/// Derive the `Record` trait for a struct.
///
/// Rows are mapped positionally, so the field order must match the order of
/// the selected columns (`SELECT *` follows the table definition).
///
/// # Example
///
/// ```ignore
/// use lazyorm::Record;
///
/// #[derive(Debug, Clone, Record)]
/// #[orm(table = "users")]
/// struct User {
///     id: i64,
///     name: String,
///     #[orm(column = "email_address")]
///     email: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table for SELECT / INSERT (defaults to the struct name)
/// - `#[orm(name = "Name")]` - Record name used in errors and cache keys (defaults to the struct name)
/// - `#[orm(column = "name")]` - Column name of a field (defaults to the field name)
///
/// Every field type must implement `FromValue` and `Clone`, and convert into `Value`.
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
