//! Derive macros for dblayer
//!
//! Provides `#[derive(FromRow)]` and `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod from_row;
mod record;

/// Derive `FromRow` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use dblayer::FromRow;
///
/// #[derive(FromRow)]
/// struct User {
///     id: i64,
///     username: String,
///     #[db(column = "email_address")]
///     email: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[db(column = "name")]` - Read the field from a different column
/// - `#[db(skip)]` - Leave the field at `Default::default()`
#[proc_macro_derive(FromRow, attributes(db))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `Record`, the persistable column/value view used by inserts and updates.
///
/// Every field type must be `Clone + Into<dblayer::Value>`.
///
/// # Example
///
/// ```ignore
/// use dblayer::Record;
///
/// #[derive(Record)]
/// struct NewUser {
///     #[db(id)]
///     id: i64,
///     username: String,
///     #[db(column = "email_address")]
///     email: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[db(id)]` - Identity column; never written
/// - `#[db(column = "name")]` - Write the field to a different column
/// - `#[db(skip)]` - Not persisted
#[proc_macro_derive(Record, attributes(db))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
