//! Derive macros for rowmap
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod entity;

/// Derive `Entity` and `FromRows` for a struct with named fields.
///
/// The struct must also implement `Default`.
///
/// # Example
///
/// ```ignore
/// use rowmap::Entity;
///
/// #[derive(Debug, Default, Entity)]
/// #[orm(table = "accounts")]
/// struct Account {
///     #[orm(id)]
///     account_id: i64,
///     #[orm(column = "mail")]
///     email: String,
///     #[orm(default = "free")]
///     plan: String,
///     #[orm(skip)]
///     cache: Vec<u8>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Override the table name (struct level)
/// - `#[orm(id)]` - Mark field as primary key
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(default = "literal")]` - Literal used by `util::bind_default`
/// - `#[orm(readonly)]` - Read from rows, never written
/// - `#[orm(skip)]` - Not mapped at all
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
