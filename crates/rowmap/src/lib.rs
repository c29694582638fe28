//! # rowmap
//!
//! A small struct-to-row mapper for PostgreSQL and SQLite.
//!
//! ## Features
//!
//! - **Raw SQL in, typed values out**: `query` accepts any SQL and converts
//!   the result into a scalar, an entity, or a `Vec` of entities.
//! - **No schema language**: column names come from field names
//!   (`createdAt` → `created_at`), overridable per field.
//! - **Generated writes**: `insert`, `update` and `delete` build their SQL
//!   from the entity and a caller-supplied filter.
//! - **`IN` lists**: a list argument expands inline into `IN $n` / `IN ?`.
//! - **All-or-nothing batches**: batch inserts and updates run in one
//!   transaction; generated keys are written back.
//! - **Checked conversions**: values never truncate silently.
//!
//! ```ignore
//! use rowmap::prelude::*;
//!
//! #[derive(Debug, Default, Entity)]
//! #[orm(table = "users")]
//! struct User {
//!     id: i64,
//!     name: String,
//!     email: String,
//! }
//!
//! let mut client = SqliteClient::open_in_memory()?;
//! let saved = rowmap::insert(&mut client, vec![User { name: "ann".into(), ..Default::default() }]).await?;
//! let found: Vec<User> = rowmap::query(&client, "SELECT * FROM users WHERE id IN ?", &args![vec![saved[0].id]]).await?;
//! rowmap::update(&mut client, &found, "", &[]).await?;
//! rowmap::delete::<User, _>(&client, "id = ?", &args![saved[0].id]).await?;
//! ```

pub mod client;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod ident;
pub mod logging;
pub mod ops;
pub mod prelude;
pub mod row;
pub mod sql;
pub mod transaction;
pub mod util;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(test)]
mod fixtures;

pub use client::{Database, GenericClient, TransactionClient};
pub use dialect::Dialect;
pub use entity::{Entity, FieldIndex, FieldKind, FieldMeta};
pub use error::{OrmError, OrmResult};
pub use ident::{column_name, table_name};
pub use logging::{LoggedClient, QueryType, SqlLogConfig};
pub use ops::{delete, insert, query, update};
pub use row::{FromRows, RowSet};
pub use sql::Statement;
pub use value::{Arg, FromValue, Json, ToValue, Value, ValueError};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteClient, SqliteTransaction};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config};

#[cfg(feature = "derive")]
pub use rowmap_derive::Entity;
