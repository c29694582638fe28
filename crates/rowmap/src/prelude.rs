//! Common imports.
//!
//! ```ignore
//! use rowmap::prelude::*;
//! ```

pub use crate::{
    Arg, Database, Entity, FromRows, GenericClient, Json, OrmError, OrmResult, SqlLogConfig,
    TransactionClient, Value, args, delete, insert, query, update,
};

#[cfg(feature = "sqlite")]
pub use crate::SqliteClient;

#[cfg(feature = "pool")]
pub use crate::{create_pool, create_pool_with_config};
