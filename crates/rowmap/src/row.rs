//! Result sets and their conversion into destination types.

use crate::entity::{Entity, FieldIndex};
use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value, ValueError};

/// A fully materialized query result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }
}

/// Destination types accepted by [`query`](crate::query).
///
/// Implemented for `i32`, `i64`, `f64`, `String`, `Vec<T: Entity>` and, via
/// `#[derive(Entity)]`, for entity structs. Anything else is rejected by the
/// compiler.
pub trait FromRows: Sized {
    fn from_rows(set: RowSet) -> OrmResult<Self>;
}

fn decode_error(column: &str, err: ValueError) -> OrmError {
    OrmError::decode(column, err.to_string())
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {$(
        /// First column of the first row; no rows yields the default.
        impl FromRows for $ty {
            fn from_rows(set: RowSet) -> OrmResult<Self> {
                let column = set.columns.first().cloned().unwrap_or_default();
                match set.rows.into_iter().next().and_then(|row| row.into_iter().next()) {
                    Some(value) => <$ty>::from_value(value).map_err(|e| decode_error(&column, e)),
                    None => Ok(<$ty>::default()),
                }
            }
        }
    )*};
}

impl_scalar!(i32, i64, f64, String);

impl<T: Entity> FromRows for Vec<T> {
    fn from_rows(set: RowSet) -> OrmResult<Self> {
        let bindings = bindings::<T>(&set.columns);
        let mut out = Vec::with_capacity(set.rows.len());
        for row in set.rows {
            let mut entity = T::default();
            fill(&mut entity, &bindings, row)?;
            out.push(entity);
        }
        Ok(out)
    }
}

/// Maps one result column onto one entity field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub position: usize,
    pub column: String,
    pub field: &'static str,
}

/// Bindings for the result columns that match a field of `T`.
///
/// Columns without a matching field are skipped.
pub fn bindings<T: Entity>(columns: &[String]) -> Vec<Binding> {
    let index = FieldIndex::build::<T>();
    columns
        .iter()
        .enumerate()
        .filter_map(|(position, column)| {
            index.by_column(column).map(|field| Binding {
                position,
                column: column.clone(),
                field: field.name(),
            })
        })
        .collect()
}

fn fill<T: Entity>(entity: &mut T, bindings: &[Binding], mut row: Vec<Value>) -> OrmResult<()> {
    for binding in bindings {
        let value = row
            .get_mut(binding.position)
            .map(std::mem::take)
            .unwrap_or_default();
        entity
            .set(binding.field, value)
            .map_err(|e| decode_error(&binding.column, e))?;
    }
    Ok(())
}

/// Scan a result set into a single entity.
///
/// Every row targets the same receivers, so the last row wins. No rows
/// leaves `T::default()`.
pub fn unmarshal_struct<T: Entity>(set: RowSet) -> OrmResult<T> {
    let bindings = bindings::<T>(&set.columns);
    let mut entity = T::default();
    if let Some(last) = set.rows.into_iter().last() {
        fill(&mut entity, &bindings, last)?;
    }
    Ok(entity)
}
