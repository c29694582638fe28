//! INSERT / UPDATE / DELETE text for an entity.

use super::{Statement, expand_in, starts_with_keywords};
use crate::dialect::Dialect;
use crate::entity::{Entity, FieldIndex, IndexedField};
use crate::error::{OrmError, OrmResult};
use crate::ident::table_name;
use crate::value::{Arg, Value};
use chrono::NaiveDateTime;

fn field_value<T: Entity>(entity: &T, field: &IndexedField) -> OrmResult<Value> {
    entity.get(field.name()).ok_or_else(|| {
        OrmError::validation(format!(
            "field '{}' of {} cannot be read",
            field.name(),
            T::TYPE_NAME
        ))
    })
}

fn is_zero_timestamp(value: &Value) -> bool {
    matches!(value, Value::Timestamp(t) if *t == NaiveDateTime::default())
}

/// Build the INSERT for one entity.
///
/// Primary keys and reference fields are left out. A zero timestamp becomes
/// the column default: the `DEFAULT` keyword where the dialect allows it,
/// otherwise the column is omitted.
pub fn insert_sql<T: Entity>(dialect: Dialect, entity: &T) -> OrmResult<Statement> {
    let index = FieldIndex::build::<T>();
    let table = table_name::<T>();

    let mut columns = Vec::new();
    let mut slots = Vec::new();
    let mut params = Vec::new();

    for field in index.writable() {
        let value = field_value(entity, field)?;
        if is_zero_timestamp(&value) {
            if dialect.supports_default_keyword() {
                columns.push(dialect.quote_column(&field.column));
                slots.push("DEFAULT".to_string());
            }
            continue;
        }
        columns.push(dialect.quote_column(&field.column));
        params.push(value);
        slots.push(dialect.placeholder(params.len()));
    }

    let mut sql = if columns.is_empty() {
        format!("INSERT INTO {table} DEFAULT VALUES")
    } else {
        format!(
            "INSERT INTO {table}({}) VALUES ({})",
            columns.join(","),
            slots.join(",")
        )
    };

    if let Some(returning) = index
        .primary_key()
        .and_then(|pk| dialect.returning(&pk.column))
    {
        sql.push_str(&returning);
    }

    Ok(Statement::new(sql, params))
}

enum Target<'a> {
    Filter(String),
    Key(&'a IndexedField, Value),
}

/// Build the UPDATE for one entity.
///
/// `filter` is either a WHERE condition or a complete statement starting
/// with `UPDATE`, which is used as is. An empty filter targets the row by
/// its primary key.
pub fn update_sql<T: Entity>(
    dialect: Dialect,
    entity: &T,
    filter: &str,
    args: &[Arg],
) -> OrmResult<Statement> {
    if starts_with_keywords(filter, &["UPDATE"]) {
        return Ok(expand_in(dialect, filter, args));
    }

    let index = FieldIndex::build::<T>();
    let table = table_name::<T>();

    let mut set_values = Vec::new();
    for field in index.writable() {
        set_values.push((field, field_value(entity, field)?));
    }
    if set_values.is_empty() {
        return Err(OrmError::validation(format!(
            "{} has no columns to update",
            T::TYPE_NAME
        )));
    }

    let filter = filter.trim();
    let (target, mut residual) = if filter.is_empty() {
        if !args.is_empty() {
            return Err(OrmError::validation(
                "update arguments given without a filter",
            ));
        }
        let pk = index.primary_key().ok_or_else(|| {
            OrmError::validation(format!(
                "update of {} needs a filter: the type has no primary key",
                T::TYPE_NAME
            ))
        })?;
        (Target::Key(pk, field_value(entity, pk)?), Vec::new())
    } else {
        let (sql, params) = expand_in(dialect, filter, args).into_parts();
        (Target::Filter(sql), params)
    };

    // Numbered placeholders follow the caller's arguments; positional ones
    // must precede them to match their order in the text.
    let mut params = Vec::with_capacity(residual.len() + set_values.len() + 1);
    if dialect == Dialect::Postgres {
        params.append(&mut residual);
    }

    let mut sets = Vec::with_capacity(set_values.len());
    for (field, value) in set_values {
        params.push(value);
        sets.push(format!(
            "{}={}",
            dialect.quote_column(&field.column),
            dialect.placeholder(params.len())
        ));
    }
    params.append(&mut residual);

    let condition = match target {
        Target::Filter(condition) => condition,
        Target::Key(pk, value) => {
            params.push(value);
            format!(
                "{} = {}",
                dialect.quote_column(&pk.column),
                dialect.placeholder(params.len())
            )
        }
    };

    Ok(Statement::new(
        format!("UPDATE {table} SET {} WHERE {condition}", sets.join(",")),
        params,
    ))
}

/// Build the DELETE for an entity type.
///
/// `filter` is either a WHERE condition or a complete statement starting
/// with `DELETE FROM`. An empty filter is rejected.
pub fn delete_sql<T: Entity>(dialect: Dialect, filter: &str, args: &[Arg]) -> OrmResult<Statement> {
    if filter.trim().is_empty() {
        return Err(OrmError::validation(format!(
            "delete from {} requires a filter",
            table_name::<T>()
        )));
    }

    let sql = if starts_with_keywords(filter, &["DELETE", "FROM"]) {
        filter.to_string()
    } else {
        format!("DELETE FROM {} WHERE {}", table_name::<T>(), filter)
    };

    Ok(expand_in(dialect, &sql, args))
}
