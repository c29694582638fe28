//! Query, insert, update and delete entry points.

use crate::client::{Database, GenericClient};
use crate::entity::{Entity, FieldIndex, FieldKind};
use crate::error::{OrmError, OrmResult};
use crate::logging::{QueryType, log_statement};
use crate::row::FromRows;
use crate::sql::{delete_sql, expand_in, insert_sql, update_sql};
use crate::value::Arg;

/// Run `sql` and convert the result into `T`.
///
/// `T` is a scalar (`i32`, `i64`, `f64`, `String`: first column of the
/// first row), an entity (last row wins) or `Vec` of an entity.
///
/// ```ignore
/// let users: Vec<User> = rowmap::query(&client, "SELECT * FROM users WHERE id IN $1", &rowmap::args![vec![1, 2, 3]]).await?;
/// let total: i64 = rowmap::query(&client, "SELECT COUNT(*) FROM users", &[]).await?;
/// ```
pub async fn query<T, C>(client: &C, sql: &str, args: &[Arg]) -> OrmResult<T>
where
    T: FromRows,
    C: GenericClient,
{
    let dialect = client.dialect();
    let stmt = expand_in(dialect, sql, args);
    log_statement(
        client.log_config(),
        QueryType::from_sql(stmt.sql()),
        dialect,
        &stmt,
    );
    let set = client.query(stmt.sql(), stmt.params()).await?;
    T::from_rows(set)
}

/// Insert `rows` in one transaction and return them with generated keys.
///
/// The key is written back when the primary-key field is an integer. If any
/// row fails, nothing is inserted.
pub async fn insert<T, C>(client: &mut C, rows: Vec<T>) -> OrmResult<Vec<T>>
where
    T: Entity,
    C: Database,
{
    let dialect = client.dialect();
    let key = FieldIndex::build::<T>()
        .primary_key()
        .filter(|pk| pk.kind() == FieldKind::Int)
        .map(|pk| (pk.name(), pk.column.clone()));

    crate::transaction!(client, tx, {
        let mut saved = Vec::with_capacity(rows.len());
        for mut row in rows {
            let stmt = insert_sql(dialect, &row)?;
            log_statement(tx.log_config(), QueryType::Insert, dialect, &stmt);
            let id = tx.insert_returning_id(stmt.sql(), stmt.params()).await?;
            if let (Some((field, column)), Some(id)) = (&key, id) {
                row.set(field, id)
                    .map_err(|e| OrmError::decode(column.as_str(), e.to_string()))?;
            }
            saved.push(row);
        }
        Ok(saved)
    })
}

/// Update every row in one transaction; returns the affected row count.
///
/// `filter` is a WHERE condition applied to each row's UPDATE, or a full
/// `UPDATE` statement. An empty filter matches each row by primary key.
pub async fn update<T, C>(client: &mut C, rows: &[T], filter: &str, args: &[Arg]) -> OrmResult<u64>
where
    T: Entity,
    C: Database,
{
    let dialect = client.dialect();

    crate::transaction!(client, tx, {
        let mut affected = 0;
        for row in rows {
            let stmt = update_sql(dialect, row, filter, args)?;
            log_statement(tx.log_config(), QueryType::Update, dialect, &stmt);
            affected += tx.execute(stmt.sql(), stmt.params()).await?;
        }
        Ok(affected)
    })
}

/// Delete the rows of `T`'s table matched by `filter`; returns the count.
///
/// ```ignore
/// rowmap::delete::<User, _>(&client, "id IN $1", &rowmap::args![vec![4, 5]]).await?;
/// ```
pub async fn delete<T, C>(client: &C, filter: &str, args: &[Arg]) -> OrmResult<u64>
where
    T: Entity,
    C: GenericClient,
{
    let dialect = client.dialect();
    let stmt = delete_sql::<T>(dialect, filter, args)?;
    log_statement(client.log_config(), QueryType::Delete, dialect, &stmt);
    client.execute(stmt.sql(), stmt.params()).await
}
