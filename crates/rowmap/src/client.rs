//! Driver contract.
//!
//! The engine talks to databases only through these traits. PostgreSQL
//! clients and transactions (plain `tokio-postgres` or pooled
//! `deadpool-postgres`) implement them here; SQLite lives in
//! [`sqlite`](crate::sqlite).

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::logging::SqlLogConfig;
use crate::row::RowSet;
use crate::value::Value;
use crate::value::postgres::{as_params, build_row_set};
use std::future::Future;
use tokio_postgres::GenericClient as PgGenericClient;

/// A connection or transaction the engine can run statements on.
///
/// Implemented for clients and for transactions, so any operation can be
/// composed into a caller's transaction.
pub trait GenericClient: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Logging configuration for statements run through this client.
    fn log_config(&self) -> &SqlLogConfig {
        SqlLogConfig::shared_default()
    }

    /// Prepare `sql` and run it once, collecting every row.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<RowSet>> + Send;

    /// Run a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> impl Future<Output = OrmResult<u64>> + Send;

    /// Run an INSERT and return the key of the new row, if the dialect
    /// reports one.
    fn insert_returning_id(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Option<Value>>> + Send;
}

/// A client that can open transactions.
pub trait Database: GenericClient {
    type Tx<'a>: TransactionClient
    where
        Self: 'a;

    fn begin(&mut self) -> impl Future<Output = OrmResult<Self::Tx<'_>>> + Send;
}

/// An open transaction.
///
/// Dropping it without calling either method rolls it back.
pub trait TransactionClient: GenericClient {
    fn commit(self) -> impl Future<Output = OrmResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = OrmResult<()>> + Send;
}

async fn pg_query<C>(client: &C, sql: &str, params: &[Value]) -> OrmResult<RowSet>
where
    C: PgGenericClient + Sync,
{
    let stmt = client.prepare(sql).await.map_err(OrmError::from_db_error)?;
    let rows = client
        .query(&stmt, &as_params(params))
        .await
        .map_err(OrmError::from_db_error)?;
    let columns = stmt.columns().iter().map(|c| c.name().to_string()).collect();
    build_row_set(columns, &rows)
}

async fn pg_execute<C>(client: &C, sql: &str, params: &[Value]) -> OrmResult<u64>
where
    C: PgGenericClient + Sync,
{
    client
        .execute(sql, &as_params(params))
        .await
        .map_err(OrmError::from_db_error)
}

/// Reads the `RETURNING` column of the first row.
async fn pg_insert_returning_id<C>(
    client: &C,
    sql: &str,
    params: &[Value],
) -> OrmResult<Option<Value>>
where
    C: PgGenericClient + Sync,
{
    let set = pg_query(client, sql, params).await?;
    Ok(set
        .into_rows()
        .into_iter()
        .next()
        .and_then(|row| row.into_iter().next()))
}

impl GenericClient for tokio_postgres::Client {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<RowSet> {
        pg_query(self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        pg_execute(self, sql, params).await
    }

    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Value>> {
        pg_insert_returning_id(self, sql, params).await
    }
}

impl Database for tokio_postgres::Client {
    type Tx<'a> = tokio_postgres::Transaction<'a>;

    async fn begin(&mut self) -> OrmResult<Self::Tx<'_>> {
        self.transaction().await.map_err(OrmError::from_db_error)
    }
}

impl GenericClient for tokio_postgres::Transaction<'_> {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<RowSet> {
        pg_query(self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        pg_execute(self, sql, params).await
    }

    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Value>> {
        pg_insert_returning_id(self, sql, params).await
    }
}

/// Nested transactions are savepoints.
impl<'t> Database for tokio_postgres::Transaction<'t> {
    type Tx<'a>
        = tokio_postgres::Transaction<'a>
    where
        Self: 'a;

    async fn begin(&mut self) -> OrmResult<Self::Tx<'_>> {
        self.transaction().await.map_err(OrmError::from_db_error)
    }
}

impl TransactionClient for tokio_postgres::Transaction<'_> {
    async fn commit(self) -> OrmResult<()> {
        tokio_postgres::Transaction::commit(self)
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn rollback(self) -> OrmResult<()> {
        tokio_postgres::Transaction::rollback(self)
            .await
            .map_err(OrmError::from_db_error)
    }
}

// ===== deadpool-postgres support =====

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Client {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<RowSet> {
        // Delegate to the deref target (tokio_postgres::Client).
        let client: &tokio_postgres::Client = self;
        pg_query(client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        let client: &tokio_postgres::Client = self;
        pg_execute(client, sql, params).await
    }

    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Value>> {
        let client: &tokio_postgres::Client = self;
        pg_insert_returning_id(client, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl Database for deadpool_postgres::Client {
    type Tx<'a> = deadpool_postgres::Transaction<'a>;

    async fn begin(&mut self) -> OrmResult<Self::Tx<'_>> {
        self.transaction().await.map_err(OrmError::from_db_error)
    }
}

#[cfg(feature = "pool")]
impl GenericClient for deadpool_postgres::Transaction<'_> {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<RowSet> {
        let tx: &tokio_postgres::Transaction<'_> = self;
        pg_query(tx, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        let tx: &tokio_postgres::Transaction<'_> = self;
        pg_execute(tx, sql, params).await
    }

    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Value>> {
        let tx: &tokio_postgres::Transaction<'_> = self;
        pg_insert_returning_id(tx, sql, params).await
    }
}

#[cfg(feature = "pool")]
impl TransactionClient for deadpool_postgres::Transaction<'_> {
    async fn commit(self) -> OrmResult<()> {
        deadpool_postgres::Transaction::commit(self)
            .await
            .map_err(OrmError::from_db_error)
    }

    async fn rollback(self) -> OrmResult<()> {
        deadpool_postgres::Transaction::rollback(self)
            .await
            .map_err(OrmError::from_db_error)
    }
}
