//! SQLite backend over `rusqlite`.
//!
//! The connection sits behind an async mutex; each statement locks it, runs
//! synchronously, and releases it before returning. Prepared statements never
//! outlive the lock.
//!
//! ```ignore
//! let client = SqliteClient::open_in_memory()?;
//! client.execute_batch("CREATE TABLE user (id INTEGER PRIMARY KEY, name TEXT)").await?;
//! let saved = rowmap::insert(&mut client, vec![User { name: "ann".into(), ..Default::default() }]).await?;
//! ```

use crate::client::{Database, GenericClient, TransactionClient};
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::logging::SqlLogConfig;
use crate::row::RowSet;
use crate::value::Value;
use crate::value::sqlite::{build_row_set, to_sqlite};
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

fn run_query(conn: &Connection, sql: &str, params: &[Value]) -> OrmResult<RowSet> {
    let mut stmt = conn.prepare(sql)?;
    build_row_set(&mut stmt, params)
}

fn run_execute(conn: &Connection, sql: &str, params: &[Value]) -> OrmResult<u64> {
    let mut stmt = conn.prepare(sql)?;
    let affected = stmt.execute(rusqlite::params_from_iter(params.iter().map(to_sqlite)))?;
    Ok(affected as u64)
}

fn run_insert(conn: &Connection, sql: &str, params: &[Value]) -> OrmResult<Option<Value>> {
    run_execute(conn, sql, params)?;
    Ok(Some(Value::Int(conn.last_insert_rowid())))
}

/// A SQLite connection.
#[derive(Debug)]
pub struct SqliteClient {
    conn: Mutex<Connection>,
    log: SqlLogConfig,
}

impl SqliteClient {
    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn open_in_memory() -> OrmResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            log: SqlLogConfig::default(),
        }
    }

    pub fn with_log_config(mut self, config: SqlLogConfig) -> Self {
        self.log = config;
        self
    }

    /// Run several `;`-separated statements without parameters (DDL, fixtures).
    pub async fn execute_batch(&self, sql: &str) -> OrmResult<()> {
        self.conn.lock().await.execute_batch(sql)?;
        Ok(())
    }

    pub fn into_inner(self) -> Connection {
        self.conn.into_inner()
    }
}

impl GenericClient for SqliteClient {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn log_config(&self) -> &SqlLogConfig {
        &self.log
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<RowSet> {
        let conn = self.conn.lock().await;
        run_query(&conn, sql, params)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        let conn = self.conn.lock().await;
        run_execute(&conn, sql, params)
    }

    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Value>> {
        let conn = self.conn.lock().await;
        run_insert(&conn, sql, params)
    }
}

impl Database for SqliteClient {
    type Tx<'a> = SqliteTransaction<'a>;

    async fn begin(&mut self) -> OrmResult<Self::Tx<'_>> {
        self.conn.lock().await.execute_batch("BEGIN")?;
        Ok(SqliteTransaction {
            client: self,
            depth: 0,
            finished: false,
        })
    }
}

/// An open SQLite transaction, or a savepoint inside one.
///
/// Rolled back on drop unless committed.
#[derive(Debug)]
pub struct SqliteTransaction<'a> {
    client: &'a SqliteClient,
    /// 0 for the outer transaction, n for the n-th nested savepoint.
    depth: usize,
    finished: bool,
}

impl SqliteTransaction<'_> {
    fn savepoint_name(&self) -> String {
        format!("rowmap_sp_{}", self.depth)
    }

    fn commit_sql(&self) -> String {
        match self.depth {
            0 => "COMMIT".to_string(),
            _ => format!("RELEASE {}", self.savepoint_name()),
        }
    }

    fn rollback_sql(&self) -> String {
        match self.depth {
            0 => "ROLLBACK".to_string(),
            _ => {
                let name = self.savepoint_name();
                format!("ROLLBACK TO {name}; RELEASE {name}")
            }
        }
    }
}

impl GenericClient for SqliteTransaction<'_> {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn log_config(&self) -> &SqlLogConfig {
        &self.client.log
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<RowSet> {
        self.client.query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        self.client.execute(sql, params).await
    }

    async fn insert_returning_id(&self, sql: &str, params: &[Value]) -> OrmResult<Option<Value>> {
        self.client.insert_returning_id(sql, params).await
    }
}

impl<'t> Database for SqliteTransaction<'t> {
    type Tx<'a>
        = SqliteTransaction<'a>
    where
        Self: 'a;

    async fn begin(&mut self) -> OrmResult<Self::Tx<'_>> {
        let depth = self.depth + 1;
        self.client
            .execute_batch(&format!("SAVEPOINT rowmap_sp_{depth}"))
            .await?;
        Ok(SqliteTransaction {
            client: self.client,
            depth,
            finished: false,
        })
    }
}

impl TransactionClient for SqliteTransaction<'_> {
    async fn commit(mut self) -> OrmResult<()> {
        self.client.execute_batch(&self.commit_sql()).await?;
        self.finished = true;
        Ok(())
    }

    async fn rollback(mut self) -> OrmResult<()> {
        self.client.execute_batch(&self.rollback_sql()).await?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match self.client.conn.try_lock() {
            Ok(conn) => {
                if let Err(e) = conn.execute_batch(&self.rollback_sql()) {
                    tracing::warn!(target: "rowmap::sql", error = %e, "rollback of dropped transaction failed");
                }
            }
            Err(_) => {
                tracing::warn!(target: "rowmap::sql", "connection busy; dropped transaction left open");
            }
        }
    }
}
