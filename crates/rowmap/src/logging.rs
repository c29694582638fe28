//! SQL logging through `tracing`.
//!
//! Every statement the engine runs is rendered with its parameters inlined
//! and emitted on the `rowmap::sql` target:
//!
//! ```text
//! DEBUG rowmap::sql: op="update" dialect=postgres params=3 sql=UPDATE user SET name='b' WHERE id = 5
//! ```
//!
//! The configuration travels with the client. [`LoggedClient`] wraps any
//! client to change it; [`SqliteClient`](crate::sqlite::SqliteClient) carries
//! its own.

use crate::client::{Database, GenericClient, TransactionClient};
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::row::RowSet;
use crate::sql::{Statement, starts_with_keywords};
use crate::value::Value;
use std::future::Future;
use tracing::Level;

/// How statements are logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlLogConfig {
    pub enabled: bool,
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate rendered SQL to this many bytes. `None` keeps it whole.
    pub max_sql_length: Option<usize>,
}

static DEFAULT_CONFIG: SqlLogConfig = SqlLogConfig {
    enabled: true,
    level: Level::DEBUG,
    max_sql_length: Some(200),
};

impl Default for SqlLogConfig {
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}

impl SqlLogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration used by clients that carry none.
    pub fn shared_default() -> &'static SqlLogConfig {
        &DEFAULT_CONFIG
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn truncate<'a>(&self, sql: &'a str) -> std::borrow::Cow<'a, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)).into(),
            _ => sql.into(),
        }
    }
}

/// Cut `sql` to at most `max_bytes`, backing off to a char boundary.
fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// The kind of statement being logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl QueryType {
    /// Detect the statement kind from its leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        if starts_with_keywords(sql, &["SELECT"]) || starts_with_keywords(sql, &["WITH"]) {
            QueryType::Select
        } else if starts_with_keywords(sql, &["INSERT"]) {
            QueryType::Insert
        } else if starts_with_keywords(sql, &["UPDATE"]) {
            QueryType::Update
        } else if starts_with_keywords(sql, &["DELETE"]) {
            QueryType::Delete
        } else {
            QueryType::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::Select => "select",
            QueryType::Insert => "insert",
            QueryType::Update => "update",
            QueryType::Delete => "delete",
            QueryType::Other => "other",
        }
    }
}

/// Emit `stmt` with its parameters inlined.
pub(crate) fn log_statement(
    config: &SqlLogConfig,
    op: QueryType,
    dialect: Dialect,
    stmt: &Statement,
) {
    /// Dispatch a tracing event at a runtime-determined level.
    macro_rules! emit_at_level {
        ($level:expr, $($field:tt)*) => {
            match $level {
                Level::ERROR => tracing::error!($($field)*),
                Level::WARN  => tracing::warn!($($field)*),
                Level::INFO  => tracing::info!($($field)*),
                Level::DEBUG => tracing::debug!($($field)*),
                Level::TRACE => tracing::trace!($($field)*),
            }
        };
    }

    if !config.enabled || !tracing::level_enabled!(config.level) {
        return;
    }

    let rendered = stmt.render(dialect);
    let sql = config.truncate(&rendered);
    emit_at_level!(
        config.level,
        target: "rowmap::sql",
        op = op.as_str(),
        dialect = %dialect,
        params = stmt.params().len(),
        sql = %sql,
    );
}

/// A client with its own logging configuration.
///
/// ```ignore
/// let client = LoggedClient::new(client, SqlLogConfig::new().level(Level::INFO).no_truncate());
/// let users: Vec<User> = rowmap::query(&client, "SELECT * FROM users", &[]).await?;
/// ```
#[derive(Debug)]
pub struct LoggedClient<C> {
    inner: C,
    config: SqlLogConfig,
}

impl<C> LoggedClient<C> {
    pub fn new(inner: C, config: SqlLogConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: GenericClient> GenericClient for LoggedClient<C> {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn log_config(&self) -> &SqlLogConfig {
        &self.config
    }

    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<RowSet>> + Send {
        self.inner.query(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> impl Future<Output = OrmResult<u64>> + Send {
        self.inner.execute(sql, params)
    }

    fn insert_returning_id(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Option<Value>>> + Send {
        self.inner.insert_returning_id(sql, params)
    }
}

impl<C: Database> Database for LoggedClient<C> {
    type Tx<'a>
        = LoggedClient<C::Tx<'a>>
    where
        Self: 'a;

    fn begin(&mut self) -> impl Future<Output = OrmResult<Self::Tx<'_>>> + Send {
        let config = self.config.clone();
        let begin = self.inner.begin();
        async move { Ok(LoggedClient::new(begin.await?, config)) }
    }
}

impl<T: TransactionClient> TransactionClient for LoggedClient<T> {
    fn commit(self) -> impl Future<Output = OrmResult<()>> + Send {
        self.inner.commit()
    }

    fn rollback(self) -> impl Future<Output = OrmResult<()>> + Send {
        self.inner.rollback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundary() {
        let sql = "SELECT 'héllo'";
        // Byte 10 falls inside the two-byte 'é'.
        assert_eq!(truncate_sql_bytes(sql, 10), "SELECT 'h");
        assert_eq!(truncate_sql_bytes(sql, 100), sql);
    }

    #[test]
    fn config_builder() {
        let config = SqlLogConfig::new().level(Level::INFO).max_sql_length(10);
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.truncate("SELECT * FROM users"), "SELECT * F...");
        assert_eq!(
            config.clone().no_truncate().truncate("SELECT * FROM users"),
            "SELECT * FROM users"
        );
        assert!(!config.disabled().enabled);
        assert_eq!(SqlLogConfig::shared_default(), &SqlLogConfig::default());
    }

    #[test]
    fn detects_query_type() {
        assert_eq!(QueryType::from_sql("  select 1"), QueryType::Select);
        assert_eq!(QueryType::from_sql("WITH x AS (SELECT 1) SELECT * FROM x"), QueryType::Select);
        assert_eq!(QueryType::from_sql("INSERT INTO t DEFAULT VALUES"), QueryType::Insert);
        assert_eq!(QueryType::from_sql("-- c\nDELETE FROM t"), QueryType::Delete);
        assert_eq!(QueryType::from_sql("CREATE TABLE t (id int)"), QueryType::Other);
    }
}
