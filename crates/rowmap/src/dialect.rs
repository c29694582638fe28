//! Placeholder dialects.

use std::fmt;

/// SQL flavour of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Numbered placeholders (`$1`, `$2`), ids via `RETURNING`.
    Postgres,
    /// Positional placeholders (`?`), ids via `last_insert_rowid()`.
    Sqlite,
}

impl Dialect {
    /// Placeholder for the 1-based parameter `n`.
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${n}"),
            Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Column reference as written in generated INSERT/UPDATE text.
    pub fn quote_column(self, column: &str) -> String {
        match self {
            Dialect::Postgres => column.to_string(),
            Dialect::Sqlite => format!("`{}`", column.replace('`', "``")),
        }
    }

    /// Suffix that makes an INSERT report the generated key, if the dialect
    /// reports it in-band.
    pub fn returning(self, primary_key: &str) -> Option<String> {
        match self {
            Dialect::Postgres => Some(format!(" RETURNING {primary_key}")),
            Dialect::Sqlite => None,
        }
    }

    /// Whether `DEFAULT` may appear inside a `VALUES` list.
    pub fn supports_default_keyword(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
