//! SQL synthesis.
//!
//! Turns an entity plus a caller-supplied filter into executable text:
//!
//! - `INSERT INTO t(c1,c2) VALUES ($1,$2) RETURNING id`
//! - `UPDATE t SET c1=$1,c2=$2 WHERE <filter>`
//! - `DELETE FROM t WHERE <filter>`
//!
//! List arguments are spliced into ` IN $n` clauses by [`expand_in`]; all
//! other values stay bound parameters. [`Statement::render`] produces the
//! literal form used for logging.

mod expand;
mod generate;

#[cfg(test)]
mod tests;

pub use expand::expand_in;
pub use generate::{delete_sql, insert_sql, update_sql};

use crate::dialect::Dialect;
use crate::value::Value;
use regex::Regex;
use std::sync::OnceLock;

/// Final SQL text plus the parameters bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    /// The statement with every placeholder replaced by its literal value.
    ///
    /// For logs only; placeholders inside string literals are not told apart.
    pub fn render(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::Postgres => {
                static RE: OnceLock<Regex> = OnceLock::new();
                let re = RE.get_or_init(|| {
                    Regex::new(r"\$([0-9]+)").expect("invalid built-in placeholder regex")
                });
                re.replace_all(&self.sql, |caps: &regex::Captures<'_>| {
                    caps[1]
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|idx| self.params.get(idx))
                        .map_or_else(|| caps[0].to_string(), Value::render)
                })
                .into_owned()
            }
            Dialect::Sqlite => {
                let mut out = String::with_capacity(self.sql.len());
                let mut params = self.params.iter();
                for ch in self.sql.chars() {
                    if ch != '?' {
                        out.push(ch);
                        continue;
                    }
                    match params.next() {
                        Some(value) => out.push_str(&value.render()),
                        None => out.push('?'),
                    }
                }
                out
            }
        }
    }
}

/// Strip leading whitespace and SQL comments (`--` and `/* */`) to reach the
/// first meaningful keyword.
fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        s = s.trim_start();
        if s.starts_with("--") {
            match s.find('\n') {
                Some(pos) => s = &s[pos + 1..],
                None => return "",
            }
            continue;
        }
        if s.starts_with("/*") {
            match s.find("*/") {
                Some(pos) => s = &s[pos + 2..],
                None => return "",
            }
            continue;
        }
        return s;
    }
}

/// Whether `sql` opens with `keywords` (case-insensitive, whitespace-separated).
pub(crate) fn starts_with_keywords(sql: &str, keywords: &[&str]) -> bool {
    let mut rest = strip_sql_prefix(sql);
    for keyword in keywords {
        let Some(head) = rest.get(..keyword.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(keyword) {
            return false;
        }
        let tail = &rest[keyword.len()..];
        if !tail.starts_with(char::is_whitespace) {
            return false;
        }
        rest = tail.trim_start();
    }
    true
}
