//! Inline expansion of list arguments into `IN` clauses.

use super::Statement;
use crate::dialect::Dialect;
use crate::value::{Arg, Value};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

fn postgres_tokens() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r" (?i:in) \$[0-9]*|\$([0-9]+)").expect("invalid built-in IN regex")
    })
}

fn sqlite_tokens() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" (?i:in) \?").expect("invalid built-in IN regex"))
}

/// Render a list as the body of an `IN (...)` clause.
///
/// Only non-empty lists of integers, floats or text expand; anything else
/// yields `None` and the list is dropped.
fn render_list(items: &[Value]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    // NaN and infinities have no SQL literal.
    let supported = items.iter().all(|v| match v {
        Value::Int(_) | Value::Text(_) => true,
        Value::Float(f) => f.is_finite(),
        _ => false,
    });
    if !supported {
        return None;
    }
    Some(items.iter().map(Value::render).collect::<Vec<_>>().join(","))
}

/// Pull list arguments out of `args` and splice them into `sql`.
///
/// Each ` IN $n` (or ` IN ?`) is replaced left to right by the next
/// expandable list. Once the lists run out the placeholder is dropped and
/// only ` IN ` remains. Scalars stay bound; for numbered placeholders the
/// remaining `$n` are renumbered to their position among the scalars.
pub fn expand_in(dialect: Dialect, sql: &str, args: &[Arg]) -> Statement {
    let mut params = Vec::with_capacity(args.len());
    let mut lists = Vec::new();
    // Original 1-based position -> position among the scalars.
    let mut renumber = HashMap::new();

    for (pos, arg) in args.iter().enumerate() {
        match arg {
            Arg::Value(value) => {
                params.push(value.clone());
                renumber.insert(pos + 1, params.len());
            }
            Arg::List(items) => {
                if let Some(rendered) = render_list(items) {
                    lists.push(rendered);
                }
            }
        }
    }

    let mut pending = lists.into_iter();
    let mut splice = |caps: &Captures<'_>| -> String {
        if let Some(n) = caps.get(1) {
            let renumbered = n
                .as_str()
                .parse::<usize>()
                .ok()
                .and_then(|old| renumber.get(&old));
            return match renumbered {
                Some(new) => format!("${new}"),
                None => caps[0].to_string(),
            };
        }
        match pending.next() {
            Some(list) => format!(" IN ({list})"),
            None => " IN ".to_string(),
        }
    };

    let sql = match dialect {
        Dialect::Postgres => postgres_tokens().replace_all(sql, &mut splice),
        Dialect::Sqlite => sqlite_tokens().replace_all(sql, &mut splice),
    };

    Statement::new(sql.into_owned(), params)
}
