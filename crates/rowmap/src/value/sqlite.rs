//! SQLite storage-class conversions for [`Value`].

use super::Value;
use crate::error::OrmResult;
use crate::row::RowSet;
use rusqlite::types::{Value as SqliteValue, ValueRef};

/// Convert a parameter into a SQLite storage value.
///
/// Booleans become 0/1, timestamps and JSON are stored as text.
pub(crate) fn to_sqlite(value: &Value) -> SqliteValue {
    match value {
        Value::Null => SqliteValue::Null,
        Value::Bool(b) => SqliteValue::Integer(i64::from(*b)),
        Value::Int(i) => SqliteValue::Integer(*i),
        Value::Float(f) => SqliteValue::Real(*f),
        Value::Text(s) => SqliteValue::Text(s.clone()),
        Value::Bytes(b) => SqliteValue::Blob(b.clone()),
        Value::Timestamp(t) => SqliteValue::Text(t.format("%F %T%.f").to_string()),
        Value::Json(j) => SqliteValue::Text(j.to_string()),
    }
}

fn from_sqlite(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

/// Run a prepared statement and collect every row.
pub(crate) fn build_row_set(
    stmt: &mut rusqlite::Statement<'_>,
    params: &[Value],
) -> OrmResult<RowSet> {
    let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let width = columns.len();

    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter().map(to_sqlite)))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for idx in 0..width {
            values.push(from_sqlite(row.get_ref(idx)?));
        }
        out.push(values);
    }

    Ok(RowSet::new(columns, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn timestamps_and_json_are_stored_as_text() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
            .and_then(|d| d.and_hms_opt(7, 8, 9))
            .unwrap();
        assert_eq!(
            to_sqlite(&Value::Timestamp(ts)),
            SqliteValue::Text("2024-05-06 07:08:09".to_string())
        );
        assert_eq!(
            to_sqlite(&Value::Json(serde_json::json!({"a": 1}))),
            SqliteValue::Text(r#"{"a":1}"#.to_string())
        );
        assert_eq!(to_sqlite(&Value::Bool(true)), SqliteValue::Integer(1));
    }
}
