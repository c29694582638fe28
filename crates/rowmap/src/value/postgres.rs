//! PostgreSQL wire conversions for [`Value`].

use super::{Value, ValueError, exact_f32, exact_f64};
use crate::error::{OrmError, OrmResult};
use crate::row::RowSet;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::error::Error;
use tokio_postgres::Row;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql_checked(ty, out),
            #[cfg(feature = "rust_decimal")]
            Value::Int(_) | Value::Float(_) | Value::Text(_) if *ty == Type::NUMERIC => {
                numeric_param(self)?.to_sql_checked(ty, out)
            }
            Value::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql_checked(ty, out),
                Type::OID => u32::try_from(*i)?.to_sql_checked(ty, out),
                Type::FLOAT4 => exact_f32(*i)
                    .ok_or_else(|| out_of_range(*i, "real"))?
                    .to_sql_checked(ty, out),
                Type::FLOAT8 => exact_f64(*i)
                    .ok_or_else(|| out_of_range(*i, "double precision"))?
                    .to_sql_checked(ty, out),
                _ => i.to_sql_checked(ty, out),
            },
            Value::Float(f) => match *ty {
                Type::FLOAT4 => {
                    let narrow = *f as f32;
                    if f.is_finite() && narrow.is_infinite() {
                        return Err(out_of_range(*f, "real").into());
                    }
                    narrow.to_sql_checked(ty, out)
                }
                _ => f.to_sql_checked(ty, out),
            },
            Value::Text(s) => match *ty {
                Type::UUID => uuid::Uuid::parse_str(s)?.to_sql_checked(ty, out),
                Type::JSON | Type::JSONB => {
                    serde_json::from_str::<serde_json::Value>(s)?.to_sql_checked(ty, out)
                }
                _ => s.to_sql_checked(ty, out),
            },
            Value::Bytes(b) => b.to_sql_checked(ty, out),
            Value::Timestamp(t) => match *ty {
                Type::TIMESTAMPTZ => t.and_utc().to_sql_checked(ty, out),
                Type::DATE => t.date().to_sql_checked(ty, out),
                _ => t.to_sql_checked(ty, out),
            },
            Value::Json(j) => match *ty {
                Type::TEXT | Type::VARCHAR | Type::BPCHAR => j.to_string().to_sql_checked(ty, out),
                _ => j.to_sql_checked(ty, out),
            },
        }
    }

    // The concrete type is chosen per column in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn out_of_range(value: impl ToString, target: &'static str) -> ValueError {
    ValueError::OutOfRange {
        value: value.to_string(),
        target,
    }
}

#[cfg(feature = "rust_decimal")]
fn numeric_param(value: &Value) -> Result<rust_decimal::Decimal, Box<dyn Error + Sync + Send>> {
    use std::str::FromStr;

    Ok(match value {
        Value::Int(i) => rust_decimal::Decimal::from(*i),
        Value::Float(f) => rust_decimal::Decimal::try_from(*f)?,
        Value::Text(s) => rust_decimal::Decimal::from_str(s)?,
        other => return Err(format!("cannot bind {} as numeric", other.type_name()).into()),
    })
}

/// Borrow a parameter slice in the shape `tokio_postgres` expects.
pub(crate) fn as_params(values: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

fn extract_value(row: &Row, idx: usize) -> OrmResult<Value> {
    let column = &row.columns()[idx];
    let decode = |e: tokio_postgres::Error| OrmError::decode(column.name(), e.to_string());

    let value = match *column.type_() {
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .map_err(decode)?
            .map(|v| Value::Int(i64::from(v))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .map_err(decode)?
            .map(|v| Value::Int(i64::from(v))),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx).map_err(decode)?.map(Value::Int),
        Type::OID => row
            .try_get::<_, Option<u32>>(idx)
            .map_err(decode)?
            .map(|v| Value::Int(i64::from(v))),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .map_err(decode)?
            .map(|v| Value::Float(f64::from(v))),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx).map_err(decode)?.map(Value::Float),
        Type::BOOL => row.try_get::<_, Option<bool>>(idx).map_err(decode)?.map(Value::Bool),
        Type::TIMESTAMP => row
            .try_get::<_, Option<NaiveDateTime>>(idx)
            .map_err(decode)?
            .map(Value::Timestamp),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)
            .map_err(decode)?
            .map(|v| Value::Timestamp(v.naive_utc())),
        Type::DATE => row
            .try_get::<_, Option<NaiveDate>>(idx)
            .map_err(decode)?
            .map(|v| Value::Timestamp(v.and_time(chrono::NaiveTime::MIN))),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(idx)
            .map_err(decode)?
            .map(Value::Json),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx).map_err(decode)?.map(Value::Bytes),
        Type::UUID => row
            .try_get::<_, Option<uuid::Uuid>>(idx)
            .map_err(decode)?
            .map(|v| Value::Text(v.to_string())),
        // Kept as text so no digits are lost.
        #[cfg(feature = "rust_decimal")]
        Type::NUMERIC => row
            .try_get::<_, Option<rust_decimal::Decimal>>(idx)
            .map_err(decode)?
            .map(|v| Value::Text(v.to_string())),
        // Text-like types (text, varchar, bpchar, name, citext, enums) decode as strings.
        _ => row
            .try_get::<_, Option<String>>(idx)
            .map_err(|_| {
                OrmError::decode(
                    column.name(),
                    format!("unsupported column type '{}'", column.type_().name()),
                )
            })?
            .map(Value::Text),
    };

    Ok(value.unwrap_or(Value::Null))
}

/// Convert driver rows into a [`RowSet`].
///
/// `columns` is passed separately so an empty result still reports its shape.
pub(crate) fn build_row_set(columns: Vec<String>, rows: &[Row]) -> OrmResult<RowSet> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let values = (0..row.len())
            .map(|idx| extract_value(row, idx))
            .collect::<OrmResult<Vec<_>>>()?;
        out.push(values);
    }
    Ok(RowSet::new(columns, out))
}
