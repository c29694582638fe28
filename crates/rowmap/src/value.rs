//! Dynamically-typed cell values.
//!
//! Every column read from a driver and every parameter handed to one travels
//! as a [`Value`]. Entity fields convert into values with [`ToValue`] and back
//! with [`FromValue`]; conversions are checked, so an `i64` that does not fit
//! an `i32` field is an error rather than a wrapped number.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Write;
use std::num::IntErrorKind;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;

pub(crate) mod postgres;
#[cfg(feature = "sqlite")]
pub(crate) mod sqlite;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single column value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    Json(serde_json::Value),
}

impl Value {
    /// Short name of the variant, used in conversion errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Timestamp(_) => "timestamp",
            Value::Json(_) => "json",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this is the zero value of its variant.
    ///
    /// A zero timestamp is `NaiveDateTime::default()`.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Text(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::Timestamp(t) => *t == NaiveDateTime::default(),
            Value::Json(j) => j.is_null(),
        }
    }

    /// Render the value as a SQL literal.
    ///
    /// Used for inline `IN` lists and for the readable form of logged
    /// statements; bound parameters never go through here.
    pub fn render(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => quote_literal(s),
            Value::Bytes(bytes) => {
                let mut out = String::with_capacity(bytes.len() * 2 + 4);
                out.push_str("'\\x");
                for b in bytes {
                    let _ = write!(out, "{b:02x}");
                }
                out.push('\'');
                out
            }
            Value::Timestamp(t) => quote_literal(&t.format(TIMESTAMP_FORMAT).to_string()),
            Value::Json(j) => quote_literal(&j.to_string()),
        }
    }
}

/// Wrap `s` in single quotes, doubling embedded quotes.
pub(crate) fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Failure converting between a [`Value`] and a Rust type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unexpected NULL for {expected}")]
    UnexpectedNull { expected: &'static str },

    #[error("value {value} out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("invalid {target}: {message}")]
    Parse {
        target: &'static str,
        message: String,
    },

    #[error("unknown field '{0}'")]
    UnknownField(String),
}

impl ValueError {
    fn mismatch(expected: &'static str, found: &Value) -> Self {
        if found.is_null() {
            Self::UnexpectedNull { expected }
        } else {
            Self::Mismatch {
                expected,
                found: found.type_name(),
            }
        }
    }
}

/// Convert a Rust value into a [`Value`] for writing.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Convert a [`Value`] read from a row into a Rust value.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

macro_rules! impl_int {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::Int(i64::from(v))
            }
        }

        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, ValueError> {
                let wide = match value {
                    Value::Int(i) => i,
                    Value::Text(s) => int_from_text(&s, stringify!($ty))?,
                    other => return Err(ValueError::mismatch(stringify!($ty), &other)),
                };
                <$ty>::try_from(wide).map_err(|_| ValueError::OutOfRange {
                    value: wide.to_string(),
                    target: stringify!($ty),
                })
            }
        }
    )*};
}

/// Parse exact numeric text (`"42"`, `"42.000"`), as PostgreSQL returns for
/// `NUMERIC` aggregates. A non-zero fraction is out of range.
fn int_from_text(text: &str, target: &'static str) -> Result<i64, ValueError> {
    let text = text.trim();
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    if !fraction.bytes().all(|b| b == b'0') {
        return Err(ValueError::OutOfRange {
            value: text.to_string(),
            target,
        });
    }
    whole.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ValueError::OutOfRange {
            value: text.to_string(),
            target,
        },
        _ => ValueError::Parse {
            target,
            message: e.to_string(),
        },
    })
}

/// 2^63: the first float above `i64::MAX`. `as` saturates it back to
/// `i64::MAX`, so it must be excluded before a round-trip check.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// `i` as `f64`, or `None` when the conversion would round.
pub(crate) fn exact_f64(i: i64) -> Option<f64> {
    let f = i as f64;
    (f < I64_LIMIT && f as i64 == i).then_some(f)
}

/// `i` as `f32`, or `None` when the conversion would round.
pub(crate) fn exact_f32(i: i64) -> Option<f32> {
    let f = i as f32;
    (f64::from(f) < I64_LIMIT && f as i64 == i).then_some(f)
}

/// Parse decimal text as `f64`.
///
/// Fractional digits round like any float column, but integer digits must
/// survive: `"12345678901234567890.5"` is out of range.
fn float_from_text(text: &str) -> Result<f64, ValueError> {
    let text = text.trim();
    let f = text.parse::<f64>().map_err(|e| ValueError::Parse {
        target: "f64",
        message: e.to_string(),
    })?;
    if text.contains(['e', 'E']) || !f.is_finite() {
        return if f.is_infinite() && !text.to_ascii_lowercase().contains("inf") {
            Err(ValueError::OutOfRange {
                value: text.to_string(),
                target: "f64",
            })
        } else {
            Ok(f)
        };
    }

    let whole = text.split_once('.').map_or(text, |(whole, _)| whole);
    let (sign, digits) = match whole.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", whole.strip_prefix('+').unwrap_or(whole)),
    };
    let digits = match digits.trim_start_matches('0') {
        "" => "0",
        d => d,
    };
    if format!("{sign}{digits}") != f.trunc().to_string() {
        return Err(ValueError::OutOfRange {
            value: text.to_string(),
            target: "f64",
        });
    }
    Ok(f)
}

impl_int!(i8, i16, i32, i64, u8, u16, u32);

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        let wide = match value {
            Value::Int(i) => i,
            Value::Text(s) => int_from_text(&s, "u64")?,
            other => return Err(ValueError::mismatch("u64", &other)),
        };
        u64::try_from(wide).map_err(|_| ValueError::OutOfRange {
            value: wide.to_string(),
            target: "u64",
        })
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(f) => Ok(f),
            // Integers beyond 2^53 lose precision as f64.
            Value::Int(i) => exact_f64(i).ok_or_else(|| ValueError::OutOfRange {
                value: i.to_string(),
                target: "f64",
            }),
            Value::Text(s) => float_from_text(&s),
            other => Err(ValueError::mismatch("f64", &other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        let wide = f64::from_value(value)?;
        let narrow = wide as f32;
        if narrow.is_infinite() && wide.is_finite() {
            return Err(ValueError::OutOfRange {
                value: wide.to_string(),
                target: "f32",
            });
        }
        Ok(narrow)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            // SQLite stores booleans as 0/1 integers.
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            Value::Int(i) => Err(ValueError::OutOfRange {
                value: i.to_string(),
                target: "bool",
            }),
            other => Err(ValueError::mismatch("bool", &other)),
        }
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(ValueError::mismatch("String", &other)),
        }
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v.naive_utc())
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::Timestamp(self.naive_utc())
    }
}

impl ToValue for NaiveDate {
    fn to_value(&self) -> Value {
        Value::Timestamp(self.and_time(NaiveTime::MIN))
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, ValueError> {
    const FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| ValueError::Parse {
            target: "timestamp",
            message: format!("unrecognized timestamp '{s}'"),
        })
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Timestamp(t) => Ok(t),
            Value::Text(s) => parse_timestamp(&s),
            other => Err(ValueError::mismatch("timestamp", &other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        NaiveDateTime::from_value(value).map(|t| t.and_utc())
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        NaiveDateTime::from_value(value).map(|t| t.date())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Text(v.to_string())
    }
}

impl ToValue for uuid::Uuid {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(s) => uuid::Uuid::parse_str(&s).map_err(|e| ValueError::Parse {
                target: "uuid",
                message: e.to_string(),
            }),
            other => Err(ValueError::mismatch("uuid", &other)),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }
}

fn json_from_value(value: Value, target: &'static str) -> Result<serde_json::Value, ValueError> {
    match value {
        Value::Json(j) => Ok(j),
        // SQLite keeps JSON as text.
        Value::Text(s) => serde_json::from_str(&s).map_err(|e| ValueError::Parse {
            target,
            message: e.to_string(),
        }),
        Value::Bytes(b) => Ok(serde_json::Value::from(b)),
        other => Err(ValueError::mismatch(target, &other)),
    }
}

fn decode_json<T: DeserializeOwned>(value: Value, target: &'static str) -> Result<T, ValueError> {
    let json = json_from_value(value, target)?;
    serde_json::from_value(json).map_err(|e| ValueError::Parse {
        target,
        message: e.to_string(),
    })
}

fn encode_json<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).map_or(Value::Null, Value::Json)
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(serde_json::Value::Null),
            other => json_from_value(other, "json"),
        }
    }
}

/// Sequence fields are stored JSON-encoded.
impl<T: Serialize> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        encode_json(self)
    }
}

impl<T: DeserializeOwned> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        decode_json(value, "json array")
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: FromValue> FromValue for Box<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        T::from_value(value).map(Box::new)
    }
}

impl<T: FromValue> FromValue for Arc<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        T::from_value(value).map(Arc::new)
    }
}

impl<T: FromValue> FromValue for Rc<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        T::from_value(value).map(Rc::new)
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

/// Wrapper storing any serde type as a JSON column.
///
/// ```ignore
/// #[derive(Default, Entity)]
/// struct Profile {
///     id: i64,
///     settings: Json<Settings>,
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Serialize> ToValue for Json<T> {
    fn to_value(&self) -> Value {
        encode_json(&self.0)
    }
}

impl<T: DeserializeOwned> FromValue for Json<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        decode_json(value, "json").map(Json)
    }
}

/// A query argument.
///
/// Scalars are bound as parameters. Lists are never bound: they are expanded
/// inline into the next `IN` placeholder of the statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    List(Vec<Value>),
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Value(v)
    }
}

macro_rules! impl_arg_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for Arg {
            fn from(v: $ty) -> Self {
                Arg::Value(Value::from(v))
            }
        }
    )*};
}

impl_arg_scalar!(
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    bool,
    String,
    &str,
    &String,
    NaiveDateTime,
    DateTime<Utc>,
    uuid::Uuid,
    serde_json::Value,
);

impl<T: Into<Value>> From<Option<T>> for Arg {
    fn from(v: Option<T>) -> Self {
        Arg::Value(Value::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Arg {
    fn from(v: Vec<T>) -> Self {
        Arg::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Arg {
    fn from(v: &[T]) -> Self {
        Arg::List(v.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Arg {
    fn from(v: [T; N]) -> Self {
        Arg::List(v.into_iter().map(Into::into).collect())
    }
}

/// Build a `Vec<Arg>` from heterogeneous expressions.
///
/// ```ignore
/// let args = rowmap::args![42_i64, "alice", vec![1_i64, 2, 3]];
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}
