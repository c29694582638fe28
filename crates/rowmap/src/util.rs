//! Helpers around entities that do not touch the database.

use crate::entity::{Entity, FieldKind};
use crate::error::{OrmError, OrmResult};
use crate::ident::resolve_column;
use crate::value::Value;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Fill unset fields from their `#[orm(default = "...")]` literal.
///
/// A field is unset when it holds its zero value (`0`, `0.0`, `""`, `false`
/// or `None`). Literals are parsed by field kind; booleans are `true` only
/// for a case-insensitive `"true"`.
///
/// ```ignore
/// #[derive(Default, Entity)]
/// struct Account {
///     id: i64,
///     #[orm(default = "free")]
///     plan: String,
/// }
///
/// let mut account = Account::default();
/// rowmap::util::bind_default(&mut account)?;
/// assert_eq!(account.plan, "free");
/// ```
pub fn bind_default<T: Entity>(entity: &mut T) -> OrmResult<()> {
    for meta in T::fields() {
        let Some(literal) = meta.default else {
            continue;
        };
        let invalid = |message: String| {
            OrmError::validation(format!("default for field '{}': {message}", meta.name))
        };

        let value = match meta.kind {
            FieldKind::Int => literal
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| invalid(e.to_string()))?,
            FieldKind::Float => literal
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| invalid(e.to_string()))?,
            FieldKind::Bool => Value::Bool(literal.trim().eq_ignore_ascii_case("true")),
            FieldKind::Text => Value::Text(literal.to_string()),
            other => return Err(invalid(format!("unsupported field kind {other:?}"))),
        };

        let is_unset = entity.get(meta.name).is_none_or(|current| current.is_zero());
        if !is_unset {
            continue;
        }
        entity
            .set(meta.name, value)
            .map_err(|e| OrmError::decode(resolve_column(meta), e.to_string()))?;
    }
    Ok(())
}

/// Trim surrounding whitespace from a string in place.
pub fn trim_string(text: &mut String) {
    let end = text.trim_end().len();
    text.truncate(end);
    let start = text.len() - text.trim_start().len();
    text.drain(..start);
}

/// Trim surrounding whitespace from every text field.
pub fn trim_all<T: Entity>(entity: &mut T) -> OrmResult<()> {
    for meta in T::fields().iter().filter(|f| f.kind == FieldKind::Text) {
        let Some(Value::Text(text)) = entity.get(meta.name) else {
            continue;
        };
        let trimmed = text.trim();
        if trimmed.len() == text.len() {
            continue;
        }
        entity
            .set(meta.name, Value::Text(trimmed.to_string()))
            .map_err(|e| OrmError::decode(resolve_column(meta), e.to_string()))?;
    }
    Ok(())
}

/// Serialize any value to a JSON string.
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> OrmResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Deserialize JSON text or bytes.
pub fn from_json<T: DeserializeOwned>(data: impl AsRef<[u8]>) -> OrmResult<T> {
    Ok(serde_json::from_slice(data.as_ref())?)
}

fn salt_offset(salt: &[u8], index: usize) -> u32 {
    match salt.len() {
        0 => 0,
        len => u32::from(salt[index % len]),
    }
}

/// Obfuscate `data` with `salt`.
///
/// Each character is shifted by the salt byte at its position (cycling), the
/// shifted code points are written as `_`-prefixed decimals, and the result
/// is base64 encoded. This is reversible obfuscation, not encryption.
///
/// ```ignore
/// let token = rowmap::util::encrypt("ab", "k");
/// assert_eq!(token, "XzIwNF8yMDU=");
/// assert_eq!(rowmap::util::decrypt(&token, "k"), "ab");
/// ```
pub fn encrypt(data: &str, salt: &str) -> String {
    let salt = salt.as_bytes();
    let mut out = String::new();
    for (index, c) in data.chars().enumerate() {
        out.push('_');
        out.push_str(&(u32::from(c) + salt_offset(salt, index)).to_string());
    }
    STANDARD.encode(out)
}

/// Reverse [`encrypt`]. Input that is not valid base64 yields an empty
/// string; unparsable or invalid code points become U+FFFD.
pub fn decrypt(data: &str, salt: &str) -> String {
    let Ok(decoded) = STANDARD.decode(data) else {
        return String::new();
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return String::new();
    };
    let mut chars = decoded.chars();
    if chars.next().is_none() {
        return String::new();
    }

    let salt = salt.as_bytes();
    chars
        .as_str()
        .split('_')
        .enumerate()
        .map(|(index, part)| {
            let code = part.parse::<i64>().unwrap_or(0) - i64::from(salt_offset(salt, index));
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect()
}

/// A random hex string of exactly `len` characters.
///
/// Each random byte is written in hex, upper-case when the byte is above 127,
/// and the result is cut to `len`.
pub fn random_string(len: usize) -> String {
    if len == 0 {
        return String::new();
    }
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill(bytes.as_mut_slice());

    let mut out = String::with_capacity(len * 2);
    for b in bytes {
        if b > 127 {
            out.push_str(&format!("{b:X}"));
        } else {
            out.push_str(&format!("{b:x}"));
        }
    }
    out.truncate(len);
    out
}
