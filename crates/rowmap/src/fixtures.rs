//! Hand-written entities shared by unit tests.

use crate::entity::{Entity, FieldKind, FieldMeta};
use crate::value::{FromValue, ToValue, Value, ValueError};
use chrono::NaiveDateTime;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl Entity for User {
    const TYPE_NAME: &'static str = "User";

    fn fields() -> &'static [FieldMeta] {
        const FIELDS: &[FieldMeta] = &[
            FieldMeta::new("id", FieldKind::Int),
            FieldMeta::new("name", FieldKind::Text),
            FieldMeta::new("email", FieldKind::Text),
        ];
        FIELDS
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.to_value()),
            "name" => Some(self.name.to_value()),
            "email" => Some(self.email.to_value()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "id" => self.id = FromValue::from_value(value)?,
            "name" => self.name = FromValue::from_value(value)?,
            "email" => self.email = FromValue::from_value(value)?,
            _ => return Err(ValueError::UnknownField(field.to_string())),
        }
        Ok(())
    }
}

/// No primary key; carries a timestamp and a JSON-encoded list.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AuditEvent {
    pub action: String,
    pub happened_at: NaiveDateTime,
    pub tags: Vec<String>,
}

impl Entity for AuditEvent {
    const TYPE_NAME: &'static str = "AuditEvent";

    fn fields() -> &'static [FieldMeta] {
        const FIELDS: &[FieldMeta] = &[
            FieldMeta::new("action", FieldKind::Text),
            FieldMeta::new("happened_at", FieldKind::Timestamp),
            FieldMeta::new("tags", FieldKind::Json),
        ];
        FIELDS
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "action" => Some(self.action.to_value()),
            "happened_at" => Some(self.happened_at.to_value()),
            "tags" => Some(self.tags.to_value()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "action" => self.action = FromValue::from_value(value)?,
            "happened_at" => self.happened_at = FromValue::from_value(value)?,
            "tags" => self.tags = FromValue::from_value(value)?,
            _ => return Err(ValueError::UnknownField(field.to_string())),
        }
        Ok(())
    }
}

/// Defaults for `bind_default` and text fields for `trim_all`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub nickname: String,
    pub age: i32,
    pub score: f64,
    pub active: bool,
    pub bio: Option<String>,
}

impl Entity for Profile {
    const TYPE_NAME: &'static str = "Profile";

    fn fields() -> &'static [FieldMeta] {
        const FIELDS: &[FieldMeta] = &[
            FieldMeta::new("id", FieldKind::Int),
            FieldMeta::new("nickname", FieldKind::Text).default_value("guest"),
            FieldMeta::new("age", FieldKind::Int).default_value("18"),
            FieldMeta::new("score", FieldKind::Float).default_value("1.5"),
            FieldMeta::new("active", FieldKind::Bool).default_value("TRUE"),
            FieldMeta::new("bio", FieldKind::Text).column("about"),
        ];
        FIELDS
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.to_value()),
            "nickname" => Some(self.nickname.to_value()),
            "age" => Some(self.age.to_value()),
            "score" => Some(self.score.to_value()),
            "active" => Some(self.active.to_value()),
            "bio" => Some(self.bio.to_value()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "id" => self.id = FromValue::from_value(value)?,
            "nickname" => self.nickname = FromValue::from_value(value)?,
            "age" => self.age = FromValue::from_value(value)?,
            "score" => self.score = FromValue::from_value(value)?,
            "active" => self.active = FromValue::from_value(value)?,
            "bio" => self.bio = FromValue::from_value(value)?,
            _ => return Err(ValueError::UnknownField(field.to_string())),
        }
        Ok(())
    }
}
