//! Column and table naming.
//!
//! Columns are derived from field identifiers by snake-casing them, unless
//! the field carries an explicit `#[orm(column = "...")]`. Tables are named
//! after the entity type the same way, unless it overrides
//! [`Entity::table_name`].

use crate::entity::{Entity, FieldMeta};
use heck::ToSnakeCase;

/// Snake-case a field identifier: `UserID` → `user_id`, `userName` → `user_name`.
///
/// A run of capitals is a single word. Already snake-cased input is returned
/// unchanged.
pub fn column_name(field: &str) -> String {
    field.to_snake_case()
}

/// The column a field maps to: the explicit annotation if set, otherwise the
/// snake-cased field identifier.
pub fn resolve_column(field: &FieldMeta) -> String {
    match field.column {
        Some(column) if !column.is_empty() => column.to_string(),
        _ => column_name(field.name),
    }
}

/// The table an entity maps to.
pub fn table_name<T: Entity>() -> String {
    match T::table_name() {
        Some(name) if !name.is_empty() => name.into_owned(),
        _ => column_name(T::TYPE_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::FieldKind;
    use crate::value::{Value, ValueError};
    use std::borrow::Cow;

    #[test]
    fn snake_cases_word_boundaries() {
        assert_eq!(column_name("UserID"), "user_id");
        assert_eq!(column_name("UserId"), "user_id");
        assert_eq!(column_name("userName"), "user_name");
        assert_eq!(column_name("Name"), "name");
        assert_eq!(column_name("HTTPServer"), "http_server");
    }

    #[test]
    fn snake_case_is_idempotent() {
        for input in ["user_id", "created_at", "id", "a_b_c"] {
            assert_eq!(column_name(input), input);
            assert_eq!(column_name(&column_name(input)), column_name(input));
        }
    }

    #[test]
    fn explicit_column_wins() {
        let plain = FieldMeta::new("CreatedAt", FieldKind::Timestamp);
        assert_eq!(resolve_column(&plain), "created_at");

        let renamed = FieldMeta::new("CreatedAt", FieldKind::Timestamp).column("ctime");
        assert_eq!(resolve_column(&renamed), "ctime");
    }

    #[derive(Default)]
    struct BlogPost;

    impl Entity for BlogPost {
        const TYPE_NAME: &'static str = "BlogPost";

        fn fields() -> &'static [FieldMeta] {
            &[]
        }

        fn get(&self, _field: &str) -> Option<Value> {
            None
        }

        fn set(&mut self, field: &str, _value: Value) -> Result<(), ValueError> {
            Err(ValueError::UnknownField(field.to_string()))
        }
    }

    #[derive(Default)]
    struct Renamed;

    impl Entity for Renamed {
        const TYPE_NAME: &'static str = "Renamed";

        fn table_name() -> Option<Cow<'static, str>> {
            Some(Cow::Borrowed("legacy_accounts"))
        }

        fn fields() -> &'static [FieldMeta] {
            &[]
        }

        fn get(&self, _field: &str) -> Option<Value> {
            None
        }

        fn set(&mut self, field: &str, _value: Value) -> Result<(), ValueError> {
            Err(ValueError::UnknownField(field.to_string()))
        }
    }

    #[test]
    fn table_name_defaults_to_snake_cased_type() {
        assert_eq!(table_name::<BlogPost>(), "blog_post");
        assert_eq!(table_name::<Renamed>(), "legacy_accounts");
    }
}
