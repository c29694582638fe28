use super::*;
use crate::args;
use crate::error::OrmError;
use crate::fixtures::{AuditEvent, User};
use crate::value::Arg;
use chrono::{NaiveDate, NaiveDateTime};

fn user(id: i64, name: &str, email: &str) -> User {
    User {
        id,
        name: name.to_string(),
        email: email.to_string(),
    }
}

#[test]
fn list_argument_expands_into_in_clause() {
    let stmt = expand_in(
        Dialect::Postgres,
        "SELECT * FROM user WHERE id IN $1",
        &args![vec![1_i64, 2, 3]],
    );
    assert_eq!(stmt.sql(), "SELECT * FROM user WHERE id IN (1,2,3)");
    assert!(stmt.params().is_empty());
}

#[test]
fn in_keyword_matches_any_case() {
    let stmt = expand_in(
        Dialect::Postgres,
        "SELECT * FROM t WHERE a iN $1 AND b In $2",
        &args![vec!["x", "y"], vec![1.5_f64]],
    );
    assert_eq!(stmt.sql(), "SELECT * FROM t WHERE a IN ('x','y') AND b IN (1.5)");
}

#[test]
fn text_lists_escape_quotes() {
    let stmt = expand_in(
        Dialect::Sqlite,
        "SELECT * FROM t WHERE name IN ?",
        &args![vec!["o'neil"]],
    );
    assert_eq!(stmt.sql(), "SELECT * FROM t WHERE name IN ('o''neil')");
}

#[test]
fn in_placeholder_without_list_becomes_bare_keyword() {
    let stmt = expand_in(
        Dialect::Postgres,
        "SELECT * FROM t WHERE a IN $1 AND b IN $2",
        &args![vec![1_i64]],
    );
    assert_eq!(stmt.sql(), "SELECT * FROM t WHERE a IN (1) AND b IN ");
}

#[test]
fn empty_and_unsupported_lists_are_dropped() {
    let empty: Vec<i64> = Vec::new();
    let stmt = expand_in(
        Dialect::Postgres,
        "SELECT * FROM t WHERE a IN $1 AND b IN $2",
        &[Arg::from(empty), Arg::List(vec![Value::Bool(true)])],
    );
    assert_eq!(stmt.sql(), "SELECT * FROM t WHERE a IN  AND b IN ");
    assert!(stmt.params().is_empty());
}

#[test]
fn non_finite_float_lists_are_dropped() {
    let stmt = expand_in(
        Dialect::Postgres,
        "SELECT * FROM t WHERE a IN $1 AND b IN $2 AND c IN $3",
        &args![vec![1.5_f64, f64::NAN], vec![f64::INFINITY], vec![-2.0_f64]],
    );
    assert_eq!(stmt.sql(), "SELECT * FROM t WHERE a IN  AND b IN  AND c IN (-2)");
    assert!(stmt.params().is_empty());
}

#[test]
fn scalars_after_a_list_are_renumbered() {
    let stmt = expand_in(
        Dialect::Postgres,
        "SELECT * FROM t WHERE id IN $1 AND status = $2 AND owner = $3",
        &args![vec![7_i64, 8], "open", 42_i64],
    );
    assert_eq!(
        stmt.sql(),
        "SELECT * FROM t WHERE id IN (7,8) AND status = $1 AND owner = $2"
    );
    assert_eq!(
        stmt.params(),
        &[Value::Text("open".into()), Value::Int(42)]
    );
}

#[test]
fn sqlite_positional_placeholders_keep_order() {
    let stmt = expand_in(
        Dialect::Sqlite,
        "SELECT * FROM t WHERE a = ? AND id IN ? AND b = ?",
        &args![1_i64, vec![3_i64, 4], "z"],
    );
    assert_eq!(stmt.sql(), "SELECT * FROM t WHERE a = ? AND id IN (3,4) AND b = ?");
    assert_eq!(stmt.params(), &[Value::Int(1), Value::Text("z".into())]);
}

#[test]
fn insert_lists_only_writable_columns() {
    let stmt = insert_sql(Dialect::Postgres, &user(0, "ann", "ann@x.io")).unwrap();
    assert_eq!(
        stmt.sql(),
        "INSERT INTO user(name,email) VALUES ($1,$2) RETURNING id"
    );
    assert_eq!(
        stmt.params(),
        &[Value::Text("ann".into()), Value::Text("ann@x.io".into())]
    );

    let stmt = insert_sql(Dialect::Sqlite, &user(0, "ann", "ann@x.io")).unwrap();
    assert_eq!(stmt.sql(), "INSERT INTO user(`name`,`email`) VALUES (?,?)");
}

#[test]
fn insert_without_primary_key_has_no_returning() {
    let event = AuditEvent {
        action: "login".into(),
        happened_at: NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap(),
        tags: vec!["web".into()],
    };
    let stmt = insert_sql(Dialect::Postgres, &event).unwrap();
    assert_eq!(
        stmt.sql(),
        "INSERT INTO audit_event(action,happened_at,tags) VALUES ($1,$2,$3)"
    );
    assert_eq!(stmt.params()[2], Value::Json(serde_json::json!(["web"])));
}

#[test]
fn zero_timestamp_uses_column_default() {
    let event = AuditEvent {
        action: "login".into(),
        happened_at: NaiveDateTime::default(),
        tags: vec![],
    };

    let pg = insert_sql(Dialect::Postgres, &event).unwrap();
    assert_eq!(
        pg.sql(),
        "INSERT INTO audit_event(action,happened_at,tags) VALUES ($1,DEFAULT,$2)"
    );
    assert_eq!(pg.params().len(), 2);

    let lite = insert_sql(Dialect::Sqlite, &event).unwrap();
    assert_eq!(
        lite.sql(),
        "INSERT INTO audit_event(`action`,`tags`) VALUES (?,?)"
    );
}

#[test]
fn update_with_filter_renders_literals() {
    let stmt = update_sql(
        Dialect::Postgres,
        &user(5, "b", "b@x.io"),
        "id = 5",
        &[],
    )
    .unwrap();
    assert_eq!(stmt.sql(), "UPDATE user SET name=$1,email=$2 WHERE id = 5");
    assert_eq!(
        stmt.render(Dialect::Postgres),
        "UPDATE user SET name='b',email='b@x.io' WHERE id = 5"
    );
}

#[test]
fn update_set_placeholders_follow_filter_arguments() {
    let stmt = update_sql(
        Dialect::Postgres,
        &user(5, "b", "b@x.io"),
        "id = $1 AND name <> $2",
        &args![5_i64, "a"],
    )
    .unwrap();
    assert_eq!(
        stmt.sql(),
        "UPDATE user SET name=$3,email=$4 WHERE id = $1 AND name <> $2"
    );
    assert_eq!(stmt.params()[0], Value::Int(5));
    assert_eq!(stmt.params()[2], Value::Text("b".into()));

    let stmt = update_sql(
        Dialect::Sqlite,
        &user(5, "b", "b@x.io"),
        "id = ?",
        &args![5_i64],
    )
    .unwrap();
    assert_eq!(stmt.sql(), "UPDATE user SET `name`=?,`email`=? WHERE id = ?");
    assert_eq!(
        stmt.params(),
        &[
            Value::Text("b".into()),
            Value::Text("b@x.io".into()),
            Value::Int(5)
        ]
    );
}

#[test]
fn update_without_filter_targets_primary_key() {
    let stmt = update_sql(Dialect::Postgres, &user(9, "c", "c@x.io"), "", &[]).unwrap();
    assert_eq!(stmt.sql(), "UPDATE user SET name=$1,email=$2 WHERE id = $3");
    assert_eq!(
        stmt.render(Dialect::Postgres),
        "UPDATE user SET name='c',email='c@x.io' WHERE id = 9"
    );
}

#[test]
fn update_statement_is_used_verbatim() {
    let stmt = update_sql(
        Dialect::Postgres,
        &user(1, "x", "y"),
        "  update user SET name = $1 WHERE id IN $2",
        &args!["z", vec![1_i64, 2]],
    )
    .unwrap();
    assert_eq!(stmt.sql(), "  update user SET name = $1 WHERE id IN (1,2)");
}

#[test]
fn update_without_filter_or_key_is_rejected() {
    let err = update_sql(Dialect::Postgres, &AuditEvent::default(), "", &[]).unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
}

#[test]
fn delete_prefixes_bare_filters() {
    let stmt = delete_sql::<User>(Dialect::Postgres, "id IN $1", &args![vec![1_i64, 2]]).unwrap();
    assert_eq!(stmt.sql(), "DELETE FROM user WHERE id IN (1,2)");

    let stmt = delete_sql::<User>(
        Dialect::Sqlite,
        "delete from user where name = ?",
        &args!["a"],
    )
    .unwrap();
    assert_eq!(stmt.sql(), "delete from user where name = ?");
    assert_eq!(stmt.render(Dialect::Sqlite), "delete from user where name = 'a'");
}

#[test]
fn delete_without_filter_is_rejected() {
    let err = delete_sql::<User>(Dialect::Postgres, "   ", &[]).unwrap_err();
    assert!(matches!(err, OrmError::Validation(_)));
}

#[test]
fn keyword_detection_skips_comments() {
    assert!(starts_with_keywords("-- note\n  UPDATE t SET a = 1", &["UPDATE"]));
    assert!(starts_with_keywords("/* x */ delete\tFROM t", &["DELETE", "FROM"]));
    assert!(!starts_with_keywords("updated_at > now()", &["UPDATE"]));
    assert!(!starts_with_keywords("DELETE t", &["DELETE", "FROM"]));
}

#[test]
fn render_leaves_unbound_placeholders() {
    let stmt = Statement::new("SELECT $1, $2", vec![Value::Int(1)]);
    assert_eq!(stmt.render(Dialect::Postgres), "SELECT 1, $2");
}
