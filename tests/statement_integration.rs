//! Integration tests for raw statement parsing.
//!
//! These tests verify:
//! - Positional and named placeholder binding
//! - Per-driver placeholder tokens
//! - Parameter flattening from structs, maps and lists
//! - Error reporting for missing keys and malformed placeholders

use batis::core::flatten::flatten;
use batis::core::placeholder::{PlaceholderStyle, PlaceholderStyles};
use batis::core::statement::{parse_named, parse_positional, parse_simple};
use batis::prelude::*;
use batis::ErrorCode;
use pretty_assertions::assert_eq;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
#[serde(rename = "u")]
struct U {
    #[serde(rename = "Id")]
    id: i64,
    #[serde(rename = "Name")]
    name: String,
}

fn hello() -> U {
    U {
        id: 100,
        name: "hello".into(),
    }
}

#[test]
fn test_positional_postgres() {
    let parser = Parser::statement("SELECT * FROM t WHERE id = #{0} AND name = #{1}");
    let md = parser
        .parse_metadata("postgres", &params![100, "hello"].unwrap())
        .unwrap();

    assert_eq!(md.action, Action::Select);
    assert_eq!(md.prepared_sql, "SELECT * FROM t WHERE id = $1 AND name = $2");
    assert_eq!(md.params, vec![Value::Int(100), Value::from("hello")]);
    assert_eq!(md.vars, vec!["0", "1"]);
}

#[test]
fn test_struct_fields_mysql() {
    let parser = Parser::statement("SELECT * FROM t WHERE id = #{u.Id} AND name = #{u.Name}");
    let md = parser
        .parse_metadata("mysql", &params![hello()].unwrap())
        .unwrap();

    assert_eq!(md.prepared_sql, "SELECT * FROM t WHERE id = ? AND name = ?");
    assert_eq!(md.params, vec![Value::Int(100), Value::from("hello")]);
}

#[test]
fn test_drivers_differ_only_in_tokens() {
    let parser = Parser::statement("UPDATE t SET name = #{u.Name} WHERE id = #{u.Id}");
    let params = params![hello()].unwrap();

    let mysql = parser.parse_metadata("mysql", &params).unwrap();
    let postgres = parser.parse_metadata("postgres", &params).unwrap();
    let oracle = parser.parse_metadata("oci8", &params).unwrap();

    assert_eq!(mysql.prepared_sql, "UPDATE t SET name = ? WHERE id = ?");
    assert_eq!(postgres.prepared_sql, "UPDATE t SET name = $1 WHERE id = $2");
    assert_eq!(oracle.prepared_sql, "UPDATE t SET name = :1 WHERE id = :2");

    assert_eq!(mysql.params, postgres.params);
    assert_eq!(mysql.params, oracle.params);
    assert_eq!(mysql.vars, postgres.vars);
    assert_eq!(mysql.action, Action::Update);
}

#[test]
fn test_unknown_driver_uses_question_marks() {
    let md = Parser::statement("DELETE FROM t WHERE id = #{0}")
        .parse_metadata("sqlite", &[Value::Int(1)])
        .unwrap();
    assert_eq!(md.prepared_sql, "DELETE FROM t WHERE id = ?");
    assert_eq!(md.action, Action::Delete);
}

#[test]
fn test_raw_substitution_is_not_bound() {
    let mut filter = BTreeMap::new();
    filter.insert("table", Value::from("users"));
    filter.insert("id", Value::Int(3));

    let md = Parser::statement("SELECT * FROM ${table} WHERE id = #{id}")
        .parse_metadata("postgres", &params![filter].unwrap())
        .unwrap();

    assert_eq!(md.prepared_sql, "SELECT * FROM users WHERE id = $1");
    assert_eq!(md.params, vec![Value::Int(3)]);
    assert_eq!(md.vars, vec!["table", "id"]);
}

#[test]
fn test_missing_key() {
    let err = Parser::statement("SELECT * FROM t WHERE id = #{missing}")
        .parse_metadata("mysql", &params![100].unwrap())
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::ParamKeyNotFound);
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_unterminated_placeholder() {
    let err = Parser::statement("SELECT * FROM t WHERE id = #{id")
        .parse_metadata("mysql", &[])
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MalformedPlaceholder);
}

#[test]
fn test_list_elements_and_length() {
    let md = Parser::statement("SELECT * FROM t WHERE id IN (#{0[0]}, #{0[1]}) LIMIT #{0}")
        .parse_metadata("mysql", &params![vec![10, 20]].unwrap())
        .unwrap();

    assert_eq!(md.prepared_sql, "SELECT * FROM t WHERE id IN (?, ?) LIMIT ?");
    assert_eq!(md.params, vec![Value::Int(10), Value::Int(20), Value::Int(2)]);
}

#[test]
fn test_flatten_is_stable_for_the_same_input() {
    let params = params![hello(), 5, vec!["a", "b"]].unwrap();
    let first = flatten(&params);
    let second = flatten(&params);

    assert_eq!(first, second);
    assert_eq!(first["u.Id"], Value::Int(100));
    assert_eq!(first["0"], Value::Int(5));
    assert_eq!(first["1[0]"], Value::from("a"));
    assert_eq!(first["1"], Value::Int(2));
}

#[test]
fn test_parse_simple_collects_names() {
    let md = parse_simple("  SELECT * FROM ${t} WHERE a = #{a} AND b = #{b}  ").unwrap();
    assert_eq!(md.prepared_sql, "SELECT * FROM ${t} WHERE a = ? AND b = ?");
    assert_eq!(md.vars, vec!["a", "b"]);
    assert!(md.params.is_empty());
}

#[test]
fn test_parse_positional_bounds() {
    let params = vec![Value::Int(1)];
    let md = parse_positional(&PlaceholderStyle::Colon, "SELECT #{0}", &params).unwrap();
    assert_eq!(md.prepared_sql, "SELECT :1");

    let err = parse_positional(&PlaceholderStyle::Colon, "SELECT #{1}", &params).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParamIndexOutOfRange);

    let err = parse_positional(&PlaceholderStyle::Colon, "SELECT #{x}", &params).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidParamIndex);
}

#[test]
fn test_parse_named_with_custom_style() {
    let styles = PlaceholderStyles::new();
    styles.register("mssql", PlaceholderStyle::custom(|i| format!("@p{}", i)));

    let params = flatten(&params![1, 2].unwrap());
    let md = parse_named(&styles.select("mssql"), "SELECT #{0} + #{1}", &params).unwrap();
    assert_eq!(md.prepared_sql, "SELECT @p1 + @p2");
}

#[test]
fn test_action_detection() {
    let cases = [
        ("select 1", Action::Select),
        ("  INSERT INTO t VALUES (1)", Action::Insert),
        ("Update t SET a = 1", Action::Update),
        ("delete from t", Action::Delete),
        ("WITH x AS (SELECT 1) SELECT * FROM x", Action::Other),
        ("SHOW", Action::Other),
    ];
    for (sql, expected) in cases {
        let md = Parser::statement(sql).parse_metadata("mysql", &[]).unwrap();
        assert_eq!(md.action, expected, "{}", sql);
    }
}
