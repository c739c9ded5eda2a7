#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use super::*;
use pretty_assertions::assert_eq;

#[test]
fn values_from_arguments() {
    assert_eq!(parse_value("42"), Value::Int(42));
    assert_eq!(parse_value("-7"), Value::Int(-7));
    assert_eq!(parse_value("true"), Value::Bool(true));
    assert_eq!(parse_value("hello"), Value::string("hello"));
    assert_eq!(parse_value(""), Value::string(""));
}

#[test]
fn bindings() {
    assert_eq!(parse_binding("x=3"), Some(("x", Value::Int(3))));
    assert_eq!(parse_binding("s=a=b"), Some(("s", Value::string("a=b"))));
    assert_eq!(parse_binding("=3"), None);
    assert_eq!(parse_binding("x"), None);
}

#[test]
fn binding_names_must_be_identifiers() {
    assert_eq!(parse_binding("a){}function x(=1"), None);
    assert_eq!(parse_binding("while=1"), None);
    assert_eq!(parse_binding("2x=1"), None);
    assert_eq!(
        eval_expression("1", &["a){}function x(=1"], &RunOptions::default()),
        1
    );
}

#[test]
fn exit_code_comes_from_exit_builtin() {
    let dir = std::env::temp_dir().join(format!("lamac-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("exit.lama");
    std::fs::write(&path, "function main() { exit(3); }").unwrap();

    let code = run_file(path.to_str().unwrap(), &[], &RunOptions::default());
    assert_eq!(code, 3);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn eval_reports_bad_bindings() {
    assert_eq!(eval_expression("x", &["oops"], &RunOptions::default()), 1);
    assert_eq!(eval_expression("x + 1", &["x=1"], &RunOptions::default()), 0);
}
