use super::*;
use lama_object::NoopReporter;

#[test]
fn strings_compare_by_content() {
    assert_eq!(Value::string("ab"), Value::from("ab"));
    assert_ne!(Value::string("ab"), Value::string("ba"));
}

#[test]
fn different_kinds_are_never_equal() {
    assert_ne!(Value::Int(1), Value::Bool(true));
    assert_ne!(Value::Unit, Value::Int(0));
    assert_ne!(Value::string("1"), Value::Int(1));
}

#[test]
fn objects_compare_by_identity() {
    let a = ObjectRef::new(DynamicObject::allocate(&NoopReporter));
    let b = ObjectRef::new(DynamicObject::allocate(&NoopReporter));
    assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
    assert_ne!(Value::Object(a), Value::Object(b));
}

#[test]
fn type_names() {
    assert_eq!(Value::Unit.type_name(), "Unit");
    assert_eq!(Value::Int(3).type_name(), "Number");
    assert_eq!(Value::string("x").type_name(), "String");
    assert_eq!(Value::Bool(false).type_name(), "Boolean");
}

#[test]
fn display() {
    assert_eq!(Value::Unit.to_string(), "null");
    assert_eq!(Value::Int(-4).to_string(), "-4");
    assert_eq!(Value::string("hi").to_string(), "hi");
}
