//! Integration tests for the value type.

use filament_foundation::{Value, ValueType};

#[test]
fn value_types_are_reported() {
    assert_eq!(Value::Null.value_type(), ValueType::Null);
    assert_eq!(Value::Int(1).value_type(), ValueType::Int);
    assert_eq!(Value::Float(1.0).value_type(), ValueType::Float);
}

#[test]
fn truthiness_follows_nonzero_numeric() {
    assert!(Value::Int(1).is_truthy());
    assert!(Value::Int(-1).is_truthy());
    assert!(Value::Float(0.5).is_truthy());
    assert!(!Value::Int(0).is_truthy());
    assert!(!Value::Float(0.0).is_truthy());
    assert!(!Value::Null.is_truthy());
}

#[test]
fn floats_widen_from_both_numeric_kinds() {
    assert_eq!(Value::Int(3).as_f64(), Some(3.0));
    assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
    assert_eq!(Value::Null.as_f64(), None);
}

#[test]
fn display_keeps_kinds_apart() {
    assert_eq!(Value::Int(3).to_string(), "3");
    assert_eq!(Value::Float(3.0).to_string(), "3.0");
    assert_eq!(Value::Float(2.25).to_string(), "2.25");
    assert_eq!(Value::Null.to_string(), "null");
}

#[test]
fn conversions_from_primitives() {
    assert_eq!(Value::from(7i64), Value::Int(7));
    assert_eq!(Value::from(1.5f64), Value::Float(1.5));
}
