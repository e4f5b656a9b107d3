//! Integration tests for error construction and classification.

use filament_foundation::{Error, ErrorKind, ValueType};

#[test]
fn syntax_errors_carry_their_position() {
    let err = Error::syntax("unexpected 'then'", 3, 14);
    assert!(err.is_syntax());
    match err.kind {
        ErrorKind::Syntax { line, column, .. } => {
            assert_eq!((line, column), (3, 14));
        }
        other => panic!("expected syntax, got {other}"),
    }
}

#[test]
fn unknown_token_errors_keep_the_text() {
    let err = Error::unknown_token("@@", 1, 1);
    assert!(err.is_syntax());
    assert!(err.to_string().contains("@@"));
}

#[test]
fn internal_errors_are_flagged_as_defects() {
    let err = Error::internal("frame underflow");
    assert!(err.is_internal());
    assert!(!err.is_syntax());
}

#[test]
fn type_mismatch_names_both_sides() {
    let err = Error::type_mismatch(ValueType::Int, ValueType::Null);
    let message = err.to_string();
    assert!(message.contains("int"));
    assert!(message.contains("null"));
}

#[test]
fn context_is_appended_to_the_display() {
    let err = Error::host("sensor offline").with_context("reading $temp");
    let message = err.to_string();
    assert!(message.contains("sensor offline"));
    assert!(message.contains("reading $temp"));
}
