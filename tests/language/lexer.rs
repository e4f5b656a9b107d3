//! Integration tests for tokenization against the in-memory host.

use filament_language::{nth_token, Lexer, TokenKind};
use filament_runtime::MemoryHost;

fn host() -> MemoryHost {
    let mut host = MemoryHost::new();
    host.register_event("sunset");
    host.register_event("notify");
    host
}

fn kinds(source: &str) -> Vec<TokenKind> {
    let host = host();
    Lexer::new(source, &host)
        .tokenize_all()
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

#[test]
fn keywords_and_punctuation() {
    let tokens = kinds("if elseif else then end ( ) , ;");
    assert!(matches!(tokens[0], TokenKind::If));
    assert!(matches!(tokens[1], TokenKind::ElseIf));
    assert!(matches!(tokens[2], TokenKind::Else));
    assert!(matches!(tokens[3], TokenKind::Then));
    assert!(matches!(tokens[4], TokenKind::End));
    assert!(matches!(tokens[5], TokenKind::LParen));
    assert!(matches!(tokens[8], TokenKind::Semicolon));
}

#[test]
fn numbers_split_on_the_dot() {
    let tokens = kinds("42 3.5 0 0.0");
    assert!(matches!(tokens[0], TokenKind::Int(42)));
    assert!(matches!(tokens[1], TokenKind::Float(f) if (f - 3.5).abs() < f64::EPSILON));
    assert!(matches!(tokens[2], TokenKind::Int(0)));
    assert!(matches!(tokens[3], TokenKind::Float(_)));
}

#[test]
fn host_classifies_variables_and_events() {
    let tokens = kinds("$temp sunset notify()");
    assert!(matches!(&tokens[0], TokenKind::Variable(name) if name == "$temp"));
    assert!(matches!(&tokens[1], TokenKind::Event(name) if name == "sunset"));
    assert!(matches!(&tokens[2], TokenKind::EventCall(name) if name == "notify"));
}

#[test]
fn assignment_and_equality_are_distinct() {
    let tokens = kinds("$a = $b == 1");
    assert!(matches!(tokens[1], TokenKind::Assign));
    assert!(matches!(tokens[3], TokenKind::Operator(_)));
}

#[test]
fn unknown_names_become_error_tokens() {
    let host = host();
    let tokens = Lexer::new("if mystery", &host).tokenize_all();
    assert!(matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Error(_))));
}

#[test]
fn nth_token_rescans_from_the_start() {
    let host = host();
    let token = nth_token("if $a then $b = 1; end", &host, 3);
    assert!(matches!(&token.kind, TokenKind::Variable(name) if name == "$b"));
}
