//! Lexer for the Filament rule DSL.
//!
//! The lexer is a stateless re-scanning classifier: it holds no token
//! table, only a cursor into the source. Names are matched
//! case-insensitively against the static operator/function tables and the
//! block keywords; everything else is offered to the host recognizer
//! hooks. Input that nothing claims is a terminal lexing error.

use crate::host::Host;
use crate::ops::{self, FunctionDef, OperatorDef};
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Characters that can form a symbolic operator or punctuation run.
const OPERATOR_CHARS: &str = "+-*/%^<>=!&|";

/// Lexer over Filament rule text.
pub struct Lexer<'src, 'h> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    /// Host recognizer hooks for variable/event tokens.
    host: &'h dyn Host,
    /// Operator table names are matched against.
    operators: &'static [OperatorDef],
    /// Function table names are matched against.
    functions: &'static [FunctionDef],
}

impl<'src, 'h> Lexer<'src, 'h> {
    /// Creates a new lexer over `source` using the built-in tables.
    #[must_use]
    pub fn new(source: &'src str, host: &'h dyn Host) -> Self {
        Self::with_tables(source, host, ops::OPERATORS, ops::FUNCTIONS)
    }

    /// Creates a new lexer with explicit operator/function tables.
    #[must_use]
    pub fn with_tables(
        source: &'src str,
        host: &'h dyn Host,
        operators: &'static [OperatorDef],
        functions: &'static [FunctionDef],
    ) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
            host,
            operators,
            functions,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, start_line, start_column),
            );
        };

        let kind = match c {
            '(' => {
                self.advance();
                TokenKind::LParen
            }
            ')' => {
                self.advance();
                TokenKind::RParen
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            ';' => {
                self.advance();
                TokenKind::Semicolon
            }
            c if c.is_ascii_digit() => self.scan_number(),
            c if OPERATOR_CHARS.contains(c) => self.scan_operator(),
            c if is_name_start(c) => self.scan_name(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c}"))
            }
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes all source and returns a vector of tokens, ending with Eof.
    #[must_use]
    pub fn tokenize_all(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = matches!(token.kind, TokenKind::Eof | TokenKind::Error(_));
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peeks at the character after the next one.
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Scans an integer or float literal.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        let mut has_dot = false;

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.'
                && !has_dot
                && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.position];
        if has_dot {
            match text.parse::<f64>() {
                Ok(n) => TokenKind::Float(n),
                Err(e) => TokenKind::Error(format!("invalid float: {e}")),
            }
        } else {
            match text.parse::<i64>() {
                Ok(n) => TokenKind::Int(n),
                Err(e) => TokenKind::Error(format!("invalid integer: {e}")),
            }
        }
    }

    /// Scans a symbolic operator or the `=` assignment sign.
    ///
    /// Two-character names are tried before one-character names so `<=`
    /// never lexes as `<` followed by garbage.
    fn scan_operator(&mut self) -> TokenKind {
        let two: String = self.rest.chars().take(2).collect();
        if two.len() == 2 && OPERATOR_CHARS.contains(two.chars().nth(1).unwrap_or(' ')) {
            if let Some(index) = ops::operator_index(self.operators, &two) {
                self.advance();
                self.advance();
                return TokenKind::Operator(index);
            }
        }

        let one: String = self.rest.chars().take(1).collect();
        self.advance();
        if one == "=" {
            return TokenKind::Assign;
        }
        match ops::operator_index(self.operators, &one) {
            Some(index) => TokenKind::Operator(index),
            None => TokenKind::Error(format!("unknown operator: {one}")),
        }
    }

    /// Scans a name and classifies it.
    ///
    /// Resolution order: block keyword, `null`, operator/function table,
    /// host variable recognizer, host event recognizer. An event name
    /// immediately followed by `()` is the callable form.
    fn scan_name(&mut self) -> TokenKind {
        let start = self.position;
        // The leading character was matched by is_name_start; consume it
        // here since is_name_char rejects the `$` sigil.
        self.advance();
        while self.peek_char().is_some_and(is_name_char) {
            self.advance();
        }
        let name = &self.source[start..self.position];

        if name.eq_ignore_ascii_case("if") {
            return TokenKind::If;
        }
        if name.eq_ignore_ascii_case("elseif") {
            return TokenKind::ElseIf;
        }
        if name.eq_ignore_ascii_case("else") {
            return TokenKind::Else;
        }
        if name.eq_ignore_ascii_case("then") {
            return TokenKind::Then;
        }
        if name.eq_ignore_ascii_case("end") {
            return TokenKind::End;
        }
        if name.eq_ignore_ascii_case("on") {
            return TokenKind::On;
        }
        if name.eq_ignore_ascii_case("null") {
            return TokenKind::Null;
        }
        if let Some(index) = ops::operator_index(self.operators, name) {
            return TokenKind::Operator(index);
        }
        if let Some(index) = ops::function_index(self.functions, name) {
            return TokenKind::Function(index);
        }
        if self.host.is_variable(name) {
            return TokenKind::Variable(name.to_string());
        }
        if self.host.is_event(name) {
            if self.rest.starts_with("()") {
                self.advance();
                self.advance();
                return TokenKind::EventCall(name.to_string());
            }
            return TokenKind::Event(name.to_string());
        }
        TokenKind::Error(format!("unrecognized name: {name}"))
    }
}

/// Re-derives the token with ordinal `index` by scanning from the start.
///
/// This trades CPU for state: no position table is kept anywhere, matching
/// the engine's memory posture. Returns the Eof token when `index` is past
/// the end.
#[must_use]
pub fn nth_token(source: &str, host: &dyn Host, index: usize) -> Token {
    let mut lexer = Lexer::new(source, host);
    let mut token = lexer.next_token();
    for _ in 0..index {
        if matches!(token.kind, TokenKind::Eof | TokenKind::Error(_)) {
            break;
        }
        token = lexer.next_token();
    }
    token
}

/// Returns true if `c` can start a name (variables include their `$`
/// sigil).
fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

/// Returns true if `c` can appear in a name (not at start).
fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
