//! Token types for the Filament rule DSL.
//!
//! Tokens are the output of the lexer and the input to the prepare pass.

use crate::span::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Token types for the Filament rule DSL.
///
/// Operator and function names are resolved to table indices at lex time;
/// variable and event names are classified by the host recognizer hooks.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Block keywords (case-insensitive)
    /// `if`
    If,
    /// `elseif`
    ElseIf,
    /// `else`
    Else,
    /// `then`
    Then,
    /// `end`
    End,
    /// `on`
    On,

    // Punctuation
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `=` (assignment)
    Assign,

    // Literals
    /// `null` (case-insensitive)
    Null,
    /// Integer literal like `42`
    Int(i64),
    /// Float literal like `21.5`
    Float(f64),

    // Table-resolved names
    /// Operator, as an index into the operator table.
    Operator(u8),
    /// Function name, as an index into the function table.
    Function(u8),

    // Host-recognized names
    /// Variable token recognized by the host, like `$temp`.
    Variable(String),
    /// Event token recognized by the host, trigger form (`sunset`).
    Event(String),
    /// Event token with trailing `()`, callable form (`notify()`).
    EventCall(String),

    // Meta
    /// End of input.
    Eof,
    /// Lexing error; always terminal.
    Error(String),
}

impl TokenKind {
    /// Returns a short human-readable name for error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::If => "'if'",
            Self::ElseIf => "'elseif'",
            Self::Else => "'else'",
            Self::Then => "'then'",
            Self::End => "'end'",
            Self::On => "'on'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Comma => "','",
            Self::Semicolon => "';'",
            Self::Assign => "'='",
            Self::Null => "'null'",
            Self::Int(_) => "integer literal",
            Self::Float(_) => "float literal",
            Self::Operator(_) => "operator",
            Self::Function(_) => "function name",
            Self::Variable(_) => "variable",
            Self::Event(_) => "event",
            Self::EventCall(_) => "event call",
            Self::Eof => "end of input",
            Self::Error(_) => "invalid token",
        }
    }
}
