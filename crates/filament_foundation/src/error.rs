//! Error types for the Filament engine.
//!
//! Uses `thiserror` for ergonomic error definition. Errors fall into three
//! classes: syntax errors in rule text (the user's problem), internal defect
//! errors (our problem, never a property of input), and evaluation errors
//! that fail a single run.

use thiserror::Error;

use crate::value::ValueType;

/// The main error type for Filament operations.
#[derive(Debug, Error)]
#[error("{kind}{}", .context.as_deref().map_or_else(String::new, |c| format!(" ({c})")))]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<String>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Creates a syntax error at a source position.
    #[must_use]
    pub fn syntax(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::Syntax {
            message: message.into(),
            line,
            column,
        })
    }

    /// Creates an unknown-token error at a source position.
    #[must_use]
    pub fn unknown_token(text: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(ErrorKind::UnknownToken {
            text: text.into(),
            line,
            column,
        })
    }

    /// Creates an internal defect error.
    ///
    /// These indicate a violated engine invariant, never a property of the
    /// rule text being processed.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: ValueType, actual: ValueType) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates an unknown-name error.
    #[must_use]
    pub fn unknown_name(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownName(name.into()))
    }

    /// Creates a host callback failure error.
    #[must_use]
    pub fn host(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::HostFailure(message.into()))
    }

    /// Returns true if this error is an internal defect.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self.kind, ErrorKind::Internal(_))
    }

    /// Returns true if this error was caused by malformed rule text.
    #[must_use]
    pub const fn is_syntax(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Syntax { .. } | ErrorKind::UnknownToken { .. } | ErrorKind::EmptyRule
        )
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Malformed rule text.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        /// Description of the problem.
        message: String,
        /// 1-based line of the offending token.
        line: u32,
        /// 1-based column of the offending token.
        column: u32,
    },

    /// Input the lexer could not classify.
    #[error("unknown token '{text}' at {line}:{column}")]
    UnknownToken {
        /// The unrecognized text.
        text: String,
        /// 1-based line of the token.
        line: u32,
        /// 1-based column of the token.
        column: u32,
    },

    /// Rule text contains no statements.
    #[error("empty rule body")]
    EmptyRule,

    /// Type mismatch during evaluation.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: ValueType,
        /// The actual type encountered.
        actual: ValueType,
    },

    /// Division or remainder by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Integer arithmetic overflowed.
    #[error("arithmetic overflow in '{operation}'")]
    Overflow {
        /// The operator or function that overflowed.
        operation: String,
    },

    /// Wrong number of arguments to a function.
    #[error("function '{function}' expects {expected} arguments, got {actual}")]
    ArityMismatch {
        /// The function name.
        function: String,
        /// Description of the expected arity.
        expected: String,
        /// Actual number of arguments.
        actual: usize,
    },

    /// A name the host or tables do not know.
    #[error("unknown name: {0}")]
    UnknownName(String),

    /// A host callback reported failure.
    #[error("host callback failed: {0}")]
    HostFailure(String),

    /// A violated engine invariant. Always a bug in the engine.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias using the Filament [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
