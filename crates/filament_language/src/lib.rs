//! Lexer, prepare pass, parser, and cursor interpreter for the Filament
//! rule DSL.
//!
//! A rule is compiled in three steps and evaluated in a fourth:
//! - [`Lexer`] - classifies raw text into tokens, consulting the host for
//!   variable and event names
//! - [`prepare`] - one sizing scan producing a dense token stream, exact
//!   AST node count, and branch/argument slot counts
//! - [`Parser`] - emits the AST into a pre-sized arena with an explicit
//!   frame stack and a precedence-climbing expression builder
//! - [`Vm`] - walks the AST iteratively with a `go`/`ret` cursor pair,
//!   suspending at callable-event nodes and resuming from a saved
//!   continuation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod host;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod prepare;
pub mod span;
pub mod token;
pub mod vm;

#[cfg(test)]
pub(crate) mod testing;

pub use ast::{Arm, Ast, Node, NodeId};
pub use host::Host;
pub use lexer::{Lexer, nth_token};
pub use ops::{Arity, Assoc, FunctionDef, OperatorDef, FUNCTIONS, OPERATORS};
pub use parser::Parser;
pub use prepare::{prepare, Prepared, PreparedRule};
pub use span::Span;
pub use token::{Token, TokenKind};
pub use vm::{compile, compile_with, Continuation, Outcome, Rule, TraceRecord, ValueRecord, Vm};
