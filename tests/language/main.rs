//! Integration tests for Layer 1: Language
//!
//! Tests for the lexer, prepare pass, parser, and interpreter, driven
//! through the real in-memory host.

mod lexer;
mod parser;
mod properties;
mod vm;
