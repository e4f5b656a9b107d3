//! Filament - Compact rule scripting for control devices
//!
//! This crate re-exports all layers of the Filament system for convenient
//! access. For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: filament_runtime    — In-memory host, rule session, REPL, CLI
//! Layer 1: filament_language   — Lexer, prepare pass, parser, interpreter
//! Layer 0: filament_foundation — Core types (Value, Error, Arena, names)
//! ```

pub use filament_foundation as foundation;
pub use filament_language as language;
pub use filament_runtime as runtime;
