//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: Value, Error, the arena primitive, and name
//! tables.

mod arena;
mod errors;
mod values;
