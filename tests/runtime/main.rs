//! Integration tests for Layer 2: Runtime
//!
//! Tests for the session driver and the REPL plumbing.

mod repl;
mod session;
