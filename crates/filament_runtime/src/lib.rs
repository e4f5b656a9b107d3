//! In-memory host, rule session, REPL, and CLI for Filament.
//!
//! This crate provides:
//! - [`MemoryHost`] - a [`filament_language::Host`] backed by process
//!   memory, with an event registry and a dispatched-event queue
//! - [`Session`] - compiles named rules and drives suspend/resume chains
//!   across them
//! - [`Repl`] - interactive shell over a swappable [`LineEditor`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod editor;
pub mod host;
pub mod repl;
pub mod session;


pub use editor::{is_balanced, LineEditor, ReadResult, RustylineEditor};
pub use host::MemoryHost;
pub use repl::Repl;
pub use session::{split_rules, NamedRule, RunReport, Session};
