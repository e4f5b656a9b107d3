//! Core types, errors, and arena storage for Filament.
//!
//! This crate provides:
//! - [`Value`] - The scalar value type rules compute with (null, integer, float)
//! - [`Error`] - Categorized error types with display-ready context
//! - [`Arena`] - Growable, offset-addressed record storage
//! - [`NameTable`] - Compact deduplicating name table

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod error;
pub mod names;
pub mod value;


pub use arena::{Arena, Offset};
pub use error::{Error, ErrorKind, Result};
pub use names::{NameId, NameTable};
pub use value::{Value, ValueType};
