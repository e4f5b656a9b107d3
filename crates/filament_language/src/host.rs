//! The host callback boundary.
//!
//! Variable storage, event dispatch, and token recognition all live in the
//! embedding application. The engine reaches them only through the [`Host`]
//! trait; nothing in the core owns a variable.

use std::fmt;

use filament_foundation::{Result, Value};

/// Callback surface supplied by the embedding application.
///
/// The recognizer hooks are consulted at compile time to classify tokens;
/// the variable and event hooks are invoked by the interpreter at run time.
/// The engine always copies values across this boundary, never aliasing
/// host storage.
pub trait Host {
    /// Returns true if `name` is a variable token this host owns.
    fn is_variable(&self, name: &str) -> bool;

    /// Returns true if `name` is an event token this host recognizes.
    fn is_event(&self, name: &str) -> bool;

    /// Optionally binds a recognized variable token to a compile-time
    /// constant. When this returns `Some`, reads of the variable resolve
    /// from the attached literal and never hit [`Host::get`]; assigning to
    /// such a name is a syntax error.
    fn literal(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Reads the current value of a variable.
    ///
    /// # Errors
    /// Returns an error if the host cannot produce a value; the run fails.
    fn get(&self, name: &str) -> Result<Value>;

    /// Writes a variable.
    ///
    /// # Errors
    /// Returns an error if the host rejects the write; the run fails.
    fn set(&mut self, name: &str, value: Value) -> Result<()>;

    /// Pre-reads a variable for use as a function argument.
    ///
    /// Defaults to [`Host::get`]; hosts with snapshot semantics can
    /// override it to pin the value read at call preparation time.
    ///
    /// # Errors
    /// Returns an error if the host cannot produce a value; the run fails.
    fn copy(&self, name: &str) -> Result<Value> {
        self.get(name)
    }

    /// Clears a variable when its rule is reset.
    ///
    /// # Errors
    /// Returns an error if the host rejects the clear.
    fn clear(&mut self, name: &str) -> Result<()>;

    /// Dispatches a callable event. Invoked immediately before the
    /// interpreter suspends at the event-call node.
    ///
    /// # Errors
    /// Returns an error if dispatch fails; the run fails without
    /// suspending.
    fn dispatch(&mut self, event: &str) -> Result<()>;

    /// Appends host-specific diagnostics (typically a variable dump).
    ///
    /// # Errors
    /// Returns an error if writing to `out` fails.
    fn dump(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let _ = out;
        Ok(())
    }
}
