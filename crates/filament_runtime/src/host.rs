//! In-memory host backing the session, the REPL, and tests.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use filament_foundation::{Result, Value};
use filament_language::Host;

/// A [`Host`] that keeps everything in process memory: `$`-prefixed
/// variables in a map, an explicit event registry, compile-time constants,
/// and a queue of dispatched events for the session to route.
#[derive(Debug, Default)]
pub struct MemoryHost {
    variables: HashMap<String, Value>,
    constants: HashMap<String, Value>,
    events: Vec<String>,
    dispatched: VecDeque<String>,
}

impl MemoryHost {
    /// Creates an empty host with no events registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an event name so the lexer recognizes it in rule text.
    pub fn register_event(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.events.contains(&name) {
            self.events.push(name);
        }
    }

    /// Binds a compile-time constant. Rules compiled afterwards resolve
    /// the name without a runtime read.
    pub fn define_constant(&mut self, name: impl Into<String>, value: Value) {
        self.constants.insert(name.into(), value);
    }

    /// Current value of a variable, if set.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<Value> {
        self.variables.get(name).copied()
    }

    /// Stores a variable directly, bypassing rule execution.
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Takes the oldest dispatched event waiting for routing.
    pub fn pop_dispatched(&mut self) -> Option<String> {
        self.dispatched.pop_front()
    }

    /// Number of dispatched events not yet routed.
    #[must_use]
    pub fn dispatched_len(&self) -> usize {
        self.dispatched.len()
    }

    /// Registered event names.
    #[must_use]
    pub fn events(&self) -> &[String] {
        &self.events
    }
}

impl Host for MemoryHost {
    fn is_variable(&self, name: &str) -> bool {
        name.len() > 1 && name.starts_with('$')
    }

    fn is_event(&self, name: &str) -> bool {
        self.events.iter().any(|event| event == name)
    }

    fn literal(&self, name: &str) -> Option<Value> {
        self.constants.get(name).copied()
    }

    fn get(&self, name: &str) -> Result<Value> {
        Ok(self.variables.get(name).copied().unwrap_or(Value::Null))
    }

    fn set(&mut self, name: &str, value: Value) -> Result<()> {
        self.variables.insert(name.to_string(), value);
        Ok(())
    }

    fn clear(&mut self, name: &str) -> Result<()> {
        self.variables.remove(name);
        Ok(())
    }

    fn dispatch(&mut self, event: &str) -> Result<()> {
        self.dispatched.push_back(event.to_string());
        Ok(())
    }

    fn dump(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let mut names: Vec<&String> = self.variables.keys().collect();
        names.sort();
        for name in names {
            writeln!(out, "{name} = {}", self.variables[name])?;
        }
        Ok(())
    }
}
