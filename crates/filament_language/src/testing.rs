//! Shared test host for unit tests.

use std::collections::HashMap;

use filament_foundation::{Result, Value};

use crate::host::Host;

/// Minimal in-crate host: `$`-prefixed variables, a registered event list,
/// and a dispatched-event log.
#[derive(Default)]
pub(crate) struct TestHost {
    pub vars: HashMap<String, Value>,
    pub events: Vec<String>,
    pub dispatched: Vec<String>,
    pub constants: HashMap<String, Value>,
}

impl TestHost {
    pub fn with_events(events: &[&str]) -> Self {
        Self {
            events: events.iter().map(ToString::to_string).collect(),
            ..Self::default()
        }
    }

    pub fn var(&self, name: &str) -> Value {
        self.vars.get(name).copied().unwrap_or(Value::Null)
    }
}

impl Host for TestHost {
    fn is_variable(&self, name: &str) -> bool {
        name.starts_with('$')
    }

    fn is_event(&self, name: &str) -> bool {
        self.events.iter().any(|e| e == name)
    }

    fn literal(&self, name: &str) -> Option<Value> {
        self.constants.get(name).copied()
    }

    fn get(&self, name: &str) -> Result<Value> {
        Ok(self.var(name))
    }

    fn set(&mut self, name: &str, value: Value) -> Result<()> {
        self.vars.insert(name.to_string(), value);
        Ok(())
    }

    fn clear(&mut self, name: &str) -> Result<()> {
        self.vars.remove(name);
        Ok(())
    }

    fn dispatch(&mut self, event: &str) -> Result<()> {
        self.dispatched.push(event.to_string());
        Ok(())
    }
}
