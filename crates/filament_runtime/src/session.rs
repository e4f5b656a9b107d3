//! Rule registry and execution driver.
//!
//! A session owns one [`MemoryHost`], one [`Vm`], and any number of
//! compiled rules. It routes dispatched events to `on` rules and drives
//! the suspend/resume chain: when a running rule raises an event that
//! another rule handles, the handler runs with a caller back-link, and the
//! raiser resumes once the handler completes. A rule that is already
//! frozen mid-chain is never re-entered; its event stays unrouted.

use filament_foundation::{Error, Result};
use filament_language::{compile, Outcome, Rule, TraceRecord, Vm};

use crate::host::MemoryHost;

/// A compiled rule with the name it was registered under.
#[derive(Debug)]
pub struct NamedRule {
    /// Registration name, unique within the session.
    pub name: String,
    /// The compiled rule and its execution state.
    pub rule: Rule,
}

/// Summary of one session run, covering the whole chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Rule activations in the chain, including resumes.
    pub activations: usize,
    /// Dispatched events no rule could handle.
    pub unrouted: Vec<String>,
}

/// Compiles, stores, and runs rules against a shared host.
pub struct Session {
    host: MemoryHost,
    vm: Vm,
    rules: Vec<NamedRule>,
    tracing: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a session with an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::with_host(MemoryHost::new())
    }

    /// Creates a session around a prepared host.
    #[must_use]
    pub fn with_host(host: MemoryHost) -> Self {
        Session {
            host,
            vm: Vm::new(),
            rules: Vec::new(),
            tracing: false,
        }
    }

    /// Shared access to the host.
    #[must_use]
    pub fn host(&self) -> &MemoryHost {
        &self.host
    }

    /// Mutable access to the host.
    pub fn host_mut(&mut self) -> &mut MemoryHost {
        &mut self.host
    }

    /// Registered rules in registration order.
    #[must_use]
    pub fn rules(&self) -> &[NamedRule] {
        &self.rules
    }

    /// Turns step tracing on or off for subsequent runs.
    pub fn set_tracing(&mut self, enabled: bool) {
        self.tracing = enabled;
    }

    /// Takes the trace collected by the last traced run.
    pub fn take_trace(&mut self) -> Option<Vec<TraceRecord>> {
        self.vm.take_trace()
    }

    /// Compiles `source` and registers it under `name`. Returns the rule's
    /// index.
    ///
    /// # Errors
    /// Returns compile errors; nothing is registered on failure.
    pub fn add_rule(&mut self, name: impl Into<String>, source: &str) -> Result<usize> {
        let rule = compile(source, &self.host)?;
        self.rules.push(NamedRule {
            name: name.into(),
            rule,
        });
        Ok(self.rules.len() - 1)
    }

    /// Runs the rule at `index` and drives the resulting chain until every
    /// rule in it has completed.
    ///
    /// # Errors
    /// Returns evaluation or host errors from any rule in the chain, and
    /// an unknown-name error for an out-of-range index.
    pub fn run_rule(&mut self, index: usize) -> Result<RunReport> {
        if index >= self.rules.len() {
            return Err(Error::unknown_name(format!("rule #{index}")));
        }
        if self.tracing {
            self.vm.enable_trace();
        }
        let mut report = RunReport {
            activations: 0,
            unrouted: Vec::new(),
        };
        let mut current = index;
        loop {
            report.activations += 1;
            let outcome = self
                .vm
                .run(&mut self.rules[current].rule, &mut self.host)?;
            match outcome {
                Outcome::Suspended { .. } => {
                    let Some(event) = self.host.pop_dispatched() else {
                        return Err(Error::internal("suspension without a dispatched event"));
                    };
                    match self.handler_for(&event) {
                        Some(handler) => {
                            self.rules[handler].rule.set_caller(current);
                            current = handler;
                        }
                        None => {
                            // Nobody takes it; resume the raiser.
                            report.unrouted.push(event);
                        }
                    }
                }
                Outcome::Complete => match self.rules[current].rule.take_caller() {
                    Some(caller) => current = caller,
                    None => return Ok(report),
                },
            }
        }
    }

    /// Fires an event as if a rule had raised it. Returns `None` if no
    /// rule handles the event.
    ///
    /// # Errors
    /// Returns evaluation or host errors from the handling chain.
    pub fn fire_event(&mut self, event: &str) -> Result<Option<RunReport>> {
        match self.handler_for(event) {
            Some(index) => self.run_rule(index).map(Some),
            None => Ok(None),
        }
    }

    /// Resets every rule and clears their variables on the host.
    ///
    /// # Errors
    /// Propagates host failures from clearing variables.
    pub fn reset(&mut self) -> Result<()> {
        for named in &mut self.rules {
            named.rule.reset(&mut self.host)?;
        }
        Ok(())
    }

    /// Finds a rule that can handle `event` right now: an `on` rule for
    /// that event which is not frozen mid-chain.
    fn handler_for(&self, event: &str) -> Option<usize> {
        self.rules.iter().position(|named| {
            if named.rule.is_suspended() {
                return false;
            }
            named
                .rule
                .trigger_event()
                .and_then(|id| named.rule.ast.events.get(id))
                == Some(event)
        })
    }
}

/// Splits a source file into individual rules by tracking `if`/`on`
/// nesting against `end` at the word level.
#[must_use]
pub fn split_rules(source: &str) -> Vec<&str> {
    let mut rules = Vec::new();
    let mut depth = 0i32;
    let mut start: Option<usize> = None;
    for (offset, word) in words(source) {
        if start.is_none() {
            start = Some(offset);
        }
        match word {
            "if" | "on" => depth += 1,
            "end" => {
                depth -= 1;
                if depth <= 0 {
                    if let Some(begin) = start.take() {
                        rules.push(&source[begin..offset + word.len()]);
                    }
                    depth = 0;
                }
            }
            _ => {}
        }
    }
    // Trailing text without a closing `end` still reaches the compiler so
    // the user sees its error.
    if let Some(begin) = start {
        rules.push(&source[begin..]);
    }
    rules
}

/// Whitespace-delimited words with their byte offsets.
fn words(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source.split_whitespace().map(move |word| {
        let offset = word.as_ptr() as usize - source.as_ptr() as usize;
        (offset, word)
    })
}
