//! The interactive read-eval-print loop.
//!
//! Two kinds of input are accepted: rule text (starting with `if` or
//! `on`), which is compiled into the session and run immediately unless it
//! is a trigger rule, and `:commands` for poking at the host and the
//! registered rules.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use filament_foundation::{Error, Result, Value};

use crate::editor::{is_balanced, LineEditor, ReadResult, RustylineEditor};
use crate::session::{split_rules, RunReport, Session};

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    editor: E,
    session: Session,
    show_banner: bool,
    prompt: String,
    continuation_prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a REPL with the default rustyline editor.
    ///
    /// # Errors
    /// Returns an error if the editor fails to initialize.
    pub fn new() -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a REPL with the given editor.
    pub fn with_editor(editor: E) -> Self {
        Self {
            editor,
            session: Session::new(),
            show_banner: true,
            prompt: "filament> ".to_string(),
            continuation_prompt: "........> ".to_string(),
        }
    }

    /// Replaces the session.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Disables the welcome banner.
    #[must_use]
    pub const fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Shared access to the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access to the session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Runs the REPL loop until EOF or `:quit`.
    ///
    /// # Errors
    /// Returns an error if reading input fails fatally; evaluation errors
    /// are printed and the loop continues.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            self.print_banner();
        }
        loop {
            match self.read_eval_print() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => print_error(&e),
            }
        }
        println!("\nGoodbye!");
        Ok(())
    }

    /// One iteration. `Ok(false)` ends the loop.
    fn read_eval_print(&mut self) -> Result<bool> {
        let Some(input) = self.read_input()? else {
            return Ok(false);
        };
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(true);
        }
        self.editor.add_history(trimmed);
        match self.eval(trimmed) {
            Ok(keep_going) => Ok(keep_going),
            Err(e) => {
                print_error(&e);
                Ok(true)
            }
        }
    }

    /// Reads one input, continuing across lines while a construct is open.
    fn read_input(&mut self) -> Result<Option<String>> {
        let mut input = String::new();
        let mut first_line = true;
        loop {
            let prompt = if first_line {
                &self.prompt
            } else {
                &self.continuation_prompt
            };
            match self.editor.read_line(prompt)? {
                ReadResult::Line(line) => {
                    if !first_line {
                        input.push('\n');
                    }
                    input.push_str(&line);
                    if is_balanced(&input) {
                        return Ok(Some(input));
                    }
                    first_line = false;
                }
                ReadResult::Interrupted => {
                    if !first_line {
                        println!("\nInput cancelled.");
                    }
                    return Ok(Some(String::new()));
                }
                ReadResult::Eof => return Ok(None),
            }
        }
    }

    /// Evaluates one complete input. `Ok(false)` ends the loop.
    ///
    /// # Errors
    /// Returns compile and evaluation errors for bad input.
    pub fn eval(&mut self, input: &str) -> Result<bool> {
        if let Some(command) = input.strip_prefix(':') {
            return self.run_command(command);
        }
        self.add_rules(input, "rule")?;
        Ok(true)
    }

    /// Compiles each rule in `source`, running non-trigger rules right
    /// away. Trigger rules wait for their event.
    fn add_rules(&mut self, source: &str, name_stem: &str) -> Result<()> {
        for chunk in split_rules(source) {
            let name = format!("{name_stem}-{}", self.session.rules().len() + 1);
            let index = self.session.add_rule(name.clone(), chunk)?;
            if self.session.rules()[index].rule.trigger_event().is_some() {
                println!("registered {name} (waiting for its event)");
            } else {
                let report = self.session.run_rule(index)?;
                self.print_report(&name, &report);
            }
        }
        Ok(())
    }

    fn run_command(&mut self, command: &str) -> Result<bool> {
        let mut parts = command.split_whitespace();
        let head = parts.next().unwrap_or("");
        let rest: Vec<&str> = parts.collect();
        match head {
            "quit" | "q" => return Ok(false),
            "help" | "h" => print_help(),
            "vars" => {
                let mut out = String::new();
                filament_language::Host::dump(self.session.host(), &mut out)
                    .map_err(|e| Error::host(format!("dump failed: {e}")))?;
                if out.is_empty() {
                    println!("(no variables set)");
                } else {
                    print!("{out}");
                }
            }
            "rules" => {
                if self.session.rules().is_empty() {
                    println!("(no rules registered)");
                }
                for (index, named) in self.session.rules().iter().enumerate() {
                    let state = if named.rule.is_suspended() {
                        "suspended"
                    } else if named.rule.trigger_event().is_some() {
                        "waiting"
                    } else {
                        "idle"
                    };
                    println!("#{index} {} [{state}]", named.name);
                }
            }
            "set" => {
                let [name, value] = rest.as_slice() else {
                    return Err(Error::host(":set requires a variable and a value"));
                };
                let value = parse_value(value)?;
                self.session.host_mut().set_variable(*name, value);
            }
            "event" => {
                let [name] = rest.as_slice() else {
                    return Err(Error::host(":event requires an event name"));
                };
                self.session.host_mut().register_event(*name);
                match self.session.fire_event(name)? {
                    Some(report) => self.print_report(name, &report),
                    None => println!("no rule handles '{name}'"),
                }
            }
            "run" => {
                let [index] = rest.as_slice() else {
                    return Err(Error::host(":run requires a rule index"));
                };
                let index: usize = index
                    .parse()
                    .map_err(|_| Error::host(format!("invalid rule index: {index}")))?;
                let name = self
                    .session
                    .rules()
                    .get(index)
                    .map(|named| named.name.clone())
                    .unwrap_or_else(|| format!("#{index}"));
                let report = self.session.run_rule(index)?;
                self.print_report(&name, &report);
            }
            "load" => {
                let [path] = rest.as_slice() else {
                    return Err(Error::host(":load requires a file path"));
                };
                self.load_file(Path::new(path))?;
            }
            "trace" => {
                let enabled = match rest.as_slice() {
                    ["on"] => true,
                    ["off"] => false,
                    _ => return Err(Error::host(":trace requires 'on' or 'off'")),
                };
                self.session.set_tracing(enabled);
                println!("tracing {}", if enabled { "on" } else { "off" });
            }
            "reset" => {
                self.session.reset()?;
                println!("session reset");
            }
            other => return Err(Error::host(format!("unknown command: :{other}"))),
        }
        Ok(true)
    }

    /// Loads a rule file: every rule is registered, non-trigger rules run
    /// in file order.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or a rule fails.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let source = fs::read_to_string(path)
            .map_err(|e| Error::host(format!("failed to read {}: {e}", path.display())))?;
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("file");
        // Event declarations may precede the rules that use them.
        for line in source.lines() {
            if let Some(event) = line.trim().strip_prefix("event ") {
                self.session.host_mut().register_event(event.trim());
            }
        }
        let rules: String = source
            .lines()
            .filter(|line| !line.trim().starts_with("event "))
            .collect::<Vec<_>>()
            .join("\n");
        self.add_rules(&rules, stem)
    }

    fn print_report(&mut self, name: &str, report: &RunReport) {
        println!(
            "{name}: completed ({} activation{})",
            report.activations,
            if report.activations == 1 { "" } else { "s" }
        );
        for event in &report.unrouted {
            println!("  event '{event}' had no handler");
        }
        if let Some(trace) = self.session.take_trace() {
            for record in &trace {
                println!("  [{:>3}] {:?} <- {:?} {}", record.step, record.at, record.from, record.kind);
            }
            // Keep tracing armed for the next run.
            self.session.set_tracing(true);
        }
    }

    fn print_banner(&self) {
        println!("Filament rule shell v{}", env!("CARGO_PKG_VERSION"));
        println!("Type a rule (if ... end / on <event> then ... end) or :help.\n");
        let _ = io::stdout().flush();
    }
}

/// Parses a literal REPL value: integer, float, or `null`.
fn parse_value(text: &str) -> Result<Value> {
    if text == "null" {
        return Ok(Value::Null);
    }
    if let Ok(int) = text.parse::<i64>() {
        return Ok(Value::Int(int));
    }
    if let Ok(float) = text.parse::<f64>() {
        return Ok(Value::Float(float));
    }
    Err(Error::host(format!("not a value: {text}")))
}

fn print_error(error: &Error) {
    eprintln!("\x1b[31mError: {error}\x1b[0m");
}

fn print_help() {
    println!(
        "Enter a rule to compile it; plain `if` rules run immediately,
`on <event>` rules wait for their event.

COMMANDS:
    :set $name VALUE   Set a host variable (integer, float, or null)
    :vars              List host variables
    :rules             List registered rules and their state
    :run N             Run rule N again
    :event NAME        Register NAME as an event and fire it
    :load PATH         Load a rule file (one `event NAME` line per event)
    :trace on|off      Toggle step tracing
    :reset             Reset all rules and clear their variables
    :help              Show this help
    :quit              Exit (also Ctrl+D)"
    );
}
