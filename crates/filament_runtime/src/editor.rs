//! Line editor abstraction for the REPL.
//!
//! Keeps the REPL itself independent of the line editing library: the
//! default implementation wraps rustyline, tests use a scripted editor.

use std::borrow::Cow;

use filament_foundation::{Error, Result};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Completer as RlCompleter, Config, Context, Editor, Helper, Hinter, Validator as RlValidator};

/// Result of reading a line from the editor.
#[derive(Debug)]
pub enum ReadResult {
    /// A line was successfully read.
    Line(String),
    /// User pressed Ctrl+C.
    Interrupted,
    /// User pressed Ctrl+D (EOF).
    Eof,
}

/// Abstraction over line editing functionality.
pub trait LineEditor {
    /// Reads a line with the given prompt.
    ///
    /// # Errors
    /// Returns an error if reading from the terminal fails.
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult>;

    /// Adds a line to history.
    fn add_history(&mut self, line: &str);
}

/// Returns true if `input` holds only fully closed constructs: every `if`
/// and `on` word is balanced by an `end`.
#[must_use]
pub fn is_balanced(input: &str) -> bool {
    let mut depth = 0i32;
    for word in input.split_whitespace() {
        match word {
            "if" | "on" => depth += 1,
            "end" => depth -= 1,
            _ => {}
        }
    }
    depth <= 0
}

/// Helper wiring completion, hints, and validation into rustyline.
#[derive(Helper, RlCompleter, Hinter, RlValidator)]
struct FilamentHelper {
    #[rustyline(Completer)]
    completer: KeywordCompleter,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    #[rustyline(Validator)]
    validator: ConstructValidator,
}

impl Highlighter for FilamentHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Owned(format!("\x1b[1;32m{prompt}\x1b[0m"))
        } else {
            Cow::Borrowed(prompt)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        false
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(format!("\x1b[2m{hint}\x1b[0m"))
    }
}

/// Completer over language keywords, built-in functions, and commands.
struct KeywordCompleter {
    keywords: Vec<String>,
}

impl KeywordCompleter {
    fn new() -> Self {
        let mut keywords: Vec<String> = [
            "if", "elseif", "else", "then", "end", "on", "null", "and", "or",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        keywords.extend(
            filament_language::FUNCTIONS
                .iter()
                .map(|def| def.name.to_string()),
        );
        keywords.extend(
            [
                ":event", ":help", ":load", ":quit", ":reset", ":rules", ":run", ":set",
                ":trace", ":vars",
            ]
            .iter()
            .map(ToString::to_string),
        );
        Self { keywords }
    }
}

impl Completer for KeywordCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || "(),;".contains(c))
            .map_or(0, |i| i + 1);
        let word = &line[start..pos];
        let candidates = self
            .keywords
            .iter()
            .filter(|keyword| keyword.starts_with(word))
            .map(|keyword| Pair {
                display: keyword.clone(),
                replacement: keyword.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

/// Treats input with unbalanced `if`/`on` constructs as incomplete, so
/// rules can be typed across several lines.
#[derive(Default)]
struct ConstructValidator;

impl Validator for ConstructValidator {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        if is_balanced(ctx.input()) {
            Ok(ValidationResult::Valid(None))
        } else {
            Ok(ValidationResult::Incomplete)
        }
    }
}

/// Line editor implementation using rustyline.
pub struct RustylineEditor {
    editor: Editor<FilamentHelper, DefaultHistory>,
}

impl RustylineEditor {
    /// Creates a new rustyline-based editor.
    ///
    /// # Errors
    /// Returns an error if rustyline initialization fails.
    ///
    /// # Panics
    /// Panics if the hardcoded history size is rejected, which cannot
    /// happen for a nonzero constant.
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .max_history_size(1000)
            .expect("valid history size")
            .build();
        let helper = FilamentHelper {
            completer: KeywordCompleter::new(),
            hinter: HistoryHinter::new(),
            validator: ConstructValidator,
        };
        let mut editor = Editor::with_config(config)
            .map_err(|e| Error::host(format!("editor initialization failed: {e}")))?;
        editor.set_helper(Some(helper));
        Ok(Self { editor })
    }
}

impl LineEditor for RustylineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<ReadResult> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadResult::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadResult::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadResult::Eof),
            Err(e) => Err(Error::host(format!("read failed: {e}"))),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }
}
