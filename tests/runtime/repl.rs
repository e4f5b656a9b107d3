//! Integration tests for the REPL driven by a scripted editor.

use filament_foundation::{Result, Value};
use filament_runtime::{LineEditor, ReadResult, Repl};

/// Editor that replays a fixed script.
struct ScriptedEditor {
    lines: Vec<String>,
    next: usize,
}

impl ScriptedEditor {
    fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(ToString::to_string).collect(),
            next: 0,
        }
    }
}

impl LineEditor for ScriptedEditor {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadResult> {
        match self.lines.get(self.next) {
            Some(line) => {
                self.next += 1;
                Ok(ReadResult::Line(line.clone()))
            }
            None => Ok(ReadResult::Eof),
        }
    }

    fn add_history(&mut self, _line: &str) {}
}

#[test]
fn a_full_scripted_exchange() {
    let editor = ScriptedEditor::new(&[
        ":set $x 5",
        "if $x > 3 then $big = 1; else $big = 0; end",
        ":event sunset",
    ]);
    let mut repl = Repl::with_editor(editor).without_banner();
    repl.run().unwrap();
    assert_eq!(repl.session().host().variable("$x"), Some(Value::Int(5)));
    assert_eq!(repl.session().host().variable("$big"), Some(Value::Int(1)));
}

#[test]
fn rules_split_across_lines_compile_once_balanced() {
    let editor = ScriptedEditor::new(&["if 1 then", "  $a = 2;", "end"]);
    let mut repl = Repl::with_editor(editor).without_banner();
    repl.run().unwrap();
    assert_eq!(repl.session().host().variable("$a"), Some(Value::Int(2)));
}

#[test]
fn evaluation_errors_do_not_end_the_loop() {
    let editor = ScriptedEditor::new(&[
        "if 1 then $a = 1 / 0; end",
        ":set $alive 1",
    ]);
    let mut repl = Repl::with_editor(editor).without_banner();
    repl.run().unwrap();
    assert_eq!(
        repl.session().host().variable("$alive"),
        Some(Value::Int(1))
    );
}
