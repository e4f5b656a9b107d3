//! The prepare pass: one sizing scan before parsing.
//!
//! Prepare walks the raw text left to right exactly once and produces
//! everything the parser needs to run without lookahead or mid-parse
//! allocation decisions:
//!
//! - a dense tagged token stream (table indices and name-table ids instead
//!   of strings), plus a parallel span table for diagnostics
//! - the exact number of AST nodes the parser will emit, so the node arena
//!   is allocated once and never resized mid-parse
//! - slot counts, in token order, for every explicit branch, trigger body,
//!   and function argument list
//! - deduplicated variable and event name tables
//!
//! Nesting depth (`if`/`on` increment, `end` decrements; `elseif` keeps
//! depth) detects rule completion. Any token that cannot be placed aborts
//! with a syntax error; nothing here is recoverable.

use filament_foundation::{Error, ErrorKind, NameId, NameTable, Result};

use crate::host::Host;
use crate::lexer::Lexer;
use crate::ops::{self, FunctionDef, OperatorDef};
use crate::span::Span;
use crate::token::TokenKind;

/// One entry in the dense prepared token stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Prepared {
    /// `if`
    If,
    /// `elseif`
    ElseIf,
    /// `else`
    Else,
    /// `then`
    Then,
    /// `end`
    End,
    /// `on <event>`, fused with the interned event name.
    On(NameId),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `=`
    Assign,
    /// `null`
    Null,
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// Operator table index.
    Operator(u8),
    /// Function table index.
    Function(u8),
    /// Interned variable name.
    Variable(NameId),
    /// Interned callable-event name.
    EventCall(NameId),
}

/// Output of the prepare pass; input to the parser.
#[derive(Clone, Debug)]
pub struct PreparedRule {
    /// Dense token stream.
    tokens: Vec<Prepared>,
    /// Source span of each token, for parser diagnostics.
    spans: Vec<Span>,
    /// Exact number of AST nodes the parser will emit.
    pub node_count: usize,
    /// Branch/trigger/argument slot counts in token order.
    pub slot_counts: Vec<u16>,
    /// Deduplicated variable names.
    pub variables: NameTable,
    /// Deduplicated event names.
    pub events: NameTable,
}

impl PreparedRule {
    /// Returns the token at `index`.
    #[must_use]
    pub fn token(&self, index: usize) -> Option<Prepared> {
        self.tokens.get(index).copied()
    }

    /// Returns the source span of the token at `index`.
    #[must_use]
    pub fn span(&self, index: usize) -> Span {
        self.spans.get(index).copied().unwrap_or_default()
    }

    /// Returns the number of prepared tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if no tokens were prepared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Where the scan currently is, mirroring the parser's frame stack just
/// closely enough to count statement and argument slots.
enum Ctx {
    /// Condition of an `if`/`elseif`, until its `then`.
    Cond,
    /// After `on <event>`, until its `then`.
    TriggerHead,
    /// Right-hand side of an assignment, until its `;`.
    AssignRhs,
    /// Open statement list; `slot` indexes `slot_counts`.
    Body { statements: u16, slot: usize },
    /// Open argument list; `slot` indexes `slot_counts`.
    Args {
        commas: u16,
        seen_any: bool,
        slot: usize,
    },
    /// Open grouping parenthesis.
    Group,
}

/// Runs the prepare pass over `source` with the built-in tables.
///
/// # Errors
/// Returns a syntax or unknown-token error for malformed rule text.
pub fn prepare(source: &str, host: &dyn Host) -> Result<PreparedRule> {
    prepare_with(source, host, ops::OPERATORS, ops::FUNCTIONS)
}

/// Runs the prepare pass with explicit operator/function tables.
///
/// # Errors
/// Returns a syntax or unknown-token error for malformed rule text.
#[allow(clippy::too_many_lines)]
pub fn prepare_with(
    source: &str,
    host: &dyn Host,
    operators: &'static [OperatorDef],
    functions: &'static [FunctionDef],
) -> Result<PreparedRule> {
    let mut lexer = Lexer::with_tables(source, host, operators, functions);
    let mut out = PreparedRule {
        tokens: Vec::new(),
        spans: Vec::new(),
        // Start and end nodes always exist.
        node_count: 2,
        slot_counts: Vec::new(),
        variables: NameTable::new(),
        events: NameTable::new(),
    };
    let mut stack: Vec<Ctx> = Vec::new();
    let mut depth = 0u32;
    let mut finished = false;
    let mut pending_function = false;
    let mut last_was_variable = false;
    let mut last_was_event_call = false;

    loop {
        let token = lexer.next_token();
        let span = token.span;
        let err = |message: &str| Error::syntax(message, span.line, span.column);

        if matches!(token.kind, TokenKind::Eof) {
            if out.tokens.is_empty() {
                return Err(Error::new(ErrorKind::EmptyRule));
            }
            if !finished {
                return Err(err("missing 'end'"));
            }
            return Ok(out);
        }
        if let TokenKind::Error(message) = &token.kind {
            return Err(
                Error::unknown_token(span.text(source), span.line, span.column)
                    .with_context(message.clone()),
            );
        }
        if finished {
            return Err(err("unexpected token after rule end"));
        }
        if pending_function && !matches!(token.kind, TokenKind::LParen) {
            return Err(err("expected '(' after function name"));
        }

        // Any token other than the closing paren makes the innermost
        // argument list non-empty.
        if !matches!(token.kind, TokenKind::RParen) {
            if let Some(Ctx::Args { seen_any, .. }) = stack.last_mut() {
                *seen_any = true;
            }
        }

        let was_variable = matches!(token.kind, TokenKind::Variable(_));
        let was_event_call = matches!(token.kind, TokenKind::EventCall(_));

        match token.kind {
            TokenKind::If => {
                match stack.last_mut() {
                    None => {}
                    Some(Ctx::Body { statements, .. }) => *statements += 1,
                    Some(_) => return Err(err("unexpected 'if'")),
                }
                out.node_count += 1;
                depth += 1;
                stack.push(Ctx::Cond);
                out.tokens.push(Prepared::If);
            }
            TokenKind::ElseIf => {
                close_body(&mut out, &mut stack, &span, last_was_event_call)?;
                // Synthesized false branch plus the chained if node.
                out.node_count += 2;
                stack.push(Ctx::Cond);
                out.tokens.push(Prepared::ElseIf);
            }
            TokenKind::Else => {
                close_body(&mut out, &mut stack, &span, last_was_event_call)?;
                out.node_count += 1;
                let slot = out.slot_counts.len();
                out.slot_counts.push(0);
                stack.push(Ctx::Body {
                    statements: 0,
                    slot,
                });
                out.tokens.push(Prepared::Else);
            }
            TokenKind::Then => {
                match stack.pop() {
                    Some(Ctx::Cond) => out.node_count += 1, // true branch
                    Some(Ctx::TriggerHead) => {}
                    _ => return Err(err("unexpected 'then'")),
                }
                let slot = out.slot_counts.len();
                out.slot_counts.push(0);
                stack.push(Ctx::Body {
                    statements: 0,
                    slot,
                });
                out.tokens.push(Prepared::Then);
            }
            TokenKind::On => {
                if !stack.is_empty() {
                    return Err(err("'on' is only allowed at the top level"));
                }
                let event = lexer.next_token();
                let TokenKind::Event(name) = event.kind else {
                    return Err(Error::syntax(
                        "expected event name after 'on'",
                        event.span.line,
                        event.span.column,
                    ));
                };
                let id = out.events.intern(&name);
                out.node_count += 1;
                depth += 1;
                stack.push(Ctx::TriggerHead);
                out.tokens.push(Prepared::On(id));
            }
            TokenKind::End => {
                close_body(&mut out, &mut stack, &span, last_was_event_call)?;
                depth -= 1;
                if depth == 0 {
                    if !stack.is_empty() {
                        return Err(Error::internal("prepare: depth/stack disagreement"));
                    }
                    finished = true;
                }
                out.tokens.push(Prepared::End);
            }
            TokenKind::LParen => {
                if pending_function {
                    pending_function = false;
                    let slot = out.slot_counts.len();
                    out.slot_counts.push(0);
                    stack.push(Ctx::Args {
                        commas: 0,
                        seen_any: false,
                        slot,
                    });
                } else if in_expression(&stack) {
                    out.node_count += 1; // grouping node
                    stack.push(Ctx::Group);
                } else {
                    return Err(err("unexpected '('"));
                }
                out.tokens.push(Prepared::LParen);
            }
            TokenKind::RParen => match stack.pop() {
                Some(Ctx::Args {
                    commas,
                    seen_any,
                    slot,
                }) => {
                    out.slot_counts[slot] = if seen_any { commas + 1 } else { 0 };
                    out.tokens.push(Prepared::RParen);
                }
                Some(Ctx::Group) => out.tokens.push(Prepared::RParen),
                _ => return Err(err("unexpected ')'")),
            },
            TokenKind::Comma => match stack.last_mut() {
                Some(Ctx::Args { commas, .. }) => {
                    *commas += 1;
                    out.tokens.push(Prepared::Comma);
                }
                _ => return Err(err("unexpected ','")),
            },
            TokenKind::Semicolon => {
                match stack.last() {
                    Some(Ctx::AssignRhs) => {
                        stack.pop();
                    }
                    Some(Ctx::Body { .. }) if last_was_event_call => {}
                    _ => return Err(err("unexpected ';'")),
                }
                match stack.last_mut() {
                    Some(Ctx::Body { statements, .. }) => *statements += 1,
                    _ => return Err(err("unexpected ';'")),
                }
                out.tokens.push(Prepared::Semicolon);
            }
            TokenKind::Assign => {
                if !last_was_variable || !matches!(stack.last(), Some(Ctx::Body { .. })) {
                    return Err(err("unexpected '='"));
                }
                stack.push(Ctx::AssignRhs);
                out.tokens.push(Prepared::Assign);
            }
            TokenKind::Null => {
                require_expression(&stack, &err)?;
                out.node_count += 1;
                out.tokens.push(Prepared::Null);
            }
            TokenKind::Int(n) => {
                require_expression(&stack, &err)?;
                out.node_count += 1;
                out.tokens.push(Prepared::Int(n));
            }
            TokenKind::Float(f) => {
                require_expression(&stack, &err)?;
                out.node_count += 1;
                out.tokens.push(Prepared::Float(f));
            }
            TokenKind::Operator(index) => {
                require_expression(&stack, &err)?;
                out.node_count += 1;
                out.tokens.push(Prepared::Operator(index));
            }
            TokenKind::Function(index) => {
                require_expression(&stack, &err)?;
                out.node_count += 1;
                pending_function = true;
                out.tokens.push(Prepared::Function(index));
            }
            TokenKind::Variable(name) => {
                if !in_expression(&stack) && !matches!(stack.last(), Some(Ctx::Body { .. })) {
                    return Err(err("unexpected variable"));
                }
                out.node_count += 1;
                let id = out.variables.intern(&name);
                out.tokens.push(Prepared::Variable(id));
            }
            TokenKind::Event(_) => {
                return Err(err("event trigger is only allowed after 'on'"));
            }
            TokenKind::EventCall(name) => {
                if !matches!(stack.last(), Some(Ctx::Body { .. })) {
                    return Err(err("event call must be a statement"));
                }
                out.node_count += 1;
                let id = out.events.intern(&name);
                out.tokens.push(Prepared::EventCall(id));
            }
            TokenKind::Eof | TokenKind::Error(_) => unreachable!("handled above"),
        }

        out.spans.push(span);
        last_was_variable = was_variable;
        last_was_event_call = was_event_call;
    }
}

/// Returns true if the innermost context accepts expression tokens.
fn in_expression(stack: &[Ctx]) -> bool {
    matches!(
        stack.last(),
        Some(Ctx::Cond | Ctx::AssignRhs | Ctx::Args { .. } | Ctx::Group)
    )
}

fn require_expression(stack: &[Ctx], err: &dyn Fn(&str) -> Error) -> Result<()> {
    if in_expression(stack) {
        Ok(())
    } else {
        Err(err("expected a statement"))
    }
}

/// Closes the innermost open statement list, backpatching its slot count.
///
/// `unterminated` is true when the preceding token left a statement open,
/// which reads as a missing ';' rather than an empty body.
fn close_body(
    out: &mut PreparedRule,
    stack: &mut Vec<Ctx>,
    span: &Span,
    unterminated: bool,
) -> Result<()> {
    match stack.pop() {
        Some(Ctx::Body { statements, slot }) => {
            if unterminated {
                return Err(Error::syntax(
                    "missing ';' after statement",
                    span.line,
                    span.column,
                ));
            }
            if statements == 0 {
                return if stack.is_empty() {
                    Err(Error::new(ErrorKind::EmptyRule))
                } else {
                    Err(Error::syntax("empty branch body", span.line, span.column))
                };
            }
            out.slot_counts[slot] = statements;
            Ok(())
        }
        Some(Ctx::AssignRhs) => Err(Error::syntax(
            "missing ';' after statement",
            span.line,
            span.column,
        )),
        _ => Err(Error::syntax(
            "unexpected block keyword",
            span.line,
            span.column,
        )),
    }
}
