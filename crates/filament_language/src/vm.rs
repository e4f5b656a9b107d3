//! Non-recursive rule interpreter.
//!
//! Execution is a pair of cursors walked over the arena tree: `go` is the
//! node the machine is at, `ret` the node it just left. Because every node
//! carries a back-link to its parent, the pair fully determines both where
//! the machine is and which direction it arrived from, so there is no call
//! stack to unwind and the whole execution state fits in a handful of
//! words. Suspension freezes the cursor pair plus the readiness counter;
//! resuming restores them and keeps walking.
//!
//! Intermediate values live in their own arena, each tagged with the node
//! that produced it. Consumers find their operands by producer, remove
//! them, and push their own result, so a completed run always leaves the
//! value arena empty.

use filament_foundation::{Arena, Error, Offset, Result, Value};

use crate::ast::{Ast, Node, NodeId};
use crate::host::Host;
use crate::ops::{self, FunctionDef, OperatorDef};
use crate::parser::Parser;
use crate::prepare;

/// An intermediate value tagged with the node that produced it.
#[derive(Clone, Copy, Debug)]
pub struct ValueRecord {
    /// The computed value.
    pub value: Value,
    /// Node whose evaluation produced it.
    pub producer: NodeId,
}

/// Frozen cursor state of a suspended rule.
#[derive(Clone, Copy, Debug)]
pub struct Continuation {
    go: Option<NodeId>,
    ret: Option<NodeId>,
    pending: u32,
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The rule walked back to its start node.
    Complete,
    /// The rule raised an event and froze mid-walk. `pending` is the
    /// number of conditional branches currently entered.
    Suspended {
        /// Conditional nesting depth at the suspension point.
        pending: u32,
    },
}

/// A compiled rule plus its execution state.
#[derive(Debug)]
pub struct Rule {
    /// The parsed tree.
    pub ast: Ast,
    values: Arena<ValueRecord>,
    continuation: Option<Continuation>,
    caller: Option<usize>,
}

impl Rule {
    /// Wraps a parsed tree in a fresh execution state.
    #[must_use]
    pub fn new(ast: Ast) -> Self {
        Rule {
            ast,
            values: Arena::new(),
            continuation: None,
            caller: None,
        }
    }

    /// Event this rule waits on, if it is an `on` rule.
    #[must_use]
    pub fn trigger_event(&self) -> Option<filament_foundation::NameId> {
        self.ast.trigger_event()
    }

    /// Returns true if the rule is frozen at an event call.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.continuation.is_some()
    }

    /// Discards execution state and clears the rule's variables on the
    /// host, leaving the rule as if it had never run.
    ///
    /// # Errors
    /// Propagates host failures from clearing variables.
    pub fn reset(&mut self, host: &mut dyn Host) -> Result<()> {
        self.values.clear();
        self.continuation = None;
        self.caller = None;
        for name in self.ast.variables.iter() {
            host.clear(name)?;
        }
        Ok(())
    }

    /// Records which rule raised the event this rule is handling.
    pub fn set_caller(&mut self, caller: usize) {
        self.caller = Some(caller);
    }

    /// Takes the back-link to the rule that raised the handled event.
    pub fn take_caller(&mut self) -> Option<usize> {
        self.caller.take()
    }
}

/// Compiles rule text with the built-in operator and function tables.
///
/// # Errors
/// Returns syntax, unknown-token, or arity errors for malformed text.
pub fn compile(source: &str, host: &dyn Host) -> Result<Rule> {
    compile_with(source, host, ops::OPERATORS, ops::FUNCTIONS)
}

/// Compiles rule text with explicit tables.
///
/// # Errors
/// Returns syntax, unknown-token, or arity errors for malformed text.
pub fn compile_with(
    source: &str,
    host: &dyn Host,
    operators: &'static [OperatorDef],
    functions: &'static [FunctionDef],
) -> Result<Rule> {
    let prepared = prepare::prepare_with(source, host, operators, functions);
    let ast = Parser::with_tables(prepared?, host, operators, functions).parse()?;
    Ok(Rule::new(ast))
}

/// One trace entry per machine step.
#[derive(Clone, Debug)]
pub struct TraceRecord {
    /// Step number, counted from zero per run.
    pub step: u64,
    /// Node the machine was at.
    pub at: NodeId,
    /// Node it arrived from, if any.
    pub from: Option<NodeId>,
    /// Node kind, for readable dumps.
    pub kind: &'static str,
}

/// The cursor machine. Holds no per-rule state, so one machine can drive
/// any number of rules.
pub struct Vm {
    operators: &'static [OperatorDef],
    functions: &'static [FunctionDef],
    trace: Option<Vec<TraceRecord>>,
    steps: u64,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// Creates a machine with the built-in tables.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tables(ops::OPERATORS, ops::FUNCTIONS)
    }

    /// Creates a machine with explicit tables. They must match the tables
    /// the rules were compiled with.
    #[must_use]
    pub fn with_tables(
        operators: &'static [OperatorDef],
        functions: &'static [FunctionDef],
    ) -> Self {
        Vm {
            operators,
            functions,
            trace: None,
            steps: 0,
        }
    }

    /// Starts collecting a step trace on the next run.
    pub fn enable_trace(&mut self) {
        self.trace = Some(Vec::new());
    }

    /// Stops tracing and returns what was collected.
    pub fn take_trace(&mut self) -> Option<Vec<TraceRecord>> {
        self.trace.take()
    }

    /// Runs `rule` to completion or suspension. A suspended rule resumes
    /// from its frozen cursor; otherwise execution starts fresh from the
    /// start node.
    ///
    /// # Errors
    /// Returns evaluation errors (type mismatches, division by zero,
    /// overflow), host failures, and internal errors if the walk ever
    /// leaves the tree.
    #[allow(clippy::too_many_lines)]
    pub fn run(&mut self, rule: &mut Rule, host: &mut dyn Host) -> Result<Outcome> {
        let Rule {
            ast,
            values,
            continuation,
            ..
        } = rule;

        let (mut at, mut from, mut pending) = match continuation.take() {
            Some(frozen) => (frozen.go, frozen.ret, frozen.pending),
            None => {
                values.clear();
                (Some(ast.start), None, 0)
            }
        };

        // Every node is visited at most once per incoming edge.
        let step_limit = (ast.len() as u64) * 4 + 16;
        self.steps = 0;

        loop {
            let Some(current) = at else {
                return Err(Error::internal("cursor walked off the tree"));
            };
            self.steps += 1;
            if self.steps > step_limit {
                return Err(Error::internal("step limit exceeded"));
            }
            let node = ast.node(current)?;
            if let Some(trace) = &mut self.trace {
                trace.push(TraceRecord {
                    step: self.steps - 1,
                    at: current,
                    from,
                    kind: node.kind_name(),
                });
            }

            // Each arm computes the next cursor pair or returns.
            match node {
                Node::Start { entry } => {
                    if from.is_some() {
                        if !values.is_empty() {
                            return Err(Error::internal("values left after completion"));
                        }
                        return Ok(Outcome::Complete);
                    }
                    let entry =
                        entry.ok_or_else(|| Error::internal("start node has no entry"))?;
                    from = Some(current);
                    at = Some(entry);
                }
                Node::End { ret } => {
                    at = *ret;
                    from = Some(current);
                }
                Node::If {
                    ret,
                    condition,
                    on_true,
                    on_false,
                } => {
                    let cond =
                        condition.ok_or_else(|| Error::internal("conditional without condition"))?;
                    if from == Some(cond) {
                        let taken = take_value(values, cond)?;
                        let target = if taken.is_truthy() { *on_true } else { *on_false };
                        if let Some(branch) = target {
                            pending += 1;
                            from = Some(current);
                            at = Some(branch);
                        } else {
                            from = Some(current);
                            at = *ret;
                        }
                    } else if from.is_some() && (from == *on_true || from == *on_false) {
                        pending = pending
                            .checked_sub(1)
                            .ok_or_else(|| Error::internal("branch counter underflow"))?;
                        from = Some(current);
                        at = *ret;
                    } else {
                        from = Some(current);
                        at = Some(cond);
                    }
                }
                Node::Branch {
                    ret, statements, ..
                } => {
                    (at, from) = walk_statements(current, *ret, statements, from)?;
                }
                Node::Trigger { ret, body, .. } => {
                    (at, from) = walk_statements(current, *ret, body, from)?;
                }
                Node::EventCall { ret, event } => {
                    let name = ast
                        .events
                        .get(*event)
                        .ok_or_else(|| Error::internal("dangling event name"))?;
                    host.dispatch(name)?;
                    *continuation = Some(Continuation {
                        go: *ret,
                        ret: Some(current),
                        pending,
                    });
                    return Ok(Outcome::Suspended { pending });
                }
                Node::Group { ret, inner } => {
                    let inner =
                        inner.ok_or_else(|| Error::internal("group without inner expression"))?;
                    if from == Some(inner) {
                        // Re-tag the inner result as this node's own.
                        let value = take_value(values, inner)?;
                        values.push(ValueRecord {
                            value,
                            producer: current,
                        });
                        from = Some(current);
                        at = *ret;
                    } else {
                        from = Some(current);
                        at = Some(inner);
                    }
                }
                Node::Operator {
                    ret,
                    op,
                    left,
                    right,
                } => {
                    let left =
                        left.ok_or_else(|| Error::internal("operator without left operand"))?;
                    let right =
                        right.ok_or_else(|| Error::internal("operator without right operand"))?;
                    if from == Some(left) {
                        from = Some(current);
                        at = Some(right);
                    } else if from == Some(right) {
                        let lhs = take_value(values, left)?;
                        let rhs = take_value(values, right)?;
                        let def = self
                            .operators
                            .get(usize::from(*op))
                            .ok_or_else(|| Error::internal("operator index out of range"))?;
                        let value = (def.apply)(lhs, rhs)
                            .map_err(|err| err.with_context(format!("operator '{}'", def.name)))?;
                        values.push(ValueRecord {
                            value,
                            producer: current,
                        });
                        from = Some(current);
                        at = *ret;
                    } else {
                        from = Some(current);
                        at = Some(left);
                    }
                }
                Node::Call {
                    ret,
                    function,
                    args,
                } => {
                    let arrived = from.and_then(|f| args.iter().position(|&a| f == a));
                    // Arriving from the parent starts at the first argument
                    // that needs a walk; immediates resolve at invocation.
                    let next = match arrived {
                        Some(index) => next_evaluated(ast, &args[index + 1..])?,
                        None => next_evaluated(ast, args)?,
                    };
                    if let Some(child) = next {
                        from = Some(current);
                        at = Some(child);
                        continue;
                    }
                    let def = self
                        .functions
                        .get(usize::from(*function))
                        .ok_or_else(|| Error::internal("function index out of range"))?;
                    let mut resolved = Vec::with_capacity(args.len());
                    for &arg in args {
                        resolved.push(resolve_argument(ast, values, host, arg)?);
                    }
                    let value = (def.apply)(&resolved)
                        .map_err(|err| err.with_context(format!("function '{}'", def.name)))?;
                    values.push(ValueRecord {
                        value,
                        producer: current,
                    });
                    from = Some(current);
                    at = *ret;
                }
                Node::Variable {
                    ret,
                    name,
                    literal,
                    assign,
                } => {
                    let text = ast
                        .variables
                        .get(*name)
                        .ok_or_else(|| Error::internal("dangling variable name"))?;
                    if let Some(expr) = assign {
                        if from == Some(*expr) {
                            let value = take_value(values, *expr)?;
                            host.set(text, value)?;
                            from = Some(current);
                            at = *ret;
                        } else {
                            from = Some(current);
                            at = Some(*expr);
                        }
                    } else {
                        let value = match literal {
                            Some(bound) => *bound,
                            None => host.get(text)?,
                        };
                        values.push(ValueRecord {
                            value,
                            producer: current,
                        });
                        from = Some(current);
                        at = *ret;
                    }
                }
                Node::Int { ret, value } => {
                    values.push(ValueRecord {
                        value: Value::Int(*value),
                        producer: current,
                    });
                    from = Some(current);
                    at = *ret;
                }
                Node::Float { ret, value } => {
                    values.push(ValueRecord {
                        value: Value::Float(*value),
                        producer: current,
                    });
                    from = Some(current);
                    at = *ret;
                }
                Node::Null { ret } => {
                    values.push(ValueRecord {
                        value: Value::Null,
                        producer: current,
                    });
                    from = Some(current);
                    at = *ret;
                }
            }
        }
    }
}

/// Advances through a statement list: first statement on arrival from the
/// parent, the next one after each finished statement, the parent after
/// the last.
fn walk_statements(
    current: NodeId,
    parent: Option<NodeId>,
    statements: &[NodeId],
    from: Option<NodeId>,
) -> Result<(Option<NodeId>, Option<NodeId>)> {
    let position = from.and_then(|f| statements.iter().position(|&s| s == f));
    let next = match position {
        Some(index) => statements.get(index + 1).copied(),
        None => statements.first().copied(),
    };
    match next {
        Some(statement) => Ok((Some(statement), Some(current))),
        None => {
            if position.is_none() {
                return Err(Error::internal("statement list is empty"));
            }
            Ok((parent, Some(current)))
        }
    }
}

/// Finds the first argument that needs a walk of its own. Literals and
/// plain variable reads resolve at invocation instead.
fn next_evaluated(ast: &Ast, args: &[NodeId]) -> Result<Option<NodeId>> {
    for &arg in args {
        if !is_immediate(ast, arg)? {
            return Ok(Some(arg));
        }
    }
    Ok(None)
}

/// Returns true if `id` resolves without walking into it.
fn is_immediate(ast: &Ast, id: NodeId) -> Result<bool> {
    Ok(matches!(
        ast.node(id)?,
        Node::Int { .. }
            | Node::Float { .. }
            | Node::Null { .. }
            | Node::Variable { assign: None, .. }
    ))
}

/// Produces the value of one call argument at invocation time.
fn resolve_argument(
    ast: &Ast,
    values: &mut Arena<ValueRecord>,
    host: &mut dyn Host,
    arg: NodeId,
) -> Result<Value> {
    match ast.node(arg)? {
        Node::Int { value, .. } => Ok(Value::Int(*value)),
        Node::Float { value, .. } => Ok(Value::Float(*value)),
        Node::Null { .. } => Ok(Value::Null),
        Node::Variable {
            name,
            literal,
            assign: None,
            ..
        } => match literal {
            Some(bound) => Ok(*bound),
            None => {
                let text = ast
                    .variables
                    .get(*name)
                    .ok_or_else(|| Error::internal("dangling variable name"))?;
                host.copy(text)
            }
        },
        _ => take_value(values, arg),
    }
}

/// Removes and returns the value produced by `producer`.
fn take_value(values: &mut Arena<ValueRecord>, producer: NodeId) -> Result<Value> {
    let found: Option<Offset> = values
        .iter()
        .find(|(_, record)| record.producer == producer)
        .map(|(offset, _)| offset);
    let offset =
        found.ok_or_else(|| Error::internal(format!("no value produced by {producer:?}")))?;
    let record = values
        .take(offset)
        .ok_or_else(|| Error::internal("value record vanished"))?;
    Ok(record.value)
}
