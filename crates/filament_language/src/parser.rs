//! Non-recursive parser from prepared tokens to an arena AST.
//!
//! The parser never calls itself: open constructs live on an explicit frame
//! stack, and expressions are built by precedence climbing over the tree
//! itself, walking the right spine through the nodes' `ret` back-links.
//! The prepare pass already sized everything, so the node arena is filled
//! without growing and every branch, trigger body, and argument list gets
//! its statement or argument vector allocated to exact capacity.

use filament_foundation::{Arena, Error, ErrorKind, Result};

use crate::ast::{Arm, Ast, Node, NodeId};
use crate::host::Host;
use crate::ops::{self, Assoc, FunctionDef, OperatorDef};
use crate::prepare::{Prepared, PreparedRule};
use crate::span::Span;

/// One open construct during parsing.
enum Frame {
    /// An `if`/`elseif` chain. `current` is the conditional whose arms are
    /// being filled; the chain head is already attached to its parent.
    Chain { current: NodeId },
    /// `on <event>` seen, `then` not yet.
    TriggerHead { node: NodeId },
    /// Statement list being filled into a branch or trigger.
    Body { container: NodeId, remaining: u16 },
    /// Expression under construction. `hole` is the operator still missing
    /// its right operand, if any.
    Expr {
        root: Option<NodeId>,
        hole: Option<NodeId>,
        ctx: ExprCtx,
    },
    /// Argument list of `call`; expressions for the arguments are separate
    /// frames pushed on top.
    Args { call: NodeId, expected: u16 },
}

/// Where a finished expression gets attached.
#[derive(Clone, Copy)]
enum ExprCtx {
    /// Condition of a conditional node.
    Condition(NodeId),
    /// Right-hand side of an assignment statement.
    Assign(NodeId),
    /// Next argument of a call node.
    Arg(NodeId),
    /// Inner expression of a grouping node.
    Group(NodeId),
}

/// Single-pass parser over a prepared rule.
pub struct Parser<'h> {
    prepared: PreparedRule,
    host: &'h dyn Host,
    operators: &'static [OperatorDef],
    functions: &'static [FunctionDef],
    nodes: Arena<Node>,
    start: NodeId,
    end: NodeId,
    frames: Vec<Frame>,
    slot_cursor: usize,
    pending_call: Option<NodeId>,
    pending_assign: Option<NodeId>,
    pos: usize,
}

impl<'h> Parser<'h> {
    /// Creates a parser with the built-in operator and function tables.
    #[must_use]
    pub fn new(prepared: PreparedRule, host: &'h dyn Host) -> Self {
        Self::with_tables(prepared, host, ops::OPERATORS, ops::FUNCTIONS)
    }

    /// Creates a parser with explicit tables. The tables must match the
    /// ones the rule was prepared with.
    #[must_use]
    pub fn with_tables(
        prepared: PreparedRule,
        host: &'h dyn Host,
        operators: &'static [OperatorDef],
        functions: &'static [FunctionDef],
    ) -> Self {
        let mut nodes = Arena::with_capacity(prepared.node_count);
        let start = nodes.push(Node::Start { entry: None });
        let end = nodes.push(Node::End { ret: Some(start) });
        Parser {
            prepared,
            host,
            operators,
            functions,
            nodes,
            start,
            end,
            frames: Vec::new(),
            slot_cursor: 0,
            pending_call: None,
            pending_assign: None,
            pos: 0,
        }
    }

    /// Consumes the token stream and builds the tree.
    ///
    /// # Errors
    /// Returns a syntax error for malformed input and an internal error if
    /// the prepared sizing and the built tree ever disagree.
    pub fn parse(mut self) -> Result<Ast> {
        while let Some(token) = self.prepared.token(self.pos) {
            self.step(token)?;
            self.pos += 1;
        }
        self.finish()
    }

    fn step(&mut self, token: Prepared) -> Result<()> {
        match token {
            Prepared::If => self.begin_if(),
            Prepared::ElseIf => self.begin_elseif(),
            Prepared::Else => self.begin_else(),
            Prepared::Then => self.begin_body(),
            Prepared::End => self.close_construct(),
            Prepared::On(event) => {
                let node = self.nodes.push(Node::Trigger {
                    ret: Some(self.end),
                    event,
                    body: Vec::new(),
                });
                self.set_entry(node)?;
                self.frames.push(Frame::TriggerHead { node });
                Ok(())
            }
            Prepared::LParen => self.open_paren(),
            Prepared::RParen => self.close_paren(),
            Prepared::Comma => self.next_argument(),
            Prepared::Semicolon => self.end_statement(),
            Prepared::Assign => {
                let Some(var) = self.pending_assign.take() else {
                    return Err(self.syntax("unexpected '='"));
                };
                self.frames.push(Frame::Expr {
                    root: None,
                    hole: None,
                    ctx: ExprCtx::Assign(var),
                });
                Ok(())
            }
            Prepared::Null => {
                let node = self.nodes.push(Node::Null { ret: None });
                self.attach_operand(node)
            }
            Prepared::Int(value) => {
                let node = self.nodes.push(Node::Int { ret: None, value });
                self.attach_operand(node)
            }
            Prepared::Float(value) => {
                let node = self.nodes.push(Node::Float { ret: None, value });
                self.attach_operand(node)
            }
            Prepared::Operator(op) => self.apply_operator(op),
            Prepared::Function(function) => {
                let node = self.nodes.push(Node::Call {
                    ret: None,
                    function,
                    args: Vec::new(),
                });
                self.attach_operand(node)?;
                self.pending_call = Some(node);
                Ok(())
            }
            Prepared::Variable(name) => self.variable(name),
            Prepared::EventCall(event) => {
                self.check_no_pending_assign()?;
                let node = self.nodes.push(Node::EventCall { ret: None, event });
                self.push_statement(node)
            }
        }
    }

    /// Starts a conditional, either top-level or in statement position.
    fn begin_if(&mut self) -> Result<()> {
        self.check_no_pending_assign()?;
        let node = self.nodes.push(Node::If {
            ret: None,
            condition: None,
            on_true: None,
            on_false: None,
        });
        if self.frames.is_empty() {
            let end = self.end;
            self.node_mut(node)?.set_ret(Some(end));
            self.set_entry(node)?;
        } else {
            self.push_statement(node)?;
        }
        self.frames.push(Frame::Chain { current: node });
        self.frames.push(Frame::Expr {
            root: None,
            hole: None,
            ctx: ExprCtx::Condition(node),
        });
        Ok(())
    }

    /// `elseif`: closes the true branch, synthesizes a single-statement
    /// false branch, and chains a fresh conditional inside it.
    fn begin_elseif(&mut self) -> Result<()> {
        self.close_body()?;
        let Some(Frame::Chain { current }) = self.frames.last() else {
            return Err(self.syntax("'elseif' without matching 'if'"));
        };
        let owner = *current;
        let synthetic = self.nodes.push(Node::Branch {
            ret: Some(owner),
            arm: Arm::False,
            statements: Vec::with_capacity(1),
        });
        self.set_false_branch(owner, synthetic)?;
        let chained = self.nodes.push(Node::If {
            ret: Some(synthetic),
            condition: None,
            on_true: None,
            on_false: None,
        });
        match self.node_mut(synthetic)? {
            Node::Branch { statements, .. } => statements.push(chained),
            _ => return Err(Error::internal("synthesized branch is not a branch")),
        }
        if let Some(Frame::Chain { current }) = self.frames.last_mut() {
            *current = chained;
        }
        self.frames.push(Frame::Expr {
            root: None,
            hole: None,
            ctx: ExprCtx::Condition(chained),
        });
        Ok(())
    }

    /// `else`: closes the true branch and opens the explicit false branch.
    fn begin_else(&mut self) -> Result<()> {
        self.close_body()?;
        let Some(Frame::Chain { current }) = self.frames.last() else {
            return Err(self.syntax("'else' without matching 'if'"));
        };
        let owner = *current;
        let remaining = self.next_slot()?;
        let branch = self.nodes.push(Node::Branch {
            ret: Some(owner),
            arm: Arm::False,
            statements: Vec::with_capacity(usize::from(remaining)),
        });
        self.set_false_branch(owner, branch)?;
        self.frames.push(Frame::Body {
            container: branch,
            remaining,
        });
        Ok(())
    }

    /// `then`: finishes a condition or trigger head and opens its body.
    fn begin_body(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(Frame::Expr {
                ctx: ExprCtx::Condition(_),
                ..
            }) => {
                let root = self.close_expression()?;
                let Some(Frame::Chain { current }) = self.frames.last() else {
                    return Err(Error::internal("condition closed outside a chain"));
                };
                let owner = *current;
                match self.node_mut(owner)? {
                    Node::If { condition, .. } => *condition = Some(root),
                    _ => return Err(Error::internal("condition owner is not a conditional")),
                }
                self.node_mut(root)?.set_ret(Some(owner));
                let remaining = self.next_slot()?;
                let branch = self.nodes.push(Node::Branch {
                    ret: Some(owner),
                    arm: Arm::True,
                    statements: Vec::with_capacity(usize::from(remaining)),
                });
                match self.node_mut(owner)? {
                    Node::If { on_true, .. } => *on_true = Some(branch),
                    _ => return Err(Error::internal("condition owner is not a conditional")),
                }
                self.frames.push(Frame::Body {
                    container: branch,
                    remaining,
                });
                Ok(())
            }
            Some(Frame::TriggerHead { node }) => {
                let container = *node;
                self.frames.pop();
                let remaining = self.next_slot()?;
                match self.node_mut(container)? {
                    Node::Trigger { body, .. } => body.reserve_exact(usize::from(remaining)),
                    _ => return Err(Error::internal("trigger head is not a trigger")),
                }
                self.frames.push(Frame::Body {
                    container,
                    remaining,
                });
                Ok(())
            }
            _ => Err(self.syntax("unexpected 'then'")),
        }
    }

    /// `end`: closes the open body, then the chain around it if any.
    fn close_construct(&mut self) -> Result<()> {
        self.close_body()?;
        if matches!(self.frames.last(), Some(Frame::Chain { .. })) {
            self.frames.pop();
        }
        Ok(())
    }

    /// `(` either opens an argument list or a grouping expression.
    fn open_paren(&mut self) -> Result<()> {
        if let Some(call) = self.pending_call.take() {
            let expected = self.next_slot()?;
            match self.node_mut(call)? {
                Node::Call { args, .. } => args.reserve_exact(usize::from(expected)),
                _ => return Err(Error::internal("pending call is not a call node")),
            }
            self.frames.push(Frame::Args { call, expected });
            if expected > 0 {
                self.frames.push(Frame::Expr {
                    root: None,
                    hole: None,
                    ctx: ExprCtx::Arg(call),
                });
            }
            Ok(())
        } else {
            let node = self.nodes.push(Node::Group {
                ret: None,
                inner: None,
            });
            self.attach_operand(node)?;
            self.frames.push(Frame::Expr {
                root: None,
                hole: None,
                ctx: ExprCtx::Group(node),
            });
            Ok(())
        }
    }

    /// `)` closes a grouping expression or an argument list.
    fn close_paren(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(Frame::Expr {
                ctx: ExprCtx::Group(node),
                ..
            }) => {
                let group = *node;
                let root = self.close_expression()?;
                match self.node_mut(group)? {
                    Node::Group { inner, .. } => *inner = Some(root),
                    _ => return Err(Error::internal("group owner is not a group node")),
                }
                self.node_mut(root)?.set_ret(Some(group));
                Ok(())
            }
            Some(Frame::Expr {
                ctx: ExprCtx::Arg(_),
                ..
            }) => {
                self.close_argument()?;
                self.close_call()
            }
            Some(Frame::Args { .. }) => self.close_call(),
            _ => Err(self.syntax("unexpected ')'")),
        }
    }

    /// `,` finishes the current argument and opens the next one.
    fn next_argument(&mut self) -> Result<()> {
        let Some(Frame::Expr {
            ctx: ExprCtx::Arg(call),
            ..
        }) = self.frames.last()
        else {
            return Err(self.syntax("unexpected ','"));
        };
        let call = *call;
        self.close_argument()?;
        self.frames.push(Frame::Expr {
            root: None,
            hole: None,
            ctx: ExprCtx::Arg(call),
        });
        Ok(())
    }

    /// `;` finishes an assignment statement or follows an event call.
    fn end_statement(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(Frame::Expr {
                ctx: ExprCtx::Assign(var),
                ..
            }) => {
                let var = *var;
                let root = self.close_expression()?;
                match self.node_mut(var)? {
                    Node::Variable { assign, .. } => *assign = Some(root),
                    _ => return Err(Error::internal("assignment target is not a variable")),
                }
                self.node_mut(root)?.set_ret(Some(var));
                Ok(())
            }
            // Event-call statements were attached when their token arrived.
            Some(Frame::Body { .. }) => Ok(()),
            _ => Err(self.syntax("unexpected ';'")),
        }
    }

    /// A variable token, either as a statement head or an operand.
    fn variable(&mut self, name: filament_foundation::NameId) -> Result<()> {
        let literal = self
            .prepared
            .variables
            .get(name)
            .and_then(|text| self.host.literal(text));
        let node = self.nodes.push(Node::Variable {
            ret: None,
            name,
            literal,
            assign: None,
        });
        if matches!(self.frames.last(), Some(Frame::Body { .. })) {
            self.check_no_pending_assign()?;
            // In statement position a variable is always an assignment head.
            if literal.is_some() {
                return Err(self.syntax("cannot assign to a constant"));
            }
            self.push_statement(node)?;
            self.pending_assign = Some(node);
            Ok(())
        } else {
            self.attach_operand(node)
        }
    }

    /// Places a finished operand into the expression on top of the stack.
    fn attach_operand(&mut self, operand: NodeId) -> Result<()> {
        let Some(Frame::Expr { root, hole, .. }) = self.frames.last_mut() else {
            return Err(self.syntax("unexpected value"));
        };
        if let Some(open) = hole.take() {
            match self.nodes.get_mut(open) {
                Some(Node::Operator { right, .. }) => *right = Some(operand),
                _ => return Err(Error::internal("operand hole is not an operator")),
            }
            match self.nodes.get_mut(operand) {
                Some(node) => node.set_ret(Some(open)),
                None => return Err(Error::internal("dangling operand")),
            }
            Ok(())
        } else if root.is_none() {
            *root = Some(operand);
            Ok(())
        } else {
            Err(self.syntax("unexpected value"))
        }
    }

    /// Inserts a binary operator by rotating the right spine: descend while
    /// the incoming operator binds tighter, or equally tight and
    /// right-associative, then take that position's subtree as the left
    /// operand.
    fn apply_operator(&mut self, op: u8) -> Result<()> {
        let def = self
            .operators
            .get(usize::from(op))
            .ok_or_else(|| Error::internal("operator index out of range"))?;
        let (precedence, assoc) = (def.precedence, def.assoc);
        let Some(Frame::Expr { root, hole, .. }) = self.frames.last() else {
            return Err(self.syntax("operator outside an expression"));
        };
        if hole.is_some() {
            return Err(self.syntax("expected a value before operator"));
        }
        let Some(mut at) = *root else {
            return Err(self.syntax("operator is missing its left operand"));
        };

        let mut parent: Option<NodeId> = None;
        loop {
            let Node::Operator { op: seen, right, .. } = self.node(at)? else {
                break;
            };
            let seen_def = &self.operators[usize::from(*seen)];
            let descend = precedence > seen_def.precedence
                || (precedence == seen_def.precedence && assoc == Assoc::Right);
            if !descend {
                break;
            }
            parent = Some(at);
            at = right.ok_or_else(|| Error::internal("incomplete operator on the spine"))?;
        }

        let inserted = self.nodes.push(Node::Operator {
            ret: parent,
            op,
            left: Some(at),
            right: None,
        });
        self.node_mut(at)?.set_ret(Some(inserted));
        if let Some(parent) = parent {
            match self.node_mut(parent)? {
                Node::Operator { right, .. } => *right = Some(inserted),
                _ => return Err(Error::internal("spine parent is not an operator")),
            }
        }
        let Some(Frame::Expr { root, hole, .. }) = self.frames.last_mut() else {
            return Err(Error::internal("expression frame vanished"));
        };
        if parent.is_none() {
            *root = Some(inserted);
        }
        *hole = Some(inserted);
        Ok(())
    }

    /// Pops the expression frame on top, returning its completed root.
    fn close_expression(&mut self) -> Result<NodeId> {
        let Some(Frame::Expr { root, hole, .. }) = self.frames.pop() else {
            return Err(Error::internal("no expression to close"));
        };
        if hole.is_some() {
            return Err(self.syntax("operator is missing its right operand"));
        }
        root.ok_or_else(|| self.syntax("expected an expression"))
    }

    /// Finishes the argument expression on top and appends it to its call.
    fn close_argument(&mut self) -> Result<()> {
        let Some(Frame::Expr {
            ctx: ExprCtx::Arg(call),
            ..
        }) = self.frames.last()
        else {
            return Err(Error::internal("no argument to close"));
        };
        let call = *call;
        let root = self.close_expression()?;
        match self.node_mut(call)? {
            Node::Call { args, .. } => args.push(root),
            _ => return Err(Error::internal("argument owner is not a call node")),
        }
        self.node_mut(root)?.set_ret(Some(call));
        Ok(())
    }

    /// Pops the argument-list frame and checks the call's arity.
    fn close_call(&mut self) -> Result<()> {
        let Some(Frame::Args { call, expected }) = self.frames.pop() else {
            return Err(Error::internal("no argument list to close"));
        };
        let (function, count) = match self.node(call)? {
            Node::Call { function, args, .. } => (*function, args.len()),
            _ => return Err(Error::internal("argument owner is not a call node")),
        };
        if count != usize::from(expected) {
            return Err(Error::internal("argument count drifted from sizing"));
        }
        let def = self
            .functions
            .get(usize::from(function))
            .ok_or_else(|| Error::internal("function index out of range"))?;
        if !def.arity.accepts(count) {
            return Err(Error::new(ErrorKind::ArityMismatch {
                function: def.name.to_string(),
                expected: def.arity.describe(),
                actual: count,
            })
            .with_context(self.position_context()));
        }
        Ok(())
    }

    /// Appends a statement to the open body and links it back.
    fn push_statement(&mut self, statement: NodeId) -> Result<()> {
        let Some(Frame::Body { container, remaining }) = self.frames.last_mut() else {
            return Err(self.syntax("statement outside a body"));
        };
        let Some(next) = remaining.checked_sub(1) else {
            // More statement heads than counted terminators.
            return Err(self.syntax("statement is not terminated by ';'"));
        };
        *remaining = next;
        let container = *container;
        match self.nodes.get_mut(container) {
            Some(Node::Branch { statements, .. }) => statements.push(statement),
            Some(Node::Trigger { body, .. }) => body.push(statement),
            _ => return Err(Error::internal("body container cannot hold statements")),
        }
        self.node_mut(statement)?.set_ret(Some(container));
        Ok(())
    }

    /// Pops the open body frame, verifying it was filled exactly.
    fn close_body(&mut self) -> Result<()> {
        self.check_no_pending_assign()?;
        match self.frames.pop() {
            Some(Frame::Body { remaining: 0, .. }) => Ok(()),
            Some(Frame::Body { .. }) => {
                Err(Error::internal("statement count drifted from sizing"))
            }
            _ => Err(self.syntax("unexpected block keyword")),
        }
    }

    fn check_no_pending_assign(&self) -> Result<()> {
        if self.pending_assign.is_some() {
            Err(self.syntax("expected '=' after variable"))
        } else {
            Ok(())
        }
    }

    /// Links the start node to the rule's top construct.
    fn set_entry(&mut self, node: NodeId) -> Result<()> {
        match self.node_mut(self.start)? {
            Node::Start { entry } => {
                *entry = Some(node);
                Ok(())
            }
            _ => Err(Error::internal("start offset does not hold the start node")),
        }
    }

    fn set_false_branch(&mut self, owner: NodeId, branch: NodeId) -> Result<()> {
        if matches!(
            self.node(owner)?,
            Node::If {
                on_false: Some(_),
                ..
            }
        ) {
            return Err(self.syntax("conditional already has a false branch"));
        }
        match self.node_mut(owner)? {
            Node::If { on_false, .. } => {
                *on_false = Some(branch);
                Ok(())
            }
            _ => Err(Error::internal("false branch owner is not a conditional")),
        }
    }

    fn next_slot(&mut self) -> Result<u16> {
        let slot = self
            .prepared
            .slot_counts
            .get(self.slot_cursor)
            .copied()
            .ok_or_else(|| Error::internal("slot table exhausted"))?;
        self.slot_cursor += 1;
        Ok(slot)
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| Error::internal(format!("dangling node id {id:?}")))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| Error::internal(format!("dangling node id {id:?}")))
    }

    fn span(&self) -> Span {
        self.prepared.span(self.pos)
    }

    fn syntax(&self, message: &str) -> Error {
        let span = self.span();
        Error::syntax(message, span.line, span.column)
    }

    fn position_context(&self) -> String {
        let span = self.span();
        format!("line {}, column {}", span.line, span.column)
    }

    /// Final consistency checks, then hands the arena over as an [`Ast`].
    fn finish(self) -> Result<Ast> {
        if !self.frames.is_empty() {
            return Err(Error::internal("unclosed construct after last token"));
        }
        if self.nodes.len() != self.prepared.node_count {
            return Err(Error::internal(format!(
                "sized {} nodes but built {}",
                self.prepared.node_count,
                self.nodes.len()
            )));
        }
        if self.slot_cursor != self.prepared.slot_counts.len() {
            return Err(Error::internal("unconsumed slot counts"));
        }
        match self.nodes.get(self.start) {
            Some(Node::Start { entry: Some(_) }) => {}
            _ => return Err(Error::internal("rule has no entry")),
        }
        let PreparedRule {
            variables, events, ..
        } = self.prepared;
        Ok(Ast {
            nodes: self.nodes,
            start: self.start,
            variables,
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::prepare;
    use crate::testing::TestHost;

    fn parse_test(source: &str) -> Result<Ast> {
        let host = TestHost::with_events(&["sunset", "notify"]);
        let prepared = prepare(source, &host)?;
        Parser::new(prepared, &host).parse()
    }

    fn entry(ast: &Ast) -> NodeId {
        match ast.node(ast.start).unwrap() {
            Node::Start { entry } => entry.unwrap(),
            other => panic!("expected start, got {}", other.kind_name()),
        }
    }

    #[test]
    fn builds_exactly_the_sized_nodes() {
        let ast = parse_test("if 1 then $a = 2; end").unwrap();
        assert_eq!(ast.len(), 7);
    }

    #[test]
    fn top_construct_links_to_the_end_node() {
        let ast = parse_test("if 1 then $a = 2; end").unwrap();
        let top = entry(&ast);
        let ret = ast.node(top).unwrap().ret().unwrap();
        assert!(matches!(ast.node(ret).unwrap(), Node::End { .. }));
    }

    #[test]
    fn condition_and_branches_are_wired() {
        let ast = parse_test("if $a then $b = 1; else $b = 2; end").unwrap();
        let Node::If {
            condition,
            on_true,
            on_false,
            ..
        } = ast.node(entry(&ast)).unwrap()
        else {
            panic!("expected a conditional entry");
        };
        assert!(matches!(
            ast.node(condition.unwrap()).unwrap(),
            Node::Variable { .. }
        ));
        let Node::Branch {
            arm: Arm::True,
            statements,
            ..
        } = ast.node(on_true.unwrap()).unwrap()
        else {
            panic!("expected a true branch");
        };
        assert_eq!(statements.len(), 1);
        assert!(matches!(
            ast.node(on_false.unwrap()).unwrap(),
            Node::Branch { arm: Arm::False, .. }
        ));
    }

    #[test]
    fn precedence_puts_addition_on_top() {
        // 1 + 2 * 3 parses as 1 + (2 * 3)
        let ast = parse_test("if 1 + 2 * 3 then $a = 1; end").unwrap();
        let Node::If { condition, .. } = ast.node(entry(&ast)).unwrap() else {
            panic!("expected a conditional entry");
        };
        let Node::Operator { op, right, .. } = ast.node(condition.unwrap()).unwrap() else {
            panic!("expected an operator condition");
        };
        assert_eq!(ops::OPERATORS[usize::from(*op)].name, "+");
        let Node::Operator { op: inner, .. } = ast.node(right.unwrap()).unwrap() else {
            panic!("expected a nested operator");
        };
        assert_eq!(ops::OPERATORS[usize::from(*inner)].name, "*");
    }

    #[test]
    fn power_is_right_associative() {
        // 2 ^ 3 ^ 2 parses as 2 ^ (3 ^ 2)
        let ast = parse_test("if 2 ^ 3 ^ 2 then $a = 1; end").unwrap();
        let Node::If { condition, .. } = ast.node(entry(&ast)).unwrap() else {
            panic!("expected a conditional entry");
        };
        let Node::Operator { left, right, .. } = ast.node(condition.unwrap()).unwrap() else {
            panic!("expected an operator condition");
        };
        assert!(matches!(
            ast.node(left.unwrap()).unwrap(),
            Node::Int { value: 2, .. }
        ));
        assert!(matches!(
            ast.node(right.unwrap()).unwrap(),
            Node::Operator { .. }
        ));
    }

    #[test]
    fn subtraction_is_left_associative() {
        // 10 - 4 - 3 parses as (10 - 4) - 3
        let ast = parse_test("if 10 - 4 - 3 then $a = 1; end").unwrap();
        let Node::If { condition, .. } = ast.node(entry(&ast)).unwrap() else {
            panic!("expected a conditional entry");
        };
        let Node::Operator { left, right, .. } = ast.node(condition.unwrap()).unwrap() else {
            panic!("expected an operator condition");
        };
        assert!(matches!(
            ast.node(left.unwrap()).unwrap(),
            Node::Operator { .. }
        ));
        assert!(matches!(
            ast.node(right.unwrap()).unwrap(),
            Node::Int { value: 3, .. }
        ));
    }

    #[test]
    fn grouping_overrides_precedence() {
        // (1 + 2) * 3: the root is *, its left a group
        let ast = parse_test("if (1 + 2) * 3 then $a = 1; end").unwrap();
        let Node::If { condition, .. } = ast.node(entry(&ast)).unwrap() else {
            panic!("expected a conditional entry");
        };
        let Node::Operator { op, left, .. } = ast.node(condition.unwrap()).unwrap() else {
            panic!("expected an operator condition");
        };
        assert_eq!(ops::OPERATORS[usize::from(*op)].name, "*");
        assert!(matches!(ast.node(left.unwrap()).unwrap(), Node::Group { .. }));
    }

    #[test]
    fn elseif_desugars_to_a_nested_chain() {
        let ast = parse_test(
            "if $a then $x = 1; elseif $b then $x = 2; else $x = 3; end",
        )
        .unwrap();
        let Node::If { on_false, .. } = ast.node(entry(&ast)).unwrap() else {
            panic!("expected a conditional entry");
        };
        let Node::Branch { statements, .. } = ast.node(on_false.unwrap()).unwrap() else {
            panic!("expected a synthesized false branch");
        };
        assert_eq!(statements.len(), 1);
        let Node::If { on_false: tail, .. } = ast.node(statements[0]).unwrap() else {
            panic!("expected a chained conditional");
        };
        assert!(matches!(
            ast.node(tail.unwrap()).unwrap(),
            Node::Branch { arm: Arm::False, .. }
        ));
    }

    #[test]
    fn trigger_rule_wires_body_and_event() {
        let ast = parse_test("on sunset then $a = 1; notify(); end").unwrap();
        let Node::Trigger { event, body, .. } = ast.node(entry(&ast)).unwrap() else {
            panic!("expected a trigger entry");
        };
        assert_eq!(ast.events.get(*event), Some("sunset"));
        assert_eq!(body.len(), 2);
        assert!(matches!(
            ast.node(body[1]).unwrap(),
            Node::EventCall { .. }
        ));
        assert_eq!(ast.trigger_event(), Some(*event));
    }

    #[test]
    fn call_arguments_are_in_source_order() {
        let ast = parse_test("if max(1, 2 + 3, $a) then $b = 1; end").unwrap();
        let Node::If { condition, .. } = ast.node(entry(&ast)).unwrap() else {
            panic!("expected a conditional entry");
        };
        let Node::Call { args, .. } = ast.node(condition.unwrap()).unwrap() else {
            panic!("expected a call condition");
        };
        assert_eq!(args.len(), 3);
        assert!(matches!(ast.node(args[0]).unwrap(), Node::Int { value: 1, .. }));
        assert!(matches!(ast.node(args[1]).unwrap(), Node::Operator { .. }));
        assert!(matches!(ast.node(args[2]).unwrap(), Node::Variable { .. }));
    }

    #[test]
    fn arity_is_checked_at_parse_time() {
        let err = parse_test("if round(1, 2) then $a = 1; end").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ArityMismatch { .. }));
    }

    #[test]
    fn zero_argument_builtin_is_rejected() {
        let err = parse_test("if max() then $a = 1; end").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ArityMismatch { .. }));
    }

    #[test]
    fn missing_condition_is_a_syntax_error() {
        assert!(parse_test("if then $a = 1; end").unwrap_err().is_syntax());
    }

    #[test]
    fn dangling_operator_is_a_syntax_error() {
        assert!(parse_test("if 1 + then $a = 1; end").unwrap_err().is_syntax());
    }

    #[test]
    fn adjacent_operands_are_a_syntax_error() {
        assert!(parse_test("if 1 2 then $a = 1; end").unwrap_err().is_syntax());
    }

    #[test]
    fn variable_statement_requires_assignment() {
        assert!(parse_test("if 1 then $a $b = 1; end").unwrap_err().is_syntax());
    }

    #[test]
    fn assignment_to_a_constant_is_rejected() {
        let mut host = TestHost::with_events(&[]);
        host.constants
            .insert("$limit".into(), filament_foundation::Value::Int(10));
        let prepared = prepare("if 1 then $limit = 1; end", &host).unwrap();
        let err = Parser::new(prepared, &host).parse().unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn duplicate_else_is_rejected() {
        let err = parse_test("if 1 then $a = 1; else $a = 2; else $a = 3; end").unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn missing_statement_terminator_is_rejected() {
        let err = parse_test("if 1 then $a = 1; $b end").unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn every_node_links_back_to_its_parent() {
        let ast = parse_test(
            "if (1 + 2) * 3 == 9 then $a = max(1, $b); elseif 0 then notify(); end",
        )
        .unwrap();
        for (id, node) in ast.nodes.iter() {
            if id == ast.start {
                continue;
            }
            let parent = node.ret();
            assert!(parent.is_some(), "{} has no parent", node.kind_name());
            assert!(ast.node(parent.unwrap()).is_ok());
        }
    }
}
