//! Arena-stored abstract syntax tree.
//!
//! Nodes live in an [`Arena`] and refer to each other by offset, so the
//! whole tree can be cloned, stored, or dropped without chasing pointers.
//! Every node except the synthetic start node carries a `ret` back-link to
//! its parent; the interpreter uses those links to walk the tree without a
//! call stack.

use filament_foundation::{Arena, Error, NameId, NameTable, Offset, Result, Value};

/// Position of a node inside the AST arena.
pub type NodeId = Offset;

/// Which side of a conditional a branch hangs on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arm {
    /// Taken when the condition is truthy.
    True,
    /// Taken when the condition is falsy.
    False,
}

/// One node of a parsed rule.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Synthetic entry point. Its only link points at the top construct.
    Start {
        /// Top-level conditional or trigger.
        entry: Option<NodeId>,
    },
    /// Synthetic exit point; walking here means the rule is done.
    End {
        /// Back-link to the start node.
        ret: Option<NodeId>,
    },
    /// Conditional with a condition expression and up to two branches.
    If {
        /// Parent node.
        ret: Option<NodeId>,
        /// Condition expression root.
        condition: Option<NodeId>,
        /// Branch taken when the condition is truthy.
        on_true: Option<NodeId>,
        /// Branch taken otherwise, if any.
        on_false: Option<NodeId>,
    },
    /// Statement list hanging off one side of a conditional.
    Branch {
        /// Owning conditional.
        ret: Option<NodeId>,
        /// Which side of the conditional this is.
        arm: Arm,
        /// Statements in source order.
        statements: Vec<NodeId>,
    },
    /// `on <event> then ... end` handler.
    Trigger {
        /// Parent node.
        ret: Option<NodeId>,
        /// Event that activates this rule.
        event: NameId,
        /// Statements in source order.
        body: Vec<NodeId>,
    },
    /// `<event>();` statement that suspends the rule.
    EventCall {
        /// Parent statement list.
        ret: Option<NodeId>,
        /// Event being raised.
        event: NameId,
    },
    /// Parenthesized sub-expression.
    Group {
        /// Parent node.
        ret: Option<NodeId>,
        /// Inner expression root.
        inner: Option<NodeId>,
    },
    /// Binary operator application.
    Operator {
        /// Parent node.
        ret: Option<NodeId>,
        /// Index into the operator table.
        op: u8,
        /// Left operand.
        left: Option<NodeId>,
        /// Right operand.
        right: Option<NodeId>,
    },
    /// Built-in function call.
    Call {
        /// Parent node.
        ret: Option<NodeId>,
        /// Index into the function table.
        function: u8,
        /// Arguments in source order.
        args: Vec<NodeId>,
    },
    /// Variable reference, possibly with an attached assignment.
    Variable {
        /// Parent node.
        ret: Option<NodeId>,
        /// Interned variable name.
        name: NameId,
        /// Constant binding supplied by the host at compile time.
        literal: Option<Value>,
        /// Assigned expression when this node is a statement.
        assign: Option<NodeId>,
    },
    /// Integer literal.
    Int {
        /// Parent node.
        ret: Option<NodeId>,
        /// Literal value.
        value: i64,
    },
    /// Float literal.
    Float {
        /// Parent node.
        ret: Option<NodeId>,
        /// Literal value.
        value: f64,
    },
    /// `null` literal.
    Null {
        /// Parent node.
        ret: Option<NodeId>,
    },
}

impl Node {
    /// Returns this node's parent back-link.
    #[must_use]
    pub fn ret(&self) -> Option<NodeId> {
        match self {
            Node::Start { .. } => None,
            Node::End { ret }
            | Node::If { ret, .. }
            | Node::Branch { ret, .. }
            | Node::Trigger { ret, .. }
            | Node::EventCall { ret, .. }
            | Node::Group { ret, .. }
            | Node::Operator { ret, .. }
            | Node::Call { ret, .. }
            | Node::Variable { ret, .. }
            | Node::Int { ret, .. }
            | Node::Float { ret, .. }
            | Node::Null { ret } => *ret,
        }
    }

    /// Re-points this node's parent back-link. No effect on the start node.
    pub fn set_ret(&mut self, parent: Option<NodeId>) {
        match self {
            Node::Start { .. } => {}
            Node::End { ret }
            | Node::If { ret, .. }
            | Node::Branch { ret, .. }
            | Node::Trigger { ret, .. }
            | Node::EventCall { ret, .. }
            | Node::Group { ret, .. }
            | Node::Operator { ret, .. }
            | Node::Call { ret, .. }
            | Node::Variable { ret, .. }
            | Node::Int { ret, .. }
            | Node::Float { ret, .. }
            | Node::Null { ret } => *ret = parent,
        }
    }

    /// Short name for diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Start { .. } => "start",
            Node::End { .. } => "end",
            Node::If { .. } => "if",
            Node::Branch { .. } => "branch",
            Node::Trigger { .. } => "trigger",
            Node::EventCall { .. } => "event call",
            Node::Group { .. } => "group",
            Node::Operator { .. } => "operator",
            Node::Call { .. } => "call",
            Node::Variable { .. } => "variable",
            Node::Int { .. } => "int",
            Node::Float { .. } => "float",
            Node::Null { .. } => "null",
        }
    }
}

/// A fully parsed rule, ready for execution.
#[derive(Clone, Debug)]
pub struct Ast {
    /// Node storage; ids are arena offsets.
    pub nodes: Arena<Node>,
    /// Synthetic entry node.
    pub start: NodeId,
    /// Variable names referenced by the rule.
    pub variables: NameTable,
    /// Event names referenced by the rule.
    pub events: NameTable,
}

impl Ast {
    /// Returns the node at `id`.
    ///
    /// # Errors
    /// Returns an internal error for a dangling id; parsed trees never
    /// contain one.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| Error::internal(format!("dangling node id {id:?}")))
    }

    /// Mutable access to the node at `id`.
    ///
    /// # Errors
    /// Returns an internal error for a dangling id.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| Error::internal(format!("dangling node id {id:?}")))
    }

    /// Event this rule is waiting on, if it is an `on` rule.
    #[must_use]
    pub fn trigger_event(&self) -> Option<NameId> {
        let Node::Start { entry } = self.nodes.get(self.start)? else {
            return None;
        };
        match self.nodes.get((*entry)?)? {
            Node::Trigger { event, .. } => Some(*event),
            _ => None,
        }
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
