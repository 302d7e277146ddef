//! Execution frames
//!
//! The interpreter never recurses on the host stack. Each pending node owns a
//! [`Frame`] on an explicit stack; a step looks at the top frame, advances its
//! [`FrameState`] by one move and either pushes a child frame or pops itself,
//! handing its result to the frame below through [`Frame::value`].

use std::rc::Rc;

use crate::ast::Node;
use crate::value::{JsString, JsValue, ObjectId};

// ═══════════════════════════════════════════════════════════════════════════════
// Stack Types
// ═══════════════════════════════════════════════════════════════════════════════

/// An assignable location
#[derive(Debug, Clone)]
pub enum Reference {
    /// A variable, resolved through the scope chain when read or written
    Scope(JsString),
    /// A property of a (possibly primitive) value
    Member(JsValue, JsString),
}

/// Result handed from a finished child frame to its parent
#[derive(Debug, Clone, Default)]
pub enum Slot {
    #[default]
    Empty,
    Value(JsValue),
    Reference(Reference),
}

/// Abrupt completion held by a `try` frame while its `finally` block runs
#[derive(Debug, Clone)]
pub enum Completion {
    Throw(JsValue),
    Return(JsValue),
    Break(Option<JsString>),
    Continue(Option<JsString>),
}

/// Where a `try` statement is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryPhase {
    Start,
    Block,
    Handler,
    Finalizer,
}

/// Where a call is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Start,
    Callee,
    Arguments,
    Execute,
    /// A guest body, an eval or an async native is running
    Waiting,
}

#[derive(Debug)]
pub struct CallState {
    pub phase: CallPhase,
    pub func: JsValue,
    pub this_value: JsValue,
    pub args: Vec<JsValue>,
    pub arg_index: usize,
    pub construct: bool,
    /// Printable callee for "is not a function" messages
    pub callee_name: JsString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchPhase {
    Start,
    Discriminant,
    /// Evaluating `case` tests in order
    Testing { case: usize, awaiting: bool },
    /// Running consequents from a matched case, falling through
    Running { case: usize, statement: usize },
}

/// Per-node progress, created from the node kind when the frame is pushed
#[derive(Debug)]
pub enum FrameState {
    /// Nodes that finish in a single step
    Leaf,
    Program {
        body: Vec<Rc<Node>>,
        index: usize,
        done: bool,
        /// Value of the last expression statement
        completion: JsValue,
    },
    Block {
        index: usize,
    },
    /// Nodes whose progress is a small counter: expression statements, `if`,
    /// `?:`, unary, update, logical, `return`, `throw`, `with`
    Phase(u8),
    Sequence {
        index: usize,
    },
    Declarations {
        index: usize,
        awaiting: bool,
    },
    Loop {
        /// 0: test next, 1: test pending, 2: body next (do-while start)
        phase: u8,
    },
    For {
        /// 0: init next, 1: test next, 2: test pending, 3: update next
        mode: u8,
    },
    ForIn {
        phase: u8,
        target: Option<Reference>,
        keys: Vec<JsString>,
        index: usize,
        object: JsValue,
    },
    Switch {
        phase: SwitchPhase,
        discriminant: JsValue,
        default_case: Option<usize>,
    },
    Try {
        phase: TryPhase,
        pending: Option<Completion>,
    },
    ArrayLiteral {
        array: Option<ObjectId>,
        index: usize,
    },
    ObjectLiteral {
        object: Option<ObjectId>,
        index: usize,
        key: Option<JsString>,
    },
    Binary {
        phase: u8,
        left: JsValue,
    },
    Assignment {
        phase: u8,
        target: Option<Reference>,
    },
    Member {
        phase: u8,
        object: JsValue,
    },
    Call(Box<CallState>),
    /// Code run by `eval`, with its own stack stepped one move at a time
    Eval {
        inner: Vec<Frame>,
    },
}

/// A pending node
#[derive(Debug)]
pub struct Frame {
    pub node: Rc<Node>,
    /// Scope entered by this frame; lookups use the nearest frame that has one
    pub scope: Option<ObjectId>,
    /// `this` for function bodies and programs
    pub this_value: Option<JsValue>,
    /// Labels attached by enclosing labeled statements
    pub labels: Vec<JsString>,
    /// Produce a [`Reference`] instead of a value
    pub wants_reference: bool,
    /// Result of the most recently finished child
    pub value: Slot,
    pub state: FrameState,
}

impl Frame {
    pub fn new(node: Rc<Node>) -> Self {
        let state = match &*node {
            Node::Program(program) => FrameState::Program {
                body: program.body.clone(),
                index: 0,
                done: false,
                completion: JsValue::Undefined,
            },
            Node::BlockStatement(_) => FrameState::Block { index: 0 },
            Node::ExpressionStatement(_)
            | Node::IfStatement(_)
            | Node::ConditionalExpression(_)
            | Node::UnaryExpression(_)
            | Node::LogicalExpression(_)
            | Node::UpdateExpression(_)
            | Node::ReturnStatement(_)
            | Node::ThrowStatement(_)
            | Node::WithStatement(_) => FrameState::Phase(0),
            Node::SequenceExpression(_) => FrameState::Sequence { index: 0 },
            Node::VariableDeclaration(_) => FrameState::Declarations {
                index: 0,
                awaiting: false,
            },
            Node::WhileStatement(_) => FrameState::Loop { phase: 0 },
            Node::DoWhileStatement(_) => FrameState::Loop { phase: 2 },
            Node::ForStatement(_) => FrameState::For { mode: 0 },
            Node::ForInStatement(_) => FrameState::ForIn {
                phase: 0,
                target: None,
                keys: Vec::new(),
                index: 0,
                object: JsValue::Undefined,
            },
            Node::SwitchStatement(_) => FrameState::Switch {
                phase: SwitchPhase::Start,
                discriminant: JsValue::Undefined,
                default_case: None,
            },
            Node::TryStatement(_) => FrameState::Try {
                phase: TryPhase::Start,
                pending: None,
            },
            Node::ArrayExpression(_) => FrameState::ArrayLiteral {
                array: None,
                index: 0,
            },
            Node::ObjectExpression(_) => FrameState::ObjectLiteral {
                object: None,
                index: 0,
                key: None,
            },
            Node::BinaryExpression(_) => FrameState::Binary {
                phase: 0,
                left: JsValue::Undefined,
            },
            Node::AssignmentExpression(_) => FrameState::Assignment {
                phase: 0,
                target: None,
            },
            Node::MemberExpression(_) => FrameState::Member {
                phase: 0,
                object: JsValue::Undefined,
            },
            Node::CallExpression(_) | Node::NewExpression(_) => {
                FrameState::Call(Box::new(CallState {
                    phase: CallPhase::Start,
                    func: JsValue::Undefined,
                    this_value: JsValue::Undefined,
                    args: Vec::new(),
                    arg_index: 0,
                    construct: matches!(&*node, Node::NewExpression(_)),
                    callee_name: JsString::from("expression"),
                }))
            }
            Node::EmptyStatement
            | Node::DebuggerStatement
            | Node::LabeledStatement(_)
            | Node::BreakStatement(_)
            | Node::ContinueStatement(_)
            | Node::FunctionDeclaration(_)
            | Node::ThisExpression
            | Node::FunctionExpression(_)
            | Node::Identifier(_)
            | Node::Literal(_) => FrameState::Leaf,
        };
        Frame {
            node,
            scope: None,
            this_value: None,
            labels: Vec::new(),
            wants_reference: false,
            value: Slot::Empty,
            state,
        }
    }

    /// A frame that enters `scope` with the given `this`
    pub fn with_scope(node: Rc<Node>, scope: ObjectId, this_value: Option<JsValue>) -> Self {
        let mut frame = Frame::new(node);
        frame.scope = Some(scope);
        frame.this_value = this_value;
        frame
    }

    pub fn is_call(&self) -> bool {
        matches!(self.state, FrameState::Call(_))
    }

    /// A program frame that has run out of statements
    pub fn is_finished_program(&self) -> bool {
        matches!(self.state, FrameState::Program { done: true, .. })
    }

    /// Take the child result, leaving the slot empty
    pub fn take_value(&mut self) -> Slot {
        std::mem::take(&mut self.value)
    }
}

impl Slot {
    /// The carried value; references and empty slots read as `undefined`
    pub fn into_value(self) -> JsValue {
        match self {
            Slot::Value(value) => value,
            Slot::Empty | Slot::Reference(_) => JsValue::Undefined,
        }
    }
}
