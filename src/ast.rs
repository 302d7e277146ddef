//! Abstract syntax tree in ESTree shape
//!
//! Node and field names follow the ESTree ES5 grammar so an AST produced by an
//! external parser (acorn, esprima) can be loaded straight from its JSON form.
//! Children are `Rc` so execution frames can hold on to the node they run
//! without borrowing from the tree.

use std::rc::Rc;

use serde::Deserialize;

use crate::error::JsError;
use crate::value::JsString;

/// A complete script
#[derive(Debug, Clone, Deserialize)]
pub struct Program {
    pub body: Vec<Rc<Node>>,
}

impl Program {
    /// Load a program from ESTree JSON (for example `JSON.stringify(acorn.parse(src))`).
    pub fn from_estree_json(json: &str) -> Result<Program, JsError> {
        let node: Node = serde_json::from_str(json).map_err(|e| {
            JsError::syntax_error(
                format!("Invalid ESTree document: {}", e),
                e.line() as u32,
                e.column() as u32,
            )
        })?;
        match node {
            Node::Program(program) => Ok(program),
            _ => Err(JsError::syntax_error(
                "ESTree document must have a Program node at the root",
                1,
                1,
            )),
        }
    }

    /// True when the body starts with a `'use strict'` directive
    pub fn is_strict(&self) -> bool {
        has_use_strict(&self.body)
    }
}

pub fn has_use_strict(body: &[Rc<Node>]) -> bool {
    match body.first().map(|node| &**node) {
        Some(Node::ExpressionStatement(stmt)) => matches!(
            &*stmt.expression,
            Node::Literal(Literal { value: LiteralValue::String(s) }) if s.as_str() == "use strict"
        ),
        _ => false,
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Program(Program),

    // ============ STATEMENTS ============
    EmptyStatement,
    DebuggerStatement,
    BlockStatement(BlockStatement),
    ExpressionStatement(ExpressionStatement),
    IfStatement(IfStatement),
    LabeledStatement(LabeledStatement),
    BreakStatement(JumpStatement),
    ContinueStatement(JumpStatement),
    WithStatement(WithStatement),
    SwitchStatement(SwitchStatement),
    ReturnStatement(ReturnStatement),
    ThrowStatement(ThrowStatement),
    TryStatement(TryStatement),
    WhileStatement(WhileStatement),
    DoWhileStatement(WhileStatement),
    ForStatement(ForStatement),
    ForInStatement(ForInStatement),
    FunctionDeclaration(Rc<Function>),
    VariableDeclaration(VariableDeclaration),

    // ============ EXPRESSIONS ============
    ThisExpression,
    ArrayExpression(ArrayExpression),
    ObjectExpression(ObjectExpression),
    FunctionExpression(Rc<Function>),
    SequenceExpression(SequenceExpression),
    UnaryExpression(UnaryExpression),
    BinaryExpression(BinaryExpression),
    AssignmentExpression(AssignmentExpression),
    UpdateExpression(UpdateExpression),
    LogicalExpression(LogicalExpression),
    ConditionalExpression(ConditionalExpression),
    CallExpression(CallExpression),
    NewExpression(CallExpression),
    MemberExpression(MemberExpression),
    Identifier(Identifier),
    Literal(Literal),
}

impl Node {
    /// ESTree type name, used in trace output and error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Program(_) => "Program",
            Node::EmptyStatement => "EmptyStatement",
            Node::DebuggerStatement => "DebuggerStatement",
            Node::BlockStatement(_) => "BlockStatement",
            Node::ExpressionStatement(_) => "ExpressionStatement",
            Node::IfStatement(_) => "IfStatement",
            Node::LabeledStatement(_) => "LabeledStatement",
            Node::BreakStatement(_) => "BreakStatement",
            Node::ContinueStatement(_) => "ContinueStatement",
            Node::WithStatement(_) => "WithStatement",
            Node::SwitchStatement(_) => "SwitchStatement",
            Node::ReturnStatement(_) => "ReturnStatement",
            Node::ThrowStatement(_) => "ThrowStatement",
            Node::TryStatement(_) => "TryStatement",
            Node::WhileStatement(_) => "WhileStatement",
            Node::DoWhileStatement(_) => "DoWhileStatement",
            Node::ForStatement(_) => "ForStatement",
            Node::ForInStatement(_) => "ForInStatement",
            Node::FunctionDeclaration(_) => "FunctionDeclaration",
            Node::VariableDeclaration(_) => "VariableDeclaration",
            Node::ThisExpression => "ThisExpression",
            Node::ArrayExpression(_) => "ArrayExpression",
            Node::ObjectExpression(_) => "ObjectExpression",
            Node::FunctionExpression(_) => "FunctionExpression",
            Node::SequenceExpression(_) => "SequenceExpression",
            Node::UnaryExpression(_) => "UnaryExpression",
            Node::BinaryExpression(_) => "BinaryExpression",
            Node::AssignmentExpression(_) => "AssignmentExpression",
            Node::UpdateExpression(_) => "UpdateExpression",
            Node::LogicalExpression(_) => "LogicalExpression",
            Node::ConditionalExpression(_) => "ConditionalExpression",
            Node::CallExpression(_) => "CallExpression",
            Node::NewExpression(_) => "NewExpression",
            Node::MemberExpression(_) => "MemberExpression",
            Node::Identifier(_) => "Identifier",
            Node::Literal(_) => "Literal",
        }
    }

    /// Loops take unlabeled `continue`; loops and switches take unlabeled `break`
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            Node::WhileStatement(_)
                | Node::DoWhileStatement(_)
                | Node::ForStatement(_)
                | Node::ForInStatement(_)
        )
    }
}

// ============ STATEMENTS ============

#[derive(Debug, Clone, Deserialize)]
pub struct BlockStatement {
    pub body: Vec<Rc<Node>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpressionStatement {
    pub expression: Rc<Node>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IfStatement {
    pub test: Rc<Node>,
    pub consequent: Rc<Node>,
    pub alternate: Option<Rc<Node>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabeledStatement {
    pub label: Identifier,
    pub body: Rc<Node>,
}

/// `break` and `continue`
#[derive(Debug, Clone, Deserialize)]
pub struct JumpStatement {
    pub label: Option<Identifier>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithStatement {
    pub object: Rc<Node>,
    pub body: Rc<Node>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchStatement {
    pub discriminant: Rc<Node>,
    pub cases: Vec<SwitchCase>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchCase {
    /// `None` for `default:`
    pub test: Option<Rc<Node>>,
    pub consequent: Vec<Rc<Node>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnStatement {
    pub argument: Option<Rc<Node>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThrowStatement {
    pub argument: Rc<Node>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TryStatement {
    pub block: Rc<Node>,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Rc<Node>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatchClause {
    pub param: Identifier,
    pub body: Rc<Node>,
}

/// `while` and `do ... while`
#[derive(Debug, Clone, Deserialize)]
pub struct WhileStatement {
    pub test: Rc<Node>,
    pub body: Rc<Node>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForStatement {
    pub init: Option<Rc<Node>>,
    pub test: Option<Rc<Node>>,
    pub update: Option<Rc<Node>>,
    pub body: Rc<Node>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForInStatement {
    /// A `VariableDeclaration` with one declarator, or an assignable expression
    pub left: Rc<Node>,
    pub right: Rc<Node>,
    pub body: Rc<Node>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableDeclaration {
    pub declarations: Vec<VariableDeclarator>,
    pub kind: VariableKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableDeclarator {
    pub id: Identifier,
    pub init: Option<Rc<Node>>,
}

/// Shared by function declarations and function expressions
#[derive(Debug, Clone, Deserialize)]
pub struct Function {
    pub id: Option<Identifier>,
    pub params: Vec<Identifier>,
    /// Always a `BlockStatement`
    pub body: Rc<Node>,
    /// Source text, when parsed from source; `toString` prints it
    #[serde(skip)]
    pub source: Option<Rc<str>>,
}

impl Function {
    pub fn body_statements(&self) -> &[Rc<Node>] {
        match &*self.body {
            Node::BlockStatement(block) => &block.body,
            _ => &[],
        }
    }
}

// ============ EXPRESSIONS ============

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identifier {
    pub name: JsString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArrayExpression {
    /// `None` marks a hole (`[1, , 3]`)
    pub elements: Vec<Option<Rc<Node>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectExpression {
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Property {
    /// An `Identifier` or a `Literal`
    pub key: Rc<Node>,
    pub value: Rc<Node>,
    #[serde(default)]
    pub kind: PropertyKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    #[default]
    Init,
    Get,
    Set,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SequenceExpression {
    pub expressions: Vec<Rc<Node>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnaryExpression {
    pub operator: UnaryOp,
    pub argument: Rc<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "~")]
    BitNot,
    #[serde(rename = "typeof")]
    Typeof,
    #[serde(rename = "void")]
    Void,
    #[serde(rename = "delete")]
    Delete,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinaryExpression {
    pub operator: BinaryOp,
    pub left: Rc<Node>,
    pub right: Rc<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "===")]
    StrictEq,
    #[serde(rename = "!==")]
    StrictNotEq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "<<")]
    LShift,
    #[serde(rename = ">>")]
    RShift,
    #[serde(rename = ">>>")]
    URShift,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "instanceof")]
    Instanceof,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentExpression {
    pub operator: AssignmentOp,
    /// An `Identifier` or a `MemberExpression`
    pub left: Rc<Node>,
    pub right: Rc<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AssignmentOp {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    AddAssign,
    #[serde(rename = "-=")]
    SubAssign,
    #[serde(rename = "*=")]
    MulAssign,
    #[serde(rename = "/=")]
    DivAssign,
    #[serde(rename = "%=")]
    ModAssign,
    #[serde(rename = "<<=")]
    LShiftAssign,
    #[serde(rename = ">>=")]
    RShiftAssign,
    #[serde(rename = ">>>=")]
    URShiftAssign,
    #[serde(rename = "|=")]
    BitOrAssign,
    #[serde(rename = "^=")]
    BitXorAssign,
    #[serde(rename = "&=")]
    BitAndAssign,
}

impl AssignmentOp {
    /// The binary operator a compound assignment applies
    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            AssignmentOp::Assign => return None,
            AssignmentOp::AddAssign => BinaryOp::Add,
            AssignmentOp::SubAssign => BinaryOp::Sub,
            AssignmentOp::MulAssign => BinaryOp::Mul,
            AssignmentOp::DivAssign => BinaryOp::Div,
            AssignmentOp::ModAssign => BinaryOp::Mod,
            AssignmentOp::LShiftAssign => BinaryOp::LShift,
            AssignmentOp::RShiftAssign => BinaryOp::RShift,
            AssignmentOp::URShiftAssign => BinaryOp::URShift,
            AssignmentOp::BitOrAssign => BinaryOp::BitOr,
            AssignmentOp::BitXorAssign => BinaryOp::BitXor,
            AssignmentOp::BitAndAssign => BinaryOp::BitAnd,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateExpression {
    pub operator: UpdateOp,
    pub prefix: bool,
    pub argument: Rc<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UpdateOp {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogicalExpression {
    pub operator: LogicalOp,
    pub left: Rc<Node>,
    pub right: Rc<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogicalOp {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionalExpression {
    pub test: Rc<Node>,
    pub consequent: Rc<Node>,
    pub alternate: Rc<Node>,
}

/// `f(args)` and `new F(args)`
#[derive(Debug, Clone, Deserialize)]
pub struct CallExpression {
    pub callee: Rc<Node>,
    pub arguments: Vec<Rc<Node>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberExpression {
    pub object: Rc<Node>,
    /// An `Identifier` naming the property when not computed
    pub property: Rc<Node>,
    pub computed: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawLiteral")]
pub struct Literal {
    pub value: LiteralValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    RegExp { pattern: String, flags: String },
}

/// ESTree literal as it appears in JSON: regexps carry a `regex` member and an
/// unusable `value`.
#[derive(Deserialize)]
struct RawLiteral {
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    regex: Option<RawRegex>,
}

#[derive(Deserialize)]
struct RawRegex {
    pattern: String,
    #[serde(default)]
    flags: String,
}

impl From<RawLiteral> for Literal {
    fn from(raw: RawLiteral) -> Self {
        if let Some(regex) = raw.regex {
            return Literal {
                value: LiteralValue::RegExp {
                    pattern: regex.pattern,
                    flags: regex.flags,
                },
            };
        }
        let value = match raw.value {
            serde_json::Value::Bool(b) => LiteralValue::Boolean(b),
            serde_json::Value::Number(n) => LiteralValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => LiteralValue::String(JsString::from(s)),
            _ => LiteralValue::Null,
        };
        Literal { value }
    }
}
