//! Declaration hoisting
//!
//! `var` names and function declarations belong to the nearest function (or
//! program) scope no matter how deeply they are nested in blocks. Nested
//! functions are opaque: their declarations are hoisted when they are called.

use std::rc::Rc;

use crate::ast::{self, Node};
use crate::value::JsString;

/// Everything a scope must declare before its body runs
#[derive(Debug, Default)]
pub struct Declarations {
    pub vars: Vec<JsString>,
    pub functions: Vec<Rc<ast::Function>>,
}

impl Declarations {
    pub fn collect(body: &[Rc<Node>]) -> Self {
        let mut decls = Declarations::default();
        // Statements still to visit, next one last
        let mut pending: Vec<&Node> = body.iter().rev().map(|node| &**node).collect();
        while let Some(node) = pending.pop() {
            decls.visit(node, &mut pending);
        }
        decls
    }

    /// Record what `node` declares itself and queue the statements nested
    /// in it, in source order.
    fn visit<'a>(&mut self, node: &'a Node, pending: &mut Vec<&'a Node>) {
        match node {
            Node::VariableDeclaration(decl) => {
                for declarator in &decl.declarations {
                    self.vars.push(declarator.id.name.clone());
                }
            }
            Node::FunctionDeclaration(func) => self.functions.push(Rc::clone(func)),
            Node::BlockStatement(block) => queue(pending, &block.body),
            Node::IfStatement(stmt) => {
                if let Some(alternate) = &stmt.alternate {
                    pending.push(alternate);
                }
                pending.push(&stmt.consequent);
            }
            Node::LabeledStatement(stmt) => pending.push(&stmt.body),
            Node::WithStatement(stmt) => pending.push(&stmt.body),
            Node::WhileStatement(stmt) | Node::DoWhileStatement(stmt) => pending.push(&stmt.body),
            Node::ForStatement(stmt) => {
                pending.push(&stmt.body);
                if let Some(init) = &stmt.init {
                    pending.push(init);
                }
            }
            Node::ForInStatement(stmt) => {
                pending.push(&stmt.body);
                pending.push(&stmt.left);
            }
            Node::SwitchStatement(stmt) => {
                for case in stmt.cases.iter().rev() {
                    queue(pending, &case.consequent);
                }
            }
            Node::TryStatement(stmt) => {
                if let Some(finalizer) = &stmt.finalizer {
                    pending.push(finalizer);
                }
                if let Some(handler) = &stmt.handler {
                    pending.push(&handler.body);
                }
                pending.push(&stmt.block);
            }
            // Expressions never declare anything
            _ => {}
        }
    }
}

/// Queue `body` so its first statement is visited next
fn queue<'a>(pending: &mut Vec<&'a Node>, body: &'a [Rc<Node>]) {
    pending.extend(body.iter().rev().map(|node| &**node));
}
