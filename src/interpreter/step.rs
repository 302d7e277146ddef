//! Per-node step handlers
//!
//! Every handler follows the same shape: take the child result out of the top
//! frame, look at the frame's progress state, then either push one child frame
//! or pop the frame with its result.

use std::rc::Rc;

use tracing::trace;

use crate::ast::{
    self, ArrayExpression, AssignmentExpression, BinaryExpression, BinaryOp, BlockStatement,
    CallExpression, ForInStatement, ForStatement, IfStatement, LiteralValue, LogicalExpression,
    LogicalOp, MemberExpression, Node, ObjectExpression, PropertyKind, SwitchStatement,
    TryStatement, UnaryExpression, UnaryOp, UpdateExpression, UpdateOp, VariableDeclaration,
    WhileStatement, WithStatement,
};
use crate::error::JsError;
use crate::parser::parse_eval_program;
use crate::value::{
    CheapClone, FunctionKind, JsString, JsValue, ObjectData, ObjectId, number_to_string,
    to_int32, to_uint32,
};

use super::stack::{CallPhase, CallState, Frame, FrameState, Reference, Slot, SwitchPhase, TryPhase};
use super::{AsyncCallback, Interpreter, PreferredType, PropertyAttrs};

fn state_mismatch(node: &Node) -> JsError {
    JsError::internal_error(format!("frame state does not match {}", node.kind_name()))
}

impl Interpreter {
    /// One step, with catchable errors routed to the nearest `try`.
    pub(crate) fn dispatch(&mut self) -> Result<(), JsError> {
        match self.step_frame() {
            Ok(()) => Ok(()),
            Err(err) if err.is_catchable() => {
                let value = self.error_to_value(err)?;
                self.unwind_throw(value)
            }
            Err(err) => Err(err),
        }
    }

    fn step_frame(&mut self) -> Result<(), JsError> {
        let Some(frame) = self.stack.last() else {
            return Ok(());
        };
        if matches!(frame.state, FrameState::Eval { .. }) {
            return self.step_eval();
        }
        let node = Rc::clone(&frame.node);
        trace!(kind = node.kind_name(), depth = self.stack.len(), "step");

        match &*node {
            Node::Program(_) => self.step_program(&node),
            Node::BlockStatement(block) => self.step_block(&node, block),
            Node::ExpressionStatement(stmt) => self.step_expression_statement(&node, &stmt.expression),
            Node::EmptyStatement | Node::DebuggerStatement | Node::FunctionDeclaration(_) => {
                self.pop_with(Slot::Empty);
                Ok(())
            }
            Node::IfStatement(stmt) => self.step_if(&node, stmt),
            Node::ConditionalExpression(expr) => self.step_conditional(&node, expr),
            Node::LabeledStatement(stmt) => {
                let Some(frame) = self.stack.pop() else {
                    return Err(state_mismatch(&node));
                };
                let mut body = Frame::new(Rc::clone(&stmt.body));
                body.labels = frame.labels;
                body.labels.push(stmt.label.name.cheap_clone());
                self.stack.push(body);
                Ok(())
            }
            Node::BreakStatement(jump) => {
                self.unwind_break(jump.label.as_ref().map(|l| l.name.cheap_clone()))
            }
            Node::ContinueStatement(jump) => {
                self.unwind_continue(jump.label.as_ref().map(|l| l.name.cheap_clone()))
            }
            Node::WithStatement(stmt) => self.step_with(&node, stmt),
            Node::SwitchStatement(stmt) => self.step_switch(&node, stmt),
            Node::ReturnStatement(stmt) => self.step_return(&node, stmt.argument.as_ref()),
            Node::ThrowStatement(stmt) => self.step_throw(&node, &stmt.argument),
            Node::TryStatement(stmt) => self.step_try(&node, stmt),
            Node::WhileStatement(stmt) | Node::DoWhileStatement(stmt) => {
                self.step_while(&node, stmt)
            }
            Node::ForStatement(stmt) => self.step_for(&node, stmt),
            Node::ForInStatement(stmt) => self.step_for_in(&node, stmt),
            Node::VariableDeclaration(decl) => self.step_declarations(&node, decl),
            Node::ThisExpression => {
                let this = self.current_this();
                self.pop_with(Slot::Value(this));
                Ok(())
            }
            Node::ArrayExpression(expr) => self.step_array(&node, expr),
            Node::ObjectExpression(expr) => self.step_object(&node, expr),
            Node::FunctionExpression(func) => self.step_function_expression(func),
            Node::SequenceExpression(expr) => self.step_sequence(&node, &expr.expressions),
            Node::UnaryExpression(expr) => self.step_unary(&node, expr),
            Node::BinaryExpression(expr) => self.step_binary(&node, expr),
            Node::AssignmentExpression(expr) => self.step_assignment(&node, expr),
            Node::UpdateExpression(expr) => self.step_update(&node, expr),
            Node::LogicalExpression(expr) => self.step_logical(&node, expr),
            Node::CallExpression(call) | Node::NewExpression(call) => self.step_call(&node, call),
            Node::MemberExpression(expr) => self.step_member(&node, expr),
            Node::Identifier(id) => {
                let wants_reference = self.stack.last().is_some_and(|f| f.wants_reference);
                if wants_reference {
                    self.pop_with(Slot::Reference(Reference::Scope(id.name.cheap_clone())));
                } else {
                    let value = self.get_value_from_scope(id.name.as_str())?;
                    self.pop_with(Slot::Value(value));
                }
                Ok(())
            }
            Node::Literal(literal) => {
                let value = match &literal.value {
                    LiteralValue::Null => JsValue::Null,
                    LiteralValue::Boolean(b) => JsValue::Boolean(*b),
                    LiteralValue::Number(n) => JsValue::Number(*n),
                    LiteralValue::String(s) => JsValue::String(s.cheap_clone()),
                    LiteralValue::RegExp { pattern, flags } => {
                        JsValue::Object(super::builtins::regexp::create_regexp(self, pattern, flags)?)
                    }
                };
                self.pop_with(Slot::Value(value));
                Ok(())
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Stack helpers
    // ═══════════════════════════════════════════════════════════════════════════

    fn top(&mut self) -> Result<&mut Frame, JsError> {
        self.stack
            .last_mut()
            .ok_or_else(|| JsError::internal_error("empty stack"))
    }

    fn push(&mut self, node: &Rc<Node>) {
        self.stack.push(Frame::new(Rc::clone(node)));
    }

    /// Push a node that should produce a reference rather than a value
    fn push_reference(&mut self, node: &Rc<Node>) {
        let mut frame = Frame::new(Rc::clone(node));
        frame.wants_reference = true;
        self.stack.push(frame);
    }

    /// Pop the top frame, handing `slot` to the frame below.
    pub(crate) fn pop_with(&mut self, slot: Slot) {
        self.stack.pop();
        if let Some(parent) = self.stack.last_mut() {
            parent.value = slot;
        }
    }

    fn pop_value(&mut self, value: JsValue) {
        self.pop_with(Slot::Value(value));
    }

    /// Read through a reference.
    pub(crate) fn get_reference(&self, reference: &Reference) -> Result<JsValue, JsError> {
        match reference {
            Reference::Scope(name) => self.get_value_from_scope(name.as_str()),
            Reference::Member(object, name) => self.get_property(object, name.as_str()),
        }
    }

    /// Write through a reference.
    pub(crate) fn put_reference(
        &mut self,
        reference: &Reference,
        value: JsValue,
    ) -> Result<(), JsError> {
        match reference {
            Reference::Scope(name) => self.set_value_to_scope(name.as_str(), value),
            Reference::Member(object, name) => {
                self.set_property(object, name.as_str(), value, PropertyAttrs::NONE)
            }
        }
    }

    fn invalid_assignment_target(&mut self) -> JsError {
        self.throw_error("ReferenceError", "Invalid left-hand side in assignment")
    }

    /// ToObject: primitives are boxed, `null`/`undefined` are a TypeError.
    pub(crate) fn to_object(&mut self, value: &JsValue) -> Result<ObjectId, JsError> {
        let constructor = match value {
            JsValue::Object(id) => return Ok(*id),
            JsValue::Undefined | JsValue::Null => {
                return Err(JsError::type_error(format!(
                    "Cannot convert {} to object",
                    value.to_js_string()
                )));
            }
            JsValue::Boolean(_) => self.intrinsics.boolean,
            JsValue::Number(_) => self.intrinsics.number,
            JsValue::String(_) => self.intrinsics.string,
        };
        let boxed = self.create_object(Some(constructor))?;
        self.object_mut(boxed)?.data = ObjectData::Primitive(value.clone());
        Ok(boxed)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Statements
    // ═══════════════════════════════════════════════════════════════════════════

    fn step_program(&mut self, node: &Node) -> Result<(), JsError> {
        let frame = self.top()?;
        frame.take_value();
        let FrameState::Program { body, index, done, .. } = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        match body.get(*index).cloned() {
            Some(statement) => {
                *index += 1;
                self.stack.push(Frame::new(statement));
            }
            None => *done = true,
        }
        Ok(())
    }

    fn step_block(&mut self, node: &Node, block: &BlockStatement) -> Result<(), JsError> {
        let frame = self.top()?;
        frame.take_value();
        let FrameState::Block { index } = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        match block.body.get(*index) {
            Some(statement) => {
                *index += 1;
                self.push(statement);
            }
            None => self.pop_with(Slot::Empty),
        }
        Ok(())
    }

    fn step_expression_statement(&mut self, node: &Node, expression: &Rc<Node>) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Phase(phase) = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        if *phase == 0 {
            *phase = 1;
            self.push(expression);
            return Ok(());
        }
        // The completion value belongs to the outermost program of this stack
        if let Some(Frame {
            state: FrameState::Program { completion, .. },
            ..
        }) = self.stack.first_mut()
        {
            *completion = slot.into_value();
        }
        self.pop_with(Slot::Empty);
        Ok(())
    }

    fn step_if(&mut self, node: &Node, stmt: &IfStatement) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Phase(phase) = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        match *phase {
            0 => {
                *phase = 1;
                self.push(&stmt.test);
            }
            1 => {
                let branch = if slot.into_value().to_boolean() {
                    Some(&stmt.consequent)
                } else {
                    stmt.alternate.as_ref()
                };
                match branch {
                    Some(branch) => {
                        *phase = 2;
                        self.push(branch);
                    }
                    None => self.pop_with(Slot::Empty),
                }
            }
            _ => self.pop_with(Slot::Empty),
        }
        Ok(())
    }

    fn step_with(&mut self, node: &Node, stmt: &WithStatement) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Phase(phase) = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        match *phase {
            0 => {
                *phase = 1;
                self.push(&stmt.object);
            }
            1 => {
                *phase = 2;
                let object = self.to_object(&slot.into_value())?;
                let parent = self.current_scope();
                let scope = self.create_scope(parent, false, Some(object))?;
                self.stack
                    .push(Frame::with_scope(Rc::clone(&stmt.body), scope, None));
            }
            _ => self.pop_with(Slot::Empty),
        }
        Ok(())
    }

    fn step_switch(&mut self, node: &Node, stmt: &SwitchStatement) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Switch {
            phase,
            discriminant,
            default_case,
        } = &mut frame.state
        else {
            return Err(state_mismatch(node));
        };
        match *phase {
            SwitchPhase::Start => {
                *phase = SwitchPhase::Discriminant;
                self.push(&stmt.discriminant);
            }
            SwitchPhase::Discriminant => {
                *discriminant = slot.into_value();
                *phase = SwitchPhase::Testing {
                    case: 0,
                    awaiting: false,
                };
            }
            SwitchPhase::Testing { mut case, awaiting } => {
                if awaiting {
                    // Cases compare with ===
                    if discriminant.strict_equals(&slot.into_value()) {
                        *phase = SwitchPhase::Running { case, statement: 0 };
                        return Ok(());
                    }
                    case += 1;
                }
                loop {
                    match stmt.cases.get(case) {
                        Some(switch_case) => match &switch_case.test {
                            Some(test) => {
                                *phase = SwitchPhase::Testing {
                                    case,
                                    awaiting: true,
                                };
                                self.push(test);
                                return Ok(());
                            }
                            None => {
                                *default_case = Some(case);
                                case += 1;
                            }
                        },
                        None => {
                            match *default_case {
                                Some(default) => {
                                    *phase = SwitchPhase::Running {
                                        case: default,
                                        statement: 0,
                                    };
                                }
                                None => self.pop_with(Slot::Empty),
                            }
                            return Ok(());
                        }
                    }
                }
            }
            SwitchPhase::Running {
                mut case,
                mut statement,
            } => loop {
                let Some(switch_case) = stmt.cases.get(case) else {
                    self.pop_with(Slot::Empty);
                    return Ok(());
                };
                match switch_case.consequent.get(statement) {
                    Some(next) => {
                        *phase = SwitchPhase::Running {
                            case,
                            statement: statement + 1,
                        };
                        self.push(next);
                        return Ok(());
                    }
                    // Fall through into the next case
                    None => {
                        case += 1;
                        statement = 0;
                    }
                }
            },
        }
        Ok(())
    }

    fn step_return(&mut self, node: &Node, argument: Option<&Rc<Node>>) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Phase(phase) = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        match (*phase, argument) {
            (0, Some(argument)) => {
                *phase = 1;
                self.push(argument);
                Ok(())
            }
            _ => self.unwind_return(slot.into_value()),
        }
    }

    fn step_throw(&mut self, node: &Node, argument: &Rc<Node>) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Phase(phase) = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        if *phase == 0 {
            *phase = 1;
            self.push(argument);
            return Ok(());
        }
        Err(JsError::Exception(slot.into_value()))
    }

    fn step_try(&mut self, node: &Node, stmt: &TryStatement) -> Result<(), JsError> {
        let frame = self.top()?;
        frame.take_value();
        let labels = frame.labels.clone();
        let FrameState::Try { phase, pending } = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        match *phase {
            TryPhase::Start => {
                *phase = TryPhase::Block;
                self.push(&stmt.block);
            }
            // The block or handler finished normally
            TryPhase::Block | TryPhase::Handler => match &stmt.finalizer {
                Some(finalizer) => {
                    *phase = TryPhase::Finalizer;
                    self.push(finalizer);
                }
                None => self.pop_with(Slot::Empty),
            },
            TryPhase::Finalizer => {
                let pending = pending.take();
                self.pop_with(Slot::Empty);
                if let Some(completion) = pending {
                    return self.resume_completion(completion, &labels);
                }
            }
        }
        Ok(())
    }

    fn step_while(&mut self, node: &Node, stmt: &WhileStatement) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Loop { phase } = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        match *phase {
            0 => {
                *phase = 1;
                self.push(&stmt.test);
            }
            1 => {
                if slot.into_value().to_boolean() {
                    *phase = 0;
                    self.push(&stmt.body);
                } else {
                    self.pop_with(Slot::Empty);
                }
            }
            _ => {
                *phase = 0;
                self.push(&stmt.body);
            }
        }
        Ok(())
    }

    fn step_for(&mut self, node: &Node, stmt: &ForStatement) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::For { mode } = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        match *mode {
            0 => {
                *mode = 1;
                if let Some(init) = &stmt.init {
                    self.push(init);
                }
            }
            1 => match &stmt.test {
                Some(test) => {
                    *mode = 2;
                    self.push(test);
                }
                None => {
                    *mode = 3;
                    self.push(&stmt.body);
                }
            },
            2 => {
                if slot.into_value().to_boolean() {
                    *mode = 3;
                    self.push(&stmt.body);
                } else {
                    self.pop_with(Slot::Empty);
                }
            }
            _ => {
                *mode = 1;
                if let Some(update) = &stmt.update {
                    self.push(update);
                }
            }
        }
        Ok(())
    }

    fn step_for_in(&mut self, node: &Node, stmt: &ForInStatement) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::ForIn {
            phase,
            target,
            keys,
            index,
            object,
        } = &mut frame.state
        else {
            return Err(state_mismatch(node));
        };
        match *phase {
            0 => match &*stmt.left {
                Node::VariableDeclaration(decl) => {
                    let Some(declarator) = decl.declarations.first() else {
                        return Err(state_mismatch(node));
                    };
                    *target = Some(Reference::Scope(declarator.id.name.cheap_clone()));
                    *phase = 2;
                    self.push(&stmt.right);
                }
                _ => {
                    *phase = 1;
                    self.push_reference(&stmt.left);
                }
            },
            1 => {
                let Slot::Reference(reference) = slot else {
                    return Err(self.invalid_assignment_target());
                };
                *target = Some(reference);
                *phase = 2;
                self.push(&stmt.right);
            }
            2 => {
                *object = slot.into_value();
                *phase = 3;
                let subject = object.clone();
                let collected = match &subject {
                    JsValue::Object(id) => self.enumerable_keys(*id)?,
                    JsValue::String(s) => (0..s.utf16_len())
                        .map(|i| JsString::from(i.to_string()))
                        .collect(),
                    _ => Vec::new(),
                };
                if let Some(Frame {
                    state: FrameState::ForIn { keys, .. },
                    ..
                }) = self.stack.last_mut()
                {
                    *keys = collected;
                }
            }
            _ => {
                let next = keys.get(*index).cloned();
                *index += 1;
                let subject = object.clone();
                let reference = target.clone();
                let Some(key) = next else {
                    self.pop_with(Slot::Empty);
                    return Ok(());
                };
                // Names deleted during the loop are skipped
                if subject.is_primitive() || self.has_property(&subject, key.as_str())? {
                    let Some(reference) = reference else {
                        return Err(state_mismatch(node));
                    };
                    self.put_reference(&reference, JsValue::String(key))?;
                    self.push(&stmt.body);
                }
            }
        }
        Ok(())
    }

    fn step_declarations(&mut self, node: &Node, decl: &VariableDeclaration) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Declarations { index, awaiting } = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        if *awaiting {
            *awaiting = false;
            let current = *index;
            *index += 1;
            if let Some(declarator) = decl.declarations.get(current) {
                self.set_value_to_scope(declarator.id.name.as_str(), slot.into_value())?;
            }
            return Ok(());
        }
        loop {
            match decl.declarations.get(*index) {
                Some(declarator) => match &declarator.init {
                    Some(init) => {
                        *awaiting = true;
                        self.push(init);
                        return Ok(());
                    }
                    // Already hoisted as undefined
                    None => *index += 1,
                },
                None => {
                    self.pop_with(Slot::Empty);
                    return Ok(());
                }
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Expressions
    // ═══════════════════════════════════════════════════════════════════════════

    fn step_conditional(&mut self, node: &Node, expr: &ast::ConditionalExpression) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Phase(phase) = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        match *phase {
            0 => {
                *phase = 1;
                self.push(&expr.test);
            }
            1 => {
                *phase = 2;
                if slot.into_value().to_boolean() {
                    self.push(&expr.consequent);
                } else {
                    self.push(&expr.alternate);
                }
            }
            _ => self.pop_value(slot.into_value()),
        }
        Ok(())
    }

    fn step_function_expression(&mut self, func: &Rc<ast::Function>) -> Result<(), JsError> {
        let scope = self.current_scope();
        // A named function expression sees its own name in a scope of its own
        let closure = match &func.id {
            Some(id) => {
                let own_scope = self.create_scope(scope, false, None)?;
                let closure = self.create_interpreted_function(Rc::clone(func), own_scope)?;
                self.define(own_scope, id.name.as_str(), JsValue::Object(closure), PropertyAttrs::NONE)?;
                closure
            }
            None => self.create_interpreted_function(Rc::clone(func), scope)?,
        };
        self.pop_value(JsValue::Object(closure));
        Ok(())
    }

    fn step_array(&mut self, node: &Node, expr: &ArrayExpression) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::ArrayLiteral { array, index } = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        let (existing, current) = (*array, *index);
        let array = match existing {
            Some(array) => array,
            None => {
                let created = self.create_array()?;
                if let Some(Frame {
                    state: FrameState::ArrayLiteral { array, .. },
                    ..
                }) = self.stack.last_mut()
                {
                    *array = Some(created);
                }
                created
            }
        };
        if let Slot::Value(value) = slot {
            if let Some(slot_index) = current.checked_sub(1) {
                let key = self.strings.index_key(slot_index as u32);
                self.set_property(&JsValue::Object(array), key.as_str(), value, PropertyAttrs::NONE)?;
            }
        }
        let mut next = current;
        // Holes only advance the index
        while let Some(None) = expr.elements.get(next) {
            next += 1;
        }
        if let Some(Frame {
            state: FrameState::ArrayLiteral { index, .. },
            ..
        }) = self.stack.last_mut()
        {
            *index = next + 1;
        }
        match expr.elements.get(next) {
            Some(Some(element)) => self.push(element),
            _ => {
                let length = JsValue::from(expr.elements.len() as u32);
                self.set_property(&JsValue::Object(array), "length", length, PropertyAttrs::NONE)?;
                self.pop_value(JsValue::Object(array));
            }
        }
        Ok(())
    }

    fn step_object(&mut self, node: &Node, expr: &ObjectExpression) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::ObjectLiteral { object, index, key } = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        let pending_key = key.take();
        let current = *index;
        let existing = *object;
        let object = match existing {
            Some(object) => object,
            None => {
                let constructor = self.intrinsics.object;
                let created = self.create_object(Some(constructor))?;
                if let Some(Frame {
                    state: FrameState::ObjectLiteral { object, .. },
                    ..
                }) = self.stack.last_mut()
                {
                    *object = Some(created);
                }
                created
            }
        };
        if let (Some(name), Slot::Value(value)) = (pending_key, slot) {
            self.set_property(&JsValue::Object(object), name.as_str(), value, PropertyAttrs::NONE)?;
        }
        let Some(property) = expr.properties.get(current) else {
            self.pop_value(JsValue::Object(object));
            return Ok(());
        };
        // Only ESTree input gets here with an accessor; the parser rejects them
        if property.kind != PropertyKind::Init {
            return Err(JsError::type_error("Object getters and setters are not supported"));
        }
        let name = match &*property.key {
            Node::Identifier(id) => id.name.cheap_clone(),
            Node::Literal(literal) => match &literal.value {
                LiteralValue::String(s) => s.cheap_clone(),
                LiteralValue::Number(n) => JsString::from(number_to_string(*n)),
                LiteralValue::Boolean(b) => JsString::from(b.to_string()),
                LiteralValue::Null => JsString::from("null"),
                LiteralValue::RegExp { pattern, flags } => {
                    JsString::from(format!("/{}/{}", pattern, flags))
                }
            },
            other => return Err(state_mismatch(other)),
        };
        if let Some(Frame {
            state: FrameState::ObjectLiteral { index, key, .. },
            ..
        }) = self.stack.last_mut()
        {
            *index = current + 1;
            *key = Some(name);
        }
        self.push(&property.value);
        Ok(())
    }

    fn step_sequence(&mut self, node: &Node, expressions: &[Rc<Node>]) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Sequence { index } = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        match expressions.get(*index) {
            Some(expression) => {
                *index += 1;
                self.push(expression);
            }
            None => self.pop_value(slot.into_value()),
        }
        Ok(())
    }

    fn step_unary(&mut self, node: &Node, expr: &UnaryExpression) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Phase(phase) = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        if *phase == 0 {
            *phase = 1;
            let soft_typeof = expr.operator == UnaryOp::Typeof
                && matches!(&*expr.argument, Node::Identifier(_));
            if expr.operator == UnaryOp::Delete || soft_typeof {
                self.push_reference(&expr.argument);
            } else {
                self.push(&expr.argument);
            }
            return Ok(());
        }
        let result = match expr.operator {
            UnaryOp::Delete => match slot {
                Slot::Reference(Reference::Member(object, name)) => {
                    JsValue::Boolean(self.delete_property(&object, name.as_str())?)
                }
                Slot::Reference(Reference::Scope(name)) => {
                    JsValue::Boolean(self.delete_variable(name.as_str())?)
                }
                _ => JsValue::Boolean(true),
            },
            UnaryOp::Typeof => {
                let type_name = match slot {
                    // An undeclared name is "undefined" rather than an error
                    Slot::Reference(Reference::Scope(name)) => match self.lookup_variable(name.as_str())? {
                        Some(value) => self.type_of(&value)?,
                        None => "undefined",
                    },
                    other => self.type_of(&other.into_value())?,
                };
                JsValue::from(type_name)
            }
            UnaryOp::Minus => JsValue::Number(-self.to_number(&slot.into_value())?),
            UnaryOp::Plus => JsValue::Number(self.to_number(&slot.into_value())?),
            UnaryOp::Not => JsValue::Boolean(!slot.into_value().to_boolean()),
            UnaryOp::BitNot => {
                JsValue::Number(!to_int32(self.to_number(&slot.into_value())?) as f64)
            }
            UnaryOp::Void => JsValue::Undefined,
        };
        self.pop_value(result);
        Ok(())
    }

    fn step_update(&mut self, node: &Node, expr: &UpdateExpression) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Phase(phase) = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        if *phase == 0 {
            *phase = 1;
            self.push_reference(&expr.argument);
            return Ok(());
        }
        let Slot::Reference(reference) = slot else {
            return Err(self.invalid_assignment_target());
        };
        let old = self.to_number(&self.get_reference(&reference)?)?;
        let new = match expr.operator {
            UpdateOp::Increment => old + 1.0,
            UpdateOp::Decrement => old - 1.0,
        };
        self.put_reference(&reference, JsValue::Number(new))?;
        self.pop_value(JsValue::Number(if expr.prefix { new } else { old }));
        Ok(())
    }

    fn step_binary(&mut self, node: &Node, expr: &BinaryExpression) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Binary { phase, left } = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        match *phase {
            0 => {
                *phase = 1;
                self.push(&expr.left);
            }
            1 => {
                *left = slot.into_value();
                *phase = 2;
                self.push(&expr.right);
            }
            _ => {
                let left = std::mem::take(left);
                let result = self.binary_op(expr.operator, &left, &slot.into_value())?;
                self.pop_value(result);
            }
        }
        Ok(())
    }

    fn step_logical(&mut self, node: &Node, expr: &LogicalExpression) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Phase(phase) = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        match *phase {
            0 => {
                *phase = 1;
                self.push(&expr.left);
            }
            1 => {
                let left = slot.into_value();
                let short_circuit = match expr.operator {
                    LogicalOp::And => !left.to_boolean(),
                    LogicalOp::Or => left.to_boolean(),
                };
                if short_circuit {
                    self.pop_value(left);
                } else {
                    *phase = 2;
                    self.push(&expr.right);
                }
            }
            _ => self.pop_value(slot.into_value()),
        }
        Ok(())
    }

    fn step_assignment(&mut self, node: &Node, expr: &AssignmentExpression) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let FrameState::Assignment { phase, target } = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        match *phase {
            0 => {
                *phase = 1;
                self.push_reference(&expr.left);
            }
            1 => {
                let Slot::Reference(reference) = slot else {
                    return Err(self.invalid_assignment_target());
                };
                *target = Some(reference);
                *phase = 2;
                self.push(&expr.right);
            }
            _ => {
                let Some(reference) = target.take() else {
                    return Err(state_mismatch(node));
                };
                let right = slot.into_value();
                let value = match expr.operator.binary_op() {
                    Some(op) => {
                        let current = self.get_reference(&reference)?;
                        self.binary_op(op, &current, &right)?
                    }
                    None => right,
                };
                self.put_reference(&reference, value.clone())?;
                self.pop_value(value);
            }
        }
        Ok(())
    }

    fn step_member(&mut self, node: &Node, expr: &MemberExpression) -> Result<(), JsError> {
        let frame = self.top()?;
        let slot = frame.take_value();
        let wants_reference = frame.wants_reference;
        let FrameState::Member { phase, object } = &mut frame.state else {
            return Err(state_mismatch(node));
        };
        let name = match *phase {
            0 => {
                *phase = 1;
                self.push(&expr.object);
                return Ok(());
            }
            1 => {
                *object = slot.into_value();
                if expr.computed {
                    *phase = 2;
                    self.push(&expr.property);
                    return Ok(());
                }
                let Node::Identifier(id) = &*expr.property else {
                    return Err(state_mismatch(node));
                };
                id.name.cheap_clone()
            }
            _ => self.to_string(&slot.into_value())?,
        };
        let object = match self.stack.last_mut() {
            Some(Frame {
                state: FrameState::Member { object, .. },
                ..
            }) => std::mem::take(object),
            _ => return Err(state_mismatch(node)),
        };
        if wants_reference {
            self.pop_with(Slot::Reference(Reference::Member(object, name)));
        } else {
            let value = self.get_property(&object, name.as_str())?;
            self.pop_value(value);
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Calls
    // ═══════════════════════════════════════════════════════════════════════════

    fn call_state(&mut self, node: &Node) -> Result<&mut CallState, JsError> {
        match self.stack.last_mut() {
            Some(Frame {
                state: FrameState::Call(state),
                ..
            }) => Ok(state),
            _ => Err(state_mismatch(node)),
        }
    }

    fn step_call(&mut self, node: &Node, call: &CallExpression) -> Result<(), JsError> {
        let slot = self.top()?.take_value();
        let phase = self.call_state(node)?.phase;
        match phase {
            CallPhase::Start => {
                self.call_state(node)?.phase = CallPhase::Callee;
                self.push_reference(&call.callee);
            }
            CallPhase::Callee => {
                let (func, this_value, name) = match slot {
                    Slot::Reference(Reference::Member(object, name)) => {
                        (self.get_property(&object, name.as_str())?, object, name)
                    }
                    Slot::Reference(Reference::Scope(name)) => {
                        (self.get_value_from_scope(name.as_str())?, JsValue::Undefined, name)
                    }
                    other => (
                        other.into_value(),
                        JsValue::Undefined,
                        JsString::from("expression"),
                    ),
                };
                let state = self.call_state(node)?;
                state.func = func;
                state.this_value = this_value;
                state.callee_name = name;
                state.phase = CallPhase::Arguments;
            }
            CallPhase::Arguments => {
                let state = self.call_state(node)?;
                if let Slot::Value(value) = slot {
                    state.args.push(value);
                }
                if let Some(argument) = call.arguments.get(state.arg_index) {
                    state.arg_index += 1;
                    self.push(argument);
                    return Ok(());
                }
                state.phase = CallPhase::Execute;
                self.execute_call(node)?;
            }
            CallPhase::Execute => self.execute_call(node)?,
            CallPhase::Waiting => self.finish_call(node, slot.into_value())?,
        }
        Ok(())
    }

    /// Perform the call once callee and arguments are known.
    fn execute_call(&mut self, node: &Node) -> Result<(), JsError> {
        let state = self.call_state(node)?;
        let mut args = std::mem::take(&mut state.args);
        let mut this_value = state.this_value.clone();
        let construct = state.construct;
        let callee = state.func.clone();
        let callee_name = state.callee_name.cheap_clone();

        let mut func = match callee {
            JsValue::Object(id) if self.object(id)?.is_function() => id,
            _ => {
                return Err(JsError::type_error(format!(
                    "{} is not a {}",
                    callee_name,
                    if construct { "constructor" } else { "function" }
                )));
            }
        };

        if construct {
            let constructor = self.bound_target(func)?;
            let fresh = self.create_object(Some(constructor))?;
            this_value = JsValue::Object(fresh);
            self.call_state(node)?.this_value = this_value.clone();
        }

        loop {
            let Some(kind) = self.object(func)?.function().cloned() else {
                return Err(JsError::type_error(format!(
                    "{} is not a function",
                    callee_name
                )));
            };
            match kind {
                FunctionKind::Bound {
                    target,
                    this_arg,
                    args: bound_args,
                } => {
                    if !construct {
                        this_value = this_arg;
                    }
                    args = bound_args.iter().cloned().chain(args).collect();
                    func = target;
                }
                FunctionKind::Apply | FunctionKind::Call => {
                    // `this` is the function being applied
                    let target = match &this_value {
                        JsValue::Object(id) if self.object(*id)?.is_function() => *id,
                        other => {
                            return Err(JsError::type_error(format!(
                                "Function.prototype.{} was called on {}, which is not a function",
                                if matches!(kind, FunctionKind::Apply) { "apply" } else { "call" },
                                self.to_string(other)?
                            )));
                        }
                    };
                    let mut rest = args.into_iter();
                    this_value = rest.next().unwrap_or_default();
                    args = if matches!(kind, FunctionKind::Apply) {
                        match rest.next() {
                            None | Some(JsValue::Undefined) | Some(JsValue::Null) => Vec::new(),
                            Some(list @ JsValue::Object(_)) => self.array_like_to_vec(&list)?,
                            Some(_) => {
                                return Err(JsError::type_error(
                                    "CreateListFromArrayLike called on non-object",
                                ));
                            }
                        }
                    } else {
                        rest.collect()
                    };
                    func = target;
                }
                FunctionKind::Interpreted { func: ast_func, scope } => {
                    let strict = self
                        .object(scope)?
                        .scope
                        .is_some_and(|link| link.strict)
                        || ast::has_use_strict(ast_func.body_statements());
                    if !strict && this_value.is_null_or_undefined() {
                        this_value = JsValue::Object(self.global_scope());
                    }
                    let call_scope = self.create_call_scope(&ast_func, scope, &args)?;
                    self.call_state(node)?.phase = CallPhase::Waiting;
                    self.stack.push(Frame::with_scope(
                        Rc::clone(&ast_func.body),
                        call_scope,
                        Some(this_value),
                    ));
                    return Ok(());
                }
                FunctionKind::Native(native) => {
                    let previous = std::mem::replace(&mut self.constructing, construct);
                    let result = (native.func)(self, this_value, &args);
                    self.constructing = previous;
                    return self.finish_call(node, result?);
                }
                FunctionKind::Async(native) => {
                    let callback = AsyncCallback::default();
                    self.call_state(node)?.phase = CallPhase::Waiting;
                    (native.func)(self, this_value, &args, callback.clone())?;
                    self.pause_for(callback);
                    return Ok(());
                }
                FunctionKind::Eval => return self.begin_eval(node, args),
            }
        }
    }

    /// Constructors reached through `bind` construct their target.
    fn bound_target(&self, mut func: ObjectId) -> Result<ObjectId, JsError> {
        while let Some(FunctionKind::Bound { target, .. }) = self.object(func)?.function() {
            func = *target;
        }
        Ok(func)
    }

    /// Pop the call frame with its result; `new` keeps the fresh object
    /// unless the constructor returned an object.
    fn finish_call(&mut self, node: &Node, result: JsValue) -> Result<(), JsError> {
        let state = self.call_state(node)?;
        let result = if state.construct && result.is_primitive() {
            state.this_value.clone()
        } else {
            result
        };
        self.pop_value(result);
        Ok(())
    }

    /// Elements `0..length` of an array-like
    pub(crate) fn array_like_to_vec(&self, value: &JsValue) -> Result<Vec<JsValue>, JsError> {
        let length = self.array_length(value)?;
        (0..length)
            .map(|index| self.get_property(value, &index.to_string()))
            .collect()
    }

    fn begin_eval(&mut self, node: &Node, args: Vec<JsValue>) -> Result<(), JsError> {
        let code = match args.into_iter().next() {
            None => return self.finish_call(node, JsValue::Undefined),
            Some(JsValue::String(code)) => code,
            // Non-strings evaluate to themselves
            Some(other) => return self.finish_call(node, other),
        };
        let program = parse_eval_program(code.as_str())?;
        let caller_scope = self.current_scope();
        let this_value = self.current_this();
        let scope = self.create_scope(caller_scope, program.is_strict(), None)?;
        self.hoist_into(scope, &program.body)?;
        let program = Rc::new(Node::Program(program));
        let inner = vec![Frame::with_scope(Rc::clone(&program), scope, Some(this_value))];
        self.call_state(node)?.phase = CallPhase::Waiting;
        let mut frame = Frame::new(program);
        frame.state = FrameState::Eval { inner };
        self.stack.push(frame);
        Ok(())
    }

    /// Advance the nested `eval` stack by one step.
    fn step_eval(&mut self) -> Result<(), JsError> {
        let mut nested = match self.stack.last_mut() {
            Some(Frame {
                state: FrameState::Eval { inner },
                ..
            }) => std::mem::take(inner),
            _ => return Err(JsError::internal_error("eval frame expected")),
        };
        if nested.first().is_none_or(Frame::is_finished_program) {
            let completion = match nested.first() {
                Some(Frame {
                    state: FrameState::Program { completion, .. },
                    ..
                }) => completion.clone(),
                _ => JsValue::Undefined,
            };
            self.pop_value(completion);
            return Ok(());
        }
        std::mem::swap(&mut self.stack, &mut nested);
        let result = self.dispatch();
        std::mem::swap(&mut self.stack, &mut nested);
        if let Some(Frame {
            state: FrameState::Eval { inner },
            ..
        }) = self.stack.last_mut()
        {
            *inner = nested;
        }
        result
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Operators
    // ═══════════════════════════════════════════════════════════════════════════

    pub(crate) fn binary_op(
        &mut self,
        op: BinaryOp,
        left: &JsValue,
        right: &JsValue,
    ) -> Result<JsValue, JsError> {
        Ok(match op {
            BinaryOp::Eq => JsValue::Boolean(self.loose_equals(left, right)?),
            BinaryOp::NotEq => JsValue::Boolean(!self.loose_equals(left, right)?),
            BinaryOp::StrictEq => JsValue::Boolean(left.strict_equals(right)),
            BinaryOp::StrictNotEq => JsValue::Boolean(!left.strict_equals(right)),
            BinaryOp::Lt => JsValue::Boolean(self.compare(left, right)? == -1.0),
            BinaryOp::LtEq => {
                let order = self.compare(left, right)?;
                JsValue::Boolean(order == -1.0 || order == 0.0)
            }
            BinaryOp::Gt => JsValue::Boolean(self.compare(left, right)? == 1.0),
            BinaryOp::GtEq => {
                let order = self.compare(left, right)?;
                JsValue::Boolean(order == 1.0 || order == 0.0)
            }
            BinaryOp::Add => {
                let left = self.to_primitive(left, PreferredType::Default)?;
                let right = self.to_primitive(right, PreferredType::Default)?;
                if left.is_string() || right.is_string() {
                    JsValue::String(left.to_js_string() + &right.to_js_string())
                } else {
                    JsValue::Number(left.to_number() + right.to_number())
                }
            }
            BinaryOp::Sub => JsValue::Number(self.to_number(left)? - self.to_number(right)?),
            BinaryOp::Mul => JsValue::Number(self.to_number(left)? * self.to_number(right)?),
            BinaryOp::Div => JsValue::Number(self.to_number(left)? / self.to_number(right)?),
            BinaryOp::Mod => JsValue::Number(self.to_number(left)? % self.to_number(right)?),
            BinaryOp::LShift => {
                let shift = to_uint32(self.to_number(right)?) & 31;
                JsValue::Number(to_int32(self.to_number(left)?).wrapping_shl(shift) as f64)
            }
            BinaryOp::RShift => {
                let shift = to_uint32(self.to_number(right)?) & 31;
                JsValue::Number((to_int32(self.to_number(left)?) >> shift) as f64)
            }
            BinaryOp::URShift => {
                let shift = to_uint32(self.to_number(right)?) & 31;
                JsValue::Number((to_uint32(self.to_number(left)?) >> shift) as f64)
            }
            BinaryOp::BitAnd => JsValue::Number(
                (to_int32(self.to_number(left)?) & to_int32(self.to_number(right)?)) as f64,
            ),
            BinaryOp::BitOr => JsValue::Number(
                (to_int32(self.to_number(left)?) | to_int32(self.to_number(right)?)) as f64,
            ),
            BinaryOp::BitXor => JsValue::Number(
                (to_int32(self.to_number(left)?) ^ to_int32(self.to_number(right)?)) as f64,
            ),
            BinaryOp::In => {
                let name = self.to_string(left)?;
                JsValue::Boolean(self.has_property(right, name.as_str())?)
            }
            BinaryOp::Instanceof => match right {
                JsValue::Object(ctor) if self.object(*ctor)?.is_function() => {
                    JsValue::Boolean(self.is_instance_of(left, *ctor)?)
                }
                _ => {
                    return Err(JsError::type_error(
                        "Right-hand side of 'instanceof' is not callable",
                    ));
                }
            },
        })
    }
}
