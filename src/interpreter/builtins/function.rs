//! Function constructor and Function.prototype methods (apply, call, bind)

use std::rc::Rc;

use crate::ast::Node;
use crate::error::JsError;
use crate::interpreter::{Interpreter, PropertyAttrs, function_source};
use crate::parser::parse_program;
use crate::value::{FunctionKind, JsValue, ObjectId};

use super::arg;

/// Initialize Function.prototype
///
/// `apply` and `call` are markers handled by the call machinery: they retarget
/// the pending call instead of running host code.
pub fn init_function(interp: &mut Interpreter, prototype: ObjectId) -> Result<(), JsError> {
    let apply = interp.create_function_object(FunctionKind::Apply, 2)?;
    interp.define(prototype, "apply", JsValue::Object(apply), PropertyAttrs::HIDDEN)?;
    let call = interp.create_function_object(FunctionKind::Call, 1)?;
    interp.define(prototype, "call", JsValue::Object(call), PropertyAttrs::HIDDEN)?;

    interp.register_method(prototype, "bind", function_bind, 1)?;
    interp.register_method(prototype, "toString", function_to_string, 0)?;
    interp.register_method(prototype, "valueOf", function_value_of, 0)?;

    let global = interp.global_scope();
    let eval = interp.create_function_object(FunctionKind::Eval, 1)?;
    interp.define(global, "eval", JsValue::Object(eval), PropertyAttrs::HIDDEN)?;
    Ok(())
}

/// `new Function(p1, ..., pN, body)`
///
/// The function closes over the global scope, never the caller's.
pub fn function_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut texts = Vec::with_capacity(args.len());
    for value in args {
        texts.push(interp.to_string(value)?.to_string());
    }
    let body = texts.pop().unwrap_or_default();
    let params = texts.join(", ");
    // A `)` would let the parameter list close early and smuggle code out
    if params.contains(')') {
        return Err(JsError::syntax_error(
            "Function arg string contains parenthesis",
            1,
            1,
        ));
    }
    let source = format!("(function({}) {{\n{}\n}})", params, body);
    let program = parse_program(&source)?;
    let func = match program.body.first().map(|node| &**node) {
        Some(Node::ExpressionStatement(stmt)) => match &*stmt.expression {
            Node::FunctionExpression(func) => Rc::clone(func),
            _ => return Err(JsError::syntax_error("Invalid function body", 1, 1)),
        },
        _ => return Err(JsError::syntax_error("Invalid function body", 1, 1)),
    };
    if program.body.len() != 1 {
        return Err(JsError::syntax_error("Invalid function body", 1, 1));
    }
    let global = interp.global_scope();
    Ok(JsValue::Object(interp.create_interpreted_function(func, global)?))
}

fn require_function(interp: &Interpreter, value: &JsValue, method: &str) -> Result<ObjectId, JsError> {
    match value {
        JsValue::Object(id) if interp.object(*id)?.is_function() => Ok(*id),
        _ => Err(JsError::type_error(format!(
            "Function.prototype.{} called on a non-function",
            method
        ))),
    }
}

/// Function.prototype.bind(thisArg, ...args)
pub fn function_bind(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target = require_function(interp, &this, "bind")?;
    let bound_args: Rc<[JsValue]> = args.iter().skip(1).cloned().collect();
    let target_length = interp.get_property(&this, "length")?;
    let arity = (interp.to_number(&target_length)? - bound_args.len() as f64).max(0.0) as u32;
    let bound = interp.create_function_object(
        FunctionKind::Bound {
            target,
            this_arg: arg(args, 0),
            args: bound_args,
        },
        arity,
    )?;
    Ok(JsValue::Object(bound))
}

/// Function.prototype.toString: the source text of guest functions
pub fn function_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = require_function(interp, &this, "toString")?;
    let source = interp
        .object(id)?
        .function()
        .map(function_source)
        .unwrap_or_default();
    Ok(JsValue::from(source))
}

pub fn function_value_of(
    _interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(this)
}
