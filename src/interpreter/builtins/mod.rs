//! Built-in function implementations for the JavaScript standard library

pub mod array;
pub mod boolean;
pub mod date;
pub mod error;
pub mod function;
pub mod global;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod polyfills;
pub mod regexp;
pub mod string;

use tracing::debug;

use crate::error::JsError;
use crate::interpreter::{Interpreter, PropertyAttrs};
use crate::value::{JsValue, ObjectId};

/// Install every intrinsic into the global scope.
///
/// Object and Function come first: every function object created after them
/// is parented to Function, and every prototype to Object.
pub fn init_globals(interp: &mut Interpreter) -> Result<(), JsError> {
    let global = interp.global_scope();

    let object = interp.create_native_function("Object", 1, object::object_constructor)?;
    let object_proto = interp.create_object(None)?;
    link_prototype(interp, object, object_proto)?;
    interp.intrinsics.object = object;

    let function = interp.create_native_function("Function", 1, function::function_constructor)?;
    let function_proto = interp.create_object(Some(object))?;
    link_prototype(interp, function, function_proto)?;
    interp.intrinsics.function = function;

    // Both were created before Function existed
    interp.object_mut(object)?.parent = Some(function);
    interp.object_mut(function)?.parent = Some(function);
    interp.object_mut(global)?.parent = Some(object);
    interp.define(global, "Object", JsValue::Object(object), PropertyAttrs::HIDDEN)?;
    interp.define(global, "Function", JsValue::Object(function), PropertyAttrs::HIDDEN)?;

    object::init_object(interp, object, object_proto)?;
    function::init_function(interp, function_proto)?;
    array::init_array(interp)?;
    number::init_number(interp)?;
    string::init_string(interp)?;
    boolean::init_boolean(interp)?;
    date::init_date(interp)?;
    math::init_math(interp)?;
    regexp::init_regexp(interp)?;
    json::init_json(interp)?;
    error::init_errors(interp)?;
    global::init_global(interp)?;

    debug!("builtins installed");
    Ok(())
}

/// Create a global constructor and its prototype object.
///
/// The prototype is made by `proto_parent` (usually Object), so lookups that
/// miss on the prototype continue there.
pub(crate) fn create_constructor<F>(
    interp: &mut Interpreter,
    name: &str,
    arity: u32,
    func: F,
    proto_parent: ObjectId,
) -> Result<(ObjectId, ObjectId), JsError>
where
    F: Fn(&mut Interpreter, JsValue, &[JsValue]) -> Result<JsValue, JsError> + 'static,
{
    let constructor = interp.create_native_function(name, arity, func)?;
    let prototype = interp.create_object(Some(proto_parent))?;
    link_prototype(interp, constructor, prototype)?;
    let global = interp.global_scope();
    interp.define(global, name, JsValue::Object(constructor), PropertyAttrs::HIDDEN)?;
    Ok((constructor, prototype))
}

fn link_prototype(
    interp: &mut Interpreter,
    constructor: ObjectId,
    prototype: ObjectId,
) -> Result<(), JsError> {
    interp.define(
        constructor,
        "prototype",
        JsValue::Object(prototype),
        PropertyAttrs::FROZEN_HIDDEN,
    )?;
    interp.define(
        prototype,
        "constructor",
        JsValue::Object(constructor),
        PropertyAttrs::HIDDEN,
    )
}

/// Argument `index`, or undefined when absent
pub(crate) fn arg(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or_default()
}

/// Frozen, hidden numeric constant
pub(crate) fn define_constant(
    interp: &mut Interpreter,
    target: ObjectId,
    name: &str,
    value: f64,
) -> Result<(), JsError> {
    interp.define(target, name, JsValue::Number(value), PropertyAttrs::FROZEN_HIDDEN)
}

/// `ToInteger` of an optional argument, with a default for undefined
pub(crate) fn integer_arg(
    interp: &Interpreter,
    args: &[JsValue],
    index: usize,
    default: f64,
) -> Result<f64, JsError> {
    match args.get(index) {
        None | Some(JsValue::Undefined) => Ok(default),
        Some(value) => Ok(crate::value::to_integer(interp.to_number(value)?)),
    }
}

/// Resolve a relative index (negative counts from the end) into `0..=len`.
pub(crate) fn relative_index(n: f64, len: usize) -> usize {
    let len_f = len as f64;
    if n < 0.0 {
        (len_f + n).max(0.0) as usize
    } else {
        n.min(len_f) as usize
    }
}
