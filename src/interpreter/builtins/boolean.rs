//! Boolean constructor and Boolean.prototype methods

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsValue, ObjectData};

use super::{arg, create_constructor};

/// Initialize the Boolean constructor and Boolean.prototype
pub fn init_boolean(interp: &mut Interpreter) -> Result<(), JsError> {
    let object = interp.intrinsics.object;
    let (constructor, proto) =
        create_constructor(interp, "Boolean", 1, boolean_constructor, object)?;
    interp.intrinsics.boolean = constructor;

    interp.register_method(proto, "toString", boolean_to_string, 0)?;
    interp.register_method(proto, "valueOf", boolean_value_of, 0)?;
    Ok(())
}

/// `Boolean(value)` converts; `new Boolean(value)` boxes.
pub fn boolean_constructor(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let value = arg(args, 0).to_boolean();
    if let (JsValue::Object(id), true) = (&this, interp.is_constructing()) {
        interp.object_mut(*id)?.data = ObjectData::Primitive(JsValue::Boolean(value));
        return Ok(this);
    }
    Ok(JsValue::Boolean(value))
}

fn this_boolean_value(interp: &Interpreter, this: &JsValue, method: &str) -> Result<bool, JsError> {
    match this {
        JsValue::Boolean(b) => return Ok(*b),
        JsValue::Object(id) => {
            if let ObjectData::Primitive(JsValue::Boolean(b)) = interp.object(*id)?.data {
                return Ok(b);
            }
        }
        _ => {}
    }
    Err(JsError::type_error(format!(
        "Boolean.prototype.{} requires that 'this' be a Boolean",
        method
    )))
}

pub fn boolean_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let value = this_boolean_value(interp, &this, "toString")?;
    Ok(JsValue::from(if value { "true" } else { "false" }))
}

pub fn boolean_value_of(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(this_boolean_value(interp, &this, "valueOf")?))
}
