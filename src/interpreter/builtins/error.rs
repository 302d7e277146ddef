//! Error constructor and its subclasses

use crate::error::JsError;
use crate::interpreter::{Interpreter, PropertyAttrs};
use crate::value::{JsValue, ObjectId};

use super::{arg, create_constructor};

/// Subclasses of Error, each with its own prototype chained to Error's
const ERROR_KINDS: [&str; 6] = [
    "EvalError",
    "RangeError",
    "ReferenceError",
    "SyntaxError",
    "TypeError",
    "URIError",
];

/// Initialize Error and the native error types
pub fn init_errors(interp: &mut Interpreter) -> Result<(), JsError> {
    let object = interp.intrinsics.object;
    let (error, error_proto) = create_constructor(interp, "Error", 1, error_constructor("Error"), object)?;
    interp.intrinsics.error = error;
    interp.define(error_proto, "name", JsValue::from("Error"), PropertyAttrs::HIDDEN)?;
    interp.define(error_proto, "message", JsValue::from(""), PropertyAttrs::HIDDEN)?;
    interp.register_method(error_proto, "toString", error_to_string, 0)?;

    for kind in ERROR_KINDS {
        let (constructor, proto) =
            create_constructor(interp, kind, 1, error_constructor(kind), error)?;
        interp.define(proto, "name", JsValue::from(kind), PropertyAttrs::HIDDEN)?;
        interp.intrinsics.error_kinds.push((kind, constructor));
    }
    Ok(())
}

/// `Error(message)` behaves the same with or without `new`.
fn error_constructor(
    kind: &'static str,
) -> impl Fn(&mut Interpreter, JsValue, &[JsValue]) -> Result<JsValue, JsError> + 'static {
    move |interp, this, args| {
        let message = match arg(args, 0) {
            JsValue::Undefined => None,
            other => Some(interp.to_string(&other)?),
        };
        let error: ObjectId = match (&this, interp.is_constructing()) {
            (JsValue::Object(id), true) => *id,
            _ => interp.create_error(kind, "")?,
        };
        if let Some(message) = message {
            interp.define(error, "message", JsValue::String(message), PropertyAttrs::HIDDEN)?;
        }
        Ok(JsValue::Object(error))
    }
}

/// Error.prototype.toString(): `name: message`
pub fn error_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    if !matches!(this, JsValue::Object(_)) {
        return Err(JsError::type_error(
            "Error.prototype.toString called on non-object",
        ));
    }
    Ok(JsValue::from(interp.error_to_string(&this)?))
}
