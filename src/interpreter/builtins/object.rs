//! Object constructor, statics and Object.prototype methods

use crate::error::JsError;
use crate::interpreter::{Interpreter, PropertyAttrs};
use crate::value::{JsString, JsValue, ObjectData, ObjectId, ObjectKind};

use super::arg;

/// Initialize Object statics and Object.prototype
pub fn init_object(
    interp: &mut Interpreter,
    constructor: ObjectId,
    prototype: ObjectId,
) -> Result<(), JsError> {
    interp.register_method(constructor, "getOwnPropertyNames", object_get_own_property_names, 1)?;
    interp.register_method(constructor, "keys", object_keys, 1)?;
    interp.register_method(constructor, "defineProperty", object_define_property, 3)?;

    interp.register_method(prototype, "toString", object_to_string, 0)?;
    interp.register_method(prototype, "toLocaleString", object_to_locale_string, 0)?;
    interp.register_method(prototype, "valueOf", object_value_of, 0)?;
    interp.register_method(prototype, "hasOwnProperty", object_has_own_property, 1)?;
    interp.register_method(
        prototype,
        "propertyIsEnumerable",
        object_property_is_enumerable,
        1,
    )?;
    Ok(())
}

/// `Object(value)`: boxes primitives, passes objects through, and makes a
/// fresh object for null/undefined.
pub fn object_constructor(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let value = arg(args, 0);
    if value.is_null_or_undefined() {
        if interp.is_constructing() {
            return Ok(this);
        }
        let object = interp.intrinsics.object;
        return Ok(JsValue::Object(interp.create_object(Some(object))?));
    }
    Ok(JsValue::Object(interp.to_object(&value)?))
}

fn require_object(value: &JsValue, method: &str) -> Result<ObjectId, JsError> {
    match value {
        JsValue::Object(id) => Ok(*id),
        _ => Err(JsError::type_error(format!(
            "Object.{} called on non-object",
            method
        ))),
    }
}

/// Object.getOwnPropertyNames(obj)
pub fn object_get_own_property_names(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = require_object(&arg(args, 0), "getOwnPropertyNames")?;
    let mut names = interp.own_keys(id, false)?;
    if interp.object(id)?.is_array() {
        names.push(JsString::from("length"));
    }
    let names = names.into_iter().map(JsValue::String).collect();
    Ok(JsValue::Object(interp.create_array_from(names)?))
}

/// Object.keys(obj): own enumerable names in insertion order
pub fn object_keys(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = require_object(&arg(args, 0), "keys")?;
    let names = interp
        .own_keys(id, true)?
        .into_iter()
        .map(JsValue::String)
        .collect();
    Ok(JsValue::Object(interp.create_array_from(names)?))
}

/// Object.defineProperty(obj, name, descriptor)
///
/// Only data descriptors are supported. `writable` and `enumerable` default
/// to false; a non-writable property can never be redefined.
pub fn object_define_property(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let target = arg(args, 0);
    let id = require_object(&target, "defineProperty")?;
    let name = interp.to_string(&arg(args, 1))?;
    let descriptor = arg(args, 2);
    if !matches!(descriptor, JsValue::Object(_)) {
        return Err(JsError::type_error("Property description must be an object"));
    }
    let flag = |interp: &Interpreter, key: &str| -> Result<bool, JsError> {
        Ok(interp.get_property(&descriptor, key)?.to_boolean())
    };
    let writable = flag(interp, "writable")?;
    let enumerable = flag(interp, "enumerable")?;
    let value = interp.get_property(&descriptor, "value")?;

    let object = interp.object_mut(id)?;
    if object.fixed.contains(name.as_str()) {
        return Err(JsError::type_error(format!(
            "Cannot redefine property: {}",
            name
        )));
    }
    object.nonenumerable.remove(name.as_str());
    interp.define(
        id,
        name.as_str(),
        value,
        PropertyAttrs {
            frozen: !writable,
            hidden: !enumerable,
        },
    )?;
    Ok(target)
}

/// Object.prototype.toString: `[object Class]`
pub fn object_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let class = class_name(interp, &this)?;
    Ok(JsValue::from(format!("[object {}]", class)))
}

/// The internal class of a value as `Object.prototype.toString` reports it
pub(crate) fn class_name(interp: &Interpreter, value: &JsValue) -> Result<&'static str, JsError> {
    let id = match value {
        JsValue::Undefined => return Ok("Undefined"),
        JsValue::Null => return Ok("Null"),
        JsValue::Boolean(_) => return Ok("Boolean"),
        JsValue::Number(_) => return Ok("Number"),
        JsValue::String(_) => return Ok("String"),
        JsValue::Object(id) => *id,
    };
    let object = interp.object(id)?;
    Ok(match (&object.kind, &object.data) {
        (ObjectKind::Array { .. }, _) => "Array",
        (ObjectKind::Function(_), _) => "Function",
        (_, ObjectData::Date(_)) => "Date",
        (_, ObjectData::RegExp(_)) => "RegExp",
        (_, ObjectData::Primitive(JsValue::Boolean(_))) => "Boolean",
        (_, ObjectData::Primitive(JsValue::Number(_))) => "Number",
        (_, ObjectData::Primitive(JsValue::String(_))) => "String",
        _ if interp.isa(id, interp.intrinsics.error)? => "Error",
        _ => "Object",
    })
}

pub fn object_to_locale_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::String(interp.to_string(&this)?))
}

pub fn object_value_of(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Object(interp.to_object(&this)?))
}

/// Object.prototype.hasOwnProperty(name)
pub fn object_has_own_property(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let name = interp.to_string(&arg(args, 0))?;
    Ok(JsValue::Boolean(interp.has_own_property(&this, name.as_str())?))
}

/// Object.prototype.propertyIsEnumerable(name)
pub fn object_property_is_enumerable(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let name = interp.to_string(&arg(args, 0))?;
    let enumerable = match &this {
        JsValue::Object(id) => {
            let object = interp.object(*id)?;
            object.properties.contains_key(name.as_str()) && object.is_enumerable(name.as_str())
        }
        // Characters of a string are enumerable, its length is not
        JsValue::String(_) => name != "length" && interp.has_own_property(&this, name.as_str())?,
        _ => false,
    };
    Ok(JsValue::Boolean(enumerable))
}
