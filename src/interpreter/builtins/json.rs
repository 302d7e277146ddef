//! JSON object and the conversions between guest values and `serde_json`
//! values that hosts use to pass data in and out.

use serde::Serialize;

use crate::error::JsError;
use crate::interpreter::{Interpreter, PropertyAttrs};
use crate::prelude::ensure_sufficient_stack;
use crate::value::{JsValue, ObjectData, ObjectId, ObjectKind};

use super::arg;
use super::date::format_iso;

/// Initialize the global JSON object
pub fn init_json(interp: &mut Interpreter) -> Result<(), JsError> {
    let object = interp.intrinsics.object;
    let json = interp.create_object(Some(object))?;
    let global = interp.global_scope();
    interp.define(global, "JSON", JsValue::Object(json), PropertyAttrs::HIDDEN)?;

    interp.register_method(json, "parse", json_parse, 2)?;
    interp.register_method(json, "stringify", json_stringify, 3)?;
    Ok(())
}

/// JSON.parse(text): malformed input is a SyntaxError. A reviver is ignored.
pub fn json_parse(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let text = interp.to_string(&arg(args, 0))?;
    let json: serde_json::Value = serde_json::from_str(text.as_str()).map_err(|e| {
        JsError::syntax_error(format!("JSON.parse: {}", e), e.line() as u32, e.column() as u32)
    })?;
    interp.native_to_guest(&json)
}

/// JSON.stringify(value, replacer, space): the replacer is ignored
pub fn json_stringify(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut visited = Vec::new();
    let Some(json) = to_json(interp, &arg(args, 0), &mut visited)? else {
        return Ok(JsValue::Undefined);
    };
    let indent = match arg(args, 2) {
        JsValue::Number(n) if n >= 1.0 => " ".repeat(n.min(10.0) as usize),
        JsValue::String(s) => s.as_str().chars().take(10).collect(),
        _ => String::new(),
    };
    let text = if indent.is_empty() {
        json.to_string()
    } else {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        json.serialize(&mut serializer)
            .map_err(|e| JsError::internal_error(format!("JSON.stringify: {}", e)))?;
        String::from_utf8_lossy(&out).into_owned()
    };
    Ok(JsValue::from(text))
}

/// A finite number as JSON; integral values print without a fraction
fn number_to_json(n: f64) -> serde_json::Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Convert one value; `None` means the value is skipped (undefined and
/// functions).
fn to_json(
    interp: &Interpreter,
    value: &JsValue,
    visited: &mut Vec<ObjectId>,
) -> Result<Option<serde_json::Value>, JsError> {
    let id = match value {
        JsValue::Undefined => return Ok(None),
        JsValue::Null => return Ok(Some(serde_json::Value::Null)),
        JsValue::Boolean(b) => return Ok(Some(serde_json::Value::Bool(*b))),
        JsValue::Number(n) => return Ok(Some(number_to_json(*n))),
        JsValue::String(s) => return Ok(Some(serde_json::Value::String(s.to_string()))),
        JsValue::Object(id) => *id,
    };
    let object = interp.object(id)?;
    match &object.data {
        ObjectData::Primitive(inner) => return to_json(interp, inner, visited),
        ObjectData::Date(t) => {
            return Ok(Some(
                format_iso(*t)
                    .map(serde_json::Value::String)
                    .unwrap_or(serde_json::Value::Null),
            ));
        }
        ObjectData::RegExp(_) | ObjectData::None => {}
    }
    if object.is_function() {
        return Ok(None);
    }
    if visited.contains(&id) {
        return Err(JsError::type_error("Converting circular structure to JSON"));
    }
    if visited.len() >= interp.config().max_nesting_depth {
        return Err(JsError::range_error("Maximum nesting depth exceeded"));
    }
    visited.push(id);
    let result = ensure_sufficient_stack(|| members_to_json(interp, value, id, visited));
    visited.pop();
    Ok(Some(result?))
}

/// Elements of an array, or enumerable own properties of an object
fn members_to_json(
    interp: &Interpreter,
    value: &JsValue,
    id: ObjectId,
    visited: &mut Vec<ObjectId>,
) -> Result<serde_json::Value, JsError> {
    if let ObjectKind::Array { length } = interp.object(id)?.kind {
        let mut items = Vec::with_capacity(length as usize);
        for index in 0..length {
            let element = interp.get_property(value, &index.to_string())?;
            items.push(to_json(interp, &element, visited)?.unwrap_or(serde_json::Value::Null));
        }
        return Ok(serde_json::Value::Array(items));
    }
    let mut map = serde_json::Map::new();
    for key in interp.own_keys(id, true)? {
        let member = interp.get_property(value, key.as_str())?;
        if let Some(json) = to_json(interp, &member, visited)? {
            map.insert(key.to_string(), json);
        }
    }
    Ok(serde_json::Value::Object(map))
}

impl Interpreter {
    /// Build a guest value from a JSON value; objects and arrays are fresh
    /// guest objects.
    pub fn native_to_guest(&mut self, value: &serde_json::Value) -> Result<JsValue, JsError> {
        Ok(match value {
            serde_json::Value::Null => JsValue::Null,
            serde_json::Value::Bool(b) => JsValue::Boolean(*b),
            serde_json::Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => JsValue::from(s.as_str()),
            serde_json::Value::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.native_to_guest(item)?);
                }
                JsValue::Object(self.create_array_from(values)?)
            }
            serde_json::Value::Object(map) => {
                let object = self.intrinsics.object;
                let id = self.create_object(Some(object))?;
                for (key, item) in map {
                    let item = self.native_to_guest(item)?;
                    self.define(id, key, item, PropertyAttrs::NONE)?;
                }
                JsValue::Object(id)
            }
        })
    }

    /// Convert a guest value to JSON the way `JSON.stringify` sees it.
    /// Undefined and functions become `null`; cycles are a TypeError.
    pub fn guest_to_native(&self, value: &JsValue) -> Result<serde_json::Value, JsError> {
        let mut visited = Vec::new();
        Ok(to_json(self, value, &mut visited)?.unwrap_or(serde_json::Value::Null))
    }
}
