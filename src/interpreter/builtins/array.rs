//! Array constructor and native Array.prototype methods
//!
//! Methods that call back into guest functions (`forEach`, `map`, sorting with
//! a comparator, ...) are interpreted polyfills; see `polyfills.rs`.

use crate::error::JsError;
use crate::interpreter::{Interpreter, PropertyAttrs};
use crate::value::{JsValue, ObjectId, compare_utf16, to_uint32};

use super::{arg, create_constructor, integer_arg, relative_index};

/// Initialize the Array constructor and Array.prototype
pub fn init_array(interp: &mut Interpreter) -> Result<(), JsError> {
    let object = interp.intrinsics.object;
    let (constructor, proto) = create_constructor(interp, "Array", 1, array_constructor, object)?;
    interp.intrinsics.array = constructor;

    interp.register_method(constructor, "isArray", array_is_array, 1)?;

    interp.register_method(proto, "pop", array_pop, 0)?;
    interp.register_method(proto, "push", array_push, 1)?;
    interp.register_method(proto, "shift", array_shift, 0)?;
    interp.register_method(proto, "unshift", array_unshift, 1)?;
    interp.register_method(proto, "reverse", array_reverse, 0)?;
    interp.register_method(proto, "splice", array_splice, 2)?;
    interp.register_method(proto, "slice", array_slice, 2)?;
    interp.register_method(proto, "join", array_join, 1)?;
    interp.register_method(proto, "concat", array_concat, 1)?;
    interp.register_method(proto, "indexOf", array_index_of, 1)?;
    interp.register_method(proto, "lastIndexOf", array_last_index_of, 1)?;
    interp.register_method(proto, "toString", array_to_string, 0)?;
    interp.register_method(proto, "sort", array_sort, 1)?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Array-like helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Elements `0..length` of an array-like; holes are `None`.
fn read_elements(interp: &Interpreter, id: ObjectId) -> Result<Vec<Option<JsValue>>, JsError> {
    let length = interp.array_length(&JsValue::Object(id))?;
    let object = interp.object(id)?;
    Ok((0..length)
        .map(|index| object.properties.get(index.to_string().as_str()).cloned())
        .collect())
}

/// Replace the elements of an array-like, deleting anything past the end.
fn write_elements(
    interp: &mut Interpreter,
    id: ObjectId,
    elements: Vec<Option<JsValue>>,
) -> Result<(), JsError> {
    let target = JsValue::Object(id);
    let old_length = interp.array_length(&target)?;
    let new_length = grown_length(0, elements.len())?;
    for (index, element) in elements.into_iter().enumerate() {
        let key = interp.strings.index_key(index as u32);
        match element {
            Some(value) => interp.set_property(&target, key.as_str(), value, PropertyAttrs::NONE)?,
            None => {
                interp.delete_property(&target, key.as_str())?;
            }
        }
    }
    for index in new_length..old_length {
        interp.delete_property(&target, &index.to_string())?;
    }
    set_length(interp, id, new_length)
}

/// `length` after adding `added` elements; an array never grows past
/// 2^32 - 1 elements
fn grown_length(length: u32, added: usize) -> Result<u32, JsError> {
    u32::try_from(added)
        .ok()
        .and_then(|added| length.checked_add(added))
        .ok_or_else(|| JsError::range_error("Invalid array length"))
}

fn set_length(interp: &mut Interpreter, id: ObjectId, length: u32) -> Result<(), JsError> {
    interp.set_property(
        &JsValue::Object(id),
        "length",
        JsValue::from(length),
        PropertyAttrs::NONE,
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constructor
// ═══════════════════════════════════════════════════════════════════════════════

/// `Array(len)` / `Array(a, b, ...)`, with or without `new`
pub fn array_constructor(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let array = match (&this, interp.is_constructing()) {
        (JsValue::Object(id), true) => *id,
        _ => interp.create_array()?,
    };
    if let [JsValue::Number(length)] = args {
        if to_uint32(*length) as f64 != *length {
            return Err(JsError::range_error("Invalid array length"));
        }
        set_length(interp, array, *length as u32)?;
    } else {
        let elements = args.iter().cloned().map(Some).collect();
        write_elements(interp, array, elements)?;
    }
    Ok(JsValue::Object(array))
}

/// Array.isArray(value)
pub fn array_is_array(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(match arg(args, 0) {
        JsValue::Object(id) => interp.object(id)?.is_array(),
        _ => false,
    }))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Mutators
// ═══════════════════════════════════════════════════════════════════════════════

/// Array.prototype.push(...items): returns the new length
pub fn array_push(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = interp.to_object(&this)?;
    let target = JsValue::Object(id);
    let length = interp.array_length(&target)?;
    let new_length = grown_length(length, args.len())?;
    for (index, value) in (length..new_length).zip(args) {
        let key = interp.strings.index_key(index);
        interp.set_property(&target, key.as_str(), value.clone(), PropertyAttrs::NONE)?;
    }
    set_length(interp, id, new_length)?;
    Ok(JsValue::from(new_length))
}

/// Array.prototype.pop()
pub fn array_pop(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = interp.to_object(&this)?;
    let target = JsValue::Object(id);
    let length = interp.array_length(&target)?;
    let Some(last) = length.checked_sub(1) else {
        set_length(interp, id, 0)?;
        return Ok(JsValue::Undefined);
    };
    let key = interp.strings.index_key(last);
    let value = interp.get_property(&target, key.as_str())?;
    interp.delete_property(&target, key.as_str())?;
    set_length(interp, id, last)?;
    Ok(value)
}

/// Array.prototype.shift()
pub fn array_shift(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = interp.to_object(&this)?;
    let mut elements = read_elements(interp, id)?;
    if elements.is_empty() {
        set_length(interp, id, 0)?;
        return Ok(JsValue::Undefined);
    }
    let first = elements.remove(0);
    write_elements(interp, id, elements)?;
    Ok(first.unwrap_or_default())
}

/// Array.prototype.unshift(...items): returns the new length
pub fn array_unshift(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = interp.to_object(&this)?;
    let length = grown_length(interp.array_length(&JsValue::Object(id))?, args.len())?;
    let existing = read_elements(interp, id)?;
    let mut elements: Vec<Option<JsValue>> = args.iter().cloned().map(Some).collect();
    elements.extend(existing);
    write_elements(interp, id, elements)?;
    Ok(JsValue::from(length))
}

/// Array.prototype.reverse(): in place, holes included
pub fn array_reverse(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = interp.to_object(&this)?;
    let mut elements = read_elements(interp, id)?;
    elements.reverse();
    write_elements(interp, id, elements)?;
    Ok(JsValue::Object(id))
}

/// Array.prototype.splice(start, deleteCount, ...items): returns the removed
/// elements
pub fn array_splice(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = interp.to_object(&this)?;
    let mut elements = read_elements(interp, id)?;
    let length = elements.len();
    let start = relative_index(integer_arg(interp, args, 0, 0.0)?, length);
    let delete_count = match args.get(1) {
        // splice(start) removes everything from start
        None => length - start,
        Some(_) => integer_arg(interp, args, 1, 0.0)?.clamp(0.0, (length - start) as f64) as usize,
    };
    let items = args.iter().skip(2).cloned().map(Some);
    let removed: Vec<JsValue> = elements
        .splice(start..start + delete_count, items)
        .map(Option::unwrap_or_default)
        .collect();
    write_elements(interp, id, elements)?;
    Ok(JsValue::Object(interp.create_array_from(removed)?))
}

/// Array.prototype.sort() without a comparator: by string value, with
/// undefined and then holes at the end. Stable.
pub fn array_sort(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = interp.to_object(&this)?;
    let elements = read_elements(interp, id)?;
    let length = elements.len();
    let mut keyed = Vec::with_capacity(length);
    let mut undefined_count = 0;
    for value in elements.into_iter().flatten() {
        match value {
            JsValue::Undefined => undefined_count += 1,
            other => {
                let key = interp.to_string(&other)?;
                keyed.push((key, other));
            }
        }
    }
    keyed.sort_by(|(a, _), (b, _)| compare_utf16(a.as_str(), b.as_str()));
    let mut sorted: Vec<Option<JsValue>> = keyed.into_iter().map(|(_, v)| Some(v)).collect();
    sorted.extend(std::iter::repeat_n(Some(JsValue::Undefined), undefined_count));
    sorted.resize(length, None);
    write_elements(interp, id, sorted)?;
    Ok(JsValue::Object(id))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Accessors
// ═══════════════════════════════════════════════════════════════════════════════

/// Array.prototype.slice(begin, end)
pub fn array_slice(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = interp.to_object(&this)?;
    let elements = read_elements(interp, id)?;
    let length = elements.len();
    let begin = relative_index(integer_arg(interp, args, 0, 0.0)?, length);
    let end = relative_index(integer_arg(interp, args, 1, length as f64)?, length);
    let result = interp.create_array()?;
    let picked: Vec<Option<JsValue>> = elements
        .into_iter()
        .skip(begin)
        .take(end.saturating_sub(begin))
        .collect();
    write_elements(interp, result, picked)?;
    Ok(JsValue::Object(result))
}

/// Array.prototype.join(separator)
pub fn array_join(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = interp.to_object(&this)?;
    let separator = match arg(args, 0) {
        JsValue::Undefined => ",".to_string(),
        other => interp.to_string(&other)?.to_string(),
    };
    let mut seen = vec![id];
    Ok(JsValue::from(interp.join_array(id, &separator, &mut seen)?))
}

pub fn array_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    match &this {
        JsValue::Object(id) if interp.object(*id)?.is_array() => array_join(interp, this, &[]),
        _ => super::object::object_to_string(interp, this, &[]),
    }
}

/// Array.prototype.concat(...values): arrays are spread one level
pub fn array_concat(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut elements = Vec::new();
    for value in std::iter::once(&this).chain(args) {
        match value {
            JsValue::Object(id) if interp.object(*id)?.is_array() => {
                elements.extend(read_elements(interp, *id)?);
            }
            other => elements.push(Some(other.clone())),
        }
    }
    let result = interp.create_array()?;
    write_elements(interp, result, elements)?;
    Ok(JsValue::Object(result))
}

/// Array.prototype.indexOf(search, fromIndex)
pub fn array_index_of(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = interp.to_object(&this)?;
    let elements = read_elements(interp, id)?;
    let search = arg(args, 0);
    let start = relative_index(integer_arg(interp, args, 1, 0.0)?, elements.len());
    let found = elements
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, element)| element.as_ref().is_some_and(|v| v.strict_equals(&search)))
        .map(|(index, _)| index as f64);
    Ok(JsValue::Number(found.unwrap_or(-1.0)))
}

/// Array.prototype.lastIndexOf(search, fromIndex)
pub fn array_last_index_of(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let id = interp.to_object(&this)?;
    let elements = read_elements(interp, id)?;
    let length = elements.len() as f64;
    let search = arg(args, 0);
    let from = integer_arg(interp, args, 1, length - 1.0)?;
    let from = if from < 0.0 { length + from } else { from.min(length - 1.0) };
    if from < 0.0 {
        return Ok(JsValue::Number(-1.0));
    }
    let found = elements
        .iter()
        .enumerate()
        .take(from as usize + 1)
        .rev()
        .find(|(_, element)| element.as_ref().is_some_and(|v| v.strict_equals(&search)))
        .map(|(index, _)| index as f64);
    Ok(JsValue::Number(found.unwrap_or(-1.0)))
}
