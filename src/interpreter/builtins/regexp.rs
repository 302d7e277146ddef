//! RegExp constructor, RegExp.prototype methods and the matching helpers
//! shared with String.prototype
//!
//! Guest indices count UTF-16 code units; the regex engine works on byte
//! offsets into UTF-8. The helpers here convert at the boundary.

use std::rc::Rc;

use crate::error::JsError;
use crate::interpreter::{Interpreter, PropertyAttrs};
use crate::value::{JsString, JsValue, ObjectData, ObjectId, RegExpData};

use super::{arg, create_constructor};

/// Initialize the RegExp constructor and RegExp.prototype
pub fn init_regexp(interp: &mut Interpreter) -> Result<(), JsError> {
    let object = interp.intrinsics.object;
    let (constructor, proto) =
        create_constructor(interp, "RegExp", 2, regexp_constructor, object)?;
    interp.intrinsics.regexp = constructor;

    interp.register_method(proto, "exec", regexp_exec, 1)?;
    interp.register_method(proto, "test", regexp_test, 1)?;
    interp.register_method(proto, "toString", regexp_to_string, 0)?;
    Ok(())
}

/// One match, in UTF-16 units
#[derive(Debug, Clone)]
pub(crate) struct RegExpMatch {
    pub start: usize,
    pub end: usize,
    /// Group 0 is the whole match; unmatched groups are `None`
    pub groups: Vec<Option<String>>,
}

/// Create a RegExp object from a pattern and flags.
pub fn create_regexp(
    interp: &mut Interpreter,
    pattern: &str,
    flags: &str,
) -> Result<ObjectId, JsError> {
    let data = compile(pattern, flags)?;
    let constructor = interp.intrinsics.regexp;
    let id = interp.create_object(Some(constructor))?;
    let source = if pattern.is_empty() { "(?:)" } else { pattern };
    interp.define(id, "source", JsValue::from(source), PropertyAttrs::FROZEN_HIDDEN)?;
    interp.define(id, "global", JsValue::Boolean(data.global), PropertyAttrs::FROZEN_HIDDEN)?;
    interp.define(
        id,
        "ignoreCase",
        JsValue::Boolean(data.ignore_case),
        PropertyAttrs::FROZEN_HIDDEN,
    )?;
    interp.define(
        id,
        "multiline",
        JsValue::Boolean(data.multiline),
        PropertyAttrs::FROZEN_HIDDEN,
    )?;
    interp.define(id, "lastIndex", JsValue::Number(0.0), PropertyAttrs::HIDDEN)?;
    interp.object_mut(id)?.data = ObjectData::RegExp(Rc::new(data));
    Ok(id)
}

fn parse_flags(pattern: &str, flags: &str) -> Result<(bool, bool, bool), JsError> {
    let (mut global, mut ignore_case, mut multiline) = (false, false, false);
    for flag in flags.chars() {
        let seen = match flag {
            'g' => std::mem::replace(&mut global, true),
            'i' => std::mem::replace(&mut ignore_case, true),
            'm' => std::mem::replace(&mut multiline, true),
            _ => true,
        };
        if seen {
            return Err(JsError::syntax_error(
                format!(
                    "Invalid flags supplied to RegExp constructor '{}' for /{}/",
                    flags, pattern
                ),
                0,
                0,
            ));
        }
    }
    Ok((global, ignore_case, multiline))
}

#[cfg(feature = "regex")]
fn compile(pattern: &str, flags: &str) -> Result<RegExpData, JsError> {
    let (global, ignore_case, multiline) = parse_flags(pattern, flags)?;
    let mut translated = String::new();
    if ignore_case || multiline {
        translated.push_str("(?");
        if ignore_case {
            translated.push('i');
        }
        if multiline {
            translated.push('m');
        }
        translated.push(')');
    }
    translated.push_str(&js_regex_to_rust(pattern));
    let regex = fancy_regex::Regex::new(&translated).map_err(|e| {
        JsError::syntax_error(
            format!("Invalid regular expression: /{}/: {}", pattern, e),
            0,
            0,
        )
    })?;
    Ok(RegExpData {
        source: pattern.to_string(),
        global,
        ignore_case,
        multiline,
        regex,
    })
}

#[cfg(not(feature = "regex"))]
fn compile(pattern: &str, flags: &str) -> Result<RegExpData, JsError> {
    parse_flags(pattern, flags)?;
    Err(JsError::syntax_error(
        format!("Invalid regular expression: /{}/: RegExp support is disabled", pattern),
        0,
        0,
    ))
}

/// Rewrite JavaScript-only syntax into the dialect fancy-regex accepts.
///
/// - `[` inside a character class is literal in JS and must be escaped
/// - `[^]` matches anything, `[]` matches nothing
/// - `\uXXXX` becomes `\x{XXXX}`, `\/` becomes `/`
#[cfg(feature = "regex")]
fn js_regex_to_rust(pattern: &str) -> String {
    let mut result = String::with_capacity(pattern.len() + 16);
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;
    let mut class_start = false;

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('/') => result.push('/'),
                Some('u') => {
                    let hex: String = chars.clone().take(4).collect();
                    if hex.len() == 4 && hex.chars().all(|h| h.is_ascii_hexdigit()) {
                        result.push_str(&format!("\\x{{{}}}", hex));
                        for _ in 0..4 {
                            chars.next();
                        }
                    } else {
                        result.push('u');
                    }
                }
                Some(next) => {
                    result.push('\\');
                    result.push(next);
                }
                None => result.push_str("\\\\"),
            }
            class_start = false;
            continue;
        }
        if !in_class {
            if c == '[' {
                match (chars.peek().copied(), chars.clone().nth(1)) {
                    (Some(']'), _) => {
                        chars.next();
                        result.push_str("(?!)");
                        continue;
                    }
                    (Some('^'), Some(']')) => {
                        chars.next();
                        chars.next();
                        result.push_str("[\\s\\S]");
                        continue;
                    }
                    _ => {}
                }
                in_class = true;
                class_start = true;
            }
            result.push(c);
            continue;
        }
        match c {
            '^' if class_start => result.push(c),
            ']' if class_start => {
                result.push_str("\\]");
                class_start = false;
            }
            ']' => {
                in_class = false;
                result.push(c);
            }
            '[' => {
                result.push_str("\\[");
                class_start = false;
            }
            _ => {
                result.push(c);
                class_start = false;
            }
        }
    }
    result
}

// ═══════════════════════════════════════════════════════════════════════════════
// Matching
// ═══════════════════════════════════════════════════════════════════════════════

/// Byte offset of UTF-16 index `index` in `text`, clamped to the end
pub(crate) fn utf16_to_byte(text: &str, index: usize) -> usize {
    let mut units = 0;
    for (byte, c) in text.char_indices() {
        if units >= index {
            return byte;
        }
        units += c.len_utf16();
    }
    text.len()
}

/// UTF-16 index of byte offset `byte` in `text`
pub(crate) fn byte_to_utf16(text: &str, byte: usize) -> usize {
    text.get(..byte)
        .map(|prefix| prefix.encode_utf16().count())
        .unwrap_or_else(|| text.encode_utf16().count())
}

/// First match at or after UTF-16 index `from`
#[cfg(feature = "regex")]
pub(crate) fn find_match(
    data: &RegExpData,
    text: &str,
    from: usize,
) -> Result<Option<RegExpMatch>, JsError> {
    let start = utf16_to_byte(text, from);
    if start > text.len() {
        return Ok(None);
    }
    let captures = data
        .regex
        .captures_from_pos(text, start)
        .map_err(|e| JsError::range_error(format!("Regular expression failed: {}", e)))?;
    let Some(captures) = captures else {
        return Ok(None);
    };
    let Some(whole) = captures.get(0) else {
        return Ok(None);
    };
    let groups = captures
        .iter()
        .map(|group| group.map(|m| m.as_str().to_string()))
        .collect();
    Ok(Some(RegExpMatch {
        start: byte_to_utf16(text, whole.start()),
        end: byte_to_utf16(text, whole.end()),
        groups,
    }))
}

#[cfg(not(feature = "regex"))]
pub(crate) fn find_match(
    _data: &RegExpData,
    _text: &str,
    _from: usize,
) -> Result<Option<RegExpMatch>, JsError> {
    Err(JsError::syntax_error("RegExp support is disabled", 0, 0))
}

/// Every match, advancing past empty matches
pub(crate) fn find_all(data: &RegExpData, text: &str) -> Result<Vec<RegExpMatch>, JsError> {
    let length = text.encode_utf16().count();
    let mut matches = Vec::new();
    let mut from = 0;
    while from <= length {
        let Some(found) = find_match(data, text, from)? else {
            break;
        };
        from = if found.end == found.start {
            found.end + 1
        } else {
            found.end
        };
        matches.push(found);
    }
    Ok(matches)
}

/// The compiled regexp behind a value, if it is a RegExp object
pub(crate) fn regexp_data(
    interp: &Interpreter,
    value: &JsValue,
) -> Result<Option<Rc<RegExpData>>, JsError> {
    let JsValue::Object(id) = value else {
        return Ok(None);
    };
    Ok(match &interp.object(*id)?.data {
        ObjectData::RegExp(data) => Some(Rc::clone(data)),
        _ => None,
    })
}

fn require_regexp(
    interp: &Interpreter,
    value: &JsValue,
    method: &str,
) -> Result<Rc<RegExpData>, JsError> {
    regexp_data(interp, value)?.ok_or_else(|| {
        JsError::type_error(format!(
            "RegExp.prototype.{} called on incompatible receiver",
            method
        ))
    })
}

/// The array `exec` returns: groups, plus `index` and `input`
pub(crate) fn match_to_array(
    interp: &mut Interpreter,
    found: &RegExpMatch,
    input: &JsString,
) -> Result<JsValue, JsError> {
    let groups = found
        .groups
        .iter()
        .map(|group| group.as_deref().map(JsValue::from).unwrap_or_default())
        .collect();
    let array = interp.create_array_from(groups)?;
    interp.define(array, "index", JsValue::from(found.start as u32), PropertyAttrs::NONE)?;
    interp.define(array, "input", JsValue::String(input.clone()), PropertyAttrs::NONE)?;
    Ok(JsValue::Object(array))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constructor and prototype
// ═══════════════════════════════════════════════════════════════════════════════

/// `RegExp(pattern, flags)`
pub fn regexp_constructor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let pattern = arg(args, 0);
    let flags = arg(args, 1);
    if let Some(existing) = regexp_data(interp, &pattern)? {
        // RegExp(re) without new hands back the same object
        if !interp.is_constructing() && flags == JsValue::Undefined {
            return Ok(pattern);
        }
        let flags = match flags {
            JsValue::Undefined => existing.flags(),
            other => interp.to_string(&other)?.to_string(),
        };
        return Ok(JsValue::Object(create_regexp(interp, &existing.source, &flags)?));
    }
    let pattern = match pattern {
        JsValue::Undefined => String::new(),
        other => interp.to_string(&other)?.to_string(),
    };
    let flags = match flags {
        JsValue::Undefined => String::new(),
        other => interp.to_string(&other)?.to_string(),
    };
    Ok(JsValue::Object(create_regexp(interp, &pattern, &flags)?))
}

/// Run the regexp against `input`, honouring and updating `lastIndex` for
/// global regexps.
pub(crate) fn exec(
    interp: &mut Interpreter,
    regexp: &JsValue,
    data: &RegExpData,
    input: &JsString,
) -> Result<Option<RegExpMatch>, JsError> {
    let from = if data.global {
        let last_index = interp.get_property(regexp, "lastIndex")?;
        let last_index = crate::value::to_integer(interp.to_number(&last_index)?);
        if last_index < 0.0 || last_index > input.utf16_len() as f64 {
            interp.set_property(regexp, "lastIndex", JsValue::Number(0.0), PropertyAttrs::NONE)?;
            return Ok(None);
        }
        last_index as usize
    } else {
        0
    };
    let found = find_match(data, input.as_str(), from)?;
    if data.global {
        let next = found.as_ref().map(|m| m.end as f64).unwrap_or(0.0);
        interp.set_property(regexp, "lastIndex", JsValue::Number(next), PropertyAttrs::NONE)?;
    }
    Ok(found)
}

/// RegExp.prototype.exec(string)
pub fn regexp_exec(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let data = require_regexp(interp, &this, "exec")?;
    let input = interp.to_string(&arg(args, 0))?;
    match exec(interp, &this, &data, &input)? {
        Some(found) => match_to_array(interp, &found, &input),
        None => Ok(JsValue::Null),
    }
}

/// RegExp.prototype.test(string)
pub fn regexp_test(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let data = require_regexp(interp, &this, "test")?;
    let input = interp.to_string(&arg(args, 0))?;
    Ok(JsValue::Boolean(exec(interp, &this, &data, &input)?.is_some()))
}

/// RegExp.prototype.toString(): `/source/flags`
pub fn regexp_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let data = require_regexp(interp, &this, "toString")?;
    Ok(JsValue::from(format!("/{}/{}", data.source, data.flags())))
}
