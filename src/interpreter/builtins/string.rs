//! String constructor and String.prototype methods
//!
//! Guest strings are indexed by UTF-16 code unit, so most methods work on a
//! `Vec<u16>` view of the receiver.

use crate::error::JsError;
use crate::interpreter::{Interpreter, PropertyAttrs};
use crate::value::{JsString, JsValue, ObjectData, is_js_whitespace, to_integer, to_uint32};

use super::regexp::{self, RegExpMatch};
use super::{arg, create_constructor, integer_arg, relative_index};

/// Initialize the String constructor and String.prototype
pub fn init_string(interp: &mut Interpreter) -> Result<(), JsError> {
    let object = interp.intrinsics.object;
    let (constructor, proto) =
        create_constructor(interp, "String", 1, string_constructor, object)?;
    interp.intrinsics.string = constructor;

    interp.register_method(constructor, "fromCharCode", string_from_char_code, 1)?;

    // Character access
    interp.register_method(proto, "charAt", string_char_at, 1)?;
    interp.register_method(proto, "charCodeAt", string_char_code_at, 1)?;

    // Search
    interp.register_method(proto, "indexOf", string_index_of, 1)?;
    interp.register_method(proto, "lastIndexOf", string_last_index_of, 1)?;
    interp.register_method(proto, "match", string_match, 1)?;
    interp.register_method(proto, "search", string_search, 1)?;

    // Extraction
    interp.register_method(proto, "slice", string_slice, 2)?;
    interp.register_method(proto, "substring", string_substring, 2)?;
    interp.register_method(proto, "substr", string_substr, 2)?;

    // Case conversion
    interp.register_method(proto, "toLowerCase", string_to_lower_case, 0)?;
    interp.register_method(proto, "toUpperCase", string_to_upper_case, 0)?;
    interp.register_method(proto, "toLocaleLowerCase", string_to_lower_case, 0)?;
    interp.register_method(proto, "toLocaleUpperCase", string_to_upper_case, 0)?;

    // Whitespace
    interp.register_method(proto, "trim", string_trim, 0)?;
    interp.register_method(proto, "trimLeft", string_trim_left, 0)?;
    interp.register_method(proto, "trimRight", string_trim_right, 0)?;

    // Transformation
    interp.register_method(proto, "split", string_split, 2)?;
    interp.register_method(proto, "replace", string_replace, 2)?;
    interp.register_method(proto, "concat", string_concat, 1)?;

    interp.register_method(proto, "localeCompare", string_locale_compare, 1)?;
    interp.register_method(proto, "toString", string_to_string, 0)?;
    interp.register_method(proto, "valueOf", string_to_string, 0)?;
    Ok(())
}

/// `String(value)` converts; `new String(value)` boxes.
pub fn string_constructor(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = match args.first() {
        Some(value) => interp.to_string(value)?,
        None => JsString::from(""),
    };
    if let (JsValue::Object(id), true) = (&this, interp.is_constructing()) {
        interp.object_mut(*id)?.data = ObjectData::Primitive(JsValue::String(s));
        return Ok(this);
    }
    Ok(JsValue::String(s))
}

/// String.fromCharCode(...codes)
pub fn string_from_char_code(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut units = Vec::with_capacity(args.len());
    for value in args {
        units.push(to_uint32(interp.to_number(value)?) as u16);
    }
    Ok(from_units(&units))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Receivers and UTF-16 helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// The string a prototype method operates on
fn this_string(interp: &Interpreter, this: &JsValue, method: &str) -> Result<JsString, JsError> {
    match this {
        JsValue::String(s) => Ok(s.clone()),
        JsValue::Undefined | JsValue::Null => Err(JsError::type_error(format!(
            "String.prototype.{} called on null or undefined",
            method
        ))),
        other => interp.to_string(other),
    }
}

fn units_of(s: &JsString) -> Vec<u16> {
    s.as_str().encode_utf16().collect()
}

fn from_units(units: &[u16]) -> JsValue {
    JsValue::from(String::from_utf16_lossy(units))
}

/// `units[start..end]` with the bounds clamped
fn unit_range(units: &[u16], start: usize, end: usize) -> &[u16] {
    let end = end.min(units.len());
    units.get(start.min(end)..end).unwrap_or_default()
}

/// First index `>= from` where `needle` occurs
fn find_units(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len())
        .find(|&i| haystack.get(i..i + needle.len()) == Some(needle))
}

/// Last index `<= from` where `needle` occurs
fn rfind_units(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    let last = from.min(haystack.len() - needle.len());
    (0..=last)
        .rev()
        .find(|&i| haystack.get(i..i + needle.len()) == Some(needle))
}

/// Clamp an integer position into `0..=len`
fn clamp_position(n: f64, len: usize) -> usize {
    n.max(0.0).min(len as f64) as usize
}

// ═══════════════════════════════════════════════════════════════════════════════
// Character access
// ═══════════════════════════════════════════════════════════════════════════════

/// String.prototype.charAt(pos)
pub fn string_char_at(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "charAt")?;
    let pos = integer_arg(interp, args, 0, 0.0)?;
    if pos < 0.0 {
        return Ok(JsValue::from(""));
    }
    Ok(crate::interpreter::string_unit_at(&s, pos as usize)
        .map(JsValue::String)
        .unwrap_or_else(|| JsValue::from("")))
}

/// String.prototype.charCodeAt(pos): NaN when out of range
pub fn string_char_code_at(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "charCodeAt")?;
    let pos = integer_arg(interp, args, 0, 0.0)?;
    if pos < 0.0 {
        return Ok(JsValue::Number(f64::NAN));
    }
    let unit = s.as_str().encode_utf16().nth(pos as usize);
    Ok(JsValue::Number(unit.map(f64::from).unwrap_or(f64::NAN)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Search
// ═══════════════════════════════════════════════════════════════════════════════

/// String.prototype.indexOf(search, position)
pub fn string_index_of(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units_of(&this_string(interp, &this, "indexOf")?);
    let search = units_of(&interp.to_string(&arg(args, 0))?);
    let from = clamp_position(integer_arg(interp, args, 1, 0.0)?, s.len());
    Ok(JsValue::Number(
        find_units(&s, &search, from).map(|i| i as f64).unwrap_or(-1.0),
    ))
}

/// String.prototype.lastIndexOf(search, position)
pub fn string_last_index_of(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units_of(&this_string(interp, &this, "lastIndexOf")?);
    let search = units_of(&interp.to_string(&arg(args, 0))?);
    let position = match args.get(1) {
        None | Some(JsValue::Undefined) => f64::INFINITY,
        Some(value) => {
            let n = interp.to_number(value)?;
            if n.is_nan() { f64::INFINITY } else { to_integer(n) }
        }
    };
    let from = clamp_position(position, s.len());
    Ok(JsValue::Number(
        rfind_units(&s, &search, from).map(|i| i as f64).unwrap_or(-1.0),
    ))
}

/// The regexp argument of match/search, compiling a string when needed
fn regexp_arg(interp: &mut Interpreter, value: &JsValue) -> Result<JsValue, JsError> {
    if regexp::regexp_data(interp, value)?.is_some() {
        return Ok(value.clone());
    }
    let pattern = match value {
        JsValue::Undefined => String::new(),
        other => interp.to_string(other)?.to_string(),
    };
    Ok(JsValue::Object(regexp::create_regexp(interp, &pattern, "")?))
}

/// String.prototype.match(regexp)
pub fn string_match(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "match")?;
    let re = regexp_arg(interp, &arg(args, 0))?;
    let Some(data) = regexp::regexp_data(interp, &re)? else {
        return Ok(JsValue::Null);
    };
    if !data.global {
        return match regexp::find_match(&data, s.as_str(), 0)? {
            Some(found) => regexp::match_to_array(interp, &found, &s),
            None => Ok(JsValue::Null),
        };
    }
    interp.set_property(&re, "lastIndex", JsValue::Number(0.0), PropertyAttrs::NONE)?;
    let matches = regexp::find_all(&data, s.as_str())?;
    if matches.is_empty() {
        return Ok(JsValue::Null);
    }
    let values = matches
        .iter()
        .map(|m| match m.groups.first() {
            Some(Some(text)) => JsValue::from(text.as_str()),
            _ => JsValue::from(""),
        })
        .collect();
    Ok(JsValue::Object(interp.create_array_from(values)?))
}

/// String.prototype.search(regexp): index of the first match or -1
pub fn string_search(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "search")?;
    let re = regexp_arg(interp, &arg(args, 0))?;
    let Some(data) = regexp::regexp_data(interp, &re)? else {
        return Ok(JsValue::Number(-1.0));
    };
    Ok(JsValue::Number(
        regexp::find_match(&data, s.as_str(), 0)?
            .map(|m| m.start as f64)
            .unwrap_or(-1.0),
    ))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Extraction
// ═══════════════════════════════════════════════════════════════════════════════

/// String.prototype.slice(start, end): negative positions count from the end
pub fn string_slice(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units_of(&this_string(interp, &this, "slice")?);
    let len = s.len();
    let start = relative_index(integer_arg(interp, args, 0, 0.0)?, len);
    let end = relative_index(integer_arg(interp, args, 1, len as f64)?, len);
    Ok(from_units(unit_range(&s, start, end)))
}

/// String.prototype.substring(start, end): clamps, and swaps when reversed
pub fn string_substring(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units_of(&this_string(interp, &this, "substring")?);
    let len = s.len();
    let a = clamp_position(integer_arg(interp, args, 0, 0.0)?, len);
    let b = clamp_position(integer_arg(interp, args, 1, len as f64)?, len);
    Ok(from_units(unit_range(&s, a.min(b), a.max(b))))
}

/// String.prototype.substr(start, length)
pub fn string_substr(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units_of(&this_string(interp, &this, "substr")?);
    let len = s.len();
    let start = relative_index(integer_arg(interp, args, 0, 0.0)?, len);
    let count = integer_arg(interp, args, 1, f64::INFINITY)?;
    let count = count.max(0.0).min((len - start) as f64) as usize;
    Ok(from_units(unit_range(&s, start, start + count)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Case and whitespace
// ═══════════════════════════════════════════════════════════════════════════════

pub fn string_to_lower_case(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "toLowerCase")?;
    Ok(JsValue::from(s.as_str().to_lowercase()))
}

pub fn string_to_upper_case(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "toUpperCase")?;
    Ok(JsValue::from(s.as_str().to_uppercase()))
}

pub fn string_trim(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "trim")?;
    Ok(JsValue::from(s.as_str().trim_matches(is_js_whitespace)))
}

pub fn string_trim_left(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "trimLeft")?;
    Ok(JsValue::from(s.as_str().trim_start_matches(is_js_whitespace)))
}

pub fn string_trim_right(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "trimRight")?;
    Ok(JsValue::from(s.as_str().trim_end_matches(is_js_whitespace)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Transformation
// ═══════════════════════════════════════════════════════════════════════════════

/// String.prototype.split(separator, limit)
pub fn string_split(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "split")?;
    let separator = arg(args, 0);
    let limit = match args.get(1) {
        None | Some(JsValue::Undefined) => u32::MAX as usize,
        Some(value) => to_uint32(interp.to_number(value)?) as usize,
    };

    let mut parts: Vec<JsValue> = Vec::new();
    if limit > 0 {
        if let Some(data) = regexp::regexp_data(interp, &separator)? {
            split_regexp(&data, &s, limit, &mut parts)?;
        } else if separator == JsValue::Undefined {
            parts.push(JsValue::String(s));
        } else {
            let separator = units_of(&interp.to_string(&separator)?);
            split_string(&units_of(&s), &separator, limit, &mut parts);
        }
    }
    Ok(JsValue::Object(interp.create_array_from(parts)?))
}

fn split_string(s: &[u16], separator: &[u16], limit: usize, parts: &mut Vec<JsValue>) {
    if separator.is_empty() {
        parts.extend(s.iter().take(limit).map(|unit| from_units(&[*unit])));
        return;
    }
    let mut start = 0;
    while let Some(found) = find_units(s, separator, start) {
        parts.push(from_units(unit_range(s, start, found)));
        if parts.len() >= limit {
            return;
        }
        start = found + separator.len();
    }
    parts.push(from_units(unit_range(s, start, s.len())));
}

/// Split on a regexp; captures are spliced into the output and empty
/// matches never split at the previous split point.
fn split_regexp(
    data: &crate::value::RegExpData,
    s: &JsString,
    limit: usize,
    parts: &mut Vec<JsValue>,
) -> Result<(), JsError> {
    let units = units_of(s);
    let size = units.len();
    if size == 0 {
        if regexp::find_match(data, s.as_str(), 0)?.is_none() {
            parts.push(JsValue::String(s.clone()));
        }
        return Ok(());
    }
    let mut p = 0;
    let mut q = 0;
    while q < size {
        let Some(found) = regexp::find_match(data, s.as_str(), q)? else {
            break;
        };
        if found.start >= size {
            break;
        }
        // An empty match at the last split point does not split
        if found.end == p {
            q = found.start + 1;
            continue;
        }
        parts.push(from_units(unit_range(&units, p, found.start)));
        if parts.len() >= limit {
            return Ok(());
        }
        for group in found.groups.iter().skip(1) {
            parts.push(group.as_deref().map(JsValue::from).unwrap_or_default());
            if parts.len() >= limit {
                return Ok(());
            }
        }
        p = found.end;
        q = if found.end == found.start { p + 1 } else { p };
    }
    parts.push(from_units(unit_range(&units, p, size)));
    Ok(())
}

/// String.prototype.replace(pattern, replacement)
///
/// Handles string replacements with `$` patterns. Function replacements are
/// layered on top by the polyfills, which call back into this method.
pub fn string_replace(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = this_string(interp, &this, "replace")?;
    let pattern = arg(args, 0);
    let replacement = interp.to_string(&arg(args, 1))?;
    let units = units_of(&s);

    let matches: Vec<RegExpMatch> = match regexp::regexp_data(interp, &pattern)? {
        Some(data) if data.global => {
            interp.set_property(&pattern, "lastIndex", JsValue::Number(0.0), PropertyAttrs::NONE)?;
            regexp::find_all(&data, s.as_str())?
        }
        Some(data) => regexp::find_match(&data, s.as_str(), 0)?.into_iter().collect(),
        None => {
            let search = interp.to_string(&pattern)?;
            let needle = units_of(&search);
            find_units(&units, &needle, 0)
                .map(|start| RegExpMatch {
                    start,
                    end: start + needle.len(),
                    groups: vec![Some(search.to_string())],
                })
                .into_iter()
                .collect()
        }
    };
    if matches.is_empty() {
        return Ok(JsValue::String(s));
    }

    let mut out: Vec<u16> = Vec::with_capacity(units.len());
    let mut last = 0;
    for found in &matches {
        out.extend_from_slice(unit_range(&units, last, found.start));
        let before = String::from_utf16_lossy(unit_range(&units, 0, found.start));
        let after = String::from_utf16_lossy(unit_range(&units, found.end, units.len()));
        let expanded = expand_replacement(replacement.as_str(), &found.groups, &before, &after);
        out.extend(expanded.encode_utf16());
        last = found.end;
    }
    out.extend_from_slice(unit_range(&units, last, units.len()));
    Ok(from_units(&out))
}

/// Expand `$$`, `$&`, `` $` ``, `$'` and `$1`..`$99` in a replacement string.
///
/// A `$n` naming a group that does not exist is kept literally.
fn expand_replacement(
    replacement: &str,
    groups: &[Option<String>],
    before: &str,
    after: &str,
) -> String {
    let group_count = groups.len().saturating_sub(1);
    let group_text = |n: usize| -> &str {
        groups
            .get(n)
            .and_then(|g| g.as_deref())
            .unwrap_or("")
    };
    let mut result = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('$') => {
                chars.next();
                result.push('$');
            }
            Some('&') => {
                chars.next();
                result.push_str(group_text(0));
            }
            Some('`') => {
                chars.next();
                result.push_str(before);
            }
            Some('\'') => {
                chars.next();
                result.push_str(after);
            }
            Some(d) if d.is_ascii_digit() => {
                let first = d.to_digit(10).unwrap_or(0) as usize;
                let second = chars.clone().nth(1).and_then(|c| c.to_digit(10));
                let two = second.map(|s| first * 10 + s as usize);
                match two {
                    Some(n) if n >= 1 && n <= group_count => {
                        chars.next();
                        chars.next();
                        result.push_str(group_text(n));
                    }
                    _ if first >= 1 && first <= group_count => {
                        chars.next();
                        result.push_str(group_text(first));
                    }
                    _ => result.push('$'),
                }
            }
            _ => result.push('$'),
        }
    }
    result
}

/// String.prototype.concat(...strings)
pub fn string_concat(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut s = this_string(interp, &this, "concat")?.to_string();
    for value in args {
        s.push_str(interp.to_string(value)?.as_str());
    }
    Ok(JsValue::from(s))
}

/// String.prototype.localeCompare(other): code unit order
pub fn string_locale_compare(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let s = units_of(&this_string(interp, &this, "localeCompare")?);
    let other = units_of(&interp.to_string(&arg(args, 0))?);
    Ok(JsValue::Number(match s.cmp(&other) {
        std::cmp::Ordering::Less => -1.0,
        std::cmp::Ordering::Equal => 0.0,
        std::cmp::Ordering::Greater => 1.0,
    }))
}

/// String.prototype.toString / valueOf: only strings and String objects
pub fn string_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    match &this {
        JsValue::String(_) => Ok(this),
        JsValue::Object(id) => match &interp.object(*id)?.data {
            ObjectData::Primitive(inner @ JsValue::String(_)) => Ok(inner.clone()),
            _ => Err(JsError::type_error(
                "String.prototype.toString requires that 'this' be a String",
            )),
        },
        _ => Err(JsError::type_error(
            "String.prototype.toString requires that 'this' be a String",
        )),
    }
}
