//! Global values and functions: NaN, Infinity, isNaN, URI coding, escape

use crate::error::JsError;
use crate::interpreter::{Interpreter, PropertyAttrs};
use crate::value::JsValue;

use super::arg;

/// Characters encodeURIComponent leaves alone
const URI_UNRESERVED: &str = "-_.!~*'()";
/// Characters encodeURI also leaves alone, and decodeURI keeps encoded
const URI_RESERVED: &str = ";/?:@&=+$,#";
/// Characters escape() leaves alone besides ASCII alphanumerics
const ESCAPE_SAFE: &str = "@*_+-./";

/// Initialize the global values and functions not owned by a constructor
pub fn init_global(interp: &mut Interpreter) -> Result<(), JsError> {
    let global = interp.global_scope();
    interp.define(global, "Infinity", JsValue::Number(f64::INFINITY), PropertyAttrs::FROZEN_HIDDEN)?;
    interp.define(global, "NaN", JsValue::Number(f64::NAN), PropertyAttrs::FROZEN_HIDDEN)?;
    interp.define(global, "undefined", JsValue::Undefined, PropertyAttrs::FROZEN_HIDDEN)?;
    interp.define(global, "window", JsValue::Object(global), PropertyAttrs::FROZEN_HIDDEN)?;
    interp.define(global, "self", JsValue::Object(global), PropertyAttrs::HIDDEN)?;

    interp.register_method(global, "isNaN", global_is_nan, 1)?;
    interp.register_method(global, "isFinite", global_is_finite, 1)?;
    interp.register_method(global, "escape", global_escape, 1)?;
    interp.register_method(global, "unescape", global_unescape, 1)?;
    interp.register_method(global, "encodeURI", global_encode_uri, 1)?;
    interp.register_method(global, "decodeURI", global_decode_uri, 1)?;
    interp.register_method(global, "encodeURIComponent", global_encode_uri_component, 1)?;
    interp.register_method(global, "decodeURIComponent", global_decode_uri_component, 1)?;
    Ok(())
}

pub fn global_is_nan(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(interp.to_number(&arg(args, 0))?.is_nan()))
}

pub fn global_is_finite(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Boolean(interp.to_number(&arg(args, 0))?.is_finite()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// URI coding
// ═══════════════════════════════════════════════════════════════════════════════

fn encode(text: &str, keep: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || keep.contains(c) {
            result.push(c);
        } else {
            for byte in c.encode_utf8(&mut buf).bytes() {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}

fn hex_byte(bytes: &[u8], at: usize) -> Option<u8> {
    let hi = char::from(*bytes.get(at)?).to_digit(16)?;
    let lo = char::from(*bytes.get(at + 1)?).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

/// Decode `%XX` sequences as UTF-8. Single-byte characters in `keep` stay
/// encoded. `None` when the input is malformed.
fn decode(text: &str, keep: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while let Some(&b) = bytes.get(i) {
        if b != b'%' {
            out.push(b);
            i += 1;
            continue;
        }
        let lead = hex_byte(bytes, i + 1)?;
        let width = match lead {
            0x00..=0x7F => 1,
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return None,
        };
        if width == 1 {
            if keep.contains(char::from(lead)) {
                out.extend_from_slice(bytes.get(i..i + 3)?);
            } else {
                out.push(lead);
            }
            i += 3;
            continue;
        }
        let mut sequence = vec![lead];
        for k in 1..width {
            let at = i + 3 * k;
            if bytes.get(at) != Some(&b'%') {
                return None;
            }
            sequence.push(hex_byte(bytes, at + 1)?);
        }
        std::str::from_utf8(&sequence).ok()?;
        out.extend_from_slice(&sequence);
        i += 3 * width;
    }
    String::from_utf8(out).ok()
}

fn uri_argument(interp: &Interpreter, args: &[JsValue]) -> Result<String, JsError> {
    Ok(interp.to_string(&arg(args, 0))?.to_string())
}

fn decoded(interp: &mut Interpreter, text: &str, keep: &str) -> Result<JsValue, JsError> {
    match decode(text, keep) {
        Some(s) => Ok(JsValue::from(s)),
        None => Err(interp.throw_error("URIError", "URI malformed")),
    }
}

pub fn global_encode_uri(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let text = uri_argument(interp, args)?;
    let keep = format!("{}{}", URI_UNRESERVED, URI_RESERVED);
    Ok(JsValue::from(encode(&text, &keep)))
}

pub fn global_encode_uri_component(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let text = uri_argument(interp, args)?;
    Ok(JsValue::from(encode(&text, URI_UNRESERVED)))
}

pub fn global_decode_uri(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let text = uri_argument(interp, args)?;
    decoded(interp, &text, URI_RESERVED)
}

pub fn global_decode_uri_component(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let text = uri_argument(interp, args)?;
    decoded(interp, &text, "")
}

// ═══════════════════════════════════════════════════════════════════════════════
// escape / unescape
// ═══════════════════════════════════════════════════════════════════════════════

/// escape(string): `%XX` for Latin-1 units, `%uXXXX` above
pub fn global_escape(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let text = uri_argument(interp, args)?;
    let mut result = String::with_capacity(text.len());
    for unit in text.encode_utf16() {
        match char::from_u32(u32::from(unit)) {
            Some(c) if c.is_ascii_alphanumeric() || ESCAPE_SAFE.contains(c) => result.push(c),
            _ if unit < 256 => result.push_str(&format!("%{:02X}", unit)),
            _ => result.push_str(&format!("%u{:04X}", unit)),
        }
    }
    Ok(JsValue::from(result))
}

/// unescape(string): the inverse of escape; malformed sequences stay as is
pub fn global_unescape(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let text = uri_argument(interp, args)?;
    let units: Vec<u16> = text.encode_utf16().collect();
    let hex = |from: usize, count: usize| -> Option<u16> {
        let digits = units.get(from..from + count)?;
        let digits = String::from_utf16(digits).ok()?;
        u16::from_str_radix(&digits, 16).ok()
    };
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;
    while let Some(&unit) = units.get(i) {
        if unit == u16::from(b'%') {
            if units.get(i + 1) == Some(&u16::from(b'u')) {
                if let Some(decoded) = hex(i + 2, 4) {
                    out.push(decoded);
                    i += 6;
                    continue;
                }
            } else if let Some(decoded) = hex(i + 1, 2) {
                out.push(decoded);
                i += 3;
                continue;
            }
        }
        out.push(unit);
        i += 1;
    }
    Ok(JsValue::from(String::from_utf16_lossy(&out)))
}
