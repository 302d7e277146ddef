//! Number constructor, number parsing, and Number.prototype formatting

use crate::error::JsError;
use crate::interpreter::{Interpreter, PropertyAttrs};
use crate::value::{JsValue, ObjectData, is_js_whitespace, number_to_string};

use super::{arg, create_constructor, define_constant, integer_arg};

/// Initialize the Number constructor and Number.prototype
pub fn init_number(interp: &mut Interpreter) -> Result<(), JsError> {
    let object = interp.intrinsics.object;
    let (constructor, proto) =
        create_constructor(interp, "Number", 1, number_constructor, object)?;
    interp.intrinsics.number = constructor;

    define_constant(interp, constructor, "MAX_VALUE", f64::MAX)?;
    define_constant(interp, constructor, "MIN_VALUE", 5e-324)?;
    define_constant(interp, constructor, "NaN", f64::NAN)?;
    define_constant(interp, constructor, "NEGATIVE_INFINITY", f64::NEG_INFINITY)?;
    define_constant(interp, constructor, "POSITIVE_INFINITY", f64::INFINITY)?;

    // The globals of the same name are these very functions
    let global = interp.global_scope();
    let parse_float = interp.register_method(constructor, "parseFloat", number_parse_float, 1)?;
    let parse_int = interp.register_method(constructor, "parseInt", number_parse_int, 2)?;
    interp.define(global, "parseFloat", JsValue::Object(parse_float), PropertyAttrs::HIDDEN)?;
    interp.define(global, "parseInt", JsValue::Object(parse_int), PropertyAttrs::HIDDEN)?;

    interp.register_method(proto, "toExponential", number_to_exponential, 1)?;
    interp.register_method(proto, "toFixed", number_to_fixed, 1)?;
    interp.register_method(proto, "toPrecision", number_to_precision, 1)?;
    interp.register_method(proto, "toString", number_to_string_method, 1)?;
    interp.register_method(proto, "toLocaleString", number_to_locale_string, 0)?;
    interp.register_method(proto, "valueOf", number_value_of, 0)?;
    Ok(())
}

/// `Number(value)` converts; `new Number(value)` boxes.
pub fn number_constructor(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let n = match args.first() {
        Some(value) => interp.to_number(value)?,
        None => 0.0,
    };
    if let (JsValue::Object(id), true) = (&this, interp.is_constructing()) {
        interp.object_mut(*id)?.data = ObjectData::Primitive(JsValue::Number(n));
        return Ok(this);
    }
    Ok(JsValue::Number(n))
}

/// The number behind `this`: a number primitive or a Number object
fn this_number_value(interp: &Interpreter, this: &JsValue, method: &str) -> Result<f64, JsError> {
    match this {
        JsValue::Number(n) => Ok(*n),
        JsValue::Object(id) => match &interp.object(*id)?.data {
            ObjectData::Primitive(JsValue::Number(n)) => Ok(*n),
            _ => Err(JsError::type_error(format!(
                "Number.prototype.{} requires that 'this' be a Number",
                method
            ))),
        },
        _ => Err(JsError::type_error(format!(
            "Number.prototype.{} requires that 'this' be a Number",
            method
        ))),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Parsing
// ═══════════════════════════════════════════════════════════════════════════════

/// parseFloat(string): the longest decimal prefix, ignoring leading whitespace
pub fn number_parse_float(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let text = interp.to_string(&arg(args, 0))?;
    Ok(JsValue::Number(parse_float_prefix(text.as_str())))
}

pub(crate) fn parse_float_prefix(text: &str) -> f64 {
    let trimmed = text.trim_start_matches(is_js_whitespace);
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if unsigned.starts_with("Infinity") {
        return sign * f64::INFINITY;
    }
    let bytes = unsigned.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    while let Some(&b) = bytes.get(end) {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return f64::NAN;
    }
    // Optional exponent, only taken when it has digits
    if let Some(b'e' | b'E') = bytes.get(end) {
        let mut exp_end = end + 1;
        if let Some(b'+' | b'-') = bytes.get(exp_end) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }
    unsigned
        .get(..end)
        .and_then(|prefix| prefix.parse::<f64>().ok())
        .map(|n| sign * n)
        .unwrap_or(f64::NAN)
}

/// parseInt(string, radix)
pub fn number_parse_int(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let text = interp.to_string(&arg(args, 0))?;
    let radix = crate::value::to_int32(interp.to_number(&arg(args, 1))?);
    Ok(JsValue::Number(parse_int_prefix(text.as_str(), radix)))
}

pub(crate) fn parse_int_prefix(text: &str, radix: i32) -> f64 {
    let trimmed = text.trim_start_matches(is_js_whitespace);
    let (sign, mut digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let mut radix = radix as u32;
    if radix == 0 || radix == 16 {
        if let Some(rest) = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
        {
            digits = rest;
            radix = 16;
        }
    }
    if radix == 0 {
        radix = 10;
    }
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    let mut result = 0.0;
    let mut any = false;
    for c in digits.chars() {
        let Some(d) = c.to_digit(radix) else {
            break;
        };
        result = result * radix as f64 + d as f64;
        any = true;
    }
    if any { sign * result } else { f64::NAN }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Formatting
// ═══════════════════════════════════════════════════════════════════════════════

/// Exact decimal digits of `|x|` (61 significant) and the decimal exponent of
/// the first digit.
fn decimal_digits(x: f64) -> (Vec<u8>, i32) {
    let formatted = format!("{:.60e}", x.abs());
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
    let digits = mantissa
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();
    (digits, exponent.parse().unwrap_or(0))
}

/// Keep `keep` leading digits, rounding half up. Returns the kept digits and
/// whether rounding carried into a new leading digit.
fn round_digits(digits: &[u8], keep: usize) -> (Vec<u8>, bool) {
    let mut kept: Vec<u8> = digits.iter().copied().take(keep).collect();
    kept.resize(keep, 0);
    if digits.get(keep).is_some_and(|&d| d >= 5) {
        for digit in kept.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                return (kept, false);
            }
        }
        kept.insert(0, 1);
        return (kept, true);
    }
    (kept, false)
}

fn digits_to_string(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

/// `x.toFixed(fraction_digits)` for finite `|x| < 1e21`
pub(crate) fn format_fixed(x: f64, fraction_digits: usize) -> String {
    let (digits, exponent) = decimal_digits(x);
    let integer_digits = exponent + 1;
    let keep = integer_digits + fraction_digits as i32;
    let mut text = if keep < 0 {
        "0".repeat(fraction_digits + 1)
    } else {
        let (mut rounded, _) = round_digits(&digits, keep as usize);
        // Left-pad so there is at least one integer digit
        let needed = fraction_digits + 1;
        while rounded.len() < needed {
            rounded.insert(0, 0);
        }
        digits_to_string(&rounded)
    };
    if fraction_digits > 0 {
        let point = text.len() - fraction_digits;
        text.insert(point, '.');
    }
    if x < 0.0 {
        text.insert(0, '-');
    }
    text
}

/// `d.ddd` mantissa and exponent with `significant` digits
fn exponential_parts(x: f64, significant: usize) -> (String, i32) {
    let (digits, mut exponent) = decimal_digits(x);
    let (rounded, carried) = round_digits(&digits, significant);
    if carried {
        exponent += 1;
    }
    let mut mantissa = digits_to_string(rounded.get(..significant).unwrap_or(&rounded));
    if significant > 1 {
        mantissa.insert(1, '.');
    }
    (mantissa, exponent)
}

fn exponent_suffix(exponent: i32) -> String {
    if exponent < 0 {
        format!("e-{}", -exponent)
    } else {
        format!("e+{}", exponent)
    }
}

fn sign_prefix(x: f64) -> &'static str {
    if x < 0.0 { "-" } else { "" }
}

/// Number.prototype.toFixed(digits)
pub fn number_to_fixed(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let x = this_number_value(interp, &this, "toFixed")?;
    let digits = integer_arg(interp, args, 0, 0.0)?;
    if !(0.0..=20.0).contains(&digits) {
        return Err(JsError::range_error(
            "toFixed() digits argument must be between 0 and 20",
        ));
    }
    if !x.is_finite() || x.abs() >= 1e21 {
        return Ok(JsValue::from(number_to_string(x)));
    }
    Ok(JsValue::from(format_fixed(x, digits as usize)))
}

/// Number.prototype.toExponential(digits)
pub fn number_to_exponential(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let x = this_number_value(interp, &this, "toExponential")?;
    if !x.is_finite() {
        return Ok(JsValue::from(number_to_string(x)));
    }
    let significant = match arg(args, 0) {
        // As many digits as it takes to identify the number
        JsValue::Undefined => {
            let shortest = format!("{:e}", x.abs());
            shortest
                .split('e')
                .next()
                .map(|m| m.bytes().filter(u8::is_ascii_digit).count())
                .unwrap_or(1)
        }
        _ => {
            let digits = integer_arg(interp, args, 0, 0.0)?;
            if !(0.0..=20.0).contains(&digits) {
                return Err(JsError::range_error(
                    "toExponential() argument must be between 0 and 20",
                ));
            }
            digits as usize + 1
        }
    };
    if x == 0.0 {
        let zeros = "0".repeat(significant - 1);
        let mantissa = if zeros.is_empty() { "0".to_string() } else { format!("0.{}", zeros) };
        return Ok(JsValue::from(format!("{}e+0", mantissa)));
    }
    let (mantissa, exponent) = exponential_parts(x, significant);
    Ok(JsValue::from(format!(
        "{}{}{}",
        sign_prefix(x),
        mantissa,
        exponent_suffix(exponent)
    )))
}

/// Number.prototype.toPrecision(precision)
pub fn number_to_precision(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let x = this_number_value(interp, &this, "toPrecision")?;
    if matches!(arg(args, 0), JsValue::Undefined) || !x.is_finite() {
        return Ok(JsValue::from(number_to_string(x)));
    }
    let precision = integer_arg(interp, args, 0, 0.0)?;
    if !(1.0..=21.0).contains(&precision) {
        return Err(JsError::range_error(
            "toPrecision() argument must be between 1 and 21",
        ));
    }
    let precision = precision as usize;
    if x == 0.0 {
        return Ok(JsValue::from(format_fixed(0.0, precision - 1)));
    }
    let (mantissa, exponent) = exponential_parts(x, precision);
    if exponent < -6 || exponent >= precision as i32 {
        return Ok(JsValue::from(format!(
            "{}{}{}",
            sign_prefix(x),
            mantissa,
            exponent_suffix(exponent)
        )));
    }
    let fraction_digits = (precision as i32 - exponent - 1).max(0) as usize;
    Ok(JsValue::from(format_fixed(x, fraction_digits)))
}

/// Number.prototype.toString(radix)
pub fn number_to_string_method(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let x = this_number_value(interp, &this, "toString")?;
    let radix = integer_arg(interp, args, 0, 10.0)?;
    if !(2.0..=36.0).contains(&radix) {
        return Err(JsError::range_error(
            "toString() radix argument must be between 2 and 36",
        ));
    }
    if radix == 10.0 || !x.is_finite() {
        return Ok(JsValue::from(number_to_string(x)));
    }
    Ok(JsValue::from(format_radix(x, radix as u32)))
}

/// Render a finite number in a non-decimal radix
pub(crate) fn format_radix(x: f64, radix: u32) -> String {
    let digit = |d: u32| char::from_digit(d, radix).unwrap_or('0');
    let negative = x < 0.0;
    let x = x.abs();
    let mut integer = crate::prelude::math::floor(x);
    let mut fraction = x - integer;

    let mut int_digits = Vec::new();
    loop {
        let d = crate::prelude::math::fmod(integer, radix as f64) as u32;
        int_digits.push(digit(d));
        integer = crate::prelude::math::floor(integer / radix as f64);
        if integer < 1.0 {
            break;
        }
    }
    let mut out: String = int_digits.into_iter().rev().collect();
    if fraction > 0.0 {
        out.push('.');
        // 52 digits is the precision of the mantissa in the worst case (radix 2)
        for _ in 0..52 {
            fraction *= radix as f64;
            let d = crate::prelude::math::floor(fraction);
            out.push(digit(d as u32));
            fraction -= d;
            if fraction <= 0.0 {
                break;
            }
        }
    }
    if negative {
        out.insert(0, '-');
    }
    out
}

pub fn number_to_locale_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let x = this_number_value(interp, &this, "toLocaleString")?;
    Ok(JsValue::from(number_to_string(x)))
}

pub fn number_value_of(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(this_number_value(interp, &this, "valueOf")?))
}
