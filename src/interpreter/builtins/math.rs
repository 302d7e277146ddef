//! The Math object

use crate::error::JsError;
use crate::interpreter::{Interpreter, PropertyAttrs};
use crate::prelude::math;
use crate::value::JsValue;

use super::{arg, define_constant};

/// Initialize the global Math object
pub fn init_math(interp: &mut Interpreter) -> Result<(), JsError> {
    let object = interp.intrinsics.object;
    let math_obj = interp.create_object(Some(object))?;
    let global = interp.global_scope();
    interp.define(global, "Math", JsValue::Object(math_obj), PropertyAttrs::HIDDEN)?;

    define_constant(interp, math_obj, "E", std::f64::consts::E)?;
    define_constant(interp, math_obj, "LN2", std::f64::consts::LN_2)?;
    define_constant(interp, math_obj, "LN10", std::f64::consts::LN_10)?;
    define_constant(interp, math_obj, "LOG2E", std::f64::consts::LOG2_E)?;
    define_constant(interp, math_obj, "LOG10E", std::f64::consts::LOG10_E)?;
    define_constant(interp, math_obj, "PI", std::f64::consts::PI)?;
    define_constant(interp, math_obj, "SQRT1_2", std::f64::consts::FRAC_1_SQRT_2)?;
    define_constant(interp, math_obj, "SQRT2", std::f64::consts::SQRT_2)?;

    let unary: [(&str, fn(f64) -> f64); 13] = [
        ("abs", f64::abs),
        ("acos", math::acos),
        ("asin", math::asin),
        ("atan", math::atan),
        ("ceil", math::ceil),
        ("cos", math::cos),
        ("exp", math::exp),
        ("floor", math::floor),
        ("log", math::ln),
        ("round", round),
        ("sin", math::sin),
        ("sqrt", math::sqrt),
        ("tan", math::tan),
    ];
    for (name, op) in unary {
        interp.register_method(
            math_obj,
            name,
            move |interp, _this, args| Ok(JsValue::Number(op(interp.to_number(&arg(args, 0))?))),
            1,
        )?;
    }

    interp.register_method(math_obj, "atan2", math_atan2, 2)?;
    interp.register_method(math_obj, "pow", math_pow, 2)?;
    interp.register_method(math_obj, "max", math_max, 2)?;
    interp.register_method(math_obj, "min", math_min, 2)?;
    interp.register_method(math_obj, "random", math_random, 0)?;
    Ok(())
}

/// Round half up, keeping the sign of zero for inputs in `[-0.5, 0)`
pub(crate) fn round(x: f64) -> f64 {
    if !x.is_finite() || x == 0.0 {
        return x;
    }
    if x > 0.0 && x < 0.5 {
        return 0.0;
    }
    if (-0.5..0.0).contains(&x) {
        return -0.0;
    }
    let floor = math::floor(x);
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

pub fn math_atan2(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let y = interp.to_number(&arg(args, 0))?;
    let x = interp.to_number(&arg(args, 1))?;
    Ok(JsValue::Number(math::atan2(y, x)))
}

/// Math.pow(base, exponent)
pub fn math_pow(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let base = interp.to_number(&arg(args, 0))?;
    let exponent = interp.to_number(&arg(args, 1))?;
    Ok(JsValue::Number(pow(base, exponent)))
}

/// Exponentiation with the cases where JS and C `pow` disagree
pub(crate) fn pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    math::powf(base, exponent)
}

fn numbers(interp: &Interpreter, args: &[JsValue]) -> Result<Vec<f64>, JsError> {
    args.iter().map(|value| interp.to_number(value)).collect()
}

/// Math.max(...values): -Infinity with no arguments, NaN if any is NaN
pub fn math_max(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut result = f64::NEG_INFINITY;
    for n in numbers(interp, args)? {
        if n.is_nan() {
            return Ok(JsValue::Number(f64::NAN));
        }
        // +0 beats -0
        if n > result || (n == 0.0 && result == 0.0 && result.is_sign_negative()) {
            result = n;
        }
    }
    Ok(JsValue::Number(result))
}

/// Math.min(...values): Infinity with no arguments, NaN if any is NaN
pub fn math_min(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let mut result = f64::INFINITY;
    for n in numbers(interp, args)? {
        if n.is_nan() {
            return Ok(JsValue::Number(f64::NAN));
        }
        if n < result || (n == 0.0 && result == 0.0 && n.is_sign_negative()) {
            result = n;
        }
    }
    Ok(JsValue::Number(result))
}

/// Math.random(): the interpreter's seeded generator
pub fn math_random(
    interp: &mut Interpreter,
    _this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(interp.next_random()))
}
