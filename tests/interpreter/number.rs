//! Number tests: conversions, parsing and Number.prototype formatting

use super::{eval, s, throws_error};
use stepjs::JsValue;

#[test]
fn test_number_conversion() {
    assert_eq!(eval("Number('42')"), JsValue::Number(42.0));
    assert_eq!(eval("Number('  12  ')"), JsValue::Number(12.0));
    assert_eq!(eval("Number('')"), JsValue::Number(0.0));
    assert_eq!(eval("Number('0x10')"), JsValue::Number(16.0));
    assert_eq!(eval("Number(true)"), JsValue::Number(1.0));
    assert_eq!(eval("Number(null)"), JsValue::Number(0.0));
    assert_eq!(eval("isNaN(Number(undefined))"), JsValue::Boolean(true));
    assert_eq!(eval("isNaN(Number('12px'))"), JsValue::Boolean(true));
    assert_eq!(eval("Number()"), JsValue::Number(0.0));
    assert_eq!(eval("+'3' + +'4'"), JsValue::Number(7.0));
}

#[test]
fn test_number_object() {
    assert_eq!(eval("typeof new Number(5)"), s("object"));
    assert_eq!(eval("new Number(5) + 1"), JsValue::Number(6.0));
    assert_eq!(eval("new Number(5).valueOf()"), JsValue::Number(5.0));
}

#[test]
fn test_constants() {
    assert_eq!(eval("Number.MAX_VALUE"), JsValue::Number(f64::MAX));
    assert_eq!(eval("Number.MIN_VALUE"), JsValue::Number(5e-324));
    assert_eq!(eval("Number.POSITIVE_INFINITY === Infinity"), JsValue::Boolean(true));
    assert_eq!(eval("isNaN(Number.NaN)"), JsValue::Boolean(true));
}

#[test]
fn test_constants_are_read_only() {
    assert_eq!(eval("Number.MAX_VALUE = 1; Number.MAX_VALUE === 1"), JsValue::Boolean(false));
    assert_eq!(eval("NaN = 1; isNaN(NaN)"), JsValue::Boolean(true));
}

#[test]
fn test_parse_int() {
    assert_eq!(eval("parseInt('42px')"), JsValue::Number(42.0));
    assert_eq!(eval("parseInt('  -17')"), JsValue::Number(-17.0));
    assert_eq!(eval("parseInt('0x1A')"), JsValue::Number(26.0));
    assert_eq!(eval("parseInt('ff', 16)"), JsValue::Number(255.0));
    assert_eq!(eval("parseInt('111', 2)"), JsValue::Number(7.0));
    assert_eq!(eval("parseInt('08')"), JsValue::Number(8.0));
    assert_eq!(eval("isNaN(parseInt('px'))"), JsValue::Boolean(true));
    assert_eq!(eval("parseInt(3.99)"), JsValue::Number(3.0));
    assert_eq!(eval("Number.parseInt === parseInt"), JsValue::Boolean(true));
}

#[test]
fn test_parse_float() {
    assert_eq!(eval("parseFloat('3.14 is pi')"), JsValue::Number(3.14));
    assert_eq!(eval("parseFloat('.5')"), JsValue::Number(0.5));
    assert_eq!(eval("parseFloat('-2.5e2x')"), JsValue::Number(-250.0));
    assert_eq!(eval("parseFloat('Infinityx')"), JsValue::Number(f64::INFINITY));
    assert_eq!(eval("isNaN(parseFloat('x1'))"), JsValue::Boolean(true));
}

#[test]
fn test_to_fixed() {
    assert_eq!(eval("(3.14159).toFixed(2)"), s("3.14"));
    assert_eq!(eval("(0.5).toFixed(0)"), s("1"));
    assert_eq!(eval("(1.005).toFixed(2)"), s("1.00"));
    assert_eq!(eval("(-1.5).toFixed(0)"), s("-2"));
    assert_eq!(eval("(42).toFixed(3)"), s("42.000"));
    assert_eq!(eval("(1e21).toFixed(2)"), s("1e+21"));
    assert!(throws_error("(1).toFixed(21)", "RangeError"));
}

#[test]
fn test_to_precision() {
    assert_eq!(eval("(123.456).toPrecision(4)"), s("123.5"));
    assert_eq!(eval("(0.000123).toPrecision(2)"), s("0.00012"));
    assert_eq!(eval("(123456).toPrecision(2)"), s("1.2e+5"));
    assert_eq!(eval("(1.5).toPrecision()"), s("1.5"));
    assert_eq!(eval("(0).toPrecision(3)"), s("0.00"));
    assert!(throws_error("(1).toPrecision(0)", "RangeError"));
}

#[test]
fn test_to_exponential() {
    assert_eq!(eval("(12345).toExponential(2)"), s("1.23e+4"));
    assert_eq!(eval("(0.00015).toExponential(1)"), s("1.5e-4"));
    assert_eq!(eval("(-5).toExponential()"), s("-5e+0"));
    assert_eq!(eval("(0).toExponential(2)"), s("0.00e+0"));
}

#[test]
fn test_to_string_with_radix() {
    assert_eq!(eval("(255).toString(16)"), s("ff"));
    assert_eq!(eval("(255).toString(2)"), s("11111111"));
    assert_eq!(eval("(-35).toString(36)"), s("-z"));
    assert_eq!(eval("(0.25).toString(2)"), s("0.01"));
    assert_eq!(eval("(10).toString()"), s("10"));
    assert!(throws_error("(10).toString(1)", "radix"));
}

#[test]
fn test_methods_require_number_receiver() {
    assert!(throws_error(
        "Number.prototype.toFixed.call('1', 2)",
        "requires that 'this' be a Number"
    ));
}

#[test]
fn test_number_literals() {
    assert_eq!(eval("0xff"), JsValue::Number(255.0));
    assert_eq!(eval("1e3"), JsValue::Number(1000.0));
    assert_eq!(eval(".5 + 1."), JsValue::Number(1.5));
    assert_eq!(eval("2.5E-1"), JsValue::Number(0.25));
}

#[test]
fn test_number_formatting() {
    assert_eq!(eval("'' + 1e-7"), s("1e-7"));
    assert_eq!(eval("'' + 0.000001"), s("0.000001"));
    assert_eq!(eval("'' + 1.5e300"), s("1.5e+300"));
    assert_eq!(eval("'' + -Infinity"), s("-Infinity"));
    assert_eq!(eval("'' + NaN"), s("NaN"));
}
