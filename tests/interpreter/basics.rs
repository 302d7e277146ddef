//! Basic expression tests: literals, operators, coercions, typeof

use super::{eval, s, throws_error};
use stepjs::JsValue;

#[test]
fn test_arithmetic() {
    assert_eq!(eval("1 + 2 * 3"), JsValue::Number(7.0));
    assert_eq!(eval("(1 + 2) * 3"), JsValue::Number(9.0));
    assert_eq!(eval("10 / 4"), JsValue::Number(2.5));
    assert_eq!(eval("-7 % 3"), JsValue::Number(-1.0));
    assert_eq!(eval("2 - 3 - 4"), JsValue::Number(-5.0));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(eval("1 / 0"), JsValue::Number(f64::INFINITY));
    assert_eq!(eval("-1 / 0"), JsValue::Number(f64::NEG_INFINITY));
    assert_eq!(eval("isNaN(0 / 0)"), JsValue::Boolean(true));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval("'a' + 1"), s("a1"));
    assert_eq!(eval("1 + 2 + 'x'"), s("3x"));
    assert_eq!(eval("'x' + 1 + 2"), s("x12"));
    assert_eq!(eval("'n: ' + null + ',' + undefined"), s("n: null,undefined"));
    assert_eq!(eval("[1, 2] + ''"), s("1,2"));
    assert_eq!(eval("({}) + ''"), s("[object Object]"));
}

#[test]
fn test_number_to_string() {
    assert_eq!(eval("String(0.1 + 0.2)"), s("0.30000000000000004"));
    assert_eq!(eval("'' + 1e21"), s("1e+21"));
    assert_eq!(eval("'' + -0"), s("0"));
    assert_eq!(eval("'' + 123456789"), s("123456789"));
}

#[test]
fn test_bitwise_and_shifts() {
    assert_eq!(eval("5 & 3"), JsValue::Number(1.0));
    assert_eq!(eval("5 | 3"), JsValue::Number(7.0));
    assert_eq!(eval("5 ^ 3"), JsValue::Number(6.0));
    assert_eq!(eval("~5"), JsValue::Number(-6.0));
    assert_eq!(eval("1 << 4"), JsValue::Number(16.0));
    assert_eq!(eval("-16 >> 2"), JsValue::Number(-4.0));
    assert_eq!(eval("-1 >>> 28"), JsValue::Number(15.0));
    assert_eq!(eval("1 << 32"), JsValue::Number(1.0));
}

#[test]
fn test_equality() {
    assert_eq!(eval("1 == '1'"), JsValue::Boolean(true));
    assert_eq!(eval("1 === '1'"), JsValue::Boolean(false));
    assert_eq!(eval("null == undefined"), JsValue::Boolean(true));
    assert_eq!(eval("null === undefined"), JsValue::Boolean(false));
    assert_eq!(eval("null == 0"), JsValue::Boolean(false));
    assert_eq!(eval("true == 1"), JsValue::Boolean(true));
    assert_eq!(eval("NaN == NaN"), JsValue::Boolean(false));
    assert_eq!(eval("var o = {}; o == o"), JsValue::Boolean(true));
    assert_eq!(eval("({}) == ({})"), JsValue::Boolean(false));
    assert_eq!(eval("'a' != 'b'"), JsValue::Boolean(true));
    assert_eq!(eval("0 !== -0"), JsValue::Boolean(false));
}

#[test]
fn test_relational() {
    assert_eq!(eval("1 < 2"), JsValue::Boolean(true));
    assert_eq!(eval("2 <= 2"), JsValue::Boolean(true));
    assert_eq!(eval("'b' > 'a'"), JsValue::Boolean(true));
    assert_eq!(eval("'10' < '9'"), JsValue::Boolean(true));
    assert_eq!(eval("'10' < 9"), JsValue::Boolean(false));
    assert_eq!(eval("NaN < 1 || NaN >= 1"), JsValue::Boolean(false));
}

#[test]
fn test_string_comparison_uses_code_units() {
    // U+1F600 is the surrogate pair D83D DE00, below U+FF61
    assert_eq!(eval("'\\uFF61' < '\\uD83D\\uDE00'"), JsValue::Boolean(false));
    assert_eq!(eval("'\\uD83D\\uDE00' < '\\uFF61'"), JsValue::Boolean(true));
    assert_eq!(
        eval("var xs = ['\\uFF61', '\\uD83D\\uDE00']; (xs[1] < xs[0]) === (xs.sort()[0] === '\\uD83D\\uDE00')"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_logical_operators_return_operands() {
    assert_eq!(eval("0 || 'fallback'"), s("fallback"));
    assert_eq!(eval("1 && 'second'"), s("second"));
    assert_eq!(eval("'' && x"), s(""));
    assert_eq!(eval("!0"), JsValue::Boolean(true));
    assert_eq!(eval("!!'text'"), JsValue::Boolean(true));
}

#[test]
fn test_logical_short_circuit_skips_right_side() {
    assert_eq!(eval("var hit = 0; false && hit++; true || hit++; hit"), JsValue::Number(0.0));
}

#[test]
fn test_conditional_and_sequence() {
    assert_eq!(eval("true ? 'yes' : 'no'"), s("yes"));
    assert_eq!(eval("0 ? 'yes' : 'no'"), s("no"));
    assert_eq!(eval("(1, 2, 3)"), JsValue::Number(3.0));
}

#[test]
fn test_typeof() {
    assert_eq!(eval("typeof 1"), s("number"));
    assert_eq!(eval("typeof 'a'"), s("string"));
    assert_eq!(eval("typeof true"), s("boolean"));
    assert_eq!(eval("typeof undefined"), s("undefined"));
    assert_eq!(eval("typeof null"), s("object"));
    assert_eq!(eval("typeof {}"), s("object"));
    assert_eq!(eval("typeof []"), s("object"));
    assert_eq!(eval("typeof function() {}"), s("function"));
    assert_eq!(eval("typeof Math.max"), s("function"));
    assert_eq!(eval("typeof /a/"), s("object"));
}

#[test]
fn test_typeof_undeclared_is_undefined() {
    assert_eq!(eval("typeof notDeclaredAnywhere"), s("undefined"));
}

#[test]
fn test_undeclared_variable_is_reference_error() {
    assert!(throws_error("notDeclaredAnywhere + 1", "ReferenceError"));
}

#[test]
fn test_void_and_delete() {
    assert_eq!(eval("void 0"), JsValue::Undefined);
    assert_eq!(eval("var o = {a: 1}; delete o.a; 'a' in o"), JsValue::Boolean(false));
    assert_eq!(eval("var o = {a: 1}; delete o.a"), JsValue::Boolean(true));
}

#[test]
fn test_in_and_instanceof() {
    assert_eq!(eval("'length' in []"), JsValue::Boolean(true));
    assert_eq!(eval("'x' in {x: undefined}"), JsValue::Boolean(true));
    assert_eq!(eval("[] instanceof Array"), JsValue::Boolean(true));
    assert_eq!(eval("[] instanceof Object"), JsValue::Boolean(true));
    assert_eq!(eval("({}) instanceof Array"), JsValue::Boolean(false));
    assert_eq!(eval("function F() {} new F() instanceof F"), JsValue::Boolean(true));
}

#[test]
fn test_in_on_primitive_is_type_error() {
    assert!(throws_error("'a' in 'abc'", "TypeError"));
}

#[test]
fn test_update_expressions() {
    assert_eq!(eval("var i = 1; i++"), JsValue::Number(1.0));
    assert_eq!(eval("var i = 1; ++i"), JsValue::Number(2.0));
    assert_eq!(eval("var i = 1; i--; i"), JsValue::Number(0.0));
    assert_eq!(eval("var o = {n: 5}; o.n++; o.n"), JsValue::Number(6.0));
    assert_eq!(eval("var a = [1]; a[0] += 10; a[0]"), JsValue::Number(11.0));
}

#[test]
fn test_compound_assignment() {
    assert_eq!(eval("var x = 10; x -= 3; x *= 2; x"), JsValue::Number(14.0));
    assert_eq!(eval("var x = 'a'; x += 'b'; x"), s("ab"));
    assert_eq!(eval("var x = 7; x %= 4; x <<= 2; x"), JsValue::Number(12.0));
    assert_eq!(eval("var x = 6; x &= 3; x |= 8; x ^= 1; x"), JsValue::Number(11.0));
}

#[test]
fn test_implicit_global_assignment() {
    assert_eq!(eval("function f() { leaked = 3; } f(); leaked"), JsValue::Number(3.0));
}

#[test]
fn test_boolean_wrapper() {
    assert_eq!(eval("Boolean('')"), JsValue::Boolean(false));
    assert_eq!(eval("Boolean('0')"), JsValue::Boolean(true));
    assert_eq!(eval("typeof new Boolean(false)"), s("object"));
    assert_eq!(eval("new Boolean(false).valueOf()"), JsValue::Boolean(false));
    assert_eq!(eval("true.toString()"), s("true"));
}

#[test]
fn test_automatic_semicolon_insertion() {
    assert_eq!(
        eval(
            r#"
            var a = 1
            var b = 2
            a + b
        "#
        ),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_let_and_const_are_function_scoped() {
    assert_eq!(eval("{ let x = 1; } x"), JsValue::Number(1.0));
    assert_eq!(eval("const k = 'c'; k"), s("c"));
}
