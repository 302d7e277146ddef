//! Global object tests: value properties, URI coding, escape/unescape

use super::{eval, s, throws_error};
use stepjs::JsValue;

#[test]
fn test_global_value_properties() {
    assert_eq!(eval("Infinity"), JsValue::Number(f64::INFINITY));
    assert_eq!(eval("isNaN(NaN)"), JsValue::Boolean(true));
    assert_eq!(eval("undefined"), JsValue::Undefined);
    assert_eq!(eval("undefined = 1; typeof undefined"), s("undefined"));
}

#[test]
fn test_window_and_self_are_global() {
    assert_eq!(eval("var g = 1; window.g + self.g"), JsValue::Number(2.0));
    assert_eq!(eval("window.viaWindow = 'w'; viaWindow"), s("w"));
    assert_eq!(eval("this === window"), JsValue::Boolean(true));
}

#[test]
fn test_globals_are_not_enumerable() {
    assert_eq!(
        eval(
            r#"
            var mine = 1;
            var names = [];
            for (var k in window) names.push(k);
            [names.indexOf('mine') >= 0, names.indexOf('window') >= 0,
             names.indexOf('Array') >= 0, names.indexOf('NaN') >= 0].join(',')
        "#
        ),
        s("true,false,false,false")
    );
}

#[test]
fn test_is_nan_and_is_finite() {
    assert_eq!(eval("isNaN('abc')"), JsValue::Boolean(true));
    assert_eq!(eval("isNaN('12')"), JsValue::Boolean(false));
    assert_eq!(eval("isFinite('12')"), JsValue::Boolean(true));
    assert_eq!(eval("isFinite(1 / 0)"), JsValue::Boolean(false));
}

#[test]
fn test_encode_uri_component() {
    assert_eq!(eval("encodeURIComponent('a b&c=d/é')"), s("a%20b%26c%3Dd%2F%C3%A9"));
    assert_eq!(eval("encodeURIComponent(\"-_.!~*'()\")"), s("-_.!~*'()"));
}

#[test]
fn test_encode_uri_keeps_reserved() {
    assert_eq!(
        eval("encodeURI('http://x.org/a b?q=1&r=é#frag')"),
        s("http://x.org/a%20b?q=1&r=%C3%A9#frag")
    );
}

#[test]
fn test_decode_uri_component() {
    assert_eq!(eval("decodeURIComponent('a%20b%26c%C3%A9')"), s("a b&cé"));
}

#[test]
fn test_decode_uri_keeps_reserved_escapes() {
    assert_eq!(eval("decodeURI('a%20b%3Fc%26')"), s("a b%3Fc%26"));
}

#[test]
fn test_malformed_uri_is_uri_error() {
    assert!(throws_error("decodeURIComponent('%')", "URIError: URI malformed"));
    assert_eq!(
        eval("var r; try { decodeURI('%E0%A4%A'); } catch (e) { r = e instanceof URIError; } r"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_escape_and_unescape() {
    assert_eq!(eval("escape('a b+c@é\\u0100')"), s("a%20b+c@%E9%u0100"));
    assert_eq!(eval("unescape('a%20b%E9%u0100')"), s("a bé\u{100}"));
    assert_eq!(eval("unescape('%zz%u12')"), s("%zz%u12"));
}
