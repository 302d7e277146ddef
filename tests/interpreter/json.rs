//! JSON tests, plus the host-side JSON conversions

use super::{create_interpreter, eval, s, throws_error};
use serde_json::json;
use stepjs::{Interpreter, JsValue, PropertyAttrs};

#[test]
fn test_parse_primitives() {
    assert_eq!(eval("JSON.parse('42')"), JsValue::Number(42.0));
    assert_eq!(eval("JSON.parse('\"hi\"')"), s("hi"));
    assert_eq!(eval("JSON.parse('true')"), JsValue::Boolean(true));
    assert_eq!(eval("JSON.parse('null')"), JsValue::Null);
}

#[test]
fn test_parse_structures() {
    assert_eq!(
        eval(r#"var o = JSON.parse('{"a": [1, 2, {"b": "c"}], "d": 1.5}'); o.a[2].b + o.a.length + o.d"#),
        s("c21.5")
    );
    assert_eq!(eval(r#"Object.keys(JSON.parse('{"z": 1, "a": 2}')).join()"#), s("z,a"));
    assert_eq!(eval("JSON.parse('[]') instanceof Array"), JsValue::Boolean(true));
}

#[test]
fn test_parse_error_is_catchable_syntax_error() {
    assert_eq!(
        eval("var r; try { JSON.parse('{bad'); } catch (e) { r = e.name; } r"),
        s("SyntaxError")
    );
    assert!(throws_error("JSON.parse('')", "SyntaxError"));
}

#[test]
fn test_stringify_primitives() {
    assert_eq!(eval("JSON.stringify(1)"), s("1"));
    assert_eq!(eval("JSON.stringify('a\"b')"), s("\"a\\\"b\""));
    assert_eq!(eval("JSON.stringify(null)"), s("null"));
    assert_eq!(eval("JSON.stringify(NaN)"), s("null"));
    assert_eq!(eval("JSON.stringify(undefined)"), JsValue::Undefined);
    assert_eq!(eval("JSON.stringify(function() {})"), JsValue::Undefined);
}

#[test]
fn test_stringify_structures() {
    assert_eq!(
        eval("JSON.stringify({a: 1, b: [true, null, 'x'], c: {d: 2.5}})"),
        s(r#"{"a":1,"b":[true,null,"x"],"c":{"d":2.5}}"#)
    );
}

#[test]
fn test_stringify_skips_undefined_and_functions() {
    assert_eq!(
        eval("JSON.stringify({a: undefined, f: function() {}, k: 1})"),
        s(r#"{"k":1}"#)
    );
    assert_eq!(eval("JSON.stringify([undefined, function() {}])"), s("[null,null]"));
}

#[test]
fn test_stringify_skips_hidden_properties() {
    assert_eq!(
        eval("var o = {shown: 1}; Object.defineProperty(o, 'hidden', {value: 2}); JSON.stringify(o)"),
        s(r#"{"shown":1}"#)
    );
}

#[test]
fn test_stringify_dates_and_boxed_values() {
    assert_eq!(eval("JSON.stringify(new Date(0))"), s(r#""1970-01-01T00:00:00.000Z""#));
    assert_eq!(eval("JSON.stringify([new Number(3), new String('s')])"), s(r#"[3,"s"]"#));
}

#[test]
fn test_stringify_with_indent() {
    assert_eq!(eval("JSON.stringify({a: [1]}, null, 2)"), s("{\n  \"a\": [\n    1\n  ]\n}"));
    assert_eq!(eval("JSON.stringify({a: 1}, null, '\\t')"), s("{\n\t\"a\": 1\n}"));
}

#[test]
fn test_stringify_circular_is_type_error() {
    assert!(throws_error("var o = {}; o.self = o; JSON.stringify(o)", "circular structure"));
}

#[test]
fn test_native_to_guest() {
    let mut interp = Interpreter::with_init("config.name + ':' + config.sizes[1]", |interp, global| {
        let config = interp.native_to_guest(&json!({"name": "demo", "sizes": [1, 2, 3]}))?;
        interp.set_property(&JsValue::Object(global), "config", config, PropertyAttrs::NONE)
    })
    .unwrap();
    interp.run().unwrap();
    assert_eq!(interp.value(), s("demo:2"));
}

#[test]
fn test_guest_to_native() {
    let mut interp =
        create_interpreter("({list: [1, 'two', null, undefined], nested: {ok: true}, skip: undefined})")
            .unwrap();
    interp.run().unwrap();
    let native = interp.guest_to_native(&interp.value()).unwrap();
    assert_eq!(native, json!({"list": [1, "two", null, null], "nested": {"ok": true}}));
}

#[test]
fn test_stringify_deep_nesting_is_range_error() {
    assert_eq!(
        eval(
            "var a = []; for (var i = 0; i < 20000; i++) a = [a]; var r;
             try { JSON.stringify(a); } catch (e) { r = e.name + ': ' + e.message; } r"
        ),
        s("RangeError: Maximum nesting depth exceeded")
    );
    assert_eq!(
        eval("var o = {v: 1}; for (var i = 0; i < 50; i++) o = {o: o}; JSON.stringify(o).length"),
        JsValue::Number(307.0)
    );
}
