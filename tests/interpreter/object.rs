//! Object tests: literals, property access, Object statics and prototype methods

use super::{eval, s, test_config, throws_error};
use stepjs::{Interpreter, JsValue};

#[test]
fn test_object_literal_and_access() {
    assert_eq!(eval("var o = {a: 1, 'b c': 2, 3: 'three'}; o.a + o['b c']"), JsValue::Number(3.0));
    assert_eq!(eval("var o = {3: 'three'}; o[3] + o['3']"), s("threethree"));
    assert_eq!(eval("var o = {if: 1, class: 2}; o.if + o.class"), JsValue::Number(3.0));
}

#[test]
fn test_missing_property_is_undefined() {
    assert_eq!(eval("({}).nothing"), JsValue::Undefined);
}

#[test]
fn test_property_of_null_is_type_error() {
    assert!(throws_error("var n = null; n.x", "Cannot read property 'x' of null"));
    assert!(throws_error("var u; u.x = 1", "Cannot set property 'x' of undefined"));
}

#[test]
fn test_computed_keys_are_strings() {
    assert_eq!(
        eval("var o = {}; o[1] = 'a'; o[true] = 'b'; o[null] = 'c'; Object.keys(o).join(',')"),
        s("1,true,null")
    );
}

#[test]
fn test_object_keys_in_insertion_order() {
    assert_eq!(eval("Object.keys({z: 1, a: 2, m: 3}).join(',')"), s("z,a,m"));
}

#[test]
fn test_object_keys_of_array() {
    assert_eq!(eval("Object.keys(['x', 'y']).join(',')"), s("0,1"));
}

#[test]
fn test_object_keys_rejects_primitives() {
    assert!(throws_error("Object.keys(5)", "Object.keys called on non-object"));
}

#[test]
fn test_get_own_property_names_includes_hidden() {
    assert_eq!(
        eval(
            r#"
            var o = {visible: 1};
            Object.defineProperty(o, 'secret', {value: 2});
            Object.keys(o).join(',') + '|' + Object.getOwnPropertyNames(o).join(',')
        "#
        ),
        s("visible|visible,secret")
    );
    assert_eq!(eval("Object.getOwnPropertyNames([7]).join(',')"), s("0,length"));
}

#[test]
fn test_define_property_defaults_to_readonly() {
    assert_eq!(
        eval(
            r#"
            var o = {};
            Object.defineProperty(o, 'fixed', {value: 'original'});
            o.fixed = 'changed';
            o.fixed + ':' + (delete o.fixed) + ':' + o.fixed
        "#
        ),
        s("original:false:original")
    );
}

#[test]
fn test_define_property_writable_enumerable() {
    assert_eq!(
        eval(
            r#"
            var o = {};
            Object.defineProperty(o, 'open', {value: 1, writable: true, enumerable: true});
            o.open = 2;
            o.open + ':' + Object.keys(o).join(',')
        "#
        ),
        s("2:open")
    );
}

#[test]
fn test_define_property_cannot_redefine_readonly() {
    assert!(throws_error(
        "var o = {}; Object.defineProperty(o, 'k', {value: 1}); Object.defineProperty(o, 'k', {value: 2});",
        "Cannot redefine property: k"
    ));
}

#[test]
fn test_define_property_requires_descriptor_object() {
    assert!(throws_error("Object.defineProperty({}, 'k', 1)", "Property description must be an object"));
}

#[test]
fn test_has_own_property() {
    assert_eq!(
        eval(
            r#"
            function F() { this.own = 1; }
            F.prototype.shared = 2;
            var f = new F();
            [f.hasOwnProperty('own'), f.hasOwnProperty('shared'), 'shared' in f].join(',')
        "#
        ),
        s("true,false,true")
    );
    assert_eq!(eval("'abc'.hasOwnProperty('1')"), JsValue::Boolean(true));
    assert_eq!(eval("[1].hasOwnProperty('length')"), JsValue::Boolean(true));
}

#[test]
fn test_property_is_enumerable() {
    assert_eq!(
        eval("[({a: 1}).propertyIsEnumerable('a'), [].propertyIsEnumerable('length')].join(',')"),
        s("true,false")
    );
    assert_eq!(eval("'abc'.propertyIsEnumerable(0)"), JsValue::Boolean(true));
}

#[test]
fn test_object_prototype_to_string_reports_class() {
    assert_eq!(
        eval(
            r#"
            var ts = Object.prototype.toString;
            [ts.call([]), ts.call(new Date(0)), ts.call(/x/), ts.call(null),
             ts.call(1), ts.call(function() {}), ts.call(new Error('e'))].join(' ')
        "#
        ),
        s("[object Array] [object Date] [object RegExp] [object Null] [object Number] [object Function] [object Error]")
    );
}

#[test]
fn test_object_constructor_boxes_primitives() {
    assert_eq!(eval("typeof Object('s')"), s("object"));
    assert_eq!(eval("Object('s').length"), JsValue::Number(1.0));
    assert_eq!(eval("var o = {}; Object(o) === o"), JsValue::Boolean(true));
    assert_eq!(eval("typeof new Object()"), s("object"));
}

#[test]
fn test_value_of_returns_object() {
    assert_eq!(eval("var o = {}; o.valueOf() === o"), JsValue::Boolean(true));
}

#[test]
fn test_shared_prototype_method() {
    assert_eq!(
        eval("Object.prototype.greet = function() { return 'hi'; }; var o = {}; o.greet()"),
        s("hi")
    );
}

#[test]
fn test_getters_and_setters_are_syntax_errors() {
    assert!(throws_error("var o = {get x() { return 1; }};", "SyntaxError: Object getters and setters are not supported at 1:10"));
    assert_eq!(
        eval("var r; try { eval('({set x(v) {}})'); } catch (e) { r = e.name; } r"),
        s("SyntaxError")
    );
}

#[test]
fn test_prototype_cycle_is_a_range_error() {
    // Instances inherit through the live `prototype` of their constructor
    assert_eq!(
        eval(
            "function F() {} var o = new F(); F.prototype = o; var r;
             try { o.missing; } catch (e) { r = String(e); } r"
        ),
        s("RangeError: Maximum prototype chain depth exceeded")
    );
    assert_eq!(
        eval("function F() {} var o = new F(); F.prototype = o; o.own = 1; o.own"),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_scope_chain_walk_is_bounded() {
    let source = "var depth = 1;
        function a() {
            return (function () {
                return (function () {
                    return (function () {
                        try { return depth; } catch (e) { return e.name + ': ' + e.message; }
                    })();
                })();
            })();
        }
        a()";
    let config = test_config().polyfills(false).max_chain_depth(4);
    let mut interp = Interpreter::with_config(source, config, |_, _| Ok(())).unwrap();
    assert!(!interp.run().unwrap());
    assert_eq!(interp.value(), s("RangeError: Maximum scope chain depth exceeded"));
    // The default bound leaves ordinary nesting alone
    assert_eq!(eval(source), JsValue::Number(1.0));
}

#[test]
fn test_nested_objects() {
    assert_eq!(
        eval("var o = {inner: {list: [1, {deep: 'yes'}]}}; o.inner.list[1].deep"),
        s("yes")
    );
}
