//! Function tests: closures, arguments, this binding, call/apply/bind, constructors

use super::{eval, s, throws_error};
use stepjs::JsValue;

#[test]
fn test_function_declaration_is_hoisted() {
    assert_eq!(eval("var r = square(4); function square(x) { return x * x; } r"), JsValue::Number(16.0));
}

#[test]
fn test_var_is_hoisted_as_undefined() {
    assert_eq!(eval("var r = typeof later; var later = 1; r"), s("undefined"));
}

#[test]
fn test_missing_arguments_are_undefined() {
    assert_eq!(eval("function f(a, b) { return b; } f(1) === undefined"), JsValue::Boolean(true));
}

#[test]
fn test_function_without_return_gives_undefined() {
    assert_eq!(eval("function f() { 1 + 1; } f()"), JsValue::Undefined);
}

#[test]
fn test_closures_capture_scope() {
    assert_eq!(
        eval(
            r#"
            function counter() {
                var count = 0;
                return function() { return ++count; };
            }
            var a = counter();
            var b = counter();
            a(); a();
            a() + ',' + b()
        "#
        ),
        s("3,1")
    );
}

#[test]
fn test_closures_in_loop_share_variable() {
    assert_eq!(
        eval(
            r#"
            var fns = [];
            for (var i = 0; i < 3; i++) {
                fns.push(function() { return i; });
            }
            fns[0]() + fns[2]()
        "#
        ),
        JsValue::Number(6.0)
    );
}

#[test]
fn test_recursion() {
    assert_eq!(
        eval("function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); } fib(15)"),
        JsValue::Number(610.0)
    );
}

#[test]
fn test_deep_recursion_does_not_use_host_stack() {
    assert_eq!(
        eval("function down(n) { return n === 0 ? 'bottom' : down(n - 1); } down(5000)"),
        s("bottom")
    );
}

#[test]
fn test_named_function_expression() {
    assert_eq!(
        eval("var f = function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); }; f(5)"),
        JsValue::Number(120.0)
    );
}

#[test]
fn test_arguments_object() {
    assert_eq!(
        eval("function f() { return arguments.length + ':' + arguments[1]; } f('a', 'b', 'c')"),
        s("3:b")
    );
}

#[test]
fn test_function_length() {
    assert_eq!(eval("(function(a, b, c) {}).length"), JsValue::Number(3.0));
    assert_eq!(eval("Math.max.length"), JsValue::Number(2.0));
}

#[test]
fn test_this_in_method_call() {
    assert_eq!(
        eval("var o = {name: 'obj', who: function() { return this.name; }}; o.who()"),
        s("obj")
    );
}

#[test]
fn test_this_in_plain_call_is_global() {
    assert_eq!(
        eval("var marker = 'global'; function f() { return this.marker; } f()"),
        s("global")
    );
}

#[test]
fn test_this_in_strict_plain_call_is_undefined() {
    assert_eq!(
        eval("function f() { 'use strict'; return this === undefined; } f()"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_call_and_apply() {
    assert_eq!(
        eval(
            r#"
            function describe(greeting, punct) { return greeting + ' ' + this.name + punct; }
            var bob = {name: 'Bob'};
            describe.call(bob, 'Hi', '!') + ' ' + describe.apply(bob, ['Bye', '.'])
        "#
        ),
        s("Hi Bob! Bye Bob.")
    );
}

#[test]
fn test_apply_with_arguments_object() {
    assert_eq!(
        eval("function sum() { return Math.max.apply(null, arguments); } sum(3, 9, 4)"),
        JsValue::Number(9.0)
    );
}

#[test]
fn test_apply_rejects_primitive_argument_list() {
    assert!(throws_error("Math.max.apply(null, 1)", "TypeError"));
}

#[test]
fn test_bind() {
    assert_eq!(
        eval(
            r#"
            function add(a, b) { return this.base + a + b; }
            var bound = add.bind({base: 100}, 10);
            bound(1) + ',' + bound.length
        "#
        ),
        s("111,1")
    );
}

#[test]
fn test_bound_constructor_constructs_target() {
    assert_eq!(
        eval(
            r#"
            function Point(x, y) { this.x = x; this.y = y; }
            var AtOrigin = Point.bind(null, 0);
            var p = new AtOrigin(5);
            (p instanceof Point) + ':' + p.x + ',' + p.y
        "#
        ),
        s("true:0,5")
    );
}

#[test]
fn test_constructor_and_prototype() {
    assert_eq!(
        eval(
            r#"
            function Animal(name) { this.name = name; }
            Animal.prototype.speak = function() { return this.name + ' speaks'; };
            var a = new Animal('Rex');
            a.speak() + ':' + (a.constructor === Animal)
        "#
        ),
        s("Rex speaks:true")
    );
}

#[test]
fn test_constructor_returning_object_wins() {
    assert_eq!(
        eval("function F() { this.a = 1; return {b: 2}; } var o = new F(); o.a + ',' + o.b"),
        s("undefined,2")
    );
    assert_eq!(
        eval("function G() { this.a = 1; return 5; } new G().a"),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_prototype_inheritance_chain() {
    assert_eq!(
        eval(
            r#"
            function Base() {}
            Base.prototype.kind = function() { return 'base'; };
            function Derived() {}
            Derived.prototype = new Base();
            var d = new Derived();
            d.kind() + ':' + (d instanceof Base) + ':' + (d instanceof Derived)
        "#
        ),
        s("base:true:true")
    );
}

#[test]
fn test_new_without_arguments() {
    assert_eq!(eval("function F() { this.v = 7; } new F;  new F().v"), JsValue::Number(7.0));
}

#[test]
fn test_calling_non_function_is_type_error() {
    assert!(throws_error("var x = 1; x()", "x is not a function"));
    assert!(throws_error("var o = {}; o.missing()", "missing is not a function"));
    assert!(throws_error("new 5", "TypeError"));
}

#[test]
fn test_function_to_string_returns_source() {
    assert_eq!(
        eval("function add(a, b) { return a + b; } add.toString()"),
        s("function add(a, b) { return a + b; }")
    );
    assert_eq!(eval("String(function() {})"), s("function() {}"));
}

#[test]
fn test_native_function_to_string() {
    assert_eq!(eval("String(parseInt)"), s("function parseInt() { [native code] }"));
}

#[test]
fn test_function_constructor() {
    assert_eq!(eval("var add = new Function('a', 'b', 'return a + b'); add(2, 3)"), JsValue::Number(5.0));
    assert_eq!(eval("Function('return 42')()"), JsValue::Number(42.0));
}

#[test]
fn test_function_constructor_uses_global_scope() {
    assert_eq!(
        eval(
            r#"
            var where = 'global';
            function f() {
                var where = 'local';
                return Function('return where')();
            }
            f()
        "#
        ),
        s("global")
    );
}

#[test]
fn test_function_constructor_rejects_parenthesis_in_params() {
    assert!(throws_error("Function('a) { return 1; }; (function(b', 'return b')", "parenthesis"));
}

#[test]
fn test_functions_are_objects() {
    assert_eq!(eval("function f() {} f.extra = 3; f.extra"), JsValue::Number(3.0));
    assert_eq!(eval("typeof (function() {}).prototype"), s("object"));
    assert_eq!(eval("(function() {}) instanceof Function"), JsValue::Boolean(true));
}
