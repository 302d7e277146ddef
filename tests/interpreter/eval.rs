//! eval tests

use super::{eval, s, throws_error};
use stepjs::JsValue;

#[test]
fn test_eval_returns_completion_value() {
    assert_eq!(eval("eval('1 + 2')"), JsValue::Number(3.0));
    assert_eq!(eval("eval('var a = 1; if (a) { \"yes\"; } else { \"no\"; }')"), s("yes"));
    assert_eq!(eval("eval('')"), JsValue::Undefined);
}

#[test]
fn test_eval_non_string_is_returned_unchanged() {
    assert_eq!(eval("eval(5)"), JsValue::Number(5.0));
    assert_eq!(eval("var o = {}; eval(o) === o"), JsValue::Boolean(true));
    assert_eq!(eval("eval()"), JsValue::Undefined);
}

#[test]
fn test_eval_sees_caller_locals() {
    assert_eq!(
        eval("function f() { var local = 20; return eval('local + 1'); } f()"),
        JsValue::Number(21.0)
    );
    assert_eq!(eval("var n = 1; eval('n = n + 41'); n"), JsValue::Number(42.0));
}

#[test]
fn test_eval_declarations_stay_inside() {
    assert_eq!(eval("eval('var inner = 1; inner'); typeof inner"), s("undefined"));
    assert_eq!(eval("eval('function g() { return 7; } g()')"), JsValue::Number(7.0));
}

#[test]
fn test_eval_this_is_callers_this() {
    assert_eq!(
        eval("var o = {v: 9, m: function() { return eval('this.v'); }}; o.m()"),
        JsValue::Number(9.0)
    );
}

#[test]
fn test_throw_inside_eval_reaches_outer_try() {
    assert_eq!(
        eval("var r; try { eval('throw \"boom\"'); } catch (e) { r = 'caught ' + e; } r"),
        s("caught boom")
    );
    assert_eq!(
        eval("var r = eval('var x; try { throw 1; } catch (e) { x = e + 1; } x'); r"),
        JsValue::Number(2.0)
    );
}

#[test]
fn test_eval_parse_error_is_syntax_error() {
    assert_eq!(
        eval("var r; try { eval('var = ;'); } catch (e) { r = e instanceof SyntaxError; } r"),
        JsValue::Boolean(true)
    );
    assert!(throws_error("eval('{')", "SyntaxError"));
}

#[test]
fn test_nested_eval() {
    assert_eq!(eval("eval('eval(\"2 * 21\")')"), JsValue::Number(42.0));
}

#[test]
fn test_stray_jumps_in_eval_are_syntax_errors() {
    let program = "var r = [];
        try { eval('return 1'); } catch (e) { r.push(e.name); }
        for (var i = 0; i < 1; i++) {
            try { eval('break'); } catch (e) { r.push(e.message); }
            try { eval('continue'); } catch (e) { r.push(e.message); }
        }
        (function () { try { eval('return 2'); } catch (e) { r.push(e.name); } })();
        r.join()";
    assert_eq!(
        eval(program),
        s("SyntaxError,Illegal break statement,Illegal continue statement,SyntaxError")
    );
    // Jumps with a target inside the eval text are fine
    assert_eq!(
        eval("eval('var n = 0; for (;;) { if (++n > 3) break; } n')"),
        JsValue::Number(4.0)
    );
}

#[test]
fn test_deeply_nested_eval_text_is_syntax_error() {
    let depth = 5000;
    let program = format!(
        "var r; try {{ eval('{}1{}'); }} catch (e) {{ r = e.name + ': ' + e.message; }} r",
        "(".repeat(depth),
        ")".repeat(depth)
    );
    assert_eq!(eval(&program), s("SyntaxError: Maximum nesting depth exceeded"));
}
