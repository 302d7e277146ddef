//! Control flow tests: if/else, switch, loops, labels, try/catch/finally, with

use super::{eval, eval_result, s, throws_error};
use stepjs::{JsError, JsValue};

// -----------------------------------------------------------------------------
// Conditionals
// -----------------------------------------------------------------------------

#[test]
fn test_if_else() {
    assert_eq!(
        eval(
            r#"
            var result = 0;
            if (false) {
                result = 1;
            } else if (true) {
                result = 2;
            } else {
                result = 3;
            }
            result
        "#
        ),
        JsValue::Number(2.0)
    );
}

#[test]
fn test_switch_fallthrough() {
    assert_eq!(
        eval(
            r#"
            var log = '';
            switch (2) {
                case 1: log += 'one';
                case 2: log += 'two';
                case 3: log += 'three'; break;
                case 4: log += 'four';
            }
            log
        "#
        ),
        s("twothree")
    );
}

#[test]
fn test_switch_default_in_middle() {
    assert_eq!(
        eval(
            r#"
            var log = '';
            switch ('z') {
                case 'a': log += 'a';
                default: log += 'd';
                case 'b': log += 'b'; break;
            }
            log
        "#
        ),
        s("db")
    );
}

#[test]
fn test_switch_uses_strict_equality() {
    assert_eq!(
        eval("var r = 'none'; switch ('1') { case 1: r = 'number'; break; case '1': r = 'string'; } r"),
        s("string")
    );
}

// -----------------------------------------------------------------------------
// Loops
// -----------------------------------------------------------------------------

#[test]
fn test_for_loop() {
    assert_eq!(
        eval("var sum = 0; for (var i = 1; i <= 10; i++) { sum += i; } sum"),
        JsValue::Number(55.0)
    );
}

#[test]
fn test_while_and_do_while() {
    assert_eq!(eval("var n = 0; while (n < 5) n++; n"), JsValue::Number(5.0));
    assert_eq!(eval("var n = 10; do { n++; } while (n < 5); n"), JsValue::Number(11.0));
}

#[test]
fn test_break_and_continue() {
    assert_eq!(
        eval(
            r#"
            var odd = [];
            for (var i = 0; i < 10; i++) {
                if (i % 2 === 0) continue;
                if (i > 7) break;
                odd.push(i);
            }
            odd.join(',')
        "#
        ),
        s("1,3,5,7")
    );
}

#[test]
fn test_labeled_break_and_continue() {
    assert_eq!(
        eval(
            r#"
            var pairs = [];
            outer: for (var i = 0; i < 3; i++) {
                for (var j = 0; j < 3; j++) {
                    if (j === 1) continue outer;
                    if (i === 2) break outer;
                    pairs.push(i + ':' + j);
                }
            }
            pairs.join(' ')
        "#
        ),
        s("0:0 1:0")
    );
}

#[test]
fn test_break_out_of_labeled_block() {
    assert_eq!(
        eval("var x = 1; block: { x = 2; break block; x = 3; } x"),
        JsValue::Number(2.0)
    );
}

#[test]
fn test_for_in_own_and_inherited() {
    assert_eq!(
        eval(
            r#"
            function Base() { this.own = 1; }
            Base.prototype.inherited = 2;
            var keys = [];
            for (var k in new Base()) keys.push(k);
            keys.join(',')
        "#
        ),
        s("own,inherited")
    );
}

#[test]
fn test_for_in_skips_hidden_properties() {
    assert_eq!(
        eval("var keys = []; for (var k in [5, 6]) keys.push(k); keys.join(',')"),
        s("0,1")
    );
}

#[test]
fn test_for_in_with_member_target() {
    assert_eq!(
        eval("var o = {}; var seen = []; for (o.key in {a: 1, b: 2}) seen.push(o.key); seen.join('')"),
        s("ab")
    );
}

#[test]
fn test_for_in_over_null_does_nothing() {
    assert_eq!(eval("var n = 0; for (var k in null) n++; n"), JsValue::Number(0.0));
}

// -----------------------------------------------------------------------------
// Exceptions
// -----------------------------------------------------------------------------

#[test]
fn test_try_catch() {
    assert_eq!(
        eval("var r; try { throw 'boom'; } catch (e) { r = 'caught ' + e; } r"),
        s("caught boom")
    );
}

#[test]
fn test_catch_native_error() {
    assert_eq!(
        eval("var r; try { null.x; } catch (e) { r = e instanceof TypeError; } r"),
        JsValue::Boolean(true)
    );
    assert_eq!(
        eval("var r; try { missing(); } catch (e) { r = e.name; } r"),
        s("ReferenceError")
    );
}

#[test]
fn test_finally_runs_on_normal_completion_and_throw() {
    assert_eq!(
        eval(
            r#"
            var log = [];
            try { log.push('try'); } finally { log.push('finally'); }
            try {
                try { throw 1; } finally { log.push('inner'); }
            } catch (e) { log.push('caught' + e); }
            log.join(',')
        "#
        ),
        s("try,finally,inner,caught1")
    );
}

#[test]
fn test_finally_runs_when_returning() {
    assert_eq!(
        eval(
            r#"
            var log = [];
            function f() {
                try { return 'result'; } finally { log.push('cleanup'); }
            }
            f() + ':' + log.join()
        "#
        ),
        s("result:cleanup")
    );
}

#[test]
fn test_finally_runs_on_break_and_continue() {
    assert_eq!(
        eval(
            r#"
            var log = [];
            for (var i = 0; i < 3; i++) {
                try {
                    if (i === 0) continue;
                    if (i === 2) break;
                    log.push('body' + i);
                } finally {
                    log.push('f' + i);
                }
            }
            log.join(',')
        "#
        ),
        s("f0,body1,f1,f2")
    );
}

#[test]
fn test_throw_in_finally_replaces_pending_completion() {
    assert_eq!(
        eval(
            r#"
            var r;
            try {
                try { throw 'first'; } finally { throw 'second'; }
            } catch (e) { r = e; }
            r
        "#
        ),
        s("second")
    );
}

#[test]
fn test_rethrow_from_catch() {
    assert_eq!(
        eval(
            r#"
            var r;
            try {
                try { throw new Error('inner'); } catch (e) { throw new RangeError(e.message + '!'); }
            } catch (e) { r = e.name + ' ' + e.message; }
            r
        "#
        ),
        s("RangeError inner!")
    );
}

#[test]
fn test_uncaught_error_reaches_host() {
    let err = eval_result("throw new TypeError('bad thing')").unwrap_err();
    match err {
        JsError::RuntimeError { kind, message } => {
            assert_eq!(kind, "TypeError");
            assert_eq!(message, "bad thing");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_uncaught_value_reaches_host() {
    let err = eval_result("throw 42").unwrap_err();
    assert!(matches!(err, JsError::ThrownValue { value } if value == "42"));
}

#[test]
fn test_exception_unwinds_through_calls() {
    assert_eq!(
        eval(
            r#"
            function inner() { throw new Error('deep'); }
            function outer() { inner(); return 'not reached'; }
            var r;
            try { outer(); } catch (e) { r = e.message; }
            r
        "#
        ),
        s("deep")
    );
}

#[test]
fn test_illegal_break_is_fatal() {
    assert!(matches!(
        eval_result("break;").unwrap_err(),
        JsError::IllegalControlFlow("break")
    ));
}

#[test]
fn test_illegal_return_is_fatal() {
    assert!(throws_error("return 1;", "Illegal return"));
}

// -----------------------------------------------------------------------------
// with / debugger
// -----------------------------------------------------------------------------

#[test]
fn test_with_statement() {
    assert_eq!(
        eval(
            r#"
            var o = {a: 1, b: 2};
            var c = 3;
            var r;
            with (o) { r = a + b + c; a = 10; }
            r + ',' + o.a
        "#
        ),
        s("6,10")
    );
}

#[test]
fn test_debugger_is_noop() {
    assert_eq!(eval("debugger; 5"), JsValue::Number(5.0));
}
