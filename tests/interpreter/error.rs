//! Error tests: the Error hierarchy, guest-visible messages and host errors

use super::{eval, eval_result, s, throws_error};
use stepjs::{JsError, JsValue};

#[test]
fn test_error_properties() {
    assert_eq!(
        eval("var e = new Error('oops'); e.name + '|' + e.message + '|' + e"),
        s("Error|oops|Error: oops")
    );
    assert_eq!(eval("String(new Error())"), s("Error"));
    assert_eq!(eval("new TypeError('t').toString()"), s("TypeError: t"));
}

#[test]
fn test_error_without_new() {
    assert_eq!(eval("var e = RangeError('r'); (e instanceof RangeError) + e.message"), s("truer"));
}

#[test]
fn test_error_subclass_chain() {
    assert_eq!(
        eval(
            r#"
            var e = new URIError('u');
            [e instanceof URIError, e instanceof Error, e instanceof TypeError,
             e instanceof Object].join(',')
        "#
        ),
        s("true,true,false,true")
    );
}

#[test]
fn test_all_native_error_types_exist() {
    assert_eq!(
        eval(
            r#"
            [EvalError, RangeError, ReferenceError, SyntaxError, TypeError, URIError]
                .map(function(E) { return new E('m').name; }).join(',')
        "#
        ),
        s("EvalError,RangeError,ReferenceError,SyntaxError,TypeError,URIError")
    );
}

#[test]
fn test_custom_error_name_and_message() {
    assert_eq!(
        eval("var e = new Error('m'); e.name = 'Custom'; String(e)"),
        s("Custom: m")
    );
    assert_eq!(
        eval("var e = new Error(''); e.name = ''; e.message = 'only'; e.toString()"),
        s("only")
    );
}

#[test]
fn test_message_is_not_enumerable() {
    assert_eq!(eval("Object.keys(new Error('hidden')).length"), JsValue::Number(0.0));
}

#[test]
fn test_engine_errors_are_guest_errors() {
    assert_eq!(
        eval(
            r#"
            var names = [];
            try { undefinedThing; } catch (e) { names.push(e.name + ':' + e.message); }
            try { null.prop; } catch (e) { names.push(e.name); }
            try { [].length = -1; } catch (e) { names.push(e.name); }
            try { eval('1 +'); } catch (e) { names.push(e.name); }
            names.join(' ')
        "#
        ),
        s("ReferenceError:undefinedThing is not defined TypeError RangeError SyntaxError")
    );
}

#[test]
fn test_uncaught_error_kinds() {
    match eval_result("undefinedThing").unwrap_err() {
        JsError::RuntimeError { kind, message } => {
            assert_eq!(kind, "ReferenceError");
            assert_eq!(message, "undefinedThing is not defined");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    let err = eval_result("throw new RangeError('too big')").unwrap_err();
    assert_eq!(err.to_string(), "RangeError: too big");
}

#[test]
fn test_uncaught_plain_object() {
    let err = eval_result("throw {code: 1}").unwrap_err();
    assert_eq!(err.to_string(), "Uncaught [object Object]");
}

#[test]
fn test_syntax_error_reports_location() {
    match eval_result("var x = ;").unwrap_err() {
        JsError::SyntaxError { location, .. } => {
            assert_eq!(location.line, 1);
            assert_eq!(location.column, 9);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_interpreter_is_dead_after_uncaught_error() {
    let mut interp = super::create_interpreter("throw 1").unwrap();
    assert!(interp.run().is_err());
    let err = interp.step().unwrap_err();
    assert!(matches!(err, JsError::Internal(_)));
}

#[test]
fn test_throw_error_from_native() {
    use stepjs::{Interpreter, PropertyAttrs};
    let mut interp = Interpreter::with_init(
        "var r; try { fail(); } catch (e) { r = e.name + ':' + e.message; } r",
        |interp, global| {
            let fail = interp.create_native_function("fail", 0, |interp, _this, _args| {
                Err(interp.throw_error("URIError", "from the host"))
            })?;
            interp.set_property(&JsValue::Object(global), "fail", JsValue::Object(fail), PropertyAttrs::NONE)
        },
    )
    .unwrap();
    interp.run().unwrap();
    assert_eq!(interp.value(), s("URIError:from the host"));
}

#[test]
fn test_type_error_from_native_is_catchable() {
    assert!(throws_error("Object.defineProperty(1, 'x', {})", "TypeError"));
    assert_eq!(
        eval("var r; try { Object.keys(null); } catch (e) { r = e instanceof TypeError; } r"),
        JsValue::Boolean(true)
    );
}
