//! Async host function tests: pausing, resuming and delivering results

use std::cell::RefCell;
use std::rc::Rc;

use super::{s, test_config};
use stepjs::{AsyncCallback, Interpreter, JsValue, PropertyAttrs};

type Pending = Rc<RefCell<Option<(AsyncCallback, Vec<JsValue>)>>>;

/// Interpreter with a global `fetch` that parks its callback in `pending`
fn interpreter_with_fetch(source: &str, pending: &Pending) -> Interpreter {
    let slot = Rc::clone(pending);
    Interpreter::with_config(source, test_config(), move |interp, global| {
        let fetch = interp.create_async_function("fetch", 1, move |_interp, _this, args, callback| {
            *slot.borrow_mut() = Some((callback, args.to_vec()));
            Ok(())
        })?;
        interp.set_property(&JsValue::Object(global), "fetch", JsValue::Object(fetch), PropertyAttrs::NONE)
    })
    .unwrap()
}

#[test]
fn test_async_function_pauses_until_resolved() {
    let pending: Pending = Rc::default();
    let mut interp = interpreter_with_fetch("var r = fetch('key'); 'got ' + r", &pending);

    assert!(interp.run().unwrap());
    assert!(interp.is_paused());
    assert!(interp.step().unwrap());
    assert!(interp.is_paused());

    let (callback, args) = pending.borrow_mut().take().unwrap();
    assert_eq!(args, vec![s("key")]);
    callback.resolve(s("value"));

    assert!(!interp.run().unwrap());
    assert!(!interp.is_paused());
    assert_eq!(interp.value(), s("got value"));
}

#[test]
fn test_resolve_before_returning_does_not_stall() {
    let mut interp = Interpreter::with_config("now(1) + now(2)", test_config(), |interp, global| {
        let now = interp.create_async_function("now", 1, |interp, _this, args, callback| {
            let n = interp.to_number(args.first().unwrap_or(&JsValue::Undefined))?;
            callback.resolve(JsValue::Number(n * 10.0));
            Ok(())
        })?;
        interp.set_property(&JsValue::Object(global), "now", JsValue::Object(now), PropertyAttrs::NONE)
    })
    .unwrap();
    assert!(!interp.run().unwrap());
    assert_eq!(interp.value(), JsValue::Number(30.0));
}

#[test]
fn test_multiple_async_calls_in_a_loop() {
    let pending: Pending = Rc::default();
    let mut interp = interpreter_with_fetch(
        "var out = []; for (var i = 0; i < 3; i++) out.push(fetch(i)); out.join('-')",
        &pending,
    );
    let mut rounds = 0;
    while interp.run().unwrap() {
        let (callback, args) = pending.borrow_mut().take().unwrap();
        let n = match args.first() {
            Some(JsValue::Number(n)) => *n,
            _ => panic!("expected a number argument"),
        };
        callback.resolve(JsValue::Number(n * n));
        rounds += 1;
    }
    assert_eq!(rounds, 3);
    assert_eq!(interp.value(), s("0-1-4"));
}

#[test]
fn test_async_result_can_be_an_object() {
    let pending: Pending = Rc::default();
    let mut interp = interpreter_with_fetch("var o = fetch(); o.name", &pending);
    assert!(interp.run().unwrap());
    let (callback, _) = pending.borrow_mut().take().unwrap();
    let object = interp.native_to_guest(&serde_json::json!({"name": "remote"})).unwrap();
    callback.resolve(object);
    assert!(!interp.run().unwrap());
    assert_eq!(interp.value(), s("remote"));
}

#[test]
fn test_async_function_error_is_catchable() {
    let mut interp = Interpreter::with_config(
        "var r; try { broken(); } catch (e) { r = e.message; } r",
        test_config(),
        |interp, global| {
            let broken = interp.create_async_function("broken", 0, |interp, _this, _args, _callback| {
                Err(interp.throw_error("Error", "no connection"))
            })?;
            interp.set_property(&JsValue::Object(global), "broken", JsValue::Object(broken), PropertyAttrs::NONE)
        },
    )
    .unwrap();
    assert!(!interp.run().unwrap());
    assert_eq!(interp.value(), s("no connection"));
}

#[test]
fn test_host_reads_globals_after_resume() {
    let pending: Pending = Rc::default();
    let mut interp = interpreter_with_fetch("var payload = fetch(); var size = payload.items.length;", &pending);
    assert!(interp.run().unwrap());
    let (callback, _) = pending.borrow_mut().take().unwrap();
    let object = interp.native_to_guest(&serde_json::json!({"items": [1, 2, 3]})).unwrap();
    callback.resolve(object);
    assert!(!interp.run().unwrap());

    let global = JsValue::Object(interp.global_object());
    assert_eq!(interp.get_property(&global, "size").unwrap(), JsValue::Number(3.0));
    let payload = interp.get_property(&global, "payload").unwrap();
    assert!(payload.as_object().is_some());
    assert_eq!(interp.guest_to_native(&payload).unwrap(), serde_json::json!({"items": [1, 2, 3]}));
}
