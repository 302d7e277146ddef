//! Stepping tests: step budgets, append_code and configuration

use super::{create_interpreter, run_steps, s};
use stepjs::{Interpreter, InterpreterConfig, JsError, JsValue};

#[test]
fn test_short_program_finishes_within_budget() {
    let (steps, finished) = run_steps("var a = 1 + 2;", 1000);
    assert!(finished);
    assert!(steps > 1);
}

#[test]
fn test_infinite_loop_never_finishes() {
    let (steps, finished) = run_steps("while (true) {}", 5000);
    assert!(!finished);
    assert_eq!(steps, 5000);
}

#[test]
fn test_each_step_makes_progress() {
    let (small, _) = run_steps("1;", 1000);
    let (large, _) = run_steps("1; 2; 3; 4; 5; 6; 7; 8;", 1000);
    assert!(large > small);
}

#[test]
fn test_step_after_finish_returns_false() {
    let mut interp = create_interpreter("1 + 1").unwrap();
    while interp.step().unwrap() {}
    assert!(!interp.step().unwrap());
    assert!(!interp.run().unwrap());
    assert_eq!(interp.value(), JsValue::Number(2.0));
}

#[test]
fn test_value_tracks_last_expression_statement() {
    let mut interp = create_interpreter("var x = 1; x + 1; var y = 5;").unwrap();
    interp.run().unwrap();
    assert_eq!(interp.value(), JsValue::Number(2.0));
}

#[test]
fn test_append_code_continues_program() {
    let mut interp = create_interpreter("var total = 10;").unwrap();
    assert!(!interp.run().unwrap());
    interp.append_code("total += 5; total").unwrap();
    assert!(!interp.run().unwrap());
    assert_eq!(interp.value(), JsValue::Number(15.0));
}

#[test]
fn test_append_code_hoists_functions() {
    let mut interp = create_interpreter("var seen = typeof later;").unwrap();
    interp.run().unwrap();
    interp
        .append_code("function later() { return 'ok'; } seen + ':' + later()")
        .unwrap();
    interp.run().unwrap();
    assert_eq!(interp.value(), s("undefined:ok"));
}

#[test]
fn test_append_code_syntax_error_leaves_program_intact() {
    let mut interp = create_interpreter("var kept = 3;").unwrap();
    interp.run().unwrap();
    assert!(matches!(interp.append_code("kept +"), Err(JsError::SyntaxError { .. })));
    interp.append_code("kept").unwrap();
    interp.run().unwrap();
    assert_eq!(interp.value(), JsValue::Number(3.0));
}

#[test]
fn test_interleaved_interpreters() {
    let mut a = create_interpreter("var n = 0; for (var i = 0; i < 10; i++) n += i; n").unwrap();
    let mut b = create_interpreter("var m = 1; for (var j = 0; j < 5; j++) m *= 2; m").unwrap();
    let (mut a_live, mut b_live) = (true, true);
    while a_live || b_live {
        if a_live {
            a_live = a.step().unwrap();
        }
        if b_live {
            b_live = b.step().unwrap();
        }
    }
    assert_eq!(a.value(), JsValue::Number(45.0));
    assert_eq!(b.value(), JsValue::Number(32.0));
}

#[test]
fn test_polyfills_can_be_disabled() {
    let mut with = create_interpreter("typeof [].map").unwrap();
    with.run().unwrap();
    assert_eq!(with.value(), s("function"));

    let mut without = Interpreter::with_config(
        "typeof [].map",
        InterpreterConfig::default().polyfills(false),
        |_, _| Ok(()),
    )
    .unwrap();
    without.run().unwrap();
    assert_eq!(without.value(), s("undefined"));
}

#[test]
fn test_init_hook_error_aborts_construction() {
    let result = Interpreter::with_init("1", |interp, _global| {
        Err(interp.throw_error("TypeError", "init failed"))
    });
    assert!(result.is_err());
}
