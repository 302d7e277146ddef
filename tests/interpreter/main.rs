//! Integration tests for the interpreter, organized by feature
//!
//! These tests exercise the interpreter through the public API. Every
//! interpreter is built with a fixed `Math.random` seed so runs repeat.

mod array;
mod async_native;
mod basics;
mod control_flow;
mod error;
mod eval;
mod function;
mod global;
mod json;
mod number;
mod object;
mod regexp;
mod step;
mod string;

use stepjs::{Interpreter, InterpreterConfig, JsError, JsString, JsValue};

/// Configuration used by every helper
pub fn test_config() -> InterpreterConfig {
    InterpreterConfig::default().random_seed(0x5eed)
}

/// Build an interpreter for `source` without running it
pub fn create_interpreter(source: &str) -> Result<Interpreter, JsError> {
    Interpreter::with_config(source, test_config(), |_, _| Ok(()))
}

/// Evaluate `source` to completion and return its completion value
#[allow(clippy::expect_used)]
pub fn eval(source: &str) -> JsValue {
    eval_result(source).expect("eval failed")
}

/// Evaluate and return the Result for error testing
pub fn eval_result(source: &str) -> Result<JsValue, JsError> {
    let mut interp = create_interpreter(source)?;
    if interp.run()? {
        return Err(JsError::internal_error("test program paused"));
    }
    Ok(interp.value())
}

/// Step `source` at most `max_steps` times. Returns the number of steps
/// taken and whether the program finished within the budget.
#[allow(clippy::expect_used)]
pub fn run_steps(source: &str, max_steps: usize) -> (usize, bool) {
    let mut interp = create_interpreter(source).expect("program should parse");
    for taken in 0..max_steps {
        if !interp.step().expect("step failed") {
            return (taken, true);
        }
    }
    (max_steps, false)
}

/// Check that evaluation fails with an error whose message contains `needle`
pub fn throws_error(source: &str, needle: &str) -> bool {
    match eval_result(source) {
        Err(e) => e.to_string().contains(needle),
        Ok(_) => false,
    }
}

/// Shorthand for string results
pub fn s(value: &str) -> JsValue {
    JsValue::String(JsString::from(value))
}
