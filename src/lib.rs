//! Sandboxed, single-stepping JavaScript (ES5) interpreter
//!
//! Guest code runs on an explicit frame stack instead of the host call stack,
//! so an embedder can execute it one step at a time, interleave it with other
//! work, abandon it after a step budget, or pause it while an async host
//! function computes its result.
//!
//! # Example
//!
//! ```
//! use stepjs::{Interpreter, JsValue};
//!
//! let mut interp = Interpreter::new("var x = 6; x * 7").unwrap();
//! interp.run().unwrap();
//! assert_eq!(interp.value(), JsValue::Number(42.0));
//! ```
//!
//! Host functions are installed through the init hook:
//!
//! ```
//! use stepjs::{Interpreter, JsValue, PropertyAttrs};
//!
//! let mut interp = Interpreter::with_init("double(21)", |interp, global| {
//!     let double = interp.create_native_function("double", 1, |interp, _this, args| {
//!         let n = interp.to_number(args.first().unwrap_or(&JsValue::Undefined))?;
//!         Ok(JsValue::Number(n * 2.0))
//!     })?;
//!     interp.set_property(&JsValue::Object(global), "double", JsValue::Object(double), PropertyAttrs::NONE)
//! })
//! .unwrap();
//! interp.run().unwrap();
//! assert_eq!(interp.value(), JsValue::Number(42.0));
//! ```

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod prelude;
pub mod string_dict;
pub mod value;

pub use ast::Program;
pub use error::{JsError, SourceLocation};
pub use interpreter::{AsyncCallback, Interpreter, InterpreterConfig, IntoProgram, PropertyAttrs};
pub use parser::parse_program;
pub use value::CheapClone;
pub use value::JsString;
pub use value::JsValue;
pub use value::ObjectId;

/// Run `source` to completion and return the value of its last expression
/// statement.
///
/// Code that calls async host functions cannot finish here; use
/// [`Interpreter`] directly for that.
pub fn run_source(source: &str) -> Result<JsValue, JsError> {
    let mut interp = Interpreter::new(source)?;
    if interp.run()? {
        return Err(JsError::internal_error(
            "program paused on an async function; drive it with Interpreter::run",
        ));
    }
    Ok(interp.value())
}
