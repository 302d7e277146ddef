//! Error types for the interpreter

use thiserror::Error;

use crate::value::JsValue;

/// Source location information for error messages
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Main error type for the interpreter
///
/// The first group of variants are guest errors in flight: natives and the
/// object model return them with `?` and the engine turns them into guest
/// Error objects that a `try` frame can catch. The rest are host-level
/// outcomes that end the current `step()`/`run()`.
#[derive(Debug, Error)]
pub enum JsError {
    #[error("SyntaxError: {message} at {location}")]
    SyntaxError {
        message: String,
        location: SourceLocation,
    },

    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("ReferenceError: {name} is not defined")]
    ReferenceError { name: String },

    #[error("RangeError: {message}")]
    RangeError { message: String },

    /// A guest value being thrown
    #[error("Uncaught exception")]
    Exception(JsValue),

    /// An uncaught guest Error, promoted to the host
    #[error("{kind}: {message}")]
    RuntimeError { kind: String, message: String },

    /// An uncaught guest value that is not an Error object
    #[error("Uncaught {value}")]
    ThrownValue { value: String },

    /// break/continue/return with no enclosing target
    #[error("SyntaxError: Illegal {0} statement")]
    IllegalControlFlow(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl JsError {
    pub fn syntax_error(message: impl Into<String>, line: u32, column: u32) -> Self {
        JsError::SyntaxError {
            message: message.into(),
            location: SourceLocation { line, column },
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        JsError::TypeError {
            message: message.into(),
        }
    }

    pub fn reference_error(name: impl Into<String>) -> Self {
        JsError::ReferenceError { name: name.into() }
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        JsError::RangeError {
            message: message.into(),
        }
    }

    /// Create an internal error for API misuse or broken engine state
    pub fn internal_error(message: impl Into<String>) -> Self {
        JsError::Internal(message.into())
    }

    /// Whether a guest `try` may intercept this error
    pub fn is_catchable(&self) -> bool {
        matches!(
            self,
            JsError::SyntaxError { .. }
                | JsError::TypeError { .. }
                | JsError::ReferenceError { .. }
                | JsError::RangeError { .. }
                | JsError::Exception(_)
        )
    }

    /// Guest constructor name and message for the catchable variants
    pub fn guest_kind(&self) -> Option<(&'static str, String)> {
        match self {
            JsError::SyntaxError { message, .. } => Some(("SyntaxError", message.clone())),
            JsError::TypeError { message } => Some(("TypeError", message.clone())),
            JsError::ReferenceError { name } => {
                Some(("ReferenceError", format!("{} is not defined", name)))
            }
            JsError::RangeError { message } => Some(("RangeError", message.clone())),
            _ => None,
        }
    }
}
