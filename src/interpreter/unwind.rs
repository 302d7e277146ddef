//! Abrupt completions
//!
//! `throw`, `return`, `break` and `continue` search the stack downwards for the
//! frame that takes them, truncating everything above it. A `try` frame with a
//! `finally` block on the way intercepts the completion, runs the block and
//! resumes the completion afterwards.

use std::rc::Rc;

use crate::ast::Node;
use crate::error::JsError;
use crate::value::{JsString, JsValue};

use super::stack::{Completion, Frame, FrameState, Slot, TryPhase};
use super::{Interpreter, PropertyAttrs};

/// What a frame does with an abrupt completion passing through it
enum Target {
    /// Not interested, keep searching
    Pass,
    /// This frame takes the completion
    Stop,
    /// A `finally` block must run first
    Finally,
    /// A function boundary: the completion cannot cross it
    Fatal,
}

impl Interpreter {
    /// Throw `value` to the nearest handler. Returns the exception as an error
    /// when nothing on this stack catches it.
    pub(crate) fn unwind_throw(&mut self, value: JsValue) -> Result<(), JsError> {
        for index in (0..self.stack.len()).rev() {
            let Some(frame) = self.stack.get(index) else {
                continue;
            };
            let Node::TryStatement(stmt) = &*frame.node else {
                continue;
            };
            let FrameState::Try { phase, .. } = frame.state else {
                continue;
            };
            if phase == TryPhase::Block {
                if let Some(handler) = &stmt.handler {
                    let handler = handler.clone();
                    self.stack.truncate(index + 1);
                    self.set_try_phase(TryPhase::Handler, None);
                    let parent = self.current_scope();
                    let scope = self.create_scope(parent, false, None)?;
                    self.define(scope, handler.param.name.as_str(), value, PropertyAttrs::NONE)?;
                    self.stack
                        .push(Frame::with_scope(Rc::clone(&handler.body), scope, None));
                    return Ok(());
                }
            }
            if matches!(phase, TryPhase::Block | TryPhase::Handler) && stmt.finalizer.is_some() {
                self.stack.truncate(index + 1);
                return self.run_finalizer(Completion::Throw(value));
            }
        }
        Err(JsError::Exception(value))
    }

    /// Return `value` from the innermost function call.
    pub(crate) fn unwind_return(&mut self, value: JsValue) -> Result<(), JsError> {
        for index in (0..self.stack.len()).rev() {
            let Some(frame) = self.stack.get(index) else {
                continue;
            };
            if frame.is_call() {
                self.stack.truncate(index + 1);
                if let Some(call) = self.stack.last_mut() {
                    call.value = Slot::Value(value);
                }
                return Ok(());
            }
            if has_pending_finally(frame) {
                self.stack.truncate(index + 1);
                return self.run_finalizer(Completion::Return(value));
            }
        }
        Err(JsError::IllegalControlFlow("return"))
    }

    pub(crate) fn unwind_break(&mut self, label: Option<JsString>) -> Result<(), JsError> {
        for index in (0..self.stack.len()).rev() {
            let Some(frame) = self.stack.get(index) else {
                continue;
            };
            let takes_break = match &label {
                Some(label) => frame.labels.contains(label),
                None => {
                    frame.node.is_loop() || matches!(&*frame.node, Node::SwitchStatement(_))
                }
            };
            match classify(frame, takes_break) {
                Target::Pass => {}
                // The target itself finishes
                Target::Stop => {
                    self.stack.truncate(index + 1);
                    self.pop_with(Slot::Empty);
                    return Ok(());
                }
                Target::Finally => {
                    self.stack.truncate(index + 1);
                    return self.run_finalizer(Completion::Break(label));
                }
                Target::Fatal => break,
            }
        }
        Err(JsError::IllegalControlFlow("break"))
    }

    pub(crate) fn unwind_continue(&mut self, label: Option<JsString>) -> Result<(), JsError> {
        for index in (0..self.stack.len()).rev() {
            let Some(frame) = self.stack.get(index) else {
                continue;
            };
            let takes_continue = frame.node.is_loop()
                && label.as_ref().is_none_or(|label| frame.labels.contains(label));
            match classify(frame, takes_continue) {
                Target::Pass => {}
                // The loop goes on to its next iteration
                Target::Stop => {
                    self.stack.truncate(index + 1);
                    return Ok(());
                }
                Target::Finally => {
                    self.stack.truncate(index + 1);
                    return self.run_finalizer(Completion::Continue(label));
                }
                Target::Fatal => break,
            }
        }
        Err(JsError::IllegalControlFlow("continue"))
    }

    /// Resume a completion held while a `finally` block ran. `labels` are the
    /// labels of the `try` statement that held it, which has already been
    /// popped.
    pub(crate) fn resume_completion(
        &mut self,
        completion: Completion,
        labels: &[JsString],
    ) -> Result<(), JsError> {
        match completion {
            Completion::Throw(value) => self.unwind_throw(value),
            Completion::Return(value) => self.unwind_return(value),
            Completion::Break(Some(label)) if labels.contains(&label) => Ok(()),
            Completion::Break(label) => self.unwind_break(label),
            Completion::Continue(label) => self.unwind_continue(label),
        }
    }

    /// Switch the top `try` frame to its `finally` block, holding `completion`.
    fn run_finalizer(&mut self, completion: Completion) -> Result<(), JsError> {
        let finalizer = match self.stack.last().map(|frame| &*frame.node) {
            Some(Node::TryStatement(stmt)) => stmt.finalizer.clone(),
            _ => None,
        };
        let Some(finalizer) = finalizer else {
            return Err(JsError::internal_error("finally block expected"));
        };
        self.set_try_phase(TryPhase::Finalizer, Some(completion));
        self.stack.push(Frame::new(finalizer));
        Ok(())
    }

    fn set_try_phase(&mut self, next: TryPhase, completion: Option<Completion>) {
        if let Some(Frame {
            state: FrameState::Try { phase, pending },
            value,
            ..
        }) = self.stack.last_mut()
        {
            *phase = next;
            *pending = completion;
            *value = Slot::Empty;
        }
    }
}

/// A `try` frame whose `finally` block has not started yet
fn has_pending_finally(frame: &Frame) -> bool {
    let Node::TryStatement(stmt) = &*frame.node else {
        return false;
    };
    stmt.finalizer.is_some()
        && matches!(
            frame.state,
            FrameState::Try {
                phase: TryPhase::Block | TryPhase::Handler,
                ..
            }
        )
}

fn classify(frame: &Frame, is_target: bool) -> Target {
    if frame.is_call() {
        Target::Fatal
    } else if has_pending_finally(frame) {
        // A labeled `try` that is itself the target still runs its finally
        Target::Finally
    } else if is_target {
        Target::Stop
    } else {
        Target::Pass
    }
}
