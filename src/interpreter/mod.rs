//! Stepping interpreter for ES5 programs
//!
//! The interpreter owns an arena of objects, the global scope and an explicit
//! stack of [`Frame`]s. [`Interpreter::step`] performs one unit of work on the
//! top frame, so an embedder can run a guest program in slices, pause it while
//! an async host function is outstanding, or abandon it after a step budget.

// Builtin function implementations (one module per intrinsic)
pub mod builtins;

mod hoist;
pub mod stack;
mod step;
mod unwind;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::ast::{self, Node, Program};
use crate::error::JsError;
use crate::parser::parse_program;
use crate::prelude::ensure_sufficient_stack;
use crate::string_dict::StringDict;
use crate::value::{
    AsyncNativeFunction, CheapClone, FunctionKind, JsObject, JsString, JsValue, NativeFunction,
    ObjectData, ObjectId, ObjectKind, ScopeLink, array_index, compare_utf16,
};

use hoist::Declarations;
use stack::{Frame, FrameState, Slot};

// ═══════════════════════════════════════════════════════════════════════════════
// Configuration and host-facing types
// ═══════════════════════════════════════════════════════════════════════════════

/// Tunables for one interpreter instance
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Bound on prototype-chain and scope-chain walks
    pub max_chain_depth: usize,
    /// Bound on nested arrays and objects converted to strings or JSON
    pub max_nesting_depth: usize,
    /// Install the interpreted `Array.prototype` polyfills
    pub polyfills: bool,
    /// Seed for `Math.random`; taken from the clock when `None`
    pub random_seed: Option<u64>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: 10_000,
            max_nesting_depth: 512,
            polyfills: true,
            random_seed: None,
        }
    }
}

impl InterpreterConfig {
    pub fn max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }

    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn polyfills(mut self, enabled: bool) -> Self {
        self.polyfills = enabled;
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}

/// Completion handle given to async native functions.
///
/// Calling [`AsyncCallback::resolve`] supplies the call's result; the paused
/// interpreter picks it up on the next `step()` or `run()`.
#[derive(Clone, Default)]
pub struct AsyncCallback {
    slot: Rc<RefCell<Option<JsValue>>>,
}

impl AsyncCallback {
    pub fn resolve(&self, value: JsValue) {
        *self.slot.borrow_mut() = Some(value);
    }

    fn take(&self) -> Option<JsValue> {
        self.slot.borrow_mut().take()
    }
}

impl fmt::Debug for AsyncCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resolved = self.slot.borrow().is_some();
        write!(f, "AsyncCallback {{ resolved: {} }}", resolved)
    }
}

/// Anything the interpreter can run: source text or an already parsed program
pub trait IntoProgram {
    fn into_program(self) -> Result<Program, JsError>;
}

impl IntoProgram for Program {
    fn into_program(self) -> Result<Program, JsError> {
        Ok(self)
    }
}

impl IntoProgram for &str {
    fn into_program(self) -> Result<Program, JsError> {
        parse_program(self)
    }
}

impl IntoProgram for &String {
    fn into_program(self) -> Result<Program, JsError> {
        parse_program(self)
    }
}

impl IntoProgram for String {
    fn into_program(self) -> Result<Program, JsError> {
        parse_program(&self)
    }
}

/// Attribute flags applied when a property is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyAttrs {
    /// Can be neither overwritten nor deleted afterwards
    pub frozen: bool,
    /// Skipped by `for-in` and `Object.keys`
    pub hidden: bool,
}

impl PropertyAttrs {
    pub const NONE: PropertyAttrs = PropertyAttrs {
        frozen: false,
        hidden: false,
    };
    pub const HIDDEN: PropertyAttrs = PropertyAttrs {
        frozen: false,
        hidden: true,
    };
    pub const FROZEN: PropertyAttrs = PropertyAttrs {
        frozen: true,
        hidden: false,
    };
    pub const FROZEN_HIDDEN: PropertyAttrs = PropertyAttrs {
        frozen: true,
        hidden: true,
    };
}

/// Which primitive an object should convert to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    Number,
    String,
}

/// Placeholder for intrinsics that do not exist yet during bootstrap
const UNSET: ObjectId = ObjectId(u32::MAX);

/// Constructors the engine itself needs to reach
#[derive(Debug, Clone)]
pub(crate) struct Intrinsics {
    pub object: ObjectId,
    pub function: ObjectId,
    pub array: ObjectId,
    pub string: ObjectId,
    pub number: ObjectId,
    pub boolean: ObjectId,
    pub date: ObjectId,
    pub regexp: ObjectId,
    pub error: ObjectId,
    /// Error subclasses by name
    pub error_kinds: Vec<(&'static str, ObjectId)>,
}

impl Intrinsics {
    fn unset() -> Self {
        Self {
            object: UNSET,
            function: UNSET,
            array: UNSET,
            string: UNSET,
            number: UNSET,
            boolean: UNSET,
            date: UNSET,
            regexp: UNSET,
            error: UNSET,
            error_kinds: Vec::new(),
        }
    }

    fn error_constructor(&self, kind: &str) -> ObjectId {
        self.error_kinds
            .iter()
            .find(|(name, _)| *name == kind)
            .map(|(_, id)| *id)
            .unwrap_or(self.error)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Interpreter
// ═══════════════════════════════════════════════════════════════════════════════

/// The interpreter state
pub struct Interpreter {
    /// Every object, scope and function, addressed by `ObjectId`
    objects: Vec<JsObject>,
    /// Interned property names
    pub(crate) strings: StringDict,
    /// Pending frames; the last one is executing
    pub(crate) stack: Vec<Frame>,
    /// Global scope, which doubles as the global object
    global: ObjectId,
    pub(crate) intrinsics: Intrinsics,
    config: InterpreterConfig,
    /// Set while an async native function is outstanding
    paused: bool,
    pending: Option<AsyncCallback>,
    /// Set by an uncaught exception or fatal control flow
    terminated: bool,
    /// True while a native function runs as a constructor
    constructing: bool,
    rng_state: u64,
}

impl Interpreter {
    /// Create an interpreter for `code` with the default configuration.
    pub fn new(code: impl IntoProgram) -> Result<Self, JsError> {
        Self::with_config(code, InterpreterConfig::default(), |_, _| Ok(()))
    }

    /// Create an interpreter, letting `init` install host functions into the
    /// global scope before any guest code runs.
    pub fn with_init<F>(code: impl IntoProgram, init: F) -> Result<Self, JsError>
    where
        F: FnOnce(&mut Interpreter, ObjectId) -> Result<(), JsError>,
    {
        Self::with_config(code, InterpreterConfig::default(), init)
    }

    pub fn with_config<F>(
        code: impl IntoProgram,
        config: InterpreterConfig,
        init: F,
    ) -> Result<Self, JsError>
    where
        F: FnOnce(&mut Interpreter, ObjectId) -> Result<(), JsError>,
    {
        let program = code.into_program()?;
        let mut interp = Interpreter::bare(config);
        builtins::init_globals(&mut interp)?;
        if interp.config.polyfills {
            interp.run_polyfills()?;
        }
        let global = interp.global;
        init(&mut interp, global)?;
        interp.start(program)?;
        debug!(
            objects = interp.objects.len(),
            strict = interp.is_strict(),
            "interpreter ready"
        );
        Ok(interp)
    }

    fn bare(config: InterpreterConfig) -> Self {
        let seed = config.random_seed.unwrap_or_else(clock_seed);
        let mut interp = Interpreter {
            objects: Vec::new(),
            strings: StringDict::with_common_strings(),
            stack: Vec::new(),
            global: UNSET,
            intrinsics: Intrinsics::unset(),
            config,
            paused: false,
            pending: None,
            terminated: false,
            constructing: false,
            // xorshift state must be non-zero
            rng_state: seed | 1,
        };
        let mut global = JsObject::new(None, ObjectKind::Ordinary);
        global.scope = Some(ScopeLink {
            parent_scope: None,
            strict: false,
            object: None,
        });
        interp.global = interp.alloc(global);
        interp
    }

    fn start(&mut self, program: Program) -> Result<(), JsError> {
        let global = self.global;
        if program.is_strict() {
            if let Some(link) = self.object_mut(global)?.scope.as_mut() {
                link.strict = true;
            }
        }
        self.hoist_into(global, &program.body)?;
        let node = Rc::new(Node::Program(program));
        self.stack
            .push(Frame::with_scope(node, global, Some(JsValue::Object(global))));
        Ok(())
    }

    /// Run the polyfill program to completion on a scratch stack.
    fn run_polyfills(&mut self) -> Result<(), JsError> {
        let program = parse_program(builtins::polyfills::POLYFILLS)?;
        let global = self.global;
        let node = Rc::new(Node::Program(program));
        let scratch = vec![Frame::with_scope(node, global, Some(JsValue::Object(global)))];
        let saved = std::mem::replace(&mut self.stack, scratch);
        let mut result = Ok(());
        while self
            .stack
            .first()
            .is_some_and(|frame| !frame.is_finished_program())
        {
            if let Err(err) = self.dispatch() {
                result = Err(err);
                break;
            }
        }
        self.stack = saved;
        result.map_err(|err| JsError::internal_error(format!("polyfills failed: {}", err)))?;
        debug!("polyfills installed");
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Stepping
    // ═══════════════════════════════════════════════════════════════════════════

    /// Execute one step of the program.
    ///
    /// Returns `Ok(false)` once the program is exhausted. While paused on an
    /// async native this returns `Ok(true)` without doing anything.
    pub fn step(&mut self) -> Result<bool, JsError> {
        self.ensure_alive()?;
        self.poll_async();
        if self.paused {
            return Ok(true);
        }
        match self.stack.first() {
            Some(frame) if !frame.is_finished_program() => {}
            _ => return Ok(false),
        }
        match self.dispatch() {
            Ok(()) => Ok(true),
            Err(err) => Err(self.terminate(err)),
        }
    }

    /// Step until the program finishes or pauses.
    ///
    /// Returns `Ok(true)` when paused on an async native, `Ok(false)` when done.
    pub fn run(&mut self) -> Result<bool, JsError> {
        loop {
            self.poll_async();
            if self.paused {
                return Ok(true);
            }
            if !self.step()? {
                return Ok(false);
            }
        }
    }

    /// Add statements to the end of the running program.
    pub fn append_code(&mut self, code: impl IntoProgram) -> Result<(), JsError> {
        self.ensure_alive()?;
        let program = code.into_program()?;
        let global = self.global;
        self.hoist_into(global, &program.body)?;
        let Some(Frame {
            state: FrameState::Program { body, done, .. },
            ..
        }) = self.stack.first_mut()
        else {
            return Err(JsError::internal_error(
                "Expecting original AST to start with a Program node",
            ));
        };
        debug!(statements = program.body.len(), "append code");
        body.extend(program.body);
        *done = false;
        Ok(())
    }

    /// Completion value of the last expression statement of the program
    pub fn value(&self) -> JsValue {
        match self.stack.first() {
            Some(Frame {
                state: FrameState::Program { completion, .. },
                ..
            }) => completion.clone(),
            _ => JsValue::Undefined,
        }
    }

    /// True while an async native function has not delivered its result
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn global_scope(&self) -> ObjectId {
        self.global
    }

    /// The global object; the same object as the global scope
    pub fn global_object(&self) -> ObjectId {
        self.global
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// True while a native function was invoked through `new`
    pub fn is_constructing(&self) -> bool {
        self.constructing
    }

    fn ensure_alive(&self) -> Result<(), JsError> {
        if self.terminated {
            return Err(JsError::internal_error(
                "interpreter was terminated by an uncaught error",
            ));
        }
        Ok(())
    }

    /// Mark the interpreter dead and turn a leftover guest exception into a
    /// host error.
    fn terminate(&mut self, err: JsError) -> JsError {
        self.terminated = true;
        let err = match err {
            JsError::Exception(value) => self.promote_exception(value),
            other => other,
        };
        debug!(error = %err, "interpreter terminated");
        err
    }

    fn promote_exception(&self, value: JsValue) -> JsError {
        if let JsValue::Object(id) = value {
            if self.isa(id, self.intrinsics.error).unwrap_or(false) {
                let kind = self
                    .get_property(&value, "name")
                    .and_then(|v| self.to_string(&v))
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| "Error".to_string());
                let message = self
                    .get_property(&value, "message")
                    .and_then(|v| self.to_string(&v))
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                return JsError::RuntimeError { kind, message };
            }
        }
        let value = self
            .to_string(&value)
            .map(|s| s.to_string())
            .unwrap_or_else(|_| "exception".to_string());
        JsError::ThrownValue { value }
    }

    /// Deliver the result of a finished async native into the waiting frame.
    fn poll_async(&mut self) {
        if !self.paused {
            return;
        }
        let Some(value) = self.pending.as_ref().and_then(AsyncCallback::take) else {
            return;
        };
        debug!("async native resolved, resuming");
        self.pending = None;
        self.paused = false;
        if let Some(frame) = innermost_top(&mut self.stack) {
            frame.value = Slot::Value(value);
        }
    }

    pub(crate) fn pause_for(&mut self, callback: AsyncCallback) {
        debug!("paused on async native");
        self.paused = true;
        self.pending = Some(callback);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Object arena
    // ═══════════════════════════════════════════════════════════════════════════

    pub(crate) fn object(&self, id: ObjectId) -> Result<&JsObject, JsError> {
        self.objects
            .get(id.index())
            .ok_or_else(|| JsError::internal_error(format!("dangling object handle {}", id.0)))
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Result<&mut JsObject, JsError> {
        self.objects
            .get_mut(id.index())
            .ok_or_else(|| JsError::internal_error(format!("dangling object handle {}", id.0)))
    }

    fn alloc(&mut self, object: JsObject) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    /// Create an object made by `constructor`; objects made by `Array` (or
    /// anything inheriting from it) get array behavior.
    pub fn create_object(&mut self, constructor: Option<ObjectId>) -> Result<ObjectId, JsError> {
        let id = self.alloc(JsObject::new(constructor, ObjectKind::Ordinary));
        if constructor.is_some() && self.isa(id, self.intrinsics.array)? {
            self.object_mut(id)?.kind = ObjectKind::Array { length: 0 };
        }
        Ok(id)
    }

    pub fn create_array(&mut self) -> Result<ObjectId, JsError> {
        let array = self.intrinsics.array;
        self.create_object(Some(array))
    }

    pub fn create_array_from(&mut self, values: Vec<JsValue>) -> Result<ObjectId, JsError> {
        let id = self.create_array()?;
        for (index, value) in values.into_iter().enumerate() {
            let key = self.strings.index_key(index as u32);
            self.set_property(&JsValue::Object(id), key.as_str(), value, PropertyAttrs::NONE)?;
        }
        Ok(id)
    }

    /// Create a function object with a frozen, hidden `length`.
    pub(crate) fn create_function_object(
        &mut self,
        kind: FunctionKind,
        arity: u32,
    ) -> Result<ObjectId, JsError> {
        let function = self.intrinsics.function;
        let parent = if function == UNSET { None } else { Some(function) };
        let id = self.alloc(JsObject::new(parent, ObjectKind::Function(kind)));
        self.define(id, "length", JsValue::from(arity), PropertyAttrs::FROZEN_HIDDEN)?;
        Ok(id)
    }

    pub fn create_native_function<F>(
        &mut self,
        name: &str,
        arity: u32,
        func: F,
    ) -> Result<ObjectId, JsError>
    where
        F: Fn(&mut Interpreter, JsValue, &[JsValue]) -> Result<JsValue, JsError> + 'static,
    {
        let name = self.strings.get_or_insert(name);
        self.create_function_object(
            FunctionKind::Native(NativeFunction {
                name,
                func: Rc::new(func),
            }),
            arity,
        )
    }

    /// Create a host function that completes later through an [`AsyncCallback`].
    pub fn create_async_function<F>(
        &mut self,
        name: &str,
        arity: u32,
        func: F,
    ) -> Result<ObjectId, JsError>
    where
        F: Fn(&mut Interpreter, JsValue, &[JsValue], AsyncCallback) -> Result<(), JsError>
            + 'static,
    {
        let name = self.strings.get_or_insert(name);
        self.create_function_object(
            FunctionKind::Async(AsyncNativeFunction {
                name,
                func: Rc::new(func),
            }),
            arity,
        )
    }

    /// Create a closure over `scope`, with a fresh `prototype` object.
    pub(crate) fn create_interpreted_function(
        &mut self,
        func: Rc<ast::Function>,
        scope: ObjectId,
    ) -> Result<ObjectId, JsError> {
        let arity = func.params.len() as u32;
        let id = self.create_function_object(FunctionKind::Interpreted { func, scope }, arity)?;
        let object = self.intrinsics.object;
        let prototype = self.create_object(Some(object))?;
        self.define(prototype, "constructor", JsValue::Object(id), PropertyAttrs::HIDDEN)?;
        self.define(id, "prototype", JsValue::Object(prototype), PropertyAttrs::HIDDEN)?;
        Ok(id)
    }

    /// Install a native method as a hidden property of `target`.
    pub fn register_method<F>(
        &mut self,
        target: ObjectId,
        name: &str,
        func: F,
        arity: u32,
    ) -> Result<ObjectId, JsError>
    where
        F: Fn(&mut Interpreter, JsValue, &[JsValue]) -> Result<JsValue, JsError> + 'static,
    {
        let method = self.create_native_function(name, arity, func)?;
        self.define(target, name, JsValue::Object(method), PropertyAttrs::HIDDEN)?;
        Ok(method)
    }

    /// Create a guest Error object of the given kind (`"TypeError"`, ...).
    pub fn create_error(&mut self, kind: &str, message: &str) -> Result<ObjectId, JsError> {
        let constructor = self.intrinsics.error_constructor(kind);
        let error = self.create_object(Some(constructor))?;
        if !message.is_empty() {
            self.define(error, "message", JsValue::from(message), PropertyAttrs::HIDDEN)?;
        }
        Ok(error)
    }

    /// Build a guest exception natives can return, e.g.
    /// `Err(interp.throw_error("URIError", "URI malformed"))`.
    pub fn throw_error(&mut self, kind: &str, message: impl AsRef<str>) -> JsError {
        match self.create_error(kind, message.as_ref()) {
            Ok(error) => JsError::Exception(JsValue::Object(error)),
            Err(err) => err,
        }
    }

    /// The guest value a catchable error throws.
    pub(crate) fn error_to_value(&mut self, err: JsError) -> Result<JsValue, JsError> {
        if let JsError::Exception(value) = err {
            return Ok(value);
        }
        match err.guest_kind() {
            Some((kind, message)) => Ok(JsValue::Object(self.create_error(kind, &message)?)),
            None => Err(err),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Properties
    // ═══════════════════════════════════════════════════════════════════════════

    /// Read `name` from any value, following the prototype chain.
    pub fn get_property(&self, target: &JsValue, name: &str) -> Result<JsValue, JsError> {
        let start = match target {
            JsValue::Undefined | JsValue::Null => {
                return Err(JsError::type_error(format!(
                    "Cannot read property '{}' of {}",
                    name,
                    target.to_js_string()
                )));
            }
            JsValue::String(s) => {
                if name == "length" {
                    return Ok(JsValue::Number(s.utf16_len() as f64));
                }
                if let Some(index) = array_index(name) {
                    return Ok(string_unit_at(s, index as usize)
                        .map(JsValue::String)
                        .unwrap_or(JsValue::Undefined));
                }
                self.intrinsics.string
            }
            JsValue::Number(_) => self.intrinsics.number,
            JsValue::Boolean(_) => self.intrinsics.boolean,
            JsValue::Object(id) => {
                let object = self.object(*id)?;
                if let ObjectKind::Array { length } = object.kind {
                    if name == "length" {
                        return Ok(JsValue::from(length));
                    }
                }
                if let Some(value) = object.properties.get(name) {
                    return Ok(value.clone());
                }
                // `new String('ab')` answers length and indices like the primitive
                if let ObjectData::Primitive(inner @ JsValue::String(_)) = &object.data {
                    if name == "length" || array_index(name).is_some() {
                        return self.get_property(inner, name);
                    }
                }
                match object.parent {
                    Some(parent) => parent,
                    None => return Ok(JsValue::Undefined),
                }
            }
        };
        Ok(self
            .lookup_inherited(start, name)?
            .unwrap_or(JsValue::Undefined))
    }

    /// Walk constructor → `prototype` → constructor ... looking for `name`.
    fn lookup_inherited(
        &self,
        constructor: ObjectId,
        name: &str,
    ) -> Result<Option<JsValue>, JsError> {
        let mut current = Some(constructor);
        let mut depth = 0;
        while let Some(ctor) = current {
            depth += 1;
            if depth > self.config.max_chain_depth {
                return Err(JsError::range_error(
                    "Maximum prototype chain depth exceeded",
                ));
            }
            let Some(JsValue::Object(proto)) = self.object(ctor)?.properties.get("prototype")
            else {
                return Ok(None);
            };
            let proto = self.object(*proto)?;
            if let Some(value) = proto.properties.get(name) {
                return Ok(Some(value.clone()));
            }
            current = proto.parent;
        }
        Ok(None)
    }

    /// Write `name` on `target`.
    ///
    /// Writes to frozen names and to primitives are dropped silently. Array
    /// `length` and index writes keep the length consistent.
    pub fn set_property(
        &mut self,
        target: &JsValue,
        name: &str,
        value: JsValue,
        attrs: PropertyAttrs,
    ) -> Result<(), JsError> {
        match target {
            JsValue::Undefined | JsValue::Null => Err(JsError::type_error(format!(
                "Cannot set property '{}' of {}",
                name,
                target.to_js_string()
            ))),
            JsValue::Object(id) => self.define(*id, name, value, attrs),
            _ => Ok(()),
        }
    }

    pub(crate) fn define(
        &mut self,
        id: ObjectId,
        name: &str,
        value: JsValue,
        attrs: PropertyAttrs,
    ) -> Result<(), JsError> {
        let object = self.object(id)?;
        if object.fixed.contains(name) {
            return Ok(());
        }
        if object.is_array() && name == "length" {
            let length = self.to_number(&value)?;
            return self.set_array_length(id, length);
        }
        let key = self.strings.get_or_insert(name);
        let object = self.object_mut(id)?;
        if let ObjectKind::Array { length } = &mut object.kind {
            if let Some(index) = array_index(name) {
                if index >= *length {
                    *length = index + 1;
                }
            }
        }
        object.properties.insert(key.cheap_clone(), value);
        if attrs.frozen {
            object.fixed.insert(key.cheap_clone());
        }
        if attrs.hidden {
            object.nonenumerable.insert(key);
        }
        Ok(())
    }

    fn set_array_length(&mut self, id: ObjectId, length: f64) -> Result<(), JsError> {
        if length.fract() != 0.0 || !(0.0..=u32::MAX as f64).contains(&length) {
            return Err(JsError::range_error("Invalid array length"));
        }
        let new_length = length as u32;
        let object = self.object_mut(id)?;
        if let ObjectKind::Array { length } = &mut object.kind {
            if new_length < *length {
                object
                    .properties
                    .retain(|key, _| array_index(key.as_str()).is_none_or(|i| i < new_length));
            }
            *length = new_length;
        }
        Ok(())
    }

    /// Remove `name`; false when the property is frozen or an array `length`.
    pub fn delete_property(&mut self, target: &JsValue, name: &str) -> Result<bool, JsError> {
        match target {
            JsValue::Undefined | JsValue::Null => Err(JsError::type_error(format!(
                "Cannot convert {} to object",
                target.to_js_string()
            ))),
            JsValue::String(s) => Ok(name != "length"
                && array_index(name).is_none_or(|i| i as usize >= s.utf16_len())),
            JsValue::Object(id) => {
                let object = self.object_mut(*id)?;
                if object.fixed.contains(name) || (object.is_array() && name == "length") {
                    return Ok(false);
                }
                object.properties.shift_remove(name);
                object.nonenumerable.remove(name);
                Ok(true)
            }
            _ => Ok(true),
        }
    }

    /// The `in` operator: own or inherited.
    pub fn has_property(&self, target: &JsValue, name: &str) -> Result<bool, JsError> {
        let JsValue::Object(id) = target else {
            return Err(JsError::type_error(format!(
                "Cannot use 'in' operator to search for '{}' in {}",
                name,
                self.to_string(target)?
            )));
        };
        let object = self.object(*id)?;
        if object.properties.contains_key(name) || (object.is_array() && name == "length") {
            return Ok(true);
        }
        match object.parent {
            Some(parent) => Ok(self.lookup_inherited(parent, name)?.is_some()),
            None => Ok(false),
        }
    }

    pub fn has_own_property(&self, target: &JsValue, name: &str) -> Result<bool, JsError> {
        Ok(match target {
            JsValue::Object(id) => {
                let object = self.object(*id)?;
                object.properties.contains_key(name) || (object.is_array() && name == "length")
            }
            JsValue::String(s) => {
                name == "length" || array_index(name).is_some_and(|i| (i as usize) < s.utf16_len())
            }
            _ => false,
        })
    }

    /// `value instanceof constructor`
    pub fn is_instance_of(&self, value: &JsValue, constructor: ObjectId) -> Result<bool, JsError> {
        match value {
            JsValue::Object(id) => self.isa(*id, constructor),
            _ => Ok(false),
        }
    }

    /// Whether `constructor` appears on the constructor chain of `id`.
    pub(crate) fn isa(&self, id: ObjectId, constructor: ObjectId) -> Result<bool, JsError> {
        let mut current = self.object(id)?.parent;
        let mut depth = 0;
        while let Some(ctor) = current {
            if ctor == constructor {
                return Ok(true);
            }
            depth += 1;
            if depth > self.config.max_chain_depth {
                return Err(JsError::range_error(
                    "Maximum prototype chain depth exceeded",
                ));
            }
            let Some(JsValue::Object(proto)) = self.object(ctor)?.properties.get("prototype")
            else {
                return Ok(false);
            };
            current = self.object(*proto)?.parent;
        }
        Ok(false)
    }

    /// Own property names in insertion order, optionally only enumerable ones.
    pub fn own_keys(&self, id: ObjectId, enumerable_only: bool) -> Result<Vec<JsString>, JsError> {
        let object = self.object(id)?;
        Ok(object
            .properties
            .keys()
            .filter(|key| !enumerable_only || object.is_enumerable(key.as_str()))
            .cloned()
            .collect())
    }

    /// Names `for-in` visits: enumerable own names, then inherited ones not
    /// shadowed by an earlier object.
    pub(crate) fn enumerable_keys(&self, id: ObjectId) -> Result<Vec<JsString>, JsError> {
        let mut seen = crate::prelude::FxHashSet::default();
        let mut keys = Vec::new();
        let mut current = Some(id);
        let mut depth = 0;
        while let Some(object_id) = current {
            depth += 1;
            if depth > self.config.max_chain_depth {
                return Err(JsError::range_error(
                    "Maximum prototype chain depth exceeded",
                ));
            }
            let object = self.object(object_id)?;
            for key in object.properties.keys() {
                if seen.insert(key.cheap_clone()) && object.is_enumerable(key.as_str()) {
                    keys.push(key.cheap_clone());
                }
            }
            current = match object.parent {
                Some(ctor) => match self.object(ctor)?.properties.get("prototype") {
                    Some(JsValue::Object(proto)) => Some(*proto),
                    _ => None,
                },
                None => None,
            };
        }
        Ok(keys)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Scopes
    // ═══════════════════════════════════════════════════════════════════════════

    /// The scope of the innermost frame that entered one
    pub(crate) fn current_scope(&self) -> ObjectId {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| frame.scope)
            .unwrap_or(self.global)
    }

    /// `this` of the innermost function body or program
    pub(crate) fn current_this(&self) -> JsValue {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| frame.this_value.clone())
            .unwrap_or(JsValue::Object(self.global))
    }

    pub(crate) fn is_strict(&self) -> bool {
        self.object(self.current_scope())
            .ok()
            .and_then(|scope| scope.scope)
            .is_some_and(|link| link.strict)
    }

    /// A child scope; `object` makes a `with` scope backed by that object.
    pub(crate) fn create_scope(
        &mut self,
        parent_scope: ObjectId,
        strict: bool,
        object: Option<ObjectId>,
    ) -> Result<ObjectId, JsError> {
        let strict = strict
            || self
                .object(parent_scope)?
                .scope
                .is_some_and(|link| link.strict);
        let mut scope = JsObject::new(None, ObjectKind::Ordinary);
        scope.scope = Some(ScopeLink {
            parent_scope: Some(parent_scope),
            strict,
            object,
        });
        Ok(self.alloc(scope))
    }

    /// The object that holds the binding for `name`, if any scope has one.
    fn find_binding(&self, name: &str) -> Result<Option<ObjectId>, JsError> {
        let mut current = Some(self.current_scope());
        let mut depth = 0;
        while let Some(id) = current {
            depth += 1;
            if depth > self.config.max_chain_depth {
                return Err(JsError::range_error("Maximum scope chain depth exceeded"));
            }
            let scope = self.object(id)?;
            let link = scope.scope;
            match link.and_then(|link| link.object) {
                Some(target) => {
                    if self.has_property(&JsValue::Object(target), name)? {
                        return Ok(Some(target));
                    }
                }
                None => {
                    if scope.properties.contains_key(name) {
                        return Ok(Some(id));
                    }
                }
            }
            current = link.and_then(|link| link.parent_scope);
        }
        Ok(None)
    }

    /// Read a variable; unknown names are a ReferenceError.
    pub(crate) fn get_value_from_scope(&self, name: &str) -> Result<JsValue, JsError> {
        match self.find_binding(name)? {
            Some(holder) => self.get_property(&JsValue::Object(holder), name),
            None => Err(JsError::reference_error(name)),
        }
    }

    /// Like [`Self::get_value_from_scope`] but `None` for unknown names (`typeof x`).
    pub(crate) fn lookup_variable(&self, name: &str) -> Result<Option<JsValue>, JsError> {
        match self.find_binding(name)? {
            Some(holder) => self.get_property(&JsValue::Object(holder), name).map(Some),
            None => Ok(None),
        }
    }

    /// Assign a variable. Sloppy code creates an implicit global on a miss.
    pub(crate) fn set_value_to_scope(&mut self, name: &str, value: JsValue) -> Result<(), JsError> {
        let holder = match self.find_binding(name)? {
            Some(holder) => holder,
            None if self.is_strict() => return Err(JsError::reference_error(name)),
            None => self.global,
        };
        self.set_property(&JsValue::Object(holder), name, value, PropertyAttrs::NONE)
    }

    /// `delete name`
    pub(crate) fn delete_variable(&mut self, name: &str) -> Result<bool, JsError> {
        match self.find_binding(name)? {
            Some(holder) => self.delete_property(&JsValue::Object(holder), name),
            None => Ok(true),
        }
    }

    /// Declare hoisted `var`s (as undefined, keeping existing bindings) and
    /// function declarations (always rebound) in `scope`.
    pub(crate) fn hoist_into(&mut self, scope: ObjectId, body: &[Rc<Node>]) -> Result<(), JsError> {
        let decls = Declarations::collect(body);
        for name in decls.vars {
            if !self.object(scope)?.properties.contains_key(name.as_str()) {
                self.define(scope, name.as_str(), JsValue::Undefined, PropertyAttrs::NONE)?;
            }
        }
        for func in decls.functions {
            let Some(id) = func.id.clone() else {
                continue;
            };
            let closure = self.create_interpreted_function(func, scope)?;
            self.define(scope, id.name.as_str(), JsValue::Object(closure), PropertyAttrs::NONE)?;
        }
        Ok(())
    }

    /// Scope for one call of an interpreted function.
    pub(crate) fn create_call_scope(
        &mut self,
        func: &ast::Function,
        parent: ObjectId,
        args: &[JsValue],
    ) -> Result<ObjectId, JsError> {
        let body = func.body_statements();
        let scope = self.create_scope(parent, ast::has_use_strict(body), None)?;
        let arguments = self.create_array_from(args.to_vec())?;
        self.define(scope, "arguments", JsValue::Object(arguments), PropertyAttrs::NONE)?;
        for (index, param) in func.params.iter().enumerate() {
            let value = args.get(index).cloned().unwrap_or_default();
            self.define(scope, param.name.as_str(), value, PropertyAttrs::NONE)?;
        }
        self.hoist_into(scope, body)?;
        Ok(scope)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Conversions
    // ═══════════════════════════════════════════════════════════════════════════

    /// ToPrimitive without calling guest code: objects convert through their
    /// native payload or their native string form.
    pub fn to_primitive(&self, value: &JsValue, hint: PreferredType) -> Result<JsValue, JsError> {
        let JsValue::Object(id) = value else {
            return Ok(value.clone());
        };
        match &self.object(*id)?.data {
            ObjectData::Primitive(inner) => Ok(inner.clone()),
            ObjectData::Date(time) if hint == PreferredType::Number => Ok(JsValue::Number(*time)),
            _ => Ok(JsValue::String(self.to_string(value)?)),
        }
    }

    pub fn to_number(&self, value: &JsValue) -> Result<f64, JsError> {
        match value {
            JsValue::Object(_) => Ok(self.to_primitive(value, PreferredType::Number)?.to_number()),
            _ => Ok(value.to_number()),
        }
    }

    pub fn to_string(&self, value: &JsValue) -> Result<JsString, JsError> {
        match value {
            JsValue::Object(_) => Ok(JsString::from(self.nested_to_string(value, &mut Vec::new())?)),
            _ => Ok(value.to_js_string()),
        }
    }

    /// String conversion that tracks the objects already being converted.
    /// A cycle converts to the empty string; nesting deeper than
    /// `max_nesting_depth` is a RangeError.
    fn nested_to_string(&self, value: &JsValue, seen: &mut Vec<ObjectId>) -> Result<String, JsError> {
        let JsValue::Object(id) = value else {
            return Ok(value.to_js_string().to_string());
        };
        if seen.contains(id) {
            return Ok(String::new());
        }
        if seen.len() >= self.config.max_nesting_depth {
            return Err(JsError::range_error("Maximum nesting depth exceeded"));
        }
        seen.push(*id);
        let result = ensure_sufficient_stack(|| self.object_to_string(*id, seen));
        seen.pop();
        result
    }

    fn object_to_string(&self, id: ObjectId, seen: &mut Vec<ObjectId>) -> Result<String, JsError> {
        let object = self.object(id)?;
        match &object.data {
            ObjectData::Primitive(inner) => return Ok(inner.to_js_string().to_string()),
            ObjectData::Date(time) => return Ok(builtins::date::format_date(*time)),
            ObjectData::RegExp(re) => return Ok(format!("/{}/{}", re.source, re.flags())),
            ObjectData::None => {}
        }
        match &object.kind {
            ObjectKind::Array { .. } => self.join_array(id, ",", seen),
            ObjectKind::Function(kind) => Ok(function_source(kind)),
            ObjectKind::Ordinary => {
                if self.isa(id, self.intrinsics.error)? {
                    return self.error_parts(&JsValue::Object(id), seen);
                }
                Ok("[object Object]".to_string())
            }
        }
    }

    /// `name: message`, or just the name when the message is empty
    pub(crate) fn error_to_string(&self, error: &JsValue) -> Result<String, JsError> {
        let mut seen = Vec::new();
        if let JsValue::Object(id) = error {
            seen.push(*id);
        }
        self.error_parts(error, &mut seen)
    }

    fn error_parts(&self, error: &JsValue, seen: &mut Vec<ObjectId>) -> Result<String, JsError> {
        let name = match self.get_property(error, "name")? {
            JsValue::Undefined => "Error".to_string(),
            other => self.nested_to_string(&other, seen)?,
        };
        let message = match self.get_property(error, "message")? {
            JsValue::Undefined => String::new(),
            other => self.nested_to_string(&other, seen)?,
        };
        Ok(match (name.is_empty(), message.is_empty()) {
            (_, true) => name,
            (true, false) => message,
            (false, false) => format!("{}: {}", name, message),
        })
    }

    /// Join array elements; holes, `null` and `undefined` become empty strings.
    /// `seen` holds the arrays already being joined, `id` included.
    pub(crate) fn join_array(
        &self,
        id: ObjectId,
        separator: &str,
        seen: &mut Vec<ObjectId>,
    ) -> Result<String, JsError> {
        let length = self.array_length(&JsValue::Object(id))?;
        let mut out = String::new();
        for index in 0..length {
            if index > 0 {
                out.push_str(separator);
            }
            let element = self.get_property(&JsValue::Object(id), &index.to_string())?;
            match element {
                JsValue::Undefined | JsValue::Null => {}
                other => out.push_str(&self.nested_to_string(&other, seen)?),
            }
        }
        Ok(out)
    }

    /// `length` of an array-like, as a u32
    pub(crate) fn array_length(&self, value: &JsValue) -> Result<u32, JsError> {
        let length = self.get_property(value, "length")?;
        Ok(crate::value::to_uint32(self.to_number(&length)?))
    }

    pub fn type_of(&self, value: &JsValue) -> Result<&'static str, JsError> {
        Ok(match value {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Object(id) => {
                if self.object(*id)?.is_function() {
                    "function"
                } else {
                    "object"
                }
            }
        })
    }

    /// Abstract equality (==)
    pub fn loose_equals(&self, a: &JsValue, b: &JsValue) -> Result<bool, JsError> {
        Ok(match (a, b) {
            (JsValue::Object(x), JsValue::Object(y)) => x == y,
            (JsValue::Object(_), other) | (other, JsValue::Object(_))
                if other.is_null_or_undefined() =>
            {
                false
            }
            (JsValue::Object(_), other) => self
                .to_primitive(a, PreferredType::Default)?
                .loose_equals_primitive(other),
            (other, JsValue::Object(_)) => {
                other.loose_equals_primitive(&self.to_primitive(b, PreferredType::Default)?)
            }
            _ => a.loose_equals_primitive(b),
        })
    }

    /// Relational comparison: -1, 0, 1, or NaN when either side is NaN.
    pub fn compare(&self, a: &JsValue, b: &JsValue) -> Result<f64, JsError> {
        let a = self.to_primitive(a, PreferredType::Number)?;
        let b = self.to_primitive(b, PreferredType::Number)?;
        if let (JsValue::String(x), JsValue::String(y)) = (&a, &b) {
            return Ok(match compare_utf16(x.as_str(), y.as_str()) {
                std::cmp::Ordering::Less => -1.0,
                std::cmp::Ordering::Equal => 0.0,
                std::cmp::Ordering::Greater => 1.0,
            });
        }
        let (x, y) = (a.to_number(), b.to_number());
        Ok(if x.is_nan() || y.is_nan() {
            f64::NAN
        } else if x < y {
            -1.0
        } else if x > y {
            1.0
        } else {
            0.0
        })
    }

    /// Next value of the `Math.random` generator in `[0, 1)`.
    pub(crate) fn next_random(&mut self) -> f64 {
        // xorshift64*
        let mut x = self.rng_state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng_state = x;
        let bits = x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11;
        bits as f64 / (1u64 << 53) as f64
    }
}

/// Top frame of the innermost running stack, looking through `eval` frames.
fn innermost_top(stack: &mut [Frame]) -> Option<&mut Frame> {
    let nested = matches!(
        stack.last(),
        Some(Frame { state: FrameState::Eval { inner }, .. }) if !inner.is_empty()
    );
    let frame = stack.last_mut()?;
    if nested {
        match &mut frame.state {
            FrameState::Eval { inner } => innermost_top(inner),
            _ => None,
        }
    } else {
        Some(frame)
    }
}

/// One UTF-16 unit of `s` as a string
pub(crate) fn string_unit_at(s: &JsString, index: usize) -> Option<JsString> {
    s.as_str()
        .encode_utf16()
        .nth(index)
        .map(|unit| JsString::from(String::from_utf16_lossy(&[unit])))
}

/// What `String(fn)` prints
pub(crate) fn function_source(kind: &FunctionKind) -> String {
    match kind {
        FunctionKind::Interpreted { func, .. } => match &func.source {
            Some(source) => source.to_string(),
            None => {
                let name = func.id.as_ref().map(|id| id.name.as_str()).unwrap_or("");
                let params: Vec<&str> = func.params.iter().map(|p| p.name.as_str()).collect();
                format!("function {}({}) {{ [code] }}", name, params.join(", "))
            }
        },
        FunctionKind::Native(native) => {
            format!("function {}() {{ [native code] }}", native.name)
        }
        FunctionKind::Async(native) => {
            format!("function {}() {{ [native code] }}", native.name)
        }
        FunctionKind::Bound { .. } => "function () { [native code] }".to_string(),
        FunctionKind::Eval => "function eval() { [native code] }".to_string(),
        FunctionKind::Apply => "function apply() { [native code] }".to_string(),
        FunctionKind::Call => "function call() { [native code] }".to_string(),
    }
}

fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9E37_79B9_7F4A_7C15)
}
