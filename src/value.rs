//! JavaScript value representation
//!
//! Primitives live inline in [`JsValue`]; everything else is a [`JsObject`]
//! stored in the interpreter's object arena and addressed by [`ObjectId`].

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Deserializer};

use crate::ast;
use crate::error::JsError;
use crate::interpreter::{AsyncCallback, Interpreter};
use crate::prelude::{FxHashSet, IndexMap, index_map_new, math};

/// Trait for types that have cheap (O(1), reference-counted) clones.
///
/// Makes it explicit at call sites when a clone is only a reference count bump.
pub trait CheapClone: Clone {
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

impl<T: ?Sized> CheapClone for Rc<T> {}

/// Handle to an object in the interpreter's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A JavaScript value
#[derive(Clone, Default)]
pub enum JsValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Object(ObjectId),
}

impl JsValue {
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, JsValue::Null | JsValue::Undefined)
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, JsValue::Object(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, JsValue::String(_))
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            JsValue::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Convert to boolean (ToBoolean)
    pub fn to_boolean(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::String(s) => !s.is_empty(),
            JsValue::Object(_) => true,
        }
    }

    /// ToNumber for primitives. Objects need the interpreter
    /// (`Interpreter::to_number`) and give NaN here.
    pub fn to_number(&self) -> f64 {
        match self {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Boolean(true) => 1.0,
            JsValue::Boolean(false) => 0.0,
            JsValue::Number(n) => *n,
            JsValue::String(s) => string_to_number(s.as_str()),
            JsValue::Object(_) => f64::NAN,
        }
    }

    /// ToString for primitives. Objects need the interpreter
    /// (`Interpreter::to_string`) and give `[object Object]` here.
    pub fn to_js_string(&self) -> JsString {
        match self {
            JsValue::Undefined => JsString::from("undefined"),
            JsValue::Null => JsString::from("null"),
            JsValue::Boolean(true) => JsString::from("true"),
            JsValue::Boolean(false) => JsString::from("false"),
            JsValue::Number(n) => JsString::from(number_to_string(*n)),
            JsValue::String(s) => s.cheap_clone(),
            JsValue::Object(_) => JsString::from("[object Object]"),
        }
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            // NaN !== NaN falls out of IEEE comparison
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => a == b,
            _ => false,
        }
    }

    /// Abstract equality (==) between two primitives
    pub fn loose_equals_primitive(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => true,
            (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => {
                false
            }
            (JsValue::Number(_), JsValue::String(_))
            | (JsValue::String(_), JsValue::Number(_))
            | (JsValue::Boolean(_), _)
            | (_, JsValue::Boolean(_)) => self.to_number() == other.to_number(),
            _ => self.strict_equals(other),
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::Number(n) => write!(f, "{}", number_to_string(*n)),
            JsValue::String(s) => write!(f, "\"{}\"", s.as_str()),
            JsValue::Object(id) => write!(f, "[object #{}]", id.0),
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        JsValue::Number(n as f64)
    }
}

impl From<u32> for JsValue {
    fn from(n: u32) -> Self {
        JsValue::Number(n as f64)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<JsString> for JsValue {
    fn from(s: JsString) -> Self {
        JsValue::String(s)
    }
}

impl From<ObjectId> for JsValue {
    fn from(id: ObjectId) -> Self {
        JsValue::Object(id)
    }
}

/// Reference-counted string for efficient string handling
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<str>);

impl CheapClone for JsString {}

impl JsString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in UTF-16 code units, which is what guest `length` reports
    pub fn utf16_len(&self) -> usize {
        self.0.encode_utf16().count()
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(s.into())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString(s.into())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add<&JsString> for JsString {
    type Output = JsString;

    fn add(self, other: &JsString) -> JsString {
        let mut s = String::with_capacity(self.0.len() + other.0.len());
        s.push_str(&self.0);
        s.push_str(&other.0);
        JsString::from(s)
    }
}

impl<'de> Deserialize<'de> for JsString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(JsString::from)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Heap objects
// ═══════════════════════════════════════════════════════════════════════════════

/// An object in the arena.
///
/// Properties keep insertion order. Attribute flags are stored as name sets
/// beside the map rather than per-property records.
#[derive(Debug)]
pub struct JsObject {
    pub properties: IndexMap<JsString, JsValue>,
    /// Names that can be neither overwritten nor deleted
    pub fixed: FxHashSet<JsString>,
    /// Names skipped by `for-in` and `Object.keys`
    pub nonenumerable: FxHashSet<JsString>,
    /// The constructor this object was made by; its `prototype` property is
    /// where lookups continue
    pub parent: Option<ObjectId>,
    pub data: ObjectData,
    pub kind: ObjectKind,
    /// Present when the object serves as a scope
    pub scope: Option<ScopeLink>,
}

impl JsObject {
    pub fn new(parent: Option<ObjectId>, kind: ObjectKind) -> Self {
        Self {
            properties: index_map_new(),
            fixed: FxHashSet::default(),
            nonenumerable: FxHashSet::default(),
            parent,
            data: ObjectData::None,
            kind,
            scope: None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array { .. })
    }

    pub fn function(&self) -> Option<&FunctionKind> {
        match &self.kind {
            ObjectKind::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn is_enumerable(&self, name: &str) -> bool {
        !self.nonenumerable.contains(name)
    }
}

/// Shape of an object that affects property access
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Ordinary,
    /// `length` is kept outside the property map
    Array { length: u32 },
    Function(FunctionKind),
}

/// Internal payload of boxed primitives, dates and regexps
#[derive(Debug, Clone, Default)]
pub enum ObjectData {
    #[default]
    None,
    /// `new Number(1)`, `new String('a')`, `new Boolean(true)`
    Primitive(JsValue),
    /// Milliseconds since the epoch, NaN for an invalid date
    Date(f64),
    RegExp(Rc<RegExpData>),
}

#[derive(Debug)]
pub struct RegExpData {
    pub source: String,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    #[cfg(feature = "regex")]
    pub regex: fancy_regex::Regex,
}

impl RegExpData {
    pub fn flags(&self) -> String {
        let mut flags = String::new();
        if self.global {
            flags.push('g');
        }
        if self.ignore_case {
            flags.push('i');
        }
        if self.multiline {
            flags.push('m');
        }
        flags
    }
}

/// Scope data carried by objects that act as environments
#[derive(Debug, Clone, Copy)]
pub struct ScopeLink {
    /// Enclosing scope; `None` for the global scope
    pub parent_scope: Option<ObjectId>,
    pub strict: bool,
    /// For `with` scopes: the object whose properties are the bindings
    pub object: Option<ObjectId>,
}

/// Signature of host functions callable from guest code
pub type NativeFn = dyn Fn(&mut Interpreter, JsValue, &[JsValue]) -> Result<JsValue, JsError>;

/// Signature of host functions that complete later through an [`AsyncCallback`]
pub type AsyncNativeFn =
    dyn Fn(&mut Interpreter, JsValue, &[JsValue], AsyncCallback) -> Result<(), JsError>;

#[derive(Clone)]
pub struct NativeFunction {
    pub name: JsString,
    pub func: Rc<NativeFn>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[native {}]", self.name)
    }
}

#[derive(Clone)]
pub struct AsyncNativeFunction {
    pub name: JsString,
    pub func: Rc<AsyncNativeFn>,
}

impl fmt::Debug for AsyncNativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[async native {}]", self.name)
    }
}

/// What happens when a function object is called
#[derive(Debug, Clone)]
pub enum FunctionKind {
    /// Guest function: its AST plus the scope it was created in
    Interpreted {
        func: Rc<ast::Function>,
        scope: ObjectId,
    },
    Native(NativeFunction),
    Async(AsyncNativeFunction),
    /// Result of `bind`
    Bound {
        target: ObjectId,
        this_arg: JsValue,
        args: Rc<[JsValue]>,
    },
    /// The global `eval`
    Eval,
    /// `Function.prototype.apply`, which re-targets the pending call
    Apply,
    /// `Function.prototype.call`
    Call,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Numeric conversions
// ═══════════════════════════════════════════════════════════════════════════════

/// Number to string as guest code sees it (`1e21`, `0.000001`, `-0` prints `0`).
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    // `{:e}` yields the shortest round-tripping digits, e.g. "1.2345e6"
    let sci = format!("{:e}", n.abs());
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let point = exponent + 1;

    let body = if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int_part, frac_part) = digits.split_at(point as usize);
        format!("{}.{}", int_part, frac_part)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let sign = if point - 1 >= 0 { "+" } else { "-" };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, (point - 1).abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, (point - 1).abs())
        }
    };

    if n < 0.0 { format!("-{}", body) } else { body }
}

/// String to number (ToNumber on a string)
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return f64::NAN;
        }
        return hex
            .chars()
            .filter_map(|c| c.to_digit(16))
            .fold(0.0, |acc, d| acc * 16.0 + d as f64);
    }
    let unsigned = trimmed
        .strip_prefix('+')
        .or_else(|| trimmed.strip_prefix('-'))
        .unwrap_or(trimmed);
    if unsigned == "Infinity" {
        return if trimmed.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    // Rust also accepts "inf" and "nan", which guest code must not
    if !unsigned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        || !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.')
    {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Whitespace and line terminators as `trim` and ToNumber understand them
pub fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}' | '\u{000A}' | '\u{000B}' | '\u{000C}' | '\u{000D}' | '\u{0020}' | '\u{00A0}'
            | '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{2028}' | '\u{2029}' | '\u{202F}'
            | '\u{205F}' | '\u{3000}' | '\u{FEFF}'
    )
}

/// String order by UTF-16 code units, the order `<` and `sort` use
pub fn compare_utf16(a: &str, b: &str) -> std::cmp::Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// Canonical array index for a property name: `"3"` yes, `"03"` or `"3.0"` no
pub fn array_index(name: &str) -> Option<u32> {
    if name.is_empty() || (name.len() > 1 && name.starts_with('0')) {
        return None;
    }
    if !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // 2^32 - 1 is a valid length but not a valid index
    name.parse::<u32>().ok().filter(|i| *i != u32::MAX)
}

/// ToInt32
pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// ToUint32
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let truncated = math::trunc(n);
    math::rem_euclid(truncated, 4_294_967_296.0) as u32
}

/// ToInteger: NaN becomes 0, otherwise truncate toward zero
pub fn to_integer(n: f64) -> f64 {
    if n.is_nan() { 0.0 } else { math::trunc(n) }
}
