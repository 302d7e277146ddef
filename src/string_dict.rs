//! Interning for property names and identifiers.
//!
//! Every property key in the object arena is a `JsString`. Routing keys through
//! one dictionary means `"length"` or `"prototype"` is allocated once per
//! interpreter, and the parser and the runtime hand out the same `Rc<str>`.

use crate::prelude::FxHashMap;
use crate::value::{CheapClone, JsString};

/// Array indices below this bound get a pre-rendered key.
const INDEX_CACHE_SIZE: u32 = 256;

/// A dictionary for deduplicating JsString instances.
pub struct StringDict {
    strings: FxHashMap<Box<str>, JsString>,
    /// `"0"`, `"1"`, ... for the most common array index keys
    indices: Vec<JsString>,
}

impl StringDict {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self {
            strings: FxHashMap::default(),
            indices: Vec::new(),
        }
    }

    /// Create a dictionary pre-populated with common strings.
    pub fn with_common_strings() -> Self {
        let mut dict = Self::new();
        for s in COMMON_STRINGS {
            dict.get_or_insert(s);
        }
        dict.indices = (0..INDEX_CACHE_SIZE)
            .map(|i| JsString::from(i.to_string()))
            .collect();
        dict
    }

    /// Get an existing string or insert a new one.
    pub fn get_or_insert(&mut self, s: &str) -> JsString {
        if let Some(existing) = self.strings.get(s) {
            return existing.cheap_clone();
        }
        let js_str = JsString::from(s);
        self.strings.insert(s.into(), js_str.cheap_clone());
        js_str
    }

    /// Property key for an array index.
    pub fn index_key(&mut self, index: u32) -> JsString {
        match self.indices.get(index as usize) {
            Some(key) => key.cheap_clone(),
            None => JsString::from(index.to_string()),
        }
    }

    /// Get an existing string without inserting.
    pub fn get(&self, s: &str) -> Option<JsString> {
        self.strings.get(s).map(|s| s.cheap_clone())
    }

    /// Number of unique strings in the dictionary.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringDict {
    fn default() -> Self {
        Self::new()
    }
}

/// Names the bootstrap and typical guest programs touch constantly.
const COMMON_STRINGS: &[&str] = &[
    "length",
    "prototype",
    "constructor",
    "name",
    "message",
    "arguments",
    "lastIndex",
    "index",
    "input",
    "source",
    "global",
    "ignoreCase",
    "multiline",
    "value",
    "writable",
    "enumerable",
    "configurable",
    "toString",
    "valueOf",
    "undefined",
    "null",
    "boolean",
    "number",
    "string",
    "object",
    "function",
    "Object",
    "Function",
    "Array",
    "String",
    "Number",
    "Boolean",
    "Date",
    "Math",
    "RegExp",
    "JSON",
    "Error",
    "EvalError",
    "RangeError",
    "ReferenceError",
    "SyntaxError",
    "TypeError",
    "URIError",
    "window",
    "self",
    "i",
    "j",
    "x",
    "y",
    "push",
    "pop",
];
