//! Defines the capability contract for a generic, tree-structured JSON-like value.
//!
//! The JSONPath engine is written exclusively against [`JsonValue`], so it can query
//! and mutate any document model that implements it. An implementation for
//! `serde_json::Value` ships with this crate.

mod serde_impl;

use std::fmt;

/// The kind of a value, aligned with the JSON data model.
///
/// Integers that fit in an `i64` classify as [`ValueKind::Int`]; only integers beyond
/// `i64::MAX` classify as [`ValueKind::UInt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    UInt,
    Float,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn is_number(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::UInt | ValueKind::Float)
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Int => "integer",
            ValueKind::UInt => "unsigned integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The universal contract for a node in a JSON-compatible document tree.
///
/// Read access (classification, scalar conversion, child lookup and iteration) is all
/// the query engine needs. Construction and the `*_mut` accessors are used by the
/// replace operation, by function results, and by `unflatten`.
pub trait JsonValue: Clone + PartialEq + fmt::Debug + 'static {
    /// The kind of this value.
    fn kind(&self) -> ValueKind;

    fn is_null(&self) -> bool {
        self.kind() == ValueKind::Null
    }

    fn is_bool(&self) -> bool {
        self.kind() == ValueKind::Bool
    }

    fn is_number(&self) -> bool {
        self.kind().is_number()
    }

    fn is_string(&self) -> bool {
        self.kind() == ValueKind::String
    }

    fn is_array(&self) -> bool {
        self.kind() == ValueKind::Array
    }

    fn is_object(&self) -> bool {
        self.kind() == ValueKind::Object
    }

    fn as_bool(&self) -> Option<bool>;

    /// Returns the value as a signed integer if it is an integer that fits.
    fn as_i64(&self) -> Option<i64>;

    /// Returns the value as an unsigned integer if it is a non-negative integer.
    fn as_u64(&self) -> Option<u64>;

    /// Returns any number as a float.
    fn as_f64(&self) -> Option<f64>;

    fn as_str(&self) -> Option<&str>;

    /// The number of elements of an array or members of an object; zero otherwise.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up an object member by key. Returns `None` for non-objects.
    fn get_key(&self, key: &str) -> Option<&Self>;

    /// Looks up an array element by position. Returns `None` for non-arrays.
    fn get_index(&self, index: usize) -> Option<&Self>;

    fn get_key_mut(&mut self, key: &str) -> Option<&mut Self>;

    fn get_index_mut(&mut self, index: usize) -> Option<&mut Self>;

    /// An iterator over the members of an object, in the object's own order.
    /// The iterator is empty for non-objects.
    fn iter_object<'s>(&'s self) -> Box<dyn Iterator<Item = (&'s str, &'s Self)> + 's>;

    /// An iterator over the elements of an array. Empty for non-arrays.
    fn iter_array<'s>(&'s self) -> Box<dyn Iterator<Item = &'s Self> + 's>;

    fn null() -> Self;

    fn from_bool(value: bool) -> Self;

    fn from_i64(value: i64) -> Self;

    fn from_u64(value: u64) -> Self;

    /// Builds a float value. Non-finite floats become null.
    fn from_f64(value: f64) -> Self;

    fn from_string(value: String) -> Self;

    fn from_array(items: Vec<Self>) -> Self;

    fn empty_object() -> Self;

    /// Inserts (or overwrites) an object member. Returns `false` if `self` is not an object.
    fn insert_key(&mut self, key: String, value: Self) -> bool;

    /// Appends an array element. Returns `false` if `self` is not an array.
    fn push(&mut self, value: Self) -> bool;

    /// "Truthiness" rules: `false`, `null`, `0`, `""`, empty arrays/objects are false.
    fn is_truthy(&self) -> bool {
        match self.kind() {
            ValueKind::Null => false,
            ValueKind::Bool => self.as_bool().unwrap_or(false),
            ValueKind::Int | ValueKind::UInt | ValueKind::Float => {
                self.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan())
            }
            ValueKind::String => self.as_str().is_some_and(|s| !s.is_empty()),
            ValueKind::Array | ValueKind::Object => !self.is_empty(),
        }
    }
}
