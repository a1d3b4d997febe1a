use crate::{JsonValue, ValueKind};
use serde_json::{Map, Number, Value};

impl JsonValue for Value {
    fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(n) if n.is_i64() => ValueKind::Int,
            Value::Number(n) if n.is_u64() => ValueKind::UInt,
            Value::Number(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        Value::as_bool(self)
    }

    fn as_i64(&self) -> Option<i64> {
        Value::as_i64(self)
    }

    fn as_u64(&self) -> Option<u64> {
        Value::as_u64(self)
    }

    fn as_f64(&self) -> Option<f64> {
        Value::as_f64(self)
    }

    fn as_str(&self) -> Option<&str> {
        Value::as_str(self)
    }

    fn len(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    fn get_key(&self, key: &str) -> Option<&Self> {
        self.as_object().and_then(|map| map.get(key))
    }

    fn get_index(&self, index: usize) -> Option<&Self> {
        self.as_array().and_then(|items| items.get(index))
    }

    fn get_key_mut(&mut self, key: &str) -> Option<&mut Self> {
        self.as_object_mut().and_then(|map| map.get_mut(key))
    }

    fn get_index_mut(&mut self, index: usize) -> Option<&mut Self> {
        self.as_array_mut().and_then(|items| items.get_mut(index))
    }

    fn iter_object<'s>(&'s self) -> Box<dyn Iterator<Item = (&'s str, &'s Self)> + 's> {
        match self {
            Value::Object(map) => Box::new(map.iter().map(|(k, v)| (k.as_str(), v))),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn iter_array<'s>(&'s self) -> Box<dyn Iterator<Item = &'s Self> + 's> {
        match self {
            Value::Array(items) => Box::new(items.iter()),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn null() -> Self {
        Value::Null
    }

    fn from_bool(value: bool) -> Self {
        Value::Bool(value)
    }

    fn from_i64(value: i64) -> Self {
        Value::Number(value.into())
    }

    fn from_u64(value: u64) -> Self {
        Value::Number(value.into())
    }

    fn from_f64(value: f64) -> Self {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }

    fn from_string(value: String) -> Self {
        Value::String(value)
    }

    fn from_array(items: Vec<Self>) -> Self {
        Value::Array(items)
    }

    fn empty_object() -> Self {
        Value::Object(Map::new())
    }

    fn insert_key(&mut self, key: String, value: Self) -> bool {
        match self {
            Value::Object(map) => {
                map.insert(key, value);
                true
            }
            _ => false,
        }
    }

    fn push(&mut self, value: Self) -> bool {
        match self {
            Value::Array(items) => {
                items.push(value);
                true
            }
            _ => false,
        }
    }
}
