//! Defines the registry and built-in implementations for filter functions.
use crate::error::ErrorCode;
use crate::operators::{Operand, compare_values, values_equal};
use regex::Regex;
use sift_value::{JsonValue, ValueKind};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The signature of a function implementation. Arguments arrive already evaluated.
pub type FunctionImpl<V> =
    Arc<dyn Fn(&[Operand<'_, V>]) -> Result<V, ErrorCode> + Send + Sync>;

/// A registered function: its fixed arity and implementation.
pub struct Function<V: JsonValue> {
    pub arity: usize,
    implementation: FunctionImpl<V>,
}

impl<V: JsonValue> Clone for Function<V> {
    fn clone(&self) -> Self {
        Self {
            arity: self.arity,
            implementation: Arc::clone(&self.implementation),
        }
    }
}

impl<V: JsonValue> Function<V> {
    pub fn call(&self, args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
        (self.implementation)(args)
    }
}

/// A registry to hold all functions callable from filter expressions.
pub struct FunctionRegistry<V: JsonValue> {
    functions: HashMap<String, Function<V>>,
}

impl<V: JsonValue> Clone for FunctionRegistry<V> {
    fn clone(&self) -> Self {
        Self {
            functions: self.functions.clone(),
        }
    }
}

impl<V: JsonValue> fmt::Debug for FunctionRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

impl<V: JsonValue> FunctionRegistry<V> {
    /// Creates a new, empty function registry.
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registers a function, replacing any previous function of the same name.
    pub fn register<F>(&mut self, name: &str, arity: usize, implementation: F)
    where
        F: Fn(&[Operand<'_, V>]) -> Result<V, ErrorCode> + Send + Sync + 'static,
    {
        self.functions.insert(
            name.to_string(),
            Function {
                arity,
                implementation: Arc::new(implementation),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Function<V>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Copies every function of `other` into this registry.
    pub fn extend(&mut self, other: &FunctionRegistry<V>) {
        for (name, function) in &other.functions {
            self.functions.insert(name.clone(), function.clone());
        }
    }
}

impl<V: JsonValue> Default for FunctionRegistry<V> {
    /// Creates a registry with the built-in functions.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("length", 1, length);
        registry.register("count", 1, length);
        registry.register("keys", 1, keys);
        registry.register("contains", 2, contains);
        registry.register("starts_with", 2, starts_with);
        registry.register("ends_with", 2, ends_with);
        registry.register("tokenize", 2, tokenize);
        registry.register("to_number", 1, to_number);
        registry.register("sum", 1, sum);
        registry.register("avg", 1, avg);
        registry.register("prod", 1, prod);
        registry.register("min", 1, min);
        registry.register("max", 1, max);
        registry.register("abs", 1, abs);
        registry.register("ceil", 1, ceil);
        registry.register("floor", 1, floor);
        registry
    }
}

// --- Argument helpers ---

fn arg<'o, 'a, V: JsonValue>(args: &'o [Operand<'a, V>], index: usize) -> Result<&'o Operand<'a, V>, ErrorCode> {
    args.get(index).ok_or(ErrorCode::InvalidType)
}

/// A value or a single node.
fn scalar<'o, V: JsonValue>(args: &'o [Operand<'_, V>], index: usize) -> Result<&'o V, ErrorCode> {
    arg(args, index)?.single().ok_or(ErrorCode::InvalidType)
}

fn string<'o, V: JsonValue>(args: &'o [Operand<'_, V>], index: usize) -> Result<&'o str, ErrorCode> {
    scalar(args, index)?.as_str().ok_or(ErrorCode::InvalidType)
}

/// The items of a list argument. A one-node set holding an array contributes that
/// array's elements; any other node-set contributes its nodes. A value must be an array.
fn list<'o, V: JsonValue>(args: &'o [Operand<'_, V>], index: usize) -> Result<Vec<&'o V>, ErrorCode> {
    match arg(args, index)? {
        Operand::Value(v) if v.is_array() => Ok(v.iter_array().collect()),
        Operand::Nodes(nodes) if nodes.len() == 1 && nodes[0].value().is_array() => {
            Ok(nodes[0].value().iter_array().collect())
        }
        Operand::Nodes(nodes) => Ok(nodes.iter().map(|n| n.value()).collect()),
        _ => Err(ErrorCode::InvalidType),
    }
}

fn numbers<V: JsonValue>(items: &[&V]) -> Result<Vec<f64>, ErrorCode> {
    items
        .iter()
        .map(|v| if v.is_number() { v.as_f64() } else { None })
        .collect::<Option<Vec<f64>>>()
        .ok_or(ErrorCode::InvalidType)
}

// --- Built-in Function Implementations ---

fn length<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    let count = match arg(args, 0)? {
        Operand::Nodes(nodes) if nodes.len() != 1 => nodes.len(),
        operand => {
            let value = operand.single().ok_or(ErrorCode::InvalidType)?;
            match value.kind() {
                ValueKind::Array | ValueKind::Object => value.len(),
                ValueKind::String => value.as_str().map_or(0, |s| s.chars().count()),
                _ => return Err(ErrorCode::InvalidType),
            }
        }
    };
    Ok(V::from_u64(count as u64))
}

fn keys<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    let value = scalar(args, 0)?;
    if !value.is_object() {
        return Err(ErrorCode::InvalidType);
    }
    Ok(V::from_array(
        value
            .iter_object()
            .map(|(k, _)| V::from_string(k.to_string()))
            .collect(),
    ))
}

fn contains<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    let needle = scalar(args, 1)?;
    let found = match arg(args, 0)? {
        Operand::Nodes(nodes) if nodes.len() != 1 => {
            nodes.iter().any(|n| values_equal(n.value(), needle))
        }
        operand => {
            let haystack = operand.single().ok_or(ErrorCode::InvalidType)?;
            match haystack.kind() {
                ValueKind::Array => haystack.iter_array().any(|item| values_equal(item, needle)),
                ValueKind::String => {
                    let needle = needle.as_str().ok_or(ErrorCode::InvalidType)?;
                    haystack.as_str().is_some_and(|s| s.contains(needle))
                }
                _ => return Err(ErrorCode::InvalidType),
            }
        }
    };
    Ok(V::from_bool(found))
}

fn starts_with<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    Ok(V::from_bool(string(args, 0)?.starts_with(string(args, 1)?)))
}

fn ends_with<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    Ok(V::from_bool(string(args, 0)?.ends_with(string(args, 1)?)))
}

fn tokenize<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    let input = string(args, 0)?;
    let compiled;
    let regex = match arg(args, 1)? {
        Operand::Regex(regex) => *regex,
        _ => {
            compiled = Regex::new(string(args, 1)?).map_err(|_| ErrorCode::InvalidType)?;
            &compiled
        }
    };
    Ok(V::from_array(
        regex
            .split(input)
            .map(|part| V::from_string(part.to_string()))
            .collect(),
    ))
}

fn to_number<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    let value = scalar(args, 0)?;
    if value.is_number() {
        return Ok(value.clone());
    }
    let text = value.as_str().ok_or(ErrorCode::InvalidType)?.trim();
    if let Ok(n) = text.parse::<u64>() {
        return Ok(V::from_u64(n));
    }
    if let Ok(n) = text.parse::<i64>() {
        return Ok(V::from_i64(n));
    }
    Ok(text.parse::<f64>().map_or_else(|_| V::null(), V::from_f64))
}

fn sum<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    let values = numbers(&list(args, 0)?)?;
    Ok(V::from_f64(values.iter().sum()))
}

fn avg<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    let values = numbers(&list(args, 0)?)?;
    if values.is_empty() {
        return Ok(V::null());
    }
    Ok(V::from_f64(values.iter().sum::<f64>() / values.len() as f64))
}

fn prod<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    let values = numbers(&list(args, 0)?)?;
    if values.is_empty() {
        return Err(ErrorCode::InvalidType);
    }
    Ok(V::from_f64(values.iter().product()))
}

fn min<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    extremum(args, Ordering::Less)
}

fn max<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    extremum(args, Ordering::Greater)
}

/// The list must be all numbers or all strings.
fn extremum<V: JsonValue>(args: &[Operand<'_, V>], wanted: Ordering) -> Result<V, ErrorCode> {
    let items = list(args, 0)?;
    let Some(first) = items.first() else {
        return Ok(V::null());
    };
    let uniform = items.iter().all(|v| v.is_number()) || items.iter().all(|v| v.is_string());
    if !uniform {
        return Err(ErrorCode::InvalidType);
    }
    let mut best = *first;
    for item in &items[1..] {
        if compare_values(*item, best) == Some(wanted) {
            best = *item;
        }
    }
    Ok(best.clone())
}

fn abs<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    let value = scalar(args, 0)?;
    match value.kind() {
        ValueKind::Int => Ok(value
            .as_i64()
            .and_then(i64::checked_abs)
            .map(V::from_i64)
            .unwrap_or_else(|| V::from_f64(value.as_f64().unwrap_or_default().abs()))),
        ValueKind::UInt => Ok(value.clone()),
        ValueKind::Float => Ok(V::from_f64(value.as_f64().unwrap_or_default().abs())),
        _ => Err(ErrorCode::InvalidType),
    }
}

fn ceil<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    round(args, f64::ceil)
}

fn floor<V: JsonValue>(args: &[Operand<'_, V>]) -> Result<V, ErrorCode> {
    round(args, f64::floor)
}

fn round<V: JsonValue>(args: &[Operand<'_, V>], rounding: fn(f64) -> f64) -> Result<V, ErrorCode> {
    let value = scalar(args, 0)?;
    if !value.is_number() {
        return Err(ErrorCode::InvalidType);
    }
    let n = value.as_f64().ok_or(ErrorCode::InvalidType)?;
    Ok(V::from_f64(rounding(n)))
}
