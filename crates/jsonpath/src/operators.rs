//! Operands and the comparison, arithmetic and regex operators over them.
use crate::ast::BinaryOp;
use crate::error::EvaluationError;
use crate::node::Node;
use regex::Regex;
use sift_value::{JsonValue, ValueKind};
use std::cmp::Ordering;

/// The result of evaluating a term: a computed value, a node-set, or a regex.
///
/// Custom functions receive their arguments in this form.
#[derive(Debug, Clone)]
pub enum Operand<'a, V: JsonValue> {
    Value(V),
    Nodes(Vec<Node<'a, V>>),
    Regex(&'a Regex),
}

impl<'a, V: JsonValue> Operand<'a, V> {
    /// The single value this operand stands for: a value itself, or the only node of
    /// a one-node set. `None` for other cardinalities and for regexes.
    pub fn single(&self) -> Option<&V> {
        match self {
            Operand::Value(v) => Some(v),
            Operand::Nodes(nodes) if nodes.len() == 1 => Some(nodes[0].value()),
            _ => None,
        }
    }

    /// The values taking part in a comparison, in order.
    pub fn values(&self) -> Vec<&V> {
        match self {
            Operand::Value(v) => vec![v],
            Operand::Nodes(nodes) => nodes.iter().map(Node::value).collect(),
            Operand::Regex(_) => Vec::new(),
        }
    }

    /// Materializes the operand: a node-set of one becomes its value, any other
    /// node-set becomes an array of its values.
    pub fn to_value(&self) -> Result<V, EvaluationError> {
        match self {
            Operand::Value(v) => Ok(v.clone()),
            Operand::Nodes(nodes) if nodes.len() == 1 => Ok(nodes[0].value().clone()),
            Operand::Nodes(nodes) => Ok(V::from_array(
                nodes.iter().map(|n| n.value().clone()).collect(),
            )),
            Operand::Regex(_) => Err(EvaluationError::invalid_type(
                "a regular expression cannot be used as a value",
            )),
        }
    }

    /// Node-sets are true when non-empty and every node is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Operand::Value(v) => v.is_truthy(),
            Operand::Nodes(nodes) => !nodes.is_empty() && nodes.iter().all(|n| n.value().is_truthy()),
            Operand::Regex(_) => true,
        }
    }
}

/// Deep equality where numbers compare by numeric value, so `1 == 1.0`.
pub fn values_equal<V: JsonValue>(a: &V, b: &V) -> bool {
    match (a.kind(), b.kind()) {
        (ka, kb) if ka.is_number() && kb.is_number() => {
            compare_numbers(a, b) == Some(Ordering::Equal)
        }
        (ValueKind::Array, ValueKind::Array) => {
            a.len() == b.len() && a.iter_array().zip(b.iter_array()).all(|(x, y)| values_equal(x, y))
        }
        (ValueKind::Object, ValueKind::Object) => {
            a.len() == b.len()
                && a.iter_object()
                    .all(|(k, x)| b.get_key(k).is_some_and(|y| values_equal(x, y)))
        }
        (ka, kb) if ka == kb => a == b,
        _ => false,
    }
}

/// Signed when both fit `i64`, unsigned when both fit `u64`, floating point otherwise.
fn compare_numbers<V: JsonValue>(a: &V, b: &V) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Ordering for the relational operators. Only number/number and string/string pairs
/// are ordered.
pub fn compare_values<V: JsonValue>(a: &V, b: &V) -> Option<Ordering> {
    if a.is_number() && b.is_number() {
        compare_numbers(a, b)
    } else if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        Some(x.cmp(y))
    } else {
        None
    }
}

fn regex_operand_error(op: BinaryOp) -> EvaluationError {
    EvaluationError::unsupported_operator(format!(
        "operator '{}' cannot take a regular expression",
        op.symbol()
    ))
}

/// Equality over operands.
///
/// An empty node-set makes `==` a presence check; a single value is compared against
/// every member of a multi-node set; two multi-node sets compare pairwise when their
/// lengths agree.
pub fn equals<V: JsonValue>(lhs: &Operand<'_, V>, rhs: &Operand<'_, V>) -> Result<bool, EvaluationError> {
    if matches!(lhs, Operand::Regex(_)) || matches!(rhs, Operand::Regex(_)) {
        return Err(regex_operand_error(BinaryOp::Eq));
    }
    let (l, r) = (lhs.values(), rhs.values());
    let result = match (l.len(), r.len()) {
        (0, 0) => true,
        (0, _) | (_, 0) => false,
        (1, _) => r.iter().all(|y| values_equal(l[0], *y)),
        (_, 1) => l.iter().all(|x| values_equal(*x, r[0])),
        (a, b) if a == b => l.iter().zip(&r).all(|(x, y)| values_equal(*x, *y)),
        _ => false,
    };
    Ok(result)
}

/// `<`, `<=`, `>` and `>=`. Defined for one value against one value and for two node-sets
/// of equal length (every pair must hold); every other combination is false.
pub fn relational<V: JsonValue>(
    op: BinaryOp,
    lhs: &Operand<'_, V>,
    rhs: &Operand<'_, V>,
) -> Result<bool, EvaluationError> {
    if matches!(lhs, Operand::Regex(_)) || matches!(rhs, Operand::Regex(_)) {
        return Err(regex_operand_error(op));
    }
    let holds = |a: &V, b: &V| {
        let Some(ordering) = compare_values(a, b) else {
            return false;
        };
        match op {
            BinaryOp::Lt => ordering == Ordering::Less,
            BinaryOp::Le => ordering != Ordering::Greater,
            BinaryOp::Gt => ordering == Ordering::Greater,
            BinaryOp::Ge => ordering != Ordering::Less,
            _ => false,
        }
    };
    let (l, r) = (lhs.values(), rhs.values());
    Ok(!l.is_empty() && l.len() == r.len() && l.iter().zip(&r).all(|(a, b)| holds(*a, *b)))
}

/// `+`, `-`, `*` and `/`.
///
/// Two signed integers stay signed and two unsigned integers stay unsigned unless the
/// result overflows; anything involving a float is computed in floating point, and `/`
/// always is. Non-numbers and node-sets that are not exactly one node yield null.
pub fn arithmetic<V: JsonValue>(
    op: BinaryOp,
    lhs: &Operand<'_, V>,
    rhs: &Operand<'_, V>,
) -> Result<V, EvaluationError> {
    if matches!(lhs, Operand::Regex(_)) || matches!(rhs, Operand::Regex(_)) {
        return Err(regex_operand_error(op));
    }
    let (Some(a), Some(b)) = (lhs.single(), rhs.single()) else {
        return Ok(V::null());
    };
    if !a.is_number() || !b.is_number() {
        return Ok(V::null());
    }

    if op != BinaryOp::Div {
        if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
            let exact = match op {
                BinaryOp::Add => x.checked_add(y),
                BinaryOp::Sub => x.checked_sub(y),
                _ => x.checked_mul(y),
            };
            if let Some(n) = exact {
                return Ok(V::from_i64(n));
            }
        } else if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
            let exact = match op {
                BinaryOp::Add => x.checked_add(y),
                BinaryOp::Sub => x.checked_sub(y),
                _ => x.checked_mul(y),
            };
            if let Some(n) = exact {
                return Ok(V::from_u64(n));
            }
        }
    }

    let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
        return Ok(V::null());
    };
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        _ => x / y,
    };
    Ok(V::from_f64(result))
}

/// Unary minus. Fails unless the operand is a value or a single node.
pub fn negate<V: JsonValue>(operand: &Operand<'_, V>) -> Result<V, EvaluationError> {
    let value = operand
        .single()
        .ok_or_else(|| EvaluationError::invalid_type("unary '-' requires exactly one operand value"))?;
    let negated = match value.kind() {
        ValueKind::Int => value
            .as_i64()
            .and_then(i64::checked_neg)
            .map(V::from_i64)
            .or_else(|| value.as_f64().map(|n| V::from_f64(-n))),
        ValueKind::UInt | ValueKind::Float => value.as_f64().map(|n| V::from_f64(-n)),
        _ => None,
    };
    Ok(negated.unwrap_or_else(V::null))
}

/// `=~`: true when every value on the left is a string containing a match.
pub fn regex_match<V: JsonValue>(lhs: &Operand<'_, V>, rhs: &Operand<'_, V>) -> Result<bool, EvaluationError> {
    let (Operand::Value(_) | Operand::Nodes(_), Operand::Regex(regex)) = (lhs, rhs) else {
        return Err(EvaluationError::unsupported_operator(
            "'=~' requires a value or path on the left and a regex literal on the right",
        ));
    };
    let values = lhs.values();
    Ok(!values.is_empty()
        && values
            .iter()
            .all(|v| v.as_str().is_some_and(|s| regex.is_match(s))))
}
