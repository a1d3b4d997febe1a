//! The evaluation engine: walks a document driven by a selector pipeline and evaluates
//! filter and index terms against the nodes it reaches.
use crate::ast::{BinaryOp, Selector, Term, UnaryOp};
use crate::error::{ErrorCode, EvaluationError};
use crate::functions::FunctionRegistry;
use crate::node::Node;
use crate::operators::{self, Operand};
use sift_value::{JsonValue, ValueKind};

/// Holds the state for a single evaluation: the document root and the functions
/// available to filters.
pub(crate) struct Evaluator<'a, V: JsonValue> {
    root: Node<'a, V>,
    functions: &'a FunctionRegistry<V>,
}

impl<'a, V: JsonValue> Evaluator<'a, V> {
    pub(crate) fn new(root: &'a V, functions: &'a FunctionRegistry<V>) -> Self {
        Self {
            root: Node::root(root),
            functions,
        }
    }

    /// Evaluates a full pipeline from the document root.
    pub(crate) fn select(&self, pipeline: &'a [Selector]) -> Result<Vec<Node<'a, V>>, EvaluationError> {
        self.apply_all(pipeline, vec![self.root.clone()])
    }

    fn apply_all(
        &self,
        selectors: &'a [Selector],
        mut nodes: Vec<Node<'a, V>>,
    ) -> Result<Vec<Node<'a, V>>, EvaluationError> {
        for selector in selectors {
            nodes = self.apply(selector, nodes)?;
            log::trace!("{selector:?} -> {} node(s)", nodes.len());
            if nodes.is_empty() {
                break;
            }
        }
        Ok(nodes)
    }

    fn apply(&self, selector: &'a Selector, nodes: Vec<Node<'a, V>>) -> Result<Vec<Node<'a, V>>, EvaluationError> {
        let mut out = Vec::new();
        match selector {
            Selector::Root => out.push(self.root.clone()),
            Selector::Current => out = nodes,
            Selector::Member(name) => {
                out.extend(nodes.iter().filter_map(|node| member(node, name)));
            }
            Selector::Index(index) => {
                out.extend(nodes.iter().filter_map(|node| {
                    let len = node.value().is_array().then(|| node.value().len())?;
                    node.child_index(resolve_index(*index, len)?)
                }));
            }
            Selector::Wildcard => {
                for node in &nodes {
                    out.extend(node.children());
                }
            }
            Selector::RecursiveDescent => {
                for node in &nodes {
                    node.descendants(&mut out);
                }
            }
            Selector::Slice { start, stop, step } => {
                for node in nodes.iter().filter(|n| n.value().is_array()) {
                    let indices = slice_indices(*start, *stop, *step, node.value().len());
                    out.extend(indices.into_iter().filter_map(|i| node.child_index(i)));
                }
            }
            Selector::Union(items) => {
                for node in &nodes {
                    for item in items {
                        let selected = match item.first() {
                            Some(Selector::Root) => self.apply_all(&item[1..], vec![self.root.clone()])?,
                            Some(Selector::Current) => self.apply_all(&item[1..], vec![node.clone()])?,
                            _ => self.apply_all(item, vec![node.clone()])?,
                        };
                        out.extend(selected);
                    }
                }
            }
            Selector::Filter(predicate) => {
                for candidate in nodes.iter().flat_map(Node::children) {
                    if self.test(predicate, &candidate)? {
                        out.push(candidate);
                    }
                }
            }
            Selector::Parent => {
                for node in &nodes {
                    let parent = node.parent().ok_or_else(|| {
                        EvaluationError::new(
                            ErrorCode::ParentOperatorOutsideBrackets,
                            "the parent operator cannot be applied to the root",
                        )
                    })?;
                    out.push(parent.clone());
                }
            }
            Selector::ExpressionIndex(term) => {
                for node in &nodes {
                    if let Some(child) = self.expression_index(term, node)? {
                        out.push(child);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Evaluates a filter predicate for one candidate. Non-fatal errors make the
    /// candidate fail the filter; fatal errors abort the evaluation.
    fn test(&self, predicate: &'a Term, candidate: &Node<'a, V>) -> Result<bool, EvaluationError> {
        match self.eval(predicate, candidate) {
            Ok(result) => Ok(result.is_truthy()),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                log::debug!("filter predicate rejected {}: {e}", candidate.path());
                Ok(false)
            }
        }
    }

    fn expression_index(&self, term: &'a Term, node: &Node<'a, V>) -> Result<Option<Node<'a, V>>, EvaluationError> {
        let result = match self.eval(term, node) {
            Ok(result) => result,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::debug!("index expression failed at {}: {e}", node.path());
                return Ok(None);
            }
        };
        let invalid = || {
            EvaluationError::new(
                ErrorCode::InvalidExpressionIndex,
                "an index expression must evaluate to a number or a string",
            )
        };
        let key = result.single().ok_or_else(invalid)?;
        match key.kind() {
            ValueKind::String => Ok(key.as_str().and_then(|name| node.child_key_owned(name))),
            ValueKind::Int | ValueKind::UInt | ValueKind::Float => {
                let Some(len) = node.value().is_array().then(|| node.value().len()) else {
                    return Ok(None);
                };
                let index = key.as_i64().or_else(|| key.as_f64().map(|f| f.trunc() as i64));
                Ok(index.and_then(|i| resolve_index(i, len)).and_then(|i| node.child_index(i)))
            }
            _ => Err(invalid()),
        }
    }

    /// Evaluates a term with `@` bound to `current`.
    pub(crate) fn eval(&self, term: &'a Term, current: &Node<'a, V>) -> Result<Operand<'a, V>, EvaluationError> {
        match term {
            Term::Value(literal) => Ok(Operand::Value(literal.to_value())),
            Term::Regex(regex) => Ok(Operand::Regex(regex)),
            Term::Path(pipeline) => {
                let (start, rest) = match pipeline.split_first() {
                    Some((Selector::Root, rest)) => (self.root.clone(), rest),
                    Some((Selector::Current, rest)) => (current.clone(), rest),
                    _ => (current.clone(), pipeline.as_slice()),
                };
                Ok(Operand::Nodes(self.apply_all(rest, vec![start])?))
            }
            Term::Unary { op, operand } => {
                let value = self.eval(operand, current)?;
                match op {
                    UnaryOp::Not => Ok(Operand::Value(V::from_bool(!value.is_truthy()))),
                    UnaryOp::Neg => Ok(Operand::Value(operators::negate(&value)?)),
                }
            }
            Term::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs, current),
            Term::Function { name, args, postfix } => {
                let function = self
                    .functions
                    .get(name)
                    .filter(|f| f.arity == args.len())
                    .ok_or_else(|| EvaluationError::function_not_found(name, args.len()))?;
                let operands = args
                    .iter()
                    .map(|arg| self.eval(arg, current))
                    .collect::<Result<Vec<_>, _>>()?;
                let result = function
                    .call(&operands)
                    .map_err(|code| EvaluationError::new(code, format!("in function '{name}'")))?;
                if postfix.is_empty() {
                    Ok(Operand::Value(result))
                } else {
                    let nodes = self.apply_all(postfix, vec![Node::detached(result)])?;
                    Ok(Operand::Nodes(nodes))
                }
            }
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        lhs: &'a Term,
        rhs: &'a Term,
        current: &Node<'a, V>,
    ) -> Result<Operand<'a, V>, EvaluationError> {
        let left = self.eval(lhs, current)?;
        let result = match op {
            BinaryOp::And if !left.is_truthy() => V::from_bool(false),
            BinaryOp::Or if left.is_truthy() => V::from_bool(true),
            BinaryOp::And | BinaryOp::Or => V::from_bool(self.eval(rhs, current)?.is_truthy()),
            _ => {
                let right = self.eval(rhs, current)?;
                match op {
                    BinaryOp::Eq => V::from_bool(operators::equals(&left, &right)?),
                    BinaryOp::Ne => V::from_bool(!operators::equals(&left, &right)?),
                    BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                        V::from_bool(operators::relational(op, &left, &right)?)
                    }
                    BinaryOp::RegexMatch => V::from_bool(operators::regex_match(&left, &right)?),
                    _ => operators::arithmetic(op, &left, &right)?,
                }
            }
        };
        Ok(Operand::Value(result))
    }
}

/// Member lookup, falling back to a synthesized element count for `length` on arrays,
/// objects and strings that have no such member.
///
/// The synthesized node reports the path it was reached by, e.g. `$['a']['length']`,
/// even though no such location exists; `replace` skips it.
fn member<'a, V: JsonValue>(node: &Node<'a, V>, name: &'a str) -> Option<Node<'a, V>> {
    if let Some(child) = node.child_key(name) {
        return Some(child);
    }
    if name != "length" {
        return None;
    }
    let value = node.value();
    let count = match value.kind() {
        ValueKind::Array | ValueKind::Object => value.len(),
        ValueKind::String => value.as_str().map_or(0, |s| s.chars().count()),
        _ => return None,
    };
    Some(node.synthetic_child(name, V::from_u64(count as u64)))
}

/// Resolves a possibly negative index against an array length.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { len + index } else { index };
    (0..len).contains(&resolved).then_some(resolved as usize)
}

/// The concrete indices selected by `[start:stop:step]` on an array of `len` elements.
fn slice_indices(start: Option<i64>, stop: Option<i64>, step: Option<i64>, len: usize) -> Vec<usize> {
    let Ok(len) = i64::try_from(len) else {
        return Vec::new();
    };
    let step = step.unwrap_or(1);
    let normalize = |i: i64| if i < 0 { len + i } else { i };

    let mut indices = Vec::new();
    if step > 0 {
        let start = start.map_or(0, normalize).clamp(0, len);
        let stop = stop.map_or(len, normalize).clamp(0, len);
        let mut i = start;
        while i < stop {
            indices.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    } else if step < 0 {
        let start = start.map_or(len - 1, normalize).clamp(-1, len - 1);
        let stop = stop.map_or(-1, |s| normalize(s).clamp(-1, len - 1));
        let mut i = start;
        while i > stop {
            indices.push(i as usize);
            match i.checked_add(step) {
                Some(next) => i = next,
                None => break,
            }
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_path;
    use serde_json::{Value, json};

    fn select(doc: &Value, expr: &str) -> Result<Vec<Value>, EvaluationError> {
        let pipeline = parse_path(expr).unwrap();
        let functions = FunctionRegistry::default();
        let evaluator = Evaluator::new(doc, &functions);
        let nodes = evaluator.select(&pipeline)?;
        Ok(nodes.iter().map(|n| n.value().clone()).collect())
    }

    fn paths(doc: &Value, expr: &str) -> Vec<String> {
        let pipeline = parse_path(expr).unwrap();
        let functions = FunctionRegistry::default();
        let evaluator = Evaluator::new(doc, &functions);
        let nodes = evaluator.select(&pipeline).unwrap();
        nodes.iter().map(|n| n.path().to_string()).collect()
    }

    #[test]
    fn test_slice_indices() {
        assert_eq!(slice_indices(None, None, None, 5), vec![0, 1, 2, 3, 4]);
        assert_eq!(slice_indices(Some(1), Some(-1), None, 5), vec![1, 2, 3]);
        assert_eq!(slice_indices(None, None, Some(2), 5), vec![0, 2, 4]);
        assert_eq!(slice_indices(None, None, Some(-1), 5), vec![4, 3, 2, 1, 0]);
        assert_eq!(slice_indices(Some(3), Some(0), Some(-1), 5), vec![3, 2, 1]);
        assert_eq!(slice_indices(Some(-2), None, None, 5), vec![3, 4]);
        assert_eq!(slice_indices(Some(10), None, None, 5), Vec::<usize>::new());
        assert_eq!(slice_indices(None, None, Some(-1), 0), Vec::<usize>::new());
        assert_eq!(slice_indices(Some(1), None, Some(i64::MAX), 3), vec![1]);
        assert_eq!(slice_indices(Some(1), Some(i64::MIN), Some(i64::MIN), 3), vec![1]);
        assert_eq!(slice_indices(None, None, Some(i64::MIN), 3), vec![2]);
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(-1, 3), Some(2));
        assert_eq!(resolve_index(-4, 3), None);
        assert_eq!(resolve_index(3, 3), None);
    }

    #[test]
    fn test_member_wildcard_and_index() {
        let doc = json!({"a": [10, 20, 30], "b": {"c": 1}});
        assert_eq!(select(&doc, "$.a[-1]").unwrap(), vec![json!(30)]);
        assert_eq!(select(&doc, "$.a[5]").unwrap(), Vec::<Value>::new());
        assert_eq!(select(&doc, "$.b.*").unwrap(), vec![json!(1)]);
        assert_eq!(select(&doc, "$.missing.x").unwrap(), Vec::<Value>::new());
    }

    #[test]
    fn test_recursive_descent_is_preorder() {
        let doc = json!({"a": {"name": 1, "b": {"name": 2}}, "name": 3});
        assert_eq!(
            paths(&doc, "$..name"),
            vec!["$['name']", "$['a']['name']", "$['a']['b']['name']"]
        );
    }

    #[test]
    fn test_union_is_node_major_and_keeps_duplicates() {
        let doc = json!([{"x": 1, "y": 2}, {"x": 3, "y": 4}]);
        assert_eq!(
            select(&doc, "$[*]['y','x']").unwrap(),
            vec![json!(2), json!(1), json!(4), json!(3)]
        );
        let doc = json!([1, 2, 3, 4, 5]);
        assert_eq!(select(&doc, "$[4,1,1]").unwrap(), vec![json!(5), json!(2), json!(2)]);
    }

    #[test]
    fn test_union_with_absolute_item() {
        let doc = json!({"a": {"v": 1}, "top": 9});
        assert_eq!(select(&doc, "$.a[@.v, $.top]").unwrap(), vec![json!(1), json!(9)]);
    }

    #[test]
    fn test_filter_over_object_members() {
        let doc = json!({"x": {"n": 1}, "y": {"n": 5}});
        assert_eq!(select(&doc, "$[?(@.n > 2)]").unwrap(), vec![json!({"n": 5})]);
    }

    #[test]
    fn test_parent_operator() {
        let doc = json!({"books": [{"price": 5, "title": "A"}, {"price": 50, "title": "B"}]});
        assert_eq!(
            paths(&doc, "$.books[*].price[?(@ > 10)]^^"),
            Vec::<String>::new(),
            "filter over a scalar has no candidates"
        );
        assert_eq!(
            select(&doc, "$.books[?(@.price > 10)].title^^").unwrap(),
            vec![json!({"price": 50, "title": "B"})]
        );
        let err = select(&doc, "$^^").unwrap_err();
        assert_eq!(err.code, ErrorCode::ParentOperatorOutsideBrackets);
    }

    #[test]
    fn test_length_pseudo_member_and_expression_index() {
        let doc = json!({"books": ["a", "b", "c"], "m": {"length": "real"}});
        assert_eq!(select(&doc, "$.books.length").unwrap(), vec![json!(3)]);
        assert_eq!(select(&doc, "$.m.length").unwrap(), vec![json!("real")]);
        assert_eq!(select(&doc, "$.books[(@.length - 1)]").unwrap(), vec![json!("c")]);
        let err = select(&doc, "$.books[(true)]").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidExpressionIndex);
    }

    #[test]
    fn test_length_pseudo_member_reports_requested_path() {
        let doc = json!({"a": [1, 2]});
        assert_eq!(paths(&doc, "$.a.length"), vec!["$['a']['length']"]);
        assert_eq!(paths(&doc, "$.a.length").len(), select(&doc, "$.a.length").unwrap().len());
    }

    #[test]
    fn test_expression_index_by_name() {
        let doc = json!({"key": "b", "a": 1, "b": 2});
        assert_eq!(select(&doc, "$[($.key)]").unwrap(), vec![json!(2)]);
    }

    #[test]
    fn test_non_fatal_errors_reject_candidate() {
        let doc = json!([{"a": "x"}, {"a": [1]}]);
        assert_eq!(select(&doc, "$[?(nope(@.a))]").unwrap(), Vec::<Value>::new());
        assert_eq!(
            select(&doc, "$[?(contains(@.a, 1))]").unwrap(),
            vec![json!({"a": [1]})]
        );
    }

    #[test]
    fn test_function_postfix() {
        let doc = json!([{"name": "John Smith"}, {"name": "Jane Doe"}]);
        assert_eq!(
            select(&doc, "$[?(tokenize(@.name, ' ')[-1] == 'Smith')].name").unwrap(),
            vec![json!("John Smith")]
        );
    }

    #[test]
    fn test_logical_short_circuit() {
        let doc = json!([{"a": 1}, {"b": 2}]);
        assert_eq!(
            select(&doc, "$[?(@.a && nope(@.a))]").unwrap(),
            Vec::<Value>::new()
        );
        assert_eq!(
            select(&doc, "$[?(@.b || nope(@.a))]").unwrap(),
            vec![json!({"b": 2})]
        );
    }
}
