//! Compiled expressions and the entry points for querying and replacing.
use crate::ast::Selector;
use crate::collect::{arrange, emit};
use crate::engine::Evaluator;
use crate::error::{ErrorCode, EvaluationError, JsonPathError, SyntaxError};
use crate::functions::FunctionRegistry;
use crate::node::Node;
use crate::operators::Operand;
use crate::options::ResultOptions;
use crate::parser::parse_path;
use crate::path::NormalizedPath;
use sift_value::JsonValue;
use std::fmt;
use std::str::FromStr;

/// A compiled path expression.
///
/// Compilation happens once; the result is immutable and can be evaluated any number
/// of times, from any number of threads, against different documents.
///
/// ```
/// use serde_json::json;
/// use sift_jsonpath::{JsonPath, ResultOptions};
///
/// let doc = json!({"store": {"book": [{"price": 8.95}, {"price": 12.99}]}});
/// let path: JsonPath = JsonPath::compile("$.store.book[?(@.price < 10)]").unwrap();
/// assert_eq!(path.evaluate(&doc, ResultOptions::NONE).unwrap(), json!([{"price": 8.95}]));
/// ```
#[derive(Debug, Clone)]
pub struct JsonPath<V: JsonValue = serde_json::Value> {
    expression: String,
    selectors: Vec<Selector>,
    functions: FunctionRegistry<V>,
    options: ResultOptions,
}

impl<V: JsonValue> JsonPath<V> {
    /// Compiles `expr` with the built-in functions.
    pub fn compile(expr: &str) -> Result<Self, SyntaxError> {
        Self::compile_with(expr, FunctionRegistry::default())
    }

    /// Compiles `expr`, resolving function calls against `functions`.
    pub fn compile_with(expr: &str, functions: FunctionRegistry<V>) -> Result<Self, SyntaxError> {
        let selectors = parse_path(expr)?;
        log::debug!("compiled '{expr}' into {} selector(s)", selectors.len());
        Ok(Self {
            expression: expr.to_string(),
            selectors,
            functions,
            options: ResultOptions::NONE,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// The options used by [`JsonPath::select`].
    pub fn options(&self) -> ResultOptions {
        self.options
    }

    fn nodes<'a>(&'a self, root: &'a V) -> Result<Vec<Node<'a, V>>, EvaluationError> {
        Evaluator::new(root, &self.functions).select(&self.selectors)
    }

    /// Evaluates against `root`, returning an array of the matched values, or of their
    /// normalized paths when `options` contains [`ResultOptions::PATH`].
    pub fn evaluate(&self, root: &V, options: ResultOptions) -> Result<V, EvaluationError> {
        Ok(emit(self.nodes(root)?, options))
    }

    /// Evaluates with the options this expression was built with.
    pub fn select(&self, root: &V) -> Result<V, EvaluationError> {
        self.evaluate(root, self.options)
    }

    /// The matched values, honoring `NODUPS` and `SORT` from the built-in options.
    pub fn select_values(&self, root: &V) -> Result<Vec<V>, EvaluationError> {
        let matches = arrange(self.nodes(root)?, self.options);
        Ok(matches.into_iter().map(|m| m.node.value().clone()).collect())
    }

    /// The distinct locations matched, sorted.
    pub fn select_paths(&self, root: &V) -> Result<Vec<NormalizedPath>, EvaluationError> {
        let matches = arrange(self.nodes(root)?, ResultOptions::NODUPS | ResultOptions::SORT);
        Ok(matches.into_iter().map(|m| m.path).collect())
    }

    /// Invokes `callback` with the normalized path and value of every match. `NODUPS`
    /// and `SORT` are applied before the first call.
    pub fn evaluate_with<F>(&self, root: &V, options: ResultOptions, mut callback: F) -> Result<(), EvaluationError>
    where
        F: FnMut(&str, &V),
    {
        for m in arrange(self.nodes(root)?, options) {
            callback(&m.rendered, m.node.value());
        }
        Ok(())
    }

    /// Overwrites every match with a copy of `new_value`. Returns the number of locations written.
    pub fn replace(&self, root: &mut V, new_value: V) -> Result<usize, EvaluationError> {
        self.replace_with(root, |_, target| *target = new_value.clone())
    }

    /// Calls `callback` with mutable access to every match, each location once.
    ///
    /// Locations are collected before anything is written, so an evaluation error
    /// leaves the document untouched. Writes go deepest-first so that replacing a node
    /// never invalidates the location of a match beneath it. Matches with no location
    /// in the document, such as a synthesized `length`, are skipped.
    pub fn replace_with<F>(&self, root: &mut V, mut callback: F) -> Result<usize, EvaluationError>
    where
        F: FnMut(&str, &mut V),
    {
        let mut targets: Vec<(String, NormalizedPath)> = arrange(self.nodes(root)?, ResultOptions::NODUPS)
            .into_iter()
            .map(|m| (m.rendered, m.path))
            .collect();
        targets.sort_by(|a, b| b.0.cmp(&a.0));

        let mut written = 0;
        for (rendered, path) in &targets {
            if let Some(target) = path.resolve_mut(root) {
                callback(rendered, target);
                written += 1;
            }
        }
        log::debug!("'{}' replaced {written} location(s)", self.expression);
        Ok(written)
    }
}

impl<V: JsonValue> fmt::Display for JsonPath<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl<V: JsonValue> FromStr for JsonPath<V> {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

/// Fluent configuration for compiled expressions.
///
/// ```
/// use serde_json::{Value, json};
/// use sift_jsonpath::{ErrorCode, JsonPathBuilder, Operand, ResultOptions};
///
/// let path = JsonPathBuilder::<Value>::new()
///     .with_function("double", 1, |args: &[Operand<'_, Value>]| {
///         let n = args[0].single().and_then(Value::as_f64).ok_or(ErrorCode::InvalidType)?;
///         Ok(json!(n * 2.0))
///     })
///     .with_options(ResultOptions::SORT)
///     .build("$[?(double(@) > 3)]")
///     .unwrap();
/// assert_eq!(path.select(&json!([1, 2, 3])).unwrap(), json!([2, 3]));
/// ```
pub struct JsonPathBuilder<V: JsonValue = serde_json::Value> {
    functions: FunctionRegistry<V>,
    options: ResultOptions,
}

impl<V: JsonValue> JsonPathBuilder<V> {
    /// Starts from the built-in functions and no result options.
    pub fn new() -> Self {
        Self {
            functions: FunctionRegistry::default(),
            options: ResultOptions::NONE,
        }
    }

    pub fn with_function<F>(mut self, name: &str, arity: usize, implementation: F) -> Self
    where
        F: Fn(&[Operand<'_, V>]) -> Result<V, ErrorCode> + Send + Sync + 'static,
    {
        self.functions.register(name, arity, implementation);
        self
    }

    /// Adds every function in `registry`, overriding built-ins of the same name.
    pub fn with_functions(mut self, registry: &FunctionRegistry<V>) -> Self {
        self.functions.extend(registry);
        self
    }

    pub fn with_options(mut self, options: ResultOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(&self, expr: &str) -> Result<JsonPath<V>, SyntaxError> {
        let mut path = JsonPath::compile_with(expr, self.functions.clone())?;
        path.options = self.options;
        Ok(path)
    }
}

impl<V: JsonValue> Default for JsonPathBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiles and evaluates `expr` in one step.
pub fn query<V: JsonValue>(root: &V, expr: &str, options: ResultOptions) -> Result<V, JsonPathError> {
    Ok(JsonPath::<V>::compile(expr)?.evaluate(root, options)?)
}

/// Compiles `expr` and overwrites every match with `new_value`.
pub fn replace<V: JsonValue>(root: &mut V, expr: &str, new_value: V) -> Result<usize, JsonPathError> {
    Ok(JsonPath::<V>::compile(expr)?.replace(root, new_value)?)
}

/// Compiles `expr` and calls `callback` on every match.
pub fn replace_with<V, F>(root: &mut V, expr: &str, callback: F) -> Result<usize, JsonPathError>
where
    V: JsonValue,
    F: FnMut(&str, &mut V),
{
    Ok(JsonPath::<V>::compile(expr)?.replace_with(root, callback)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_compiled_expression_is_shareable() {
        assert_send_sync::<JsonPath<Value>>();
    }

    #[test]
    fn test_evaluate_with_callback_sees_paths() {
        let doc = json!({"a": [1, 2]});
        let path: JsonPath = JsonPath::compile("$.a[*]").unwrap();
        let mut seen = Vec::new();
        path.evaluate_with(&doc, ResultOptions::NONE, |p, v| seen.push((p.to_string(), v.clone())))
            .unwrap();
        assert_eq!(
            seen,
            vec![("$['a'][0]".to_string(), json!(1)), ("$['a'][1]".to_string(), json!(2))]
        );
    }

    #[test]
    fn test_replace_nested_matches_deepest_first() {
        let mut doc = json!({"a": {"a": {"a": 1}}});
        let path: JsonPath = JsonPath::compile("$..a").unwrap();
        let mut order = Vec::new();
        let written = path
            .replace_with(&mut doc, |p, v| {
                order.push(p.to_string());
                if let Some(n) = v.as_i64() {
                    *v = json!(n + 1);
                }
            })
            .unwrap();
        assert_eq!(written, 3);
        assert_eq!(order, vec!["$['a']['a']['a']", "$['a']['a']", "$['a']"]);
        assert_eq!(doc, json!({"a": {"a": {"a": 2}}}));
    }

    #[test]
    fn test_replace_touches_duplicates_once() {
        let mut doc = json!([1, 2, 3]);
        let path: JsonPath = JsonPath::compile("$[0,0,2]").unwrap();
        let mut calls = 0;
        let written = path
            .replace_with(&mut doc, |_, v| {
                calls += 1;
                *v = json!(0);
            })
            .unwrap();
        assert_eq!((written, calls), (2, 2));
        assert_eq!(doc, json!([0, 2, 0]));
    }

    #[test]
    fn test_replace_skips_synthesized_nodes() {
        let mut doc = json!({"list": [1, 2]});
        assert_eq!(replace(&mut doc, "$.list.length", json!(9)), Ok(0));
        assert_eq!(doc, json!({"list": [1, 2]}));
    }

    #[test]
    fn test_failed_replace_leaves_document_untouched() {
        let mut doc = json!({"a": 1});
        let err = replace(&mut doc, "$.a^^^^", json!(0)).unwrap_err();
        assert!(matches!(err, JsonPathError::Evaluation(e) if e.code == ErrorCode::ParentOperatorOutsideBrackets));
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn test_select_paths_are_unique_and_sorted() {
        let doc = json!([1, 2, 3, 4, 5]);
        let path: JsonPath = JsonPath::compile("$[4,1,1]").unwrap();
        let paths: Vec<String> = path.select_paths(&doc).unwrap().iter().map(ToString::to_string).collect();
        assert_eq!(paths, vec!["$[1]", "$[4]"]);
    }

    #[test]
    fn test_builder_options_drive_select() {
        let doc = json!([3, 1, 3]);
        let path = JsonPathBuilder::<Value>::new()
            .with_options(ResultOptions::NODUPS | ResultOptions::PATH)
            .build("$[0,0,1]")
            .unwrap();
        assert_eq!(path.select(&doc).unwrap(), json!(["$[0]", "$[1]"]));
        assert_eq!(path.select_values(&doc).unwrap(), vec![json!(3), json!(1)]);
        assert_eq!(path.to_string(), "$[0,0,1]");
    }

    #[test]
    fn test_query_surfaces_syntax_errors() {
        let err = query(&json!({}), "$[", ResultOptions::NONE).unwrap_err();
        assert!(matches!(err, JsonPathError::Syntax(_)));
    }
}
