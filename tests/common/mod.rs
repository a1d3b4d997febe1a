pub mod fixtures;

use serde_json::Value;
use sift::{JsonPath, ResultOptions};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Compiles `expr` and evaluates it against `doc` with `options`.
pub fn eval(doc: &Value, expr: &str, options: ResultOptions) -> Result<Value, Box<dyn std::error::Error>> {
    let path = JsonPath::<Value>::compile(expr)?;
    Ok(path.evaluate(doc, options)?)
}

/// Evaluates `expr` and returns the matched normalized paths as strings.
pub fn paths(doc: &Value, expr: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let result = eval(doc, expr, ResultOptions::PATH)?;
    Ok(result
        .as_array()
        .map(|items| items.iter().filter_map(|p| p.as_str().map(str::to_string)).collect())
        .unwrap_or_default())
}
