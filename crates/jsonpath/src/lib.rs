//! A JSONPath query and transform engine over any [`JsonValue`] document model.
//!
//! Expressions are compiled once into a [`JsonPath`] and can then be evaluated to
//! collect matched values or their normalized paths, stream matches to a callback,
//! or replace matched locations in place.
//!
//! ```
//! use serde_json::json;
//! use sift_jsonpath::{ResultOptions, query};
//!
//! let doc = json!([1, 2, 3, 4, 5]);
//! let sorted = query(&doc, "$[4,1,1]", ResultOptions::NODUPS | ResultOptions::SORT).unwrap();
//! assert_eq!(sorted, json!([2, 5]));
//! ```

pub mod ast;
pub mod error;
pub mod functions;
pub mod operators;
pub mod parser;
pub mod path;
pub mod token;

mod collect;
mod engine;
mod expression;
mod flatten;
mod node;
mod options;

pub use error::{ErrorCode, EvaluationError, FlattenError, JsonPathError, SyntaxError, SyntaxErrorKind};
pub use expression::{JsonPath, JsonPathBuilder, query, replace, replace_with};
pub use flatten::{flatten, unflatten};
pub use functions::{Function, FunctionRegistry};
pub use node::Node;
pub use operators::Operand;
pub use options::{ParseOptionsError, ResultOptions};
pub use path::{NormalizedPath, PathElement};
pub use sift_value::{JsonValue, ValueKind};
