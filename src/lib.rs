//! JSONPath query and transform engine.
//!
//! This crate bundles the [`sift_jsonpath`] engine with the value adapter from
//! [`sift_value`] and hosts the `sift` command-line tool.

pub mod cli;

pub use sift_jsonpath::*;
pub use sift_value;
