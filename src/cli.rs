//! The `sift` command-line host.
use crate::{JsonPath, JsonPathError, ParseOptionsError, ResultOptions, flatten, unflatten};
use clap::Parser;
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Query(#[from] JsonPathError),

    #[error(transparent)]
    Options(#[from] ParseOptionsError),

    #[error("an expression is required unless --flatten or --unflatten is given")]
    MissingExpression,
}

/// Query, replace or flatten a JSON document.
#[derive(Parser, Debug, Default)]
#[command(name = "sift", version, about)]
pub struct Args {
    /// JSONPath expression, e.g. `$.store.book[?(@.price < 10)].title`
    #[arg(value_name = "EXPRESSION")]
    pub expression: Option<String>,

    /// Input document; reads stdin when absent
    #[arg(long, short = 'f', value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Emit normalized paths instead of values
    #[arg(long)]
    pub path: bool,

    /// Drop matches whose path was already emitted
    #[arg(long)]
    pub nodups: bool,

    /// Order matches by normalized path
    #[arg(long)]
    pub sort: bool,

    /// Result options as a list, e.g. `nodups|sort`
    #[arg(long, value_name = "LIST")]
    pub options: Option<String>,

    /// Replace every match with this JSON value and print the document
    #[arg(long, value_name = "JSON", conflicts_with_all = ["flatten", "unflatten"])]
    pub replace: Option<String>,

    /// Print the input flattened to a path-keyed object
    #[arg(long, conflicts_with = "unflatten")]
    pub flatten: bool,

    /// Rebuild a nested document from a path-keyed object
    #[arg(long)]
    pub unflatten: bool,

    /// Print single-line JSON
    #[arg(long)]
    pub compact: bool,
}

impl Args {
    /// Combines `--options` with the individual option flags.
    pub fn result_options(&self) -> Result<ResultOptions, ParseOptionsError> {
        let mut options = match &self.options {
            Some(list) => list.parse()?,
            None => ResultOptions::NONE,
        };
        if self.path {
            options |= ResultOptions::PATH;
        }
        if self.nodups {
            options |= ResultOptions::NODUPS;
        }
        if self.sort {
            options |= ResultOptions::SORT;
        }
        Ok(options)
    }

    pub fn read_input(&self) -> Result<String, CliError> {
        match &self.file {
            Some(path) => Ok(fs::read_to_string(path)?),
            None => {
                let mut buffer = String::new();
                io::stdin().read_to_string(&mut buffer)?;
                Ok(buffer)
            }
        }
    }
}

/// Runs one invocation against `input` and returns the text to print.
pub fn run(args: &Args, input: &str) -> Result<String, CliError> {
    let document: Value = serde_json::from_str(input)?;

    let output = if args.flatten {
        flatten(&document)
    } else if args.unflatten {
        unflatten(&document).map_err(JsonPathError::from)?
    } else {
        let expression = args.expression.as_deref().ok_or(CliError::MissingExpression)?;
        let path = JsonPath::<Value>::compile(expression).map_err(JsonPathError::from)?;
        match &args.replace {
            Some(replacement) => {
                let new_value: Value = serde_json::from_str(replacement)?;
                let mut document = document;
                let count = path.replace(&mut document, new_value).map_err(JsonPathError::from)?;
                log::info!("replaced {count} location(s)");
                document
            }
            None => path
                .evaluate(&document, args.result_options()?)
                .map_err(JsonPathError::from)?,
        }
    };

    let text = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    Ok(text)
}
