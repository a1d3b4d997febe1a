use std::fmt;
use thiserror::Error;

/// What went wrong while compiling an expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated regular expression")]
    UnterminatedRegex,

    #[error("invalid escape sequence")]
    InvalidEscape,

    #[error("invalid number literal")]
    InvalidNumber,

    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("expected {expected}, found end of expression")]
    UnexpectedEnd { expected: String },

    #[error("empty filter expression")]
    EmptyFilter,

    #[error("slice step cannot be zero")]
    ZeroSliceStep,

    #[error("'@' is only valid inside a filter or bracket expression")]
    CurrentNodeAtTopLevel,
}

/// A compile-time error, carrying the byte offset into the expression where it was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error at offset {offset}: {kind}")]
pub struct SyntaxError {
    pub offset: usize,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    pub fn new(offset: usize, kind: SyntaxErrorKind) -> Self {
        Self { offset, kind }
    }

    pub fn unexpected(offset: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::new(
            offset,
            SyntaxErrorKind::UnexpectedToken {
                expected: expected.into(),
                found: found.into(),
            },
        )
    }

    pub fn unexpected_end(offset: usize, expected: impl Into<String>) -> Self {
        Self::new(
            offset,
            SyntaxErrorKind::UnexpectedEnd {
                expected: expected.into(),
            },
        )
    }
}

/// Runtime error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidType,
    FunctionNameNotFound,
    InvalidFilterUnsupportedOperator,
    ParentOperatorOutsideBrackets,
    InvalidExpressionIndex,
}

impl ErrorCode {
    /// Fatal errors abort the whole evaluation. All others only make the
    /// enclosing filter predicate false for the current candidate.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ErrorCode::ParentOperatorOutsideBrackets | ErrorCode::InvalidExpressionIndex
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidType => "invalid type",
            ErrorCode::FunctionNameNotFound => "function name not found",
            ErrorCode::InvalidFilterUnsupportedOperator => "unsupported operator in filter",
            ErrorCode::ParentOperatorOutsideBrackets => "parent operator applied to the root",
            ErrorCode::InvalidExpressionIndex => "invalid expression index",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct EvaluationError {
    pub code: ErrorCode,
    pub message: String,
}

impl EvaluationError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_type(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidType, message)
    }

    pub fn function_not_found(name: &str, arity: usize) -> Self {
        Self::new(
            ErrorCode::FunctionNameNotFound,
            format!("no function '{name}' taking {arity} argument(s)"),
        )
    }

    pub fn unsupported_operator(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFilterUnsupportedOperator, message)
    }

    pub fn is_fatal(&self) -> bool {
        self.code.is_fatal()
    }
}

impl From<ErrorCode> for EvaluationError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code, code.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlattenError {
    #[error("unflatten requires an object keyed by normalized paths")]
    NotAnObject,

    #[error("invalid normalized path '{key}' at offset {offset}")]
    InvalidKey { key: String, offset: usize },
}

/// The error type of the one-shot entry points such as [`crate::query`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JsonPathError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Flatten(#[from] FlattenError),
}
