//! Defines the Abstract Syntax Tree (AST) for compiled path expressions.
use regex::Regex;
use sift_value::JsonValue;

/// One step of a selector pipeline.
#[derive(Debug, Clone)]
pub enum Selector {
    /// `$`: the document root.
    Root,
    /// `@`: the node the enclosing filter is testing.
    Current,
    Member(String),
    Index(i64),
    Wildcard,
    /// The node itself followed by all of its descendants, pre-order.
    RecursiveDescent,
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: Option<i64>,
    },
    /// Each item is a pipeline evaluated against the same input; outputs are concatenated.
    Union(Vec<Vec<Selector>>),
    Filter(Term),
    Parent,
    ExpressionIndex(Term),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
}

impl Literal {
    pub fn to_value<V: JsonValue>(&self) -> V {
        match self {
            Literal::Null => V::null(),
            Literal::Bool(b) => V::from_bool(*b),
            Literal::Int(n) => V::from_i64(*n),
            Literal::UInt(n) => V::from_u64(*n),
            Literal::Float(n) => V::from_f64(*n),
            Literal::String(s) => V::from_string(s.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    RegexMatch,
}

impl BinaryOp {
    /// Binding strength; larger binds tighter. Every binary operator is left-associative.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div => 6,
            BinaryOp::RegexMatch => 7,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::RegexMatch => "=~",
        }
    }
}

/// A node of a filter or index expression.
#[derive(Debug, Clone)]
pub enum Term {
    Value(Literal),
    /// A sub-pipeline starting at `$` or `@`.
    Path(Vec<Selector>),
    Regex(Regex),
    Unary {
        op: UnaryOp,
        operand: Box<Term>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Term>,
        rhs: Box<Term>,
    },
    /// A function call, optionally followed by selectors applied to its result.
    Function {
        name: String,
        args: Vec<Term>,
        postfix: Vec<Selector>,
    },
}
