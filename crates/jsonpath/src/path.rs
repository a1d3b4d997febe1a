//! Normalized paths: owned, canonical locations of nodes within a document.
use crate::error::FlattenError;
use crate::token::{NumberLit, TokenKind, tokenize};
use sift_value::JsonValue;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    Key(String),
    Index(usize),
}

/// The location of a node, rendered in bracket notation as `$['store']['book'][0]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NormalizedPath(Vec<PathElement>);

impl NormalizedPath {
    /// The path of the document root, `$`.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, element: PathElement) {
        self.0.push(element);
    }

    pub fn pop(&mut self) -> Option<PathElement> {
        self.0.pop()
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.0
    }

    /// Number of steps below the root.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Follows the path from `root`. Returns `None` if any step is missing.
    pub fn resolve<'v, V: JsonValue>(&self, root: &'v V) -> Option<&'v V> {
        self.0.iter().try_fold(root, |current, element| match element {
            PathElement::Key(key) => current.get_key(key),
            PathElement::Index(index) => current.get_index(*index),
        })
    }

    pub fn resolve_mut<'v, V: JsonValue>(&self, root: &'v mut V) -> Option<&'v mut V> {
        let mut current = root;
        for element in &self.0 {
            current = match element {
                PathElement::Key(key) => current.get_key_mut(key)?,
                PathElement::Index(index) => current.get_index_mut(*index)?,
            };
        }
        Some(current)
    }
}

impl From<Vec<PathElement>> for NormalizedPath {
    fn from(elements: Vec<PathElement>) -> Self {
        Self(elements)
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for element in &self.0 {
            match element {
                PathElement::Key(key) => {
                    f.write_str("['")?;
                    for c in key.chars() {
                        if c == '\'' || c == '\\' {
                            f.write_str("\\")?;
                        }
                        write!(f, "{c}")?;
                    }
                    f.write_str("']")?;
                }
                PathElement::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for NormalizedPath {
    type Err = FlattenError;

    /// Parses bracket notation: `$` followed by any number of `['key']` or `[index]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |offset: usize| FlattenError::InvalidKey {
            key: s.to_string(),
            offset,
        };
        let tokens = tokenize(s).map_err(|e| invalid(e.offset))?;
        let mut tokens = tokens.iter();

        match tokens.next() {
            Some(t) if t.kind == TokenKind::Root => {}
            t => return Err(invalid(t.map_or(0, |t| t.offset))),
        }

        let mut path = Self::root();
        loop {
            let Some(open) = tokens.next() else {
                return Err(invalid(s.len()));
            };
            match open.kind {
                TokenKind::End => return Ok(path),
                TokenKind::LBracket => {}
                _ => return Err(invalid(open.offset)),
            }
            let element = match tokens.next() {
                Some(t) => match &t.kind {
                    TokenKind::String(key) => PathElement::Key(key.clone()),
                    TokenKind::Number(NumberLit::Int(n)) if *n >= 0 => {
                        PathElement::Index(usize::try_from(*n).map_err(|_| invalid(t.offset))?)
                    }
                    _ => return Err(invalid(t.offset)),
                },
                None => return Err(invalid(s.len())),
            };
            match tokens.next() {
                Some(t) if t.kind == TokenKind::RBracket => path.push(element),
                t => return Err(invalid(t.map_or(s.len(), |t| t.offset))),
            }
        }
    }
}
