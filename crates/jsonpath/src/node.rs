//! Matched nodes with structurally shared location tracking.
//!
//! A [`Node`] is a value together with a link to the node it was reached from. Every
//! branch of a traversal shares the common prefix of its location, so expanding a node
//! into its children costs one small allocation per child rather than a path copy.
use crate::path::{NormalizedPath, PathElement};
use sift_value::JsonValue;
use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone)]
enum Segment<'a> {
    Root,
    Key(Cow<'a, str>),
    Index(usize),
}

struct NodeInner<'a, V: JsonValue> {
    parent: Option<Node<'a, V>>,
    segment: Segment<'a>,
    value: Cow<'a, V>,
}

/// A node reached during evaluation.
///
/// Nodes inside the queried document borrow from it. Values computed during evaluation,
/// such as function results or a synthesized `length`, are owned by the node.
pub struct Node<'a, V: JsonValue>(Rc<NodeInner<'a, V>>);

impl<V: JsonValue> Clone for Node<'_, V> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<V: JsonValue> fmt::Debug for Node<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.path().to_string())
            .field("value", self.value())
            .finish()
    }
}

impl<'a, V: JsonValue> Node<'a, V> {
    pub(crate) fn root(value: &'a V) -> Self {
        Self(Rc::new(NodeInner {
            parent: None,
            segment: Segment::Root,
            value: Cow::Borrowed(value),
        }))
    }

    /// A root-less node holding a computed value.
    pub(crate) fn detached(value: V) -> Self {
        Self(Rc::new(NodeInner {
            parent: None,
            segment: Segment::Root,
            value: Cow::Owned(value),
        }))
    }

    fn child(&self, segment: Segment<'a>, value: Cow<'a, V>) -> Self {
        Self(Rc::new(NodeInner {
            parent: Some(self.clone()),
            segment,
            value,
        }))
    }

    pub fn value(&self) -> &V {
        &self.0.value
    }

    /// The node this one was reached from, or `None` at the root.
    pub fn parent(&self) -> Option<&Node<'a, V>> {
        self.0.parent.as_ref()
    }

    /// Builds the normalized path by walking up to the root.
    pub fn path(&self) -> NormalizedPath {
        let mut elements = Vec::new();
        let mut current = Some(self);
        while let Some(node) = current {
            match &node.0.segment {
                Segment::Root => {}
                Segment::Key(key) => elements.push(PathElement::Key(key.to_string())),
                Segment::Index(index) => elements.push(PathElement::Index(*index)),
            }
            current = node.parent();
        }
        elements.reverse();
        NormalizedPath::from(elements)
    }

    fn lookup_key(&self, key: &str) -> Option<Cow<'a, V>> {
        match &self.0.value {
            Cow::Borrowed(v) => Some(Cow::Borrowed((*v).get_key(key)?)),
            Cow::Owned(v) => Some(Cow::Owned(v.get_key(key)?.clone())),
        }
    }

    pub(crate) fn child_key(&self, key: &'a str) -> Option<Self> {
        let value = self.lookup_key(key)?;
        Some(self.child(Segment::Key(Cow::Borrowed(key)), value))
    }

    /// Like [`Node::child_key`] for a key computed during evaluation.
    pub(crate) fn child_key_owned(&self, key: &str) -> Option<Self> {
        let value = self.lookup_key(key)?;
        Some(self.child(Segment::Key(Cow::Owned(key.to_string())), value))
    }

    pub(crate) fn child_index(&self, index: usize) -> Option<Self> {
        let value = match &self.0.value {
            Cow::Borrowed(v) => Cow::Borrowed((*v).get_index(index)?),
            Cow::Owned(v) => Cow::Owned(v.get_index(index)?.clone()),
        };
        Some(self.child(Segment::Index(index), value))
    }

    /// A child holding a computed value that does not exist in the document.
    pub(crate) fn synthetic_child(&self, key: &'a str, value: V) -> Self {
        self.child(Segment::Key(Cow::Borrowed(key)), Cow::Owned(value))
    }

    /// All immediate children: array elements in order, object members in the
    /// object's own order. Scalars have none.
    pub(crate) fn children(&self) -> Vec<Self> {
        match &self.0.value {
            Cow::Borrowed(v) => {
                let v: &'a V = *v;
                if v.is_array() {
                    v.iter_array()
                        .enumerate()
                        .map(|(i, item)| self.child(Segment::Index(i), Cow::Borrowed(item)))
                        .collect()
                } else {
                    v.iter_object()
                        .map(|(k, item)| self.child(Segment::Key(Cow::Borrowed(k)), Cow::Borrowed(item)))
                        .collect()
                }
            }
            Cow::Owned(v) => {
                if v.is_array() {
                    v.iter_array()
                        .enumerate()
                        .map(|(i, item)| self.child(Segment::Index(i), Cow::Owned(item.clone())))
                        .collect()
                } else {
                    v.iter_object()
                        .map(|(k, item)| {
                            self.child(Segment::Key(Cow::Owned(k.to_string())), Cow::Owned(item.clone()))
                        })
                        .collect()
                }
            }
        }
    }

    /// The node followed by every descendant, pre-order.
    pub(crate) fn descendants(&self, out: &mut Vec<Self>) {
        out.push(self.clone());
        for child in self.children() {
            child.descendants(out);
        }
    }
}
