//! Post-processing of matched nodes: de-duplication and ordering by path.
use crate::node::Node;
use crate::options::ResultOptions;
use crate::path::NormalizedPath;
use indexmap::IndexMap;
use sift_value::JsonValue;

pub(crate) struct Match<'a, V: JsonValue> {
    pub path: NormalizedPath,
    pub rendered: String,
    pub node: Node<'a, V>,
}

/// Renders paths for every node and applies `NODUPS` and `SORT`.
///
/// De-duplication keeps the first occurrence of each path in traversal order; sorting
/// is stable and orders by the rendered bracket notation.
pub(crate) fn arrange<'a, V: JsonValue>(nodes: Vec<Node<'a, V>>, options: ResultOptions) -> Vec<Match<'a, V>> {
    let mut matches: Vec<Match<'a, V>> = nodes
        .into_iter()
        .map(|node| {
            let path = node.path();
            let rendered = path.to_string();
            Match { path, rendered, node }
        })
        .collect();

    if options.contains(ResultOptions::NODUPS) {
        let mut unique: IndexMap<String, Match<'a, V>> = IndexMap::with_capacity(matches.len());
        for m in matches {
            unique.entry(m.rendered.clone()).or_insert(m);
        }
        matches = unique.into_values().collect();
    }
    if options.contains(ResultOptions::SORT) {
        matches.sort_by(|a, b| a.rendered.cmp(&b.rendered));
    }
    matches
}

/// Builds the array returned by an evaluation: values, or path strings with `PATH`.
pub(crate) fn emit<V: JsonValue>(nodes: Vec<Node<'_, V>>, options: ResultOptions) -> V {
    let plain = !options.contains(ResultOptions::NODUPS)
        && !options.contains(ResultOptions::SORT)
        && !options.contains(ResultOptions::PATH);
    if plain {
        return V::from_array(nodes.iter().map(|n| n.value().clone()).collect());
    }
    let matches = arrange(nodes, options);
    let items = if options.contains(ResultOptions::PATH) {
        matches.into_iter().map(|m| V::from_string(m.rendered)).collect()
    } else {
        matches.into_iter().map(|m| m.node.value().clone()).collect()
    };
    V::from_array(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn nodes_at<'a>(doc: &'a Value, indices: &[usize]) -> Vec<Node<'a, Value>> {
        let root = Node::root(doc);
        indices.iter().filter_map(|&i| root.child_index(i)).collect()
    }

    #[test]
    fn test_emit_options() {
        let doc = json!([1, 2, 3, 4, 5]);
        let run = |options| emit(nodes_at(&doc, &[4, 1, 1]), options);
        assert_eq!(run(ResultOptions::NONE), json!([5, 2, 2]));
        assert_eq!(run(ResultOptions::NODUPS), json!([5, 2]));
        assert_eq!(run(ResultOptions::SORT), json!([2, 2, 5]));
        assert_eq!(run(ResultOptions::NODUPS | ResultOptions::SORT), json!([2, 5]));
        assert_eq!(run(ResultOptions::PATH), json!(["$[4]", "$[1]", "$[1]"]));
    }

    #[test]
    fn test_nodups_is_idempotent() {
        let doc = json!([1, 2, 3]);
        let once = arrange(nodes_at(&doc, &[2, 0, 2, 0]), ResultOptions::NODUPS);
        let again = arrange(
            once.iter().map(|m| m.node.clone()).collect(),
            ResultOptions::NODUPS,
        );
        let rendered: Vec<&str> = again.iter().map(|m| m.rendered.as_str()).collect();
        assert_eq!(rendered, vec!["$[2]", "$[0]"]);
        assert_eq!(once.len(), again.len());
    }
}
