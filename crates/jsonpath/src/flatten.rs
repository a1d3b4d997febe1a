//! Conversion between nested documents and flat objects keyed by normalized paths.
use crate::error::FlattenError;
use crate::path::{NormalizedPath, PathElement};
use sift_value::{JsonValue, ValueKind};

/// Maps every leaf of `value` to an entry keyed by its normalized path.
///
/// Scalars and empty arrays or objects are leaves. A scalar root flattens to `{"$": value}`.
pub fn flatten<V: JsonValue>(value: &V) -> V {
    let mut flat = V::empty_object();
    let mut path = NormalizedPath::root();
    flatten_into(value, &mut path, &mut flat);
    flat
}

fn flatten_into<V: JsonValue>(value: &V, path: &mut NormalizedPath, flat: &mut V) {
    match value.kind() {
        ValueKind::Array if !value.is_empty() => {
            for (index, item) in value.iter_array().enumerate() {
                path.push(PathElement::Index(index));
                flatten_into(item, path, flat);
                path.pop();
            }
        }
        ValueKind::Object if !value.is_empty() => {
            for (key, item) in value.iter_object() {
                path.push(PathElement::Key(key.to_string()));
                flatten_into(item, path, flat);
                path.pop();
            }
        }
        _ => {
            flat.insert_key(path.to_string(), value.clone());
        }
    }
}

/// Rebuilds a nested document from the output of [`flatten`].
pub fn unflatten<V: JsonValue>(flat: &V) -> Result<V, FlattenError> {
    if !flat.is_object() {
        return Err(FlattenError::NotAnObject);
    }
    let mut result = V::null();
    for (key, value) in flat.iter_object() {
        let path: NormalizedPath = key.parse()?;
        *slot(&mut result, &path, key)? = value.clone();
    }
    Ok(result)
}

/// Walks `path` from `root`, creating objects, arrays and null padding as needed.
fn slot<'v, V: JsonValue>(root: &'v mut V, path: &NormalizedPath, key: &str) -> Result<&'v mut V, FlattenError> {
    let conflict = || FlattenError::InvalidKey {
        key: key.to_string(),
        offset: 0,
    };
    let mut current = root;
    for element in path.elements() {
        current = match element {
            PathElement::Key(name) => {
                if current.is_null() {
                    *current = V::empty_object();
                }
                if current.get_key(name).is_none() && !current.insert_key(name.clone(), V::null()) {
                    return Err(conflict());
                }
                current.get_key_mut(name).ok_or_else(conflict)?
            }
            PathElement::Index(index) => {
                if current.is_null() {
                    *current = V::from_array(Vec::new());
                }
                if !current.is_array() {
                    return Err(conflict());
                }
                while current.len() <= *index {
                    current.push(V::null());
                }
                current.get_index_mut(*index).ok_or_else(conflict)?
            }
        };
    }
    Ok(current)
}
