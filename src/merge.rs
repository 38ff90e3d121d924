use indexmap::IndexMap;

use crate::value::Value;

/// A tree whose interior nodes can be string-keyed maps.
///
/// Both plain values and provenance-tagged values implement this, so they
/// share a single merge routine and can't drift apart semantically.
pub trait Node: Sized {
    /// Hand back the map if this node is one, otherwise the node itself.
    fn into_mapping(self) -> Result<IndexMap<String, Self>, Self>;

    fn from_mapping(map: IndexMap<String, Self>) -> Self;
}

impl Node for Value {
    fn into_mapping(self) -> Result<IndexMap<String, Self>, Self> {
        match self {
            Value::Mapping(map) => Ok(map),
            other => Err(other),
        }
    }

    fn from_mapping(map: IndexMap<String, Self>) -> Self {
        Value::Mapping(map)
    }
}

/// Deep-merge `overlay` on top of `base`.
/// If both sides have a map for the same key, recurse.
/// Otherwise, `overlay`'s value wins. Sequences are replaced whole.
///
/// Keys already in `base` keep their position; new keys are appended in
/// `overlay`'s order.
pub fn deep_merge<T: Node>(
    mut base: IndexMap<String, T>,
    overlay: IndexMap<String, T>,
) -> IndexMap<String, T> {
    for (key, overlay_val) in overlay {
        let merged = match overlay_val.into_mapping() {
            Ok(overlay_map) => {
                let base_val = base
                    .get_mut(&key)
                    .map(|slot| std::mem::replace(slot, T::from_mapping(IndexMap::new())));
                match base_val.map(T::into_mapping) {
                    Some(Ok(base_map)) => T::from_mapping(deep_merge(base_map, overlay_map)),
                    _ => T::from_mapping(overlay_map),
                }
            }
            Err(overlay_val) => overlay_val,
        };
        base.insert(key, merged);
    }
    base
}

/// Merge fragments in ascending precedence, starting from an empty map.
pub fn merge_all<T: Node>(
    fragments: impl IntoIterator<Item = IndexMap<String, T>>,
) -> IndexMap<String, T> {
    fragments.into_iter().fold(IndexMap::new(), deep_merge)
}
