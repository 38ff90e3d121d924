//! Write values into a nested fragment by dotted path.
//!
//! `("database.url", "pg://")` becomes `{database = {url = "pg://"}}` and
//! `("servers.0.host", "a")` becomes `{servers = [{host = "a"}]}`: the shape of
//! each intermediate container is inferred from the segment that follows it.

use crate::value::{Mapping, Value};

/// How far past a sequence's end an index may reach before the segment is
/// treated as a plain mapping key instead.
const MAX_INDEX_GAP: usize = 1024;

/// Assign `value` at `dotted_path` inside `root`, creating containers on demand.
///
/// For every segment but the last, the slot is kept if it already holds a
/// mapping or sequence and replaced otherwise. A fresh container is a
/// sequence when the *next* segment is an array index, else a mapping.
/// The last segment overwrites whatever was there.
///
/// An index more than `MAX_INDEX_GAP` past the end of its sequence is a
/// mapping key, so `list.99999999` can't allocate a huge run of nulls.
pub fn assign(root: &mut Mapping, dotted_path: &str, value: Value) {
    let segments: Vec<&str> = dotted_path.split('.').collect();
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };
    let Some((first, rest)) = parents.split_first() else {
        root.insert(leaf.to_string(), value);
        return;
    };

    let mut current = root.entry(first.to_string()).or_insert(Value::Null);
    prepare_container(current, segments[1]);
    for (i, segment) in rest.iter().enumerate() {
        current = child_slot(current, segment);
        // `rest[i]` is `segments[i + 1]`, so its successor is `segments[i + 2]`.
        prepare_container(current, segments[i + 2]);
    }
    *child_slot(current, leaf) = value;
}

/// Get (creating as needed) the mapping at `segments` below `root`.
///
/// Used by the INI parser for `[a.b]` section headers, where every level is a
/// mapping regardless of what the segment looks like.
pub(crate) fn mapping_at<'a>(root: &'a mut Mapping, segments: &[&str]) -> &'a mut Mapping {
    segments.iter().fold(root, |current, segment| {
        ensure_mapping(current.entry(segment.to_string()).or_insert(Value::Null))
    })
}

/// A segment is an array index when it round-trips through `usize` unchanged,
/// so `"0"` and `"12"` qualify but `"01"`, `"-1"` and `"1.5"` don't.
pub(crate) fn array_index(segment: &str) -> Option<usize> {
    segment
        .parse::<usize>()
        .ok()
        .filter(|i| i.to_string() == segment)
}

fn prepare_container(slot: &mut Value, next_segment: &str) {
    if slot.is_container() {
        return;
    }
    *slot = match sequence_index(next_segment, 0) {
        Some(_) => Value::Sequence(Vec::new()),
        None => Value::Mapping(Mapping::new()),
    };
}

/// The slot for `key` inside `container`.
fn child_slot<'a>(container: &'a mut Value, key: &str) -> &'a mut Value {
    let index = match &*container {
        Value::Sequence(items) => sequence_index(key, items.len()),
        _ => None,
    };
    match (container, index) {
        (Value::Sequence(items), Some(index)) => {
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        (container, _) => ensure_mapping(container)
            .entry(key.to_string())
            .or_insert(Value::Null),
    }
}

/// `segment` as an index into a sequence of `len` items, if it is close
/// enough to the end to be padded to.
fn sequence_index(segment: &str, len: usize) -> Option<usize> {
    array_index(segment).filter(|&index| index.saturating_sub(len) <= MAX_INDEX_GAP)
}

/// Turn `value` into a mapping in place. A sequence keeps its elements under
/// their indices; any other value is discarded.
fn ensure_mapping(value: &mut Value) -> &mut Mapping {
    match value {
        Value::Mapping(map) => map,
        other => {
            let map = match std::mem::take(other) {
                Value::Sequence(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| (i.to_string(), item))
                    .collect(),
                _ => Mapping::new(),
            };
            *other = Value::Mapping(map);
            ensure_mapping(other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::mapping;
    use serde_json::json;

    fn assigned(pairs: &[(&str, Value)]) -> Mapping {
        let mut root = Mapping::new();
        for (path, value) in pairs {
            assign(&mut root, path, value.clone());
        }
        root
    }

    #[test]
    fn flat_key() {
        let root = assigned(&[("host", Value::from("0.0.0.0"))]);
        assert_eq!(root, mapping(json!({"host": "0.0.0.0"})));
    }

    #[test]
    fn nested_key() {
        let root = assigned(&[("database.url", Value::from("pg://"))]);
        assert_eq!(root, mapping(json!({"database": {"url": "pg://"}})));
    }

    #[test]
    fn deep_nesting() {
        let root = assigned(&[("a.b.c.d", Value::from(42i64))]);
        assert_eq!(root, mapping(json!({"a": {"b": {"c": {"d": 42}}}})));
    }

    #[test]
    fn numeric_next_segment_creates_sequence() {
        let root = assigned(&[
            ("servers.0.host", Value::from("a")),
            ("servers.1.host", Value::from("b")),
        ]);
        assert_eq!(
            root,
            mapping(json!({"servers": [{"host": "a"}, {"host": "b"}]}))
        );
    }

    #[test]
    fn sparse_index_pads_with_null() {
        let root = assigned(&[("list.2", Value::from("c"))]);
        assert_eq!(root, mapping(json!({"list": [null, null, "c"]})));
    }

    #[test]
    fn only_the_next_segment_decides_container_kind() {
        // "a" becomes a sequence because "0" follows it; element 0 becomes a
        // mapping because "b" follows it.
        let root = assigned(&[("a.0.b", Value::from("x"))]);
        assert_eq!(root, mapping(json!({"a": [{"b": "x"}]})));

        // A numeric *leaf* never turns its parent into a sequence retroactively.
        let root = assigned(&[("a.b", Value::from("x")), ("a.0", Value::from("y"))]);
        assert_eq!(root, mapping(json!({"a": {"b": "x", "0": "y"}})));
    }

    #[test]
    fn non_canonical_numbers_are_keys() {
        let root = assigned(&[("a.01.b", Value::from(true)), ("c.-1.d", Value::from(true))]);
        assert_eq!(
            root,
            mapping(json!({"a": {"01": {"b": true}}, "c": {"-1": {"d": true}}}))
        );
    }

    #[test]
    fn scalar_intermediate_is_replaced_by_container() {
        let root = assigned(&[
            ("database", Value::from("flat")),
            ("database.url", Value::from("pg://")),
        ]);
        assert_eq!(root, mapping(json!({"database": {"url": "pg://"}})));
    }

    #[test]
    fn existing_container_is_kept() {
        let root = assigned(&[
            ("database.url", Value::from("pg://")),
            ("database.pool", Value::from(5i64)),
        ]);
        assert_eq!(root, mapping(json!({"database": {"url": "pg://", "pool": 5}})));
    }

    #[test]
    fn named_key_into_sequence_converts_to_mapping() {
        let root = assigned(&[
            ("list.0", Value::from("first")),
            ("list.name", Value::from("named")),
        ]);
        assert_eq!(root, mapping(json!({"list": {"0": "first", "name": "named"}})));
    }

    #[test]
    fn last_assignment_wins() {
        let root = assigned(&[("port", Value::from(3000i64)), ("port", Value::from(5000i64))]);
        assert_eq!(root, mapping(json!({"port": 5000})));
    }

    #[test]
    fn leaf_overwrites_container() {
        let root = assigned(&[("a.b", Value::from(1i64)), ("a", Value::from("flat"))]);
        assert_eq!(root, mapping(json!({"a": "flat"})));
    }

    #[test]
    fn mapping_at_builds_nested_sections() {
        let mut root = Mapping::new();
        mapping_at(&mut root, &["a", "b"]).insert("k".into(), Value::from("v"));
        mapping_at(&mut root, &["a"]).insert("top".into(), Value::from("t"));
        assert_eq!(root, mapping(json!({"a": {"top": "t", "b": {"k": "v"}}})));
    }

    #[test]
    fn far_index_becomes_mapping_key() {
        let root = assigned(&[("list.18446744073709551615", Value::from("x"))]);
        assert_eq!(root, mapping(json!({"list": {"18446744073709551615": "x"}})));

        let root = assigned(&[("list.9999999999999.name", Value::from("x"))]);
        assert_eq!(root, mapping(json!({"list": {"9999999999999": {"name": "x"}}})));
    }

    #[test]
    fn far_index_into_sequence_converts_it() {
        let root = assigned(&[
            ("list.0", Value::from("first")),
            ("list.5000", Value::from("far")),
        ]);
        assert_eq!(root, mapping(json!({"list": {"0": "first", "5000": "far"}})));
    }

    #[test]
    fn index_within_gap_still_pads() {
        let root = assigned(&[("list.1024", Value::from("x"))]);
        let list = root["list"].as_sequence().unwrap();
        assert_eq!(list.len(), 1025);
        assert!(list[..1024].iter().all(Value::is_null));
        assert_eq!(list[1024], Value::from("x"));
    }

    #[test]
    fn array_index_is_canonical_only() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("17"), Some(17));
        assert_eq!(array_index("01"), None);
        assert_eq!(array_index("+1"), None);
        assert_eq!(array_index("x"), None);
        assert_eq!(array_index(""), None);
    }
}
