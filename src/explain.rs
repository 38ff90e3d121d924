//! Provenance: which source supplied each resolved value.
//!
//! An [`Explanation`] has the same shape as the resolved config, but every
//! leaf is a [`Sourced`] pair. Serialized, a leaf reads
//! `{"val": "c1", "src": "../../../.myapprc"}`.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::RcfigError;
use crate::merge::Node;
use crate::template::Templater;
use crate::types::Source;
use crate::value::{Mapping, Value};

/// The resolved config with every leaf annotated.
pub type Explanation = IndexMap<String, Explained>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced {
    pub val: Value,
    pub src: Source,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Explained {
    Leaf(Sourced),
    Sequence(Vec<Explained>),
    Mapping(Explanation),
}

impl Explained {
    pub fn leaf(&self) -> Option<&Sourced> {
        match self {
            Explained::Leaf(sourced) => Some(sourced),
            _ => None,
        }
    }

    /// Look up a dotted key path, like [`Value::pointer`].
    pub fn pointer(&self, dotted_key: &str) -> Option<&Explained> {
        dotted_key
            .split('.')
            .try_fold(self, |current, segment| match current {
                Explained::Mapping(map) => map.get(segment),
                Explained::Sequence(items) => {
                    segment.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                Explained::Leaf(_) => None,
            })
    }

    /// Drop the annotations.
    pub fn into_value(self) -> Value {
        match self {
            Explained::Leaf(sourced) => sourced.val,
            Explained::Sequence(items) => {
                Value::Sequence(items.into_iter().map(Explained::into_value).collect())
            }
            Explained::Mapping(map) => Value::Mapping(strip(map)),
        }
    }
}

impl Node for Explained {
    fn into_mapping(self) -> Result<IndexMap<String, Self>, Self> {
        match self {
            Explained::Mapping(map) => Ok(map),
            other => Err(other),
        }
    }

    fn from_mapping(map: IndexMap<String, Self>) -> Self {
        Explained::Mapping(map)
    }
}

/// Annotate every leaf of `fragment` with `src`.
pub fn tag(fragment: Mapping, src: &Source) -> Explanation {
    fragment
        .into_iter()
        .map(|(key, value)| (key, tag_value(value, src)))
        .collect()
}

fn tag_value(value: Value, src: &Source) -> Explained {
    match value {
        Value::Mapping(map) => Explained::Mapping(tag(map, src)),
        Value::Sequence(items) => {
            Explained::Sequence(items.into_iter().map(|item| tag_value(item, src)).collect())
        }
        leaf => Explained::Leaf(Sourced {
            val: leaf,
            src: src.clone(),
        }),
    }
}

/// The plain config an explanation describes.
pub fn strip(explanation: Explanation) -> Mapping {
    explanation
        .into_iter()
        .map(|(key, explained)| (key, explained.into_value()))
        .collect()
}

/// Template the value of every leaf, leaving sources untouched.
pub(crate) fn apply_templates(
    explanation: &mut Explanation,
    templater: &Templater<'_>,
) -> Result<(), RcfigError> {
    for (key, explained) in explanation.iter_mut() {
        template_node(explained, key, templater)?;
    }
    Ok(())
}

fn template_node(
    explained: &mut Explained,
    path: &str,
    templater: &Templater<'_>,
) -> Result<(), RcfigError> {
    match explained {
        Explained::Leaf(sourced) => templater.apply(&mut sourced.val, path),
        Explained::Sequence(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                template_node(item, &format!("{path}.{i}"), templater)?;
            }
            Ok(())
        }
        Explained::Mapping(map) => {
            for (key, item) in map.iter_mut() {
                template_node(item, &format!("{path}.{key}"), templater)?;
            }
            Ok(())
        }
    }
}

/// One row of a flattened explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainEntry<'a> {
    /// `database.url`, `servers[0].host`.
    pub path: String,
    pub value: &'a Value,
    pub source: &'a Source,
}

/// Flatten an explanation into rows, in document order.
pub fn entries(explanation: &Explanation) -> Vec<ExplainEntry<'_>> {
    let mut rows = Vec::new();
    collect_mapping(explanation, "", &mut rows);
    rows
}

fn collect_mapping<'a>(map: &'a Explanation, prefix: &str, rows: &mut Vec<ExplainEntry<'a>>) {
    for (key, explained) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        collect(explained, path, rows);
    }
}

fn collect<'a>(explained: &'a Explained, path: String, rows: &mut Vec<ExplainEntry<'a>>) {
    match explained {
        Explained::Leaf(sourced) => rows.push(ExplainEntry {
            path,
            value: &sourced.val,
            source: &sourced.src,
        }),
        Explained::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                collect(item, format!("{path}[{i}]"), rows);
            }
        }
        Explained::Mapping(map) => collect_mapping(map, &path, rows),
    }
}
