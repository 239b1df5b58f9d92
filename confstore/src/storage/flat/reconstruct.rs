//! Conversion between nested values and flattened key sets.

use crate::bind::merge_value;
use crate::path::{PathSegment, PathSyntax};
use crate::value::{Map, Value};

/// Parse a flat key, keeping unparsable keys as one literal member.
pub(super) fn key_segments(key: &str, syntax: &PathSyntax) -> Vec<PathSegment> {
    syntax.parse(key).unwrap_or_else(|err| {
        tracing::debug!(key, error = %err, "flat key kept as a literal member");
        vec![PathSegment::Member(key.to_owned())]
    })
}

/// Trie of path segments built from flat entries.
#[derive(Default)]
pub(super) struct Node {
    leaf: Option<Value>,
    children: Vec<(PathSegment, Self)>,
}

impl Node {
    pub(super) fn insert(&mut self, segments: &[PathSegment], value: Value) {
        let Some((head, tail)) = segments.split_first() else {
            self.leaf = Some(value);
            return;
        };
        let position = self
            .children
            .iter()
            .position(|(segment, _)| segment == head)
            .unwrap_or_else(|| {
                self.children.push((head.clone(), Self::default()));
                self.children.len().saturating_sub(1)
            });
        if let Some((_, child)) = self.children.get_mut(position) {
            child.insert(tail, value);
        }
    }

    /// Collapse the trie into a value: children that are all indices become
    /// a list with `null` holes, anything else becomes a map.
    pub(super) fn into_value(self) -> Value {
        if self.children.is_empty() {
            return self.leaf.unwrap_or(Value::Null);
        }
        if self.leaf.is_some() {
            tracing::debug!("flat key is both a value and a container; keeping the container");
        }
        let all_indices = self
            .children
            .iter()
            .all(|(segment, _)| matches!(segment, PathSegment::Index(_)));
        if all_indices {
            list_from(self.children)
        } else {
            map_from(self.children)
        }
    }
}

fn list_from(children: Vec<(PathSegment, Node)>) -> Value {
    let len = children
        .iter()
        .filter_map(|(segment, _)| match segment {
            PathSegment::Index(index) => Some(index.saturating_add(1)),
            PathSegment::Member(_) => None,
        })
        .max()
        .unwrap_or_default();
    let mut items = vec![Value::Null; len];
    for (segment, child) in children {
        if let PathSegment::Index(index) = segment
            && let Some(slot) = items.get_mut(index)
        {
            *slot = child.into_value();
        }
    }
    Value::Array(items)
}

fn map_from(children: Vec<(PathSegment, Node)>) -> Value {
    let mut fields = Map::new();
    for (segment, child) in children {
        let key = match segment {
            PathSegment::Member(name) => name,
            PathSegment::Index(index) => index.to_string(),
        };
        let value = child.into_value();
        match fields.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                fields.insert(key, value);
            }
        }
    }
    Value::Object(fields)
}

/// Rebuild a nested value from flat `(key, value)` pairs written in
/// `syntax`.
///
/// A lone empty key is a bare scalar; keys made only of index tokens build a
/// list; everything else builds nested maps, with lists wherever every child
/// of a node is an index.
///
/// # Examples
///
/// ```
/// use confstore::{PathSyntax, unflatten};
/// use serde_json::json;
///
/// let value = unflatten(
///     [("[0].name", json!("a")), ("[1].name", json!("b"))],
///     &PathSyntax::default(),
/// );
/// assert_eq!(value, json!([{"name": "a"}, {"name": "b"}]));
/// ```
pub fn unflatten<K, I>(entries: I, syntax: &PathSyntax) -> Value
where
    K: AsRef<str>,
    I: IntoIterator<Item = (K, Value)>,
{
    let mut root = Node::default();
    for (key, value) in entries {
        root.insert(&key_segments(key.as_ref(), syntax), value);
    }
    root.into_value()
}

/// Flatten `value` into `(key, leaf)` pairs written in `syntax`.
///
/// Map keys join with the separator and list positions with the index
/// token. A bare scalar is stored under the empty key. Empty maps and lists
/// are kept as leaves so that [`unflatten`] restores them.
///
/// # Examples
///
/// ```
/// use confstore::{PathSyntax, flatten};
/// use serde_json::json;
///
/// let pairs = flatten(&json!({"db": {"hosts": ["a", "b"]}}), &PathSyntax::env());
/// assert_eq!(
///     pairs,
///     vec![
///         ("db_hosts_0".to_owned(), json!("a")),
///         ("db_hosts_1".to_owned(), json!("b")),
///     ]
/// );
/// ```
#[must_use]
pub fn flatten(value: &Value, syntax: &PathSyntax) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    collect(value, &mut Vec::new(), &mut |segments: &[PathSegment], leaf: &Value| {
        out.push((syntax.render(segments), leaf.clone()));
    });
    out
}

/// Visit every leaf of `value` with its path.
pub(super) fn collect(
    value: &Value,
    prefix: &mut Vec<PathSegment>,
    visit: &mut dyn FnMut(&[PathSegment], &Value),
) {
    match value {
        Value::Object(fields) if !fields.is_empty() => {
            for (key, child) in fields {
                prefix.push(PathSegment::Member(key.clone()));
                collect(child, prefix, visit);
                prefix.pop();
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                prefix.push(PathSegment::Index(index));
                collect(child, prefix, visit);
                prefix.pop();
            }
        }
        leaf => visit(prefix, leaf),
    }
}
