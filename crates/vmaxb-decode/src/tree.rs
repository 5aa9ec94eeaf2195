//! Container tree access.
//!
//! Parsing the property-list container and decompressing its envelope happen
//! upstream. The decoder only navigates the resulting tree through
//! [`TreeNode`], so any plist implementation can be plugged in. [`Node`] is an
//! owned tree for callers that hand over a fully materialized document.

use serde::{Deserialize, Serialize};
use vmaxb_core::{Error, Result};

/// Type of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Dict,
    Array,
    Data,
    UInt,
    Real,
    Bool,
    String,
}

impl NodeKind {
    /// Short lowercase name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dict => "dict",
            Self::Array => "array",
            Self::Data => "data",
            Self::UInt => "uint",
            Self::Real => "real",
            Self::Bool => "bool",
            Self::String => "string",
        }
    }
}

/// Read-only navigation over a dictionary/array/scalar document.
///
/// Accessors return `None` when the node has a different kind or the key or
/// index does not exist.
pub trait TreeNode {
    fn kind(&self) -> NodeKind;

    fn dict_item(&self, key: &str) -> Option<&Self>;

    /// Dictionary entries in document order. Empty for non-dictionaries.
    fn dict_entries(&self) -> Vec<(&str, &Self)>;

    fn array_len(&self) -> Option<usize>;

    fn array_item(&self, index: usize) -> Option<&Self>;

    fn data_bytes(&self) -> Option<&[u8]>;

    fn uint(&self) -> Option<u64>;

    fn real(&self) -> Option<f64> {
        None
    }

    fn boolean(&self) -> Option<bool> {
        None
    }

    fn string(&self) -> Option<&str> {
        None
    }
}

/// Follow a chain of dictionary keys from `root`.
pub fn node_at<'a, N: TreeNode>(root: &'a N, path: &[&str]) -> Option<&'a N> {
    path.iter().try_fold(root, |node, key| node.dict_item(key))
}

/// Fetch `key` from `root` and require it to be an array.
pub fn require_array<'a, N: TreeNode>(root: &'a N, key: &str) -> Result<&'a N> {
    let node = root
        .dict_item(key)
        .ok_or_else(|| Error::MissingKey(key.to_string()))?;
    match node.kind() {
        NodeKind::Array => Ok(node),
        other => Err(Error::UnexpectedNode {
            path: key.to_string(),
            expected: NodeKind::Array.name(),
            found: other.name(),
        }),
    }
}

/// Owned document tree.
///
/// Dictionaries keep their entries in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Dict(Vec<(String, Node)>),
    Array(Vec<Node>),
    Data(Vec<u8>),
    UInt(u64),
    Real(f64),
    Bool(bool),
    String(String),
}

impl Node {
    /// Build a dictionary from `(key, value)` pairs.
    pub fn dict<K: Into<String>>(entries: impl IntoIterator<Item = (K, Node)>) -> Self {
        Self::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an array of unsigned integers.
    pub fn uints(values: impl IntoIterator<Item = u64>) -> Self {
        Self::Array(values.into_iter().map(Self::UInt).collect())
    }
}

impl TreeNode for Node {
    fn kind(&self) -> NodeKind {
        match self {
            Self::Dict(_) => NodeKind::Dict,
            Self::Array(_) => NodeKind::Array,
            Self::Data(_) => NodeKind::Data,
            Self::UInt(_) => NodeKind::UInt,
            Self::Real(_) => NodeKind::Real,
            Self::Bool(_) => NodeKind::Bool,
            Self::String(_) => NodeKind::String,
        }
    }

    fn dict_item(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    fn dict_entries(&self) -> Vec<(&str, &Self)> {
        match self {
            Self::Dict(entries) => entries.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            _ => Vec::new(),
        }
    }

    fn array_len(&self) -> Option<usize> {
        match self {
            Self::Array(items) => Some(items.len()),
            _ => None,
        }
    }

    fn array_item(&self, index: usize) -> Option<&Self> {
        match self {
            Self::Array(items) => items.get(index),
            _ => None,
        }
    }

    fn data_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Data(bytes) => Some(bytes),
            _ => None,
        }
    }

    fn uint(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    fn real(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    fn boolean(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn string(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::dict([(
            "s",
            Node::dict([
                ("id", Node::dict([("c", Node::UInt(9)), ("t", Node::UInt(4))])),
                ("ds", Node::Data(vec![0, 1])),
            ]),
        )])
    }

    #[test]
    fn nested_lookup() {
        let root = sample();
        assert_eq!(node_at(&root, &["s", "id", "c"]).and_then(Node::uint), Some(9));
        assert_eq!(
            node_at(&root, &["s", "ds"]).and_then(Node::data_bytes),
            Some(&[0u8, 1][..])
        );
        assert!(node_at(&root, &["s", "missing"]).is_none());
        assert!(node_at(&root, &["s", "ds", "deeper"]).is_none());
        assert!(node_at(&root, &[]).is_some());
    }

    #[test]
    fn accessors_reject_wrong_kind() {
        let root = sample();
        assert_eq!(root.kind(), NodeKind::Dict);
        assert!(root.uint().is_none());
        assert!(root.array_len().is_none());
        assert!(Node::UInt(3).dict_item("x").is_none());
        assert!(Node::UInt(3).dict_entries().is_empty());
    }

    #[test]
    fn require_array_errors() {
        let root = Node::dict([("snapshots", Node::UInt(1))]);
        assert_eq!(
            require_array(&root, "snapshots"),
            Err(Error::UnexpectedNode {
                path: "snapshots".into(),
                expected: "array",
                found: "uint",
            })
        );
        assert_eq!(
            require_array(&Node::dict::<&str>([]), "snapshots"),
            Err(Error::MissingKey("snapshots".into()))
        );
        let ok = Node::dict([("snapshots", Node::Array(Vec::new()))]);
        assert_eq!(require_array(&ok, "snapshots").unwrap().array_len(), Some(0));
    }
}
