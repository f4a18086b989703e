#![forbid(unsafe_code)]

//! Tree node model.
//!
//! A [`TreeNode`] owns its children and refers to its parent through a
//! [`NodeKey`] handle only. Keys are the identity of a node within one tree
//! version: every copy produced by [`crate::copy()`] receives fresh keys, so a
//! key held from an older version never resolves against a newer one. The
//! authority-assigned `id` is the only identity that survives across versions.
//!
//! # Example
//!
//! ```
//! use buildtree_core::{NodeValue, TreeNode};
//!
//! let root = TreeNode::new("Root")
//!     .with_id("1000")
//!     .child(TreeNode::new("Child").with_id("1001"))
//!     .child(TreeNode::new(7));
//!
//! assert_eq!(root.children().len(), 2);
//! assert_eq!(root.children()[0].parent(), Some(root.key()));
//! assert_eq!(root.children()[1].value(), &NodeValue::Number(7.0));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "wire")]
use serde::{Deserialize, Serialize, Serializer};

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Version-scoped identity of a node.
///
/// Allocated from a process-wide monotonic counter, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(u64);

impl NodeKey {
    /// Allocate a fresh key.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw counter value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Label carried by a node: text or a number.
///
/// Integral numbers serialize as JSON integers, so `12` round-trips as `12`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "wire", derive(Deserialize))]
#[cfg_attr(feature = "wire", serde(untagged))]
pub enum NodeValue {
    /// Text label.
    Text(String),
    /// Numeric label.
    Number(f64),
}

/// Largest magnitude below which every integral `f64` is exact.
#[cfg(feature = "wire")]
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

#[cfg(feature = "wire")]
impl Serialize for NodeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            #[allow(clippy::cast_possible_truncation)]
            Self::Number(n) if n.fract() == 0.0 && n.abs() <= EXACT_INTEGER_LIMIT => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for NodeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for NodeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for NodeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for NodeValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for NodeValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

/// A node in the building tree.
///
/// `PartialEq` compares structure only (id, value, children). Use
/// [`TreeNode::key`] to compare identity.
///
/// Cloning keeps keys: a clone denotes the same node of the same version.
/// Producing a new version goes through [`crate::copy()`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "wire", derive(Serialize, Deserialize))]
pub struct TreeNode {
    #[cfg_attr(feature = "wire", serde(skip, default = "NodeKey::next"))]
    pub(crate) key: NodeKey,
    #[cfg_attr(
        feature = "wire",
        serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "crate::wire::deserialize_id"
        )
    )]
    pub(crate) id: Option<String>,
    pub(crate) value: NodeValue,
    #[cfg_attr(feature = "wire", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub(crate) children: Vec<TreeNode>,
    /// Handle of the parent in this version. Derived, never owning.
    #[cfg_attr(feature = "wire", serde(skip))]
    pub(crate) parent: Option<NodeKey>,
}

impl TreeNode {
    /// Create a detached leaf with no authority id.
    #[must_use]
    pub fn new(value: impl Into<NodeValue>) -> Self {
        Self {
            key: NodeKey::next(),
            id: None,
            value: value.into(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// Set the authority id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append a child, linking its parent handle to this node.
    #[must_use]
    pub fn child(mut self, node: TreeNode) -> Self {
        self.push_child(node);
        self
    }

    /// Replace the children, linking each parent handle to this node.
    #[must_use]
    pub fn with_children(mut self, nodes: Vec<TreeNode>) -> Self {
        self.children = nodes;
        for child in &mut self.children {
            child.parent = Some(self.key);
        }
        self
    }

    /// Identity of this node in its tree version.
    #[inline]
    #[must_use]
    pub fn key(&self) -> NodeKey {
        self.key
    }

    /// Authority id, absent while the node is locally pending.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Whether the authority has not confirmed this node yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.id.is_none()
    }

    /// The label.
    #[must_use]
    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    /// Children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Parent handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Whether this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The last child, if any.
    #[must_use]
    pub fn last_child(&self) -> Option<&TreeNode> {
        self.children.last()
    }

    /// Pre-order iterator over this node and all descendants.
    #[must_use]
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Number of nodes in this subtree, including this one.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Depth of the node identified by `key` below this one (0 = self).
    #[must_use]
    pub fn depth_of(&self, key: NodeKey) -> Option<usize> {
        if self.key == key {
            return Some(0);
        }
        self.children
            .iter()
            .find_map(|child| child.depth_of(key))
            .map(|depth| depth + 1)
    }

    /// Append a child in place, linking its parent handle.
    ///
    /// Meant for visitors splicing a tree that is still under construction.
    pub fn push_child(&mut self, mut node: TreeNode) {
        node.parent = Some(self.key);
        self.children.push(node);
    }

    /// Remove and return the last child.
    pub fn pop_child(&mut self) -> Option<TreeNode> {
        self.children.pop()
    }

    /// Confirm a pending node with its authority id.
    ///
    /// For authorities filling in ids on a copy they own.
    pub fn assign_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Point every descendant's parent handle at its owner.
    ///
    /// Only for trees that have not been published yet (freshly decoded).
    #[cfg_attr(not(feature = "wire"), allow(dead_code))]
    pub(crate) fn relink(&mut self, parent: Option<NodeKey>) {
        self.parent = parent;
        let key = self.key;
        for child in &mut self.children {
            child.relink(Some(key));
        }
    }
}

impl PartialEq for TreeNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.value == other.value && self.children == other.children
    }
}

/// Pre-order traversal returned by [`TreeNode::iter`].
#[derive(Debug)]
pub struct PreOrder<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family() -> TreeNode {
        TreeNode::new("Root")
            .with_id("1000")
            .child(
                TreeNode::new("Child")
                    .with_id("1001")
                    .child(TreeNode::new("GrandSon").with_id("1003"))
                    .child(TreeNode::new("GrandDaughter").with_id("1004")),
            )
            .child(TreeNode::new("Sibling").with_id("1002"))
    }

    #[test]
    fn keys_are_unique() {
        let a = NodeKey::next();
        let b = NodeKey::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn builder_links_parents() {
        let root = family();
        let child = &root.children()[0];
        assert_eq!(root.parent(), None);
        assert_eq!(child.parent(), Some(root.key()));
        assert_eq!(child.children()[1].parent(), Some(child.key()));
    }

    #[test]
    fn with_children_links_parents() {
        let root = TreeNode::new("r").with_children(vec![TreeNode::new("a"), TreeNode::new("b")]);
        assert!(root.children().iter().all(|c| c.parent() == Some(root.key())));
    }

    #[test]
    fn pre_order_visits_node_before_children() {
        let root = family();
        let labels: Vec<String> = root.iter().map(|n| n.value().to_string()).collect();
        assert_eq!(
            labels,
            ["Root", "Child", "GrandSon", "GrandDaughter", "Sibling"]
        );
        assert_eq!(root.node_count(), 5);
    }

    #[test]
    fn structural_eq_ignores_identity() {
        let a = family();
        let b = family();
        assert_eq!(a, b);
        assert_ne!(a.key(), b.key());

        let c = TreeNode::new("Root").with_id("1000");
        assert_ne!(a, c);
    }

    #[test]
    fn clone_keeps_identity() {
        let a = family();
        let b = a.clone();
        assert_eq!(a.key(), b.key());
        assert_eq!(a.children()[0].key(), b.children()[0].key());
    }

    #[test]
    fn depth_of_reports_levels() {
        let root = family();
        let grand = root.children()[0].children()[0].key();
        assert_eq!(root.depth_of(root.key()), Some(0));
        assert_eq!(root.depth_of(grand), Some(2));
        assert_eq!(root.depth_of(NodeKey::next()), None);
    }

    #[test]
    fn leaf_and_last_child() {
        let root = family();
        assert!(!root.is_leaf());
        assert_eq!(root.last_child().and_then(TreeNode::id), Some("1002"));
        assert!(root.children()[1].is_leaf());
        assert!(root.children()[1].last_child().is_none());
    }

    #[test]
    fn pending_until_id_assigned() {
        assert!(TreeNode::new("x").is_pending());
        assert!(!TreeNode::new("x").with_id("1").is_pending());

        let mut node = TreeNode::new("x");
        let key = node.key();
        node.assign_id("1006");
        assert_eq!(node.id(), Some("1006"));
        assert_eq!(node.key(), key);
    }

    #[test]
    fn number_values_display_without_fraction() {
        assert_eq!(NodeValue::from(42).to_string(), "42");
        assert_eq!(NodeValue::from(1.5).to_string(), "1.5");
        assert_eq!(NodeValue::from("door").to_string(), "door");
    }
}
