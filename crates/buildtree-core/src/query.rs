#![forbid(unsafe_code)]

//! Depth-first lookups.
//!
//! All searches walk the tree in pre-order and return the first match.
//! Keys and ids are expected to be unique within one tree version.

use crate::node::{NodeKey, TreeNode};

/// Find the node whose identity is `target` in this tree version.
#[must_use]
pub fn find_node(root: Option<&TreeNode>, target: NodeKey) -> Option<&TreeNode> {
    root?.iter().find(|node| node.key == target)
}

/// Find the node carrying the authority id `id`.
#[must_use]
pub fn find_node_by_id<'a>(root: Option<&'a TreeNode>, id: &str) -> Option<&'a TreeNode> {
    root?.iter().find(|node| node.id.as_deref() == Some(id))
}

/// Resolve `node`'s parent handle against `root`.
#[must_use]
pub fn parent_of<'a>(root: Option<&'a TreeNode>, node: &TreeNode) -> Option<&'a TreeNode> {
    find_node(root, node.parent?)
}

/// Follow child indices from the root.
///
/// `path(root, &[])` is the root itself.
#[must_use]
pub fn node_at_path<'a>(root: Option<&'a TreeNode>, path: &[usize]) -> Option<&'a TreeNode> {
    path.iter()
        .try_fold(root?, |node, &index| node.children.get(index))
}
