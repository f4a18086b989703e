#![forbid(unsafe_code)]

//! Mutation operators built on the copy engine.
//!
//! Both operators return a brand-new tree and never touch their input. A
//! target that is not part of the tree is not an error: the result is a
//! fresh, structurally identical copy. Stale references from the UI or the
//! authority race are expected and must not corrupt state.

use crate::copy::{CopyOptions, copy, copy_node};
use crate::error::TreeError;
use crate::node::{NodeKey, TreeNode};
use crate::query::find_node;

/// Insert a copy of `node` as the last child of `parent`.
///
/// An empty tree makes the copy of `node` the new root. When no node is
/// identity-equal to `parent` the tree is copied unchanged.
#[must_use]
pub fn insert(root: Option<&TreeNode>, parent: Option<NodeKey>, node: &TreeNode) -> TreeNode {
    let Some(root) = root else {
        return copy_node(node, None, &mut CopyOptions::new());
    };

    #[cfg(feature = "tracing")]
    let mut spliced = false;
    let mut splice = |from: &TreeNode, to: &mut TreeNode| {
        if Some(from.key) == parent {
            let child = copy_node(node, Some(to.key), &mut CopyOptions::new());
            to.push_child(child);
            #[cfg(feature = "tracing")]
            {
                spliced = true;
            }
        }
    };
    let produced = copy_node(root, root.parent, &mut CopyOptions::new().visit(&mut splice));

    #[cfg(feature = "tracing")]
    if !spliced {
        tracing::debug!(
            target: "buildtree.copy",
            parent = ?parent,
            "insert parent not in tree; copied unchanged"
        );
    }
    produced
}

/// Remove `target` and its whole subtree.
///
/// Returns `Ok(None)` when `target` is the root itself.
///
/// # Errors
///
/// [`TreeError::EmptyTree`] when `root` is `None`.
pub fn remove(root: Option<&TreeNode>, target: NodeKey) -> Result<Option<TreeNode>, TreeError> {
    let root = root.ok_or(TreeError::EmptyTree)?;
    Ok(copy(Some(root), CopyOptions::new().exclude(target)))
}

/// Remove the last child of `parent`.
///
/// Same as `remove(root, parent.last_child)`. A missing or childless
/// `parent` yields an unchanged copy.
///
/// # Errors
///
/// [`TreeError::EmptyTree`] when `root` is `None`.
pub fn remove_last_child(
    root: Option<&TreeNode>,
    parent: NodeKey,
) -> Result<Option<TreeNode>, TreeError> {
    let target = find_node(root, parent)
        .and_then(TreeNode::last_child)
        .map(TreeNode::key);
    match target {
        Some(target) => remove(root, target),
        None => {
            let root = root.ok_or(TreeError::EmptyTree)?;
            Ok(copy(Some(root), CopyOptions::new()))
        }
    }
}
