#![forbid(unsafe_code)]

//! Session-visible tree state.

use std::sync::Arc;

use buildtree_core::{CopyOptions, NodeKey, Snapshot, TreeNode, copy, find_node};

/// Immutable snapshot of the editing session.
///
/// Produced only by [`crate::reduce`]. `selected`, when set, always
/// identifies a node reachable from `root` in this same version.
#[derive(Debug, Clone, Default)]
pub struct TreeState {
    pub(crate) root: Option<Arc<TreeNode>>,
    pub(crate) selected: Option<NodeKey>,
}

impl TreeState {
    /// Empty tree, nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an authority snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            root: snapshot.into_root().map(Arc::new),
            selected: None,
        }
    }

    /// Root node, if any.
    #[must_use]
    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_deref()
    }

    /// Identity of the selected node.
    #[must_use]
    pub fn selected(&self) -> Option<NodeKey> {
        self.selected
    }

    /// The selected node, resolved against this version's root.
    #[must_use]
    pub fn selected_node(&self) -> Option<&TreeNode> {
        find_node(self.root(), self.selected?)
    }

    /// Whether there is no tree at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Whether the selection (if any) resolves inside this version.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.selected.is_none() || self.selected_node().is_some()
    }

    /// Wire snapshot of the current tree.
    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot::new(copy(self.root(), CopyOptions::new().clean()))
    }
}
