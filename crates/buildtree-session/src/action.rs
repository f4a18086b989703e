#![forbid(unsafe_code)]

//! Actions consumed by the session reducer.
//!
//! The UI dispatches [`Action::AddChild`], [`Action::RemoveChild`] and
//! [`Action::SelectNode`]; the authority delivers [`Action::ReceiveTree`].
//! Anything else travelling on the same dispatch bus arrives as
//! [`Action::Foreign`] and leaves the tree state untouched.

use buildtree_core::{NodeKey, Snapshot, TreeNode};

/// Type string of [`Action::AddChild`].
pub const ADD_CHILD: &str = "building/tree/ADD-CHILD";
/// Type string of [`Action::RemoveChild`].
pub const REMOVE_CHILD: &str = "building/tree/REMOVE-CHILD";
/// Type string of [`Action::SelectNode`].
pub const SELECT_NODE: &str = "building/tree/SELECT-NODE";
/// Type string of [`Action::ReceiveTree`].
pub const RECEIVE_TREE: &str = "building/tree/RECEIVE-TREE";

/// Tree data delivered by the authority.
#[derive(Debug, Clone)]
pub enum TreePayload {
    /// Already decoded snapshot.
    Snapshot(Snapshot),
    /// Undecoded JSON, validated by the reducer.
    Raw(serde_json::Value),
}

/// A discrete state transition request.
#[derive(Debug, Clone)]
pub enum Action {
    /// Append `node` under the node identified by `parent`, or make it the
    /// root of an empty tree.
    AddChild {
        /// Target parent in the current version.
        parent: Option<NodeKey>,
        /// Template for the new subtree; copied, never adopted.
        node: TreeNode,
    },
    /// Remove `target` and its subtree.
    RemoveChild {
        /// Node to drop.
        target: NodeKey,
    },
    /// Toggle selection of `node`.
    SelectNode {
        /// Node to select; `None` clears the selection.
        node: Option<NodeKey>,
    },
    /// Replace the tree with an authority snapshot.
    ReceiveTree {
        /// Snapshot, `None` meaning no tree.
        data: Option<TreePayload>,
    },
    /// An action owned by another widget.
    Foreign {
        /// Its type string.
        kind: String,
    },
}

impl Action {
    /// Add `node` under `parent` (`None` on an empty tree creates the root).
    #[must_use]
    pub fn add_child(parent: Option<&TreeNode>, node: TreeNode) -> Self {
        Self::AddChild {
            parent: parent.map(TreeNode::key),
            node,
        }
    }

    /// Remove `target`.
    #[must_use]
    pub fn remove_child(target: &TreeNode) -> Self {
        Self::RemoveChild {
            target: target.key(),
        }
    }

    /// Select (or deselect, if already selected) `node`.
    #[must_use]
    pub fn select_node(node: Option<&TreeNode>) -> Self {
        Self::SelectNode {
            node: node.map(TreeNode::key),
        }
    }

    /// Deliver a decoded snapshot.
    #[must_use]
    pub fn receive(snapshot: Snapshot) -> Self {
        Self::ReceiveTree {
            data: Some(TreePayload::Snapshot(snapshot)),
        }
    }

    /// Deliver raw JSON from the authority.
    #[must_use]
    pub fn receive_raw(value: serde_json::Value) -> Self {
        Self::ReceiveTree {
            data: Some(TreePayload::Raw(value)),
        }
    }

    /// An action this session does not handle.
    #[must_use]
    pub fn foreign(kind: impl Into<String>) -> Self {
        Self::Foreign { kind: kind.into() }
    }

    /// Namespaced type string.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::AddChild { .. } => ADD_CHILD,
            Self::RemoveChild { .. } => REMOVE_CHILD,
            Self::SelectNode { .. } => SELECT_NODE,
            Self::ReceiveTree { .. } => RECEIVE_TREE,
            Self::Foreign { kind } => kind,
        }
    }
}
