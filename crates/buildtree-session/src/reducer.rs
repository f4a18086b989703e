#![forbid(unsafe_code)]

//! The session reducer: `(state, action) -> state`.
//!
//! Structural actions produce a brand-new root, so the old selection key can
//! never resolve in the new version. Selection is carried across by the
//! authority id instead: the selected node's id is read from the old root and
//! looked up again in the new one. A selected node without an id (still
//! pending) cannot be carried and the selection is cleared.
//!
//! Actions that do not belong to this session return the input state
//! unchanged, the same `Arc`.

use std::sync::Arc;

use buildtree_core::{
    CopyOptions, NodeKey, Snapshot, TreeError, TreeNode, copy, find_node, find_node_by_id, insert,
    remove,
};

use crate::action::{Action, TreePayload};
use crate::state::TreeState;

/// Apply one action.
///
/// # Errors
///
/// [`TreeError::EmptyTree`] when removing from a session with no tree.
pub fn reduce(state: &Arc<TreeState>, action: Action) -> Result<Arc<TreeState>, TreeError> {
    let _span = tracing::debug_span!(
        target: "buildtree.reducer",
        "reducer.reduce",
        action = %action.kind()
    )
    .entered();

    let next = match action {
        Action::AddChild { parent, node } => {
            let root = insert(state.root(), parent, &node);
            structural(state, Some(root))
        }
        Action::RemoveChild { target } => {
            let root = remove(state.root(), target)?;
            structural(state, root)
        }
        Action::ReceiveTree { data } => structural(state, received_root(data)),
        Action::SelectNode { node } => TreeState {
            root: state.root.clone(),
            selected: toggle(state, node),
        },
        Action::Foreign { kind } => {
            tracing::trace!(target: "buildtree.reducer", kind = %kind, "ignoring foreign action");
            return Ok(Arc::clone(state));
        }
    };

    tracing::debug!(
        target: "buildtree.reducer",
        nodes = next.root().map_or(0, TreeNode::node_count),
        selected = ?next.selected,
        "state updated"
    );
    Ok(Arc::new(next))
}

/// New version with the selection carried over by id.
fn structural(state: &TreeState, root: Option<TreeNode>) -> TreeState {
    let selected = state
        .selected_node()
        .and_then(TreeNode::id)
        .and_then(|id| find_node_by_id(root.as_ref(), id))
        .map(TreeNode::key);
    if state.selected.is_some() && selected.is_none() {
        tracing::debug!(target: "buildtree.reducer", "selection dropped");
    }
    TreeState {
        root: root.map(Arc::new),
        selected,
    }
}

fn toggle(state: &TreeState, node: Option<NodeKey>) -> Option<NodeKey> {
    match node {
        Some(key) if state.selected == Some(key) => None,
        Some(key) => find_node(state.root(), key).map(TreeNode::key),
        None => None,
    }
}

/// Fresh, linked root from an authority payload.
///
/// Decoded snapshots are copied so the session never shares keys with the
/// sender's tree. Malformed raw payloads are treated as no tree.
fn received_root(data: Option<TreePayload>) -> Option<TreeNode> {
    match data? {
        TreePayload::Snapshot(snapshot) => {
            copy(snapshot.root.as_ref(), CopyOptions::new().with_parent(None))
        }
        TreePayload::Raw(value) => match Snapshot::from_value(value) {
            Ok(snapshot) => snapshot.into_root(),
            Err(err) => {
                tracing::warn!(
                    target: "buildtree.reducer",
                    error = %err,
                    "malformed tree payload; treating as empty"
                );
                None
            }
        },
    }
}
