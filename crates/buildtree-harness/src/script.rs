//! Scripted editing sessions.
//!
//! A script is a JSON array of steps, each tagged by `op`:
//!
//! ```json
//! [
//!   {"op": "select", "target": {"id": "1004"}},
//!   {"op": "add", "parent": {"id": 1002}, "value": "Shed"},
//!   {"op": "pump"},
//!   {"op": "remove-last", "parent": {"path": [0]}},
//!   {"op": "receive", "data": {"root": {"id": "1", "value": "Root"}}}
//! ]
//! ```
//!
//! Nodes are referenced by authority id or by child-index path from the
//! root (the only way to reach pending nodes). References are resolved
//! against the state current at that step; anything that does not resolve
//! becomes a stale reference and the step is a no-op, the same as a UI
//! holding on to a node from an outdated tree.

use std::fmt;

use buildtree_core::{NodeKey, NodeValue, TreeNode, find_node, find_node_by_id, node_at_path};
use buildtree_session::{Action, Authority, TreeSession, TreeState};
use serde::Deserialize;

use crate::error::{HarnessError, Result};

/// An id as written in a script: string or integer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ScriptId {
    Text(String),
    Number(u64),
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(id) => f.write_str(id),
            Self::Number(id) => write!(f, "{id}"),
        }
    }
}

/// How a step names a node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NodeRef {
    Id { id: ScriptId },
    Path { path: Vec<usize> },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    /// Add a node under `parent`, or as the root when `parent` is absent.
    Add {
        #[serde(default)]
        parent: Option<NodeRef>,
        value: NodeValue,
        #[serde(default)]
        id: Option<ScriptId>,
    },
    /// Remove a node and its subtree.
    Remove { target: NodeRef },
    /// Remove the last child of `parent`.
    RemoveLast { parent: NodeRef },
    /// Toggle selection; no target clears it.
    Select {
        #[serde(default)]
        target: Option<NodeRef>,
    },
    /// Deliver an authority payload, as-is.
    Receive {
        #[serde(default)]
        data: serde_json::Value,
    },
    /// Apply queued authority snapshots.
    Pump,
}

impl Step {
    #[must_use]
    pub fn op(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::RemoveLast { .. } => "remove-last",
            Self::Select { .. } => "select",
            Self::Receive { .. } => "receive",
            Self::Pump => "pump",
        }
    }

    /// The session action for this step, resolved against `state`.
    ///
    /// `None` for `pump`, which is not an action.
    #[must_use]
    pub fn to_action(&self, state: &TreeState) -> Option<Action> {
        let action = match self {
            Self::Add { parent, value, id } => {
                let node = TreeNode::new(value.clone());
                let node = match id {
                    Some(id) => node.with_id(id.to_string()),
                    None => node,
                };
                Action::AddChild {
                    parent: parent.as_ref().map(|parent| resolve(state, parent)),
                    node,
                }
            }
            Self::Remove { target } => Action::RemoveChild {
                target: resolve(state, target),
            },
            Self::RemoveLast { parent } => {
                let parent = resolve(state, parent);
                let target = find_node(state.root(), parent)
                    .and_then(TreeNode::last_child)
                    .map_or_else(NodeKey::next, TreeNode::key);
                Action::RemoveChild { target }
            }
            Self::Select { target } => Action::SelectNode {
                node: target.as_ref().map(|target| resolve(state, target)),
            },
            Self::Receive { data } => Action::receive_raw(data.clone()),
            Self::Pump => return None,
        };
        Some(action)
    }
}

/// Key of the referenced node in `state`, or a fresh key that matches
/// nothing.
#[must_use]
pub fn resolve(state: &TreeState, reference: &NodeRef) -> NodeKey {
    let found = match reference {
        NodeRef::Id { id } => find_node_by_id(state.root(), &id.to_string()),
        NodeRef::Path { path } => node_at_path(state.root(), path),
    };
    match found {
        Some(node) => node.key(),
        None => {
            tracing::debug!(?reference, "unresolved node reference; step will be a no-op");
            NodeKey::next()
        }
    }
}

/// A parsed script.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Run every step through `session`, stopping at the first failure.
    pub fn run<A: Authority>(&self, session: &mut TreeSession<A>) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            let _span =
                tracing::debug_span!("script.step", step = index + 1, op = step.op()).entered();
            let outcome = match step.to_action(session.state()) {
                Some(action) => session.dispatch(action).map(|_| ()),
                None => session.pump().map(|_| ()),
            };
            outcome.map_err(|source| HarnessError::Step {
                step: index + 1,
                op: step.op(),
                source,
            })?;
        }
        Ok(())
    }
}
