#![forbid(unsafe_code)]

//! The bridge to the external tree authority.
//!
//! The session forwards each local edit as an [`AuthorityRequest`] and the
//! authority answers, asynchronously and in its own time, by publishing a
//! whole-tree [`Snapshot`] through a [`Notifier`]. Published snapshots are
//! queued as `RECEIVE_TREE` actions and applied when the session pumps.
//!
//! Requests address nodes by authority id only: keys are meaningless outside
//! the session's own tree versions.

use std::sync::mpsc::Sender;

use buildtree_core::{CopyOptions, NodeKey, Snapshot, TreeNode, copy, find_node, find_node_by_id};

use crate::action::Action;
use crate::config::AuthorityConfig;
use crate::state::TreeState;

/// A local edit, expressed for the authority.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorityRequest {
    /// Add `node` under the node with id `parent_id` (`None` creates the root).
    AddNode {
        /// Parent's authority id.
        parent_id: Option<String>,
        /// Clean copy of the new subtree.
        node: TreeNode,
    },
    /// Remove the node with this id and its subtree.
    RemoveNode {
        /// Target's authority id.
        id: String,
    },
    /// The user selected (or deselected) a node.
    SelectNode {
        /// Selected node's id, `None` when clearing.
        id: Option<String>,
    },
}

impl AuthorityRequest {
    /// Express `action` for the authority, resolving keys against the
    /// state it is about to be applied to.
    ///
    /// Returns `None` for actions the authority does not care about and for
    /// edits that cannot be addressed by id (stale keys, pending nodes).
    #[must_use]
    pub fn from_action(action: &Action, state: &TreeState) -> Option<Self> {
        match action {
            Action::AddChild { parent, node } => {
                // On an empty tree the node becomes the root whatever the parent.
                let parent_id = match parent {
                    Some(key) if !state.is_empty() => {
                        Some(addressable(state, *key, "add parent")?)
                    }
                    _ => None,
                };
                let node = copy(Some(node), CopyOptions::new().clean())?;
                Some(Self::AddNode { parent_id, node })
            }
            Action::RemoveChild { target } => Some(Self::RemoveNode {
                id: addressable(state, *target, "remove target")?,
            }),
            Action::SelectNode { node } => Some(Self::SelectNode {
                id: match node {
                    None => None,
                    Some(key) => Some(addressable(state, *key, "selection")?),
                },
            }),
            Action::ReceiveTree { .. } | Action::Foreign { .. } => None,
        }
    }
}

fn addressable(state: &TreeState, key: NodeKey, role: &str) -> Option<String> {
    let Some(node) = find_node(state.root(), key) else {
        tracing::debug!(target: "buildtree.authority", role, key = %key, "stale node; not forwarded");
        return None;
    };
    match node.id() {
        Some(id) => Some(id.to_owned()),
        None => {
            tracing::debug!(target: "buildtree.authority", role, key = %key, "pending node; not forwarded");
            None
        }
    }
}

/// Handle an authority uses to publish snapshots into a session.
///
/// Cheap to clone and `Send`, so it can be handed to another thread.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Sender<Action>,
}

impl Notifier {
    pub(crate) fn new(tx: Sender<Action>) -> Self {
        Self { tx }
    }

    /// Queue a decoded snapshot. Returns `false` if the session is gone.
    pub fn notify(&self, snapshot: Snapshot) -> bool {
        self.send(Action::receive(snapshot))
    }

    /// Queue raw JSON, validated when the session applies it.
    pub fn notify_raw(&self, value: serde_json::Value) -> bool {
        self.send(Action::receive_raw(value))
    }

    fn send(&self, action: Action) -> bool {
        match self.tx.send(action) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(target: "buildtree.authority", "session dropped; snapshot discarded");
                false
            }
        }
    }
}

/// An external owner of the canonical tree.
pub trait Authority {
    /// Called once when a session takes ownership of the authority.
    fn attach(&mut self, notifier: Notifier);

    /// Observe a locally applied edit.
    fn submit(&mut self, request: AuthorityRequest);
}

/// An authority that never answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAuthority;

impl Authority for OfflineAuthority {
    fn attach(&mut self, _notifier: Notifier) {}

    fn submit(&mut self, request: AuthorityRequest) {
        tracing::trace!(target: "buildtree.authority", ?request, "offline; request dropped");
    }
}

/// In-process authority.
///
/// Keeps its own clean tree, confirms pending nodes by assigning sequential
/// ids and republishes the whole tree after every change. Selection is
/// observed but not persisted.
#[derive(Debug)]
pub struct LocalAuthority {
    tree: Option<TreeNode>,
    last_id: u64,
    notifier: Option<Notifier>,
}

impl LocalAuthority {
    /// Empty (or sample, per `config.seed_sample`) authority.
    #[must_use]
    pub fn new(config: &AuthorityConfig) -> Self {
        let snapshot = if config.seed_sample {
            Snapshot::sample()
        } else {
            Snapshot::default()
        };
        Self::with_snapshot(snapshot, config)
    }

    /// Authority owning `snapshot`'s tree.
    ///
    /// Numbering resumes after the highest numeric id already in the tree
    /// when that is above `config.id_seed`.
    #[must_use]
    pub fn with_snapshot(snapshot: Snapshot, config: &AuthorityConfig) -> Self {
        let tree = copy(snapshot.root.as_ref(), CopyOptions::new().clean());
        let last_id = highest_numeric_id(tree.as_ref())
            .map_or(config.id_seed, |id| id.max(config.id_seed));
        Self {
            tree,
            last_id,
            notifier: None,
        }
    }

    /// The canonical tree.
    #[must_use]
    pub fn tree(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    /// Last id handed out.
    #[must_use]
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    /// Clean snapshot of the canonical tree.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(copy(self.tree.as_ref(), CopyOptions::new().clean()))
    }

    /// Replace the canonical tree wholesale and publish it.
    pub fn replace(&mut self, snapshot: Snapshot) {
        self.tree = copy(snapshot.root.as_ref(), CopyOptions::new().clean());
        if let Some(highest) = highest_numeric_id(self.tree.as_ref()) {
            self.last_id = self.last_id.max(highest);
        }
        self.publish();
    }

    fn add_node(&mut self, parent_id: Option<&str>, node: &TreeNode) {
        let mut last_id = self.last_id;
        let tree = self.tree.as_ref();
        let taken = |id: &str| {
            find_node_by_id(tree, id).is_some() || find_node_by_id(Some(node), id).is_some()
        };
        let mut confirm = |_: &TreeNode, to: &mut TreeNode| {
            if !to.is_pending() {
                return;
            }
            while let Some(next) = last_id.checked_add(1) {
                last_id = next;
                let id = next.to_string();
                if !taken(&id) {
                    to.assign_id(id);
                    return;
                }
            }
            tracing::warn!(target: "buildtree.authority", "id space exhausted; node left pending");
        };
        let Some(node) = copy(Some(node), CopyOptions::new().clean().visit(&mut confirm)) else {
            return;
        };

        let updated = match (&self.tree, parent_id) {
            (None, _) => Some(node),
            (Some(tree), Some(parent_id)) => {
                if find_node_by_id(Some(tree), parent_id).is_none() {
                    tracing::warn!(target: "buildtree.authority", parent_id, "unknown parent; ignored");
                    return;
                }
                let mut splice = |from: &TreeNode, to: &mut TreeNode| {
                    if from.id() == Some(parent_id) {
                        to.push_child(node.clone());
                    }
                };
                copy(Some(tree), CopyOptions::new().clean().visit(&mut splice))
            }
            (Some(_), None) => {
                tracing::warn!(target: "buildtree.authority", "second root requested; ignored");
                return;
            }
        };

        self.last_id = last_id;
        self.tree = updated;
        tracing::debug!(target: "buildtree.authority", last_id, "node confirmed");
        self.publish();
    }

    fn remove_node(&mut self, id: &str) {
        let Some(target) = find_node_by_id(self.tree.as_ref(), id).map(TreeNode::key) else {
            tracing::warn!(target: "buildtree.authority", id, "unknown node; ignored");
            return;
        };
        self.tree = copy(self.tree.as_ref(), CopyOptions::new().clean().exclude(target));
        self.publish();
    }

    fn publish(&self) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(self.snapshot());
        }
    }
}

fn highest_numeric_id(tree: Option<&TreeNode>) -> Option<u64> {
    tree?.iter().filter_map(|node| node.id()?.parse::<u64>().ok()).max()
}

impl Authority for LocalAuthority {
    fn attach(&mut self, notifier: Notifier) {
        self.notifier = Some(notifier);
        self.publish();
    }

    fn submit(&mut self, request: AuthorityRequest) {
        match request {
            AuthorityRequest::AddNode { parent_id, node } => {
                self.add_node(parent_id.as_deref(), &node);
            }
            AuthorityRequest::RemoveNode { id } => self.remove_node(&id),
            AuthorityRequest::SelectNode { id } => {
                tracing::debug!(target: "buildtree.authority", id = ?id, "selection observed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn attached(authority: &mut LocalAuthority) -> mpsc::Receiver<Action> {
        let (tx, rx) = mpsc::channel();
        authority.attach(Notifier::new(tx));
        rx
    }

    fn published(rx: &mpsc::Receiver<Action>) -> Vec<Snapshot> {
        rx.try_iter()
            .map(|action| match action {
                Action::ReceiveTree {
                    data: Some(crate::TreePayload::Snapshot(snapshot)),
                } => snapshot,
                other => panic!("unexpected {other:?}"),
            })
            .collect()
    }

    fn sample_authority() -> LocalAuthority {
        LocalAuthority::with_snapshot(Snapshot::sample(), &AuthorityConfig::default())
    }

    #[test]
    fn attach_publishes_current_tree() {
        let mut authority = sample_authority();
        let rx = attached(&mut authority);
        assert_eq!(published(&rx), vec![Snapshot::sample()]);
    }

    #[test]
    fn add_assigns_next_id() {
        let mut authority = sample_authority();
        let rx = attached(&mut authority);
        rx.try_iter().for_each(drop);

        authority.submit(AuthorityRequest::AddNode {
            parent_id: Some("1001".into()),
            node: TreeNode::new("Annex"),
        });

        assert_eq!(authority.last_id(), 1006);
        let annex = find_node_by_id(authority.tree(), "1006").unwrap();
        assert_eq!(annex.value().to_string(), "Annex");
        let parent = find_node_by_id(authority.tree(), "1001").unwrap();
        assert_eq!(parent.last_child().unwrap().id(), Some("1006"));
        assert_eq!(published(&rx).len(), 1);
    }

    #[test]
    fn add_keeps_existing_ids_and_confirms_descendants() {
        let mut authority = sample_authority();
        authority.submit(AuthorityRequest::AddNode {
            parent_id: Some("1000".into()),
            node: TreeNode::new("Wing")
                .child(TreeNode::new("Stair").with_id("77"))
                .child(TreeNode::new("Hall")),
        });
        let wing = authority.tree().unwrap().last_child().unwrap();
        assert_eq!(wing.children()[0].id(), Some("77"));
        assert_eq!(wing.children()[1].id(), Some("1006"));
        assert_eq!(wing.id(), Some("1007"));
    }

    #[test]
    fn add_to_empty_authority_creates_root() {
        let mut authority = LocalAuthority::new(&AuthorityConfig::default());
        authority.submit(AuthorityRequest::AddNode {
            parent_id: None,
            node: TreeNode::new("Root"),
        });
        assert_eq!(authority.tree().unwrap().id(), Some("1006"));
    }

    #[test]
    fn numbering_skips_ids_already_present() {
        let seed = Snapshot::new(Some(
            TreeNode::new("Root")
                .with_id("1000")
                .child(TreeNode::new("Kitchen").with_id("1006"))
                .child(TreeNode::new("Loft").with_id("loft")),
        ));
        let mut authority = LocalAuthority::with_snapshot(seed, &AuthorityConfig::default());
        assert_eq!(authority.last_id(), 1006);

        authority.submit(AuthorityRequest::AddNode {
            parent_id: Some("1000".into()),
            node: TreeNode::new("Wing").child(TreeNode::new("Stair").with_id("1007")),
        });
        let wing = authority.tree().unwrap().last_child().unwrap();
        assert_eq!(wing.id(), Some("1008"));
        assert_eq!(wing.children()[0].id(), Some("1007"));
    }

    #[test]
    fn replace_resumes_numbering_above_new_ids() {
        let mut authority = LocalAuthority::new(&AuthorityConfig::default());
        authority.replace(Snapshot::new(Some(TreeNode::new("Tower").with_id("2040"))));
        assert_eq!(authority.last_id(), 2040);

        authority.submit(AuthorityRequest::AddNode {
            parent_id: Some("2040".into()),
            node: TreeNode::new("Floor"),
        });
        assert!(find_node_by_id(authority.tree(), "2041").is_some());
    }

    #[test]
    fn unknown_or_missing_parent_is_ignored() {
        let mut authority = sample_authority();
        let rx = attached(&mut authority);
        rx.try_iter().for_each(drop);

        authority.submit(AuthorityRequest::AddNode {
            parent_id: Some("9999".into()),
            node: TreeNode::new("Ghost"),
        });
        authority.submit(AuthorityRequest::AddNode {
            parent_id: None,
            node: TreeNode::new("Second root"),
        });

        assert_eq!(authority.last_id(), 1005);
        assert_eq!(authority.snapshot(), Snapshot::sample());
        assert!(published(&rx).is_empty());
    }

    #[test]
    fn remove_drops_subtree_and_publishes() {
        let mut authority = sample_authority();
        let rx = attached(&mut authority);
        rx.try_iter().for_each(drop);

        authority.submit(AuthorityRequest::RemoveNode { id: "1001".into() });
        assert!(find_node_by_id(authority.tree(), "1003").is_none());
        assert_eq!(authority.tree().unwrap().node_count(), 3);
        assert_eq!(published(&rx).len(), 1);

        authority.submit(AuthorityRequest::RemoveNode { id: "1001".into() });
        assert!(published(&rx).is_empty());
    }

    #[test]
    fn selection_does_not_publish() {
        let mut authority = sample_authority();
        let rx = attached(&mut authority);
        rx.try_iter().for_each(drop);
        authority.submit(AuthorityRequest::SelectNode { id: Some("1002".into()) });
        assert!(published(&rx).is_empty());
    }

    #[test]
    fn replace_publishes_new_tree() {
        let mut authority = LocalAuthority::new(&AuthorityConfig::default());
        let rx = attached(&mut authority);
        assert_eq!(published(&rx), vec![Snapshot::default()]);

        authority.replace(Snapshot::sample());
        assert_eq!(published(&rx), vec![Snapshot::sample()]);
    }

    #[test]
    fn notifier_reports_dropped_session() {
        let (tx, rx) = mpsc::channel();
        let notifier = Notifier::new(tx);
        assert!(notifier.notify(Snapshot::default()));
        drop(rx);
        assert!(!notifier.notify_raw(serde_json::Value::Null));
    }

    #[test]
    fn requests_resolve_ids_against_pre_action_state() {
        let state = TreeState::from_snapshot(Snapshot::sample());
        let child = find_node_by_id(state.root(), "1001").unwrap();

        let request = AuthorityRequest::from_action(
            &Action::add_child(Some(child), TreeNode::new("Annex")),
            &state,
        );
        assert_eq!(
            request,
            Some(AuthorityRequest::AddNode {
                parent_id: Some("1001".into()),
                node: TreeNode::new("Annex"),
            })
        );

        let request = AuthorityRequest::from_action(&Action::remove_child(child), &state);
        assert_eq!(request, Some(AuthorityRequest::RemoveNode { id: "1001".into() }));

        let request = AuthorityRequest::from_action(&Action::select_node(None), &state);
        assert_eq!(request, Some(AuthorityRequest::SelectNode { id: None }));
    }

    #[test]
    fn add_on_empty_tree_requests_a_root() {
        let state = TreeState::default();
        let gone = TreeNode::new("Demolished").with_id("1000");
        let action = Action::add_child(Some(&gone), TreeNode::new("Root"));
        assert_eq!(
            AuthorityRequest::from_action(&action, &state),
            Some(AuthorityRequest::AddNode {
                parent_id: None,
                node: TreeNode::new("Root"),
            })
        );
    }

    #[test]
    fn unaddressable_edits_are_not_forwarded() {
        let state = TreeState::from_snapshot(Snapshot::new(Some(TreeNode::new("Draft"))));
        let draft = state.root().unwrap();
        assert_eq!(
            AuthorityRequest::from_action(&Action::remove_child(draft), &state),
            None
        );

        let stranger = TreeNode::new("elsewhere").with_id("5");
        assert_eq!(
            AuthorityRequest::from_action(&Action::select_node(Some(&stranger)), &state),
            None
        );
        assert_eq!(
            AuthorityRequest::from_action(&Action::foreign("other"), &state),
            None
        );
        assert_eq!(
            AuthorityRequest::from_action(&Action::receive(Snapshot::default()), &state),
            None
        );
    }
}
