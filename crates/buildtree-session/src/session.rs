#![forbid(unsafe_code)]

//! The editing session: reducer, authority and inbox wired together.
//!
//! Local edits go through [`TreeSession::dispatch`], which applies them
//! immediately and then tells the authority. The authority's answers land in
//! an inbox and are applied by [`TreeSession::pump`], in arrival order.
//! Nothing the authority publishes is applied re-entrantly from inside
//! `dispatch`.
//!
//! # Example
//!
//! ```
//! use buildtree_core::{TreeNode, find_node_by_id};
//! use buildtree_session::{Action, LocalAuthority, SessionConfig, TreeSession};
//!
//! let mut config = SessionConfig::default();
//! config.authority.seed_sample = true;
//! let authority = LocalAuthority::new(&config.authority);
//! let mut session = TreeSession::with_config(authority, config);
//! session.pump().unwrap();
//!
//! let hall = find_node_by_id(session.state().root(), "1001").unwrap();
//! let action = Action::add_child(Some(hall), TreeNode::new("Annex"));
//! session.dispatch(action).unwrap();
//! assert!(find_node_by_id(session.state().root(), "1006").is_none());
//!
//! session.pump().unwrap();
//! assert!(find_node_by_id(session.state().root(), "1006").is_some());
//! ```

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use buildtree_core::TreeError;

use crate::action::Action;
use crate::authority::{Authority, AuthorityRequest, Notifier};
use crate::config::SessionConfig;
use crate::reducer::reduce;
use crate::state::TreeState;

/// Errors surfaced by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A tree operation rejected the action.
    Tree(TreeError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tree(e) => write!(f, "tree error: {e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tree(e) => Some(e),
        }
    }
}

impl From<TreeError> for SessionError {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}

/// An editing session over one building tree.
#[derive(Debug)]
pub struct TreeSession<A: Authority> {
    state: Arc<TreeState>,
    authority: A,
    notifier: Notifier,
    inbox: Receiver<Action>,
    config: SessionConfig,
    applied: u64,
}

impl<A: Authority> TreeSession<A> {
    /// Session with the default configuration.
    pub fn new(authority: A) -> Self {
        Self::with_config(authority, SessionConfig::default())
    }

    /// Session with an explicit configuration. Attaches the authority.
    pub fn with_config(mut authority: A, config: SessionConfig) -> Self {
        let (tx, inbox) = mpsc::channel();
        let notifier = Notifier::new(tx);
        authority.attach(notifier.clone());
        tracing::debug!(target: "buildtree.session", ?config, "session started");
        Self {
            state: Arc::new(TreeState::new()),
            authority,
            notifier,
            inbox,
            config,
            applied: 0,
        }
    }

    /// Replace the starting state.
    #[must_use]
    pub fn with_state(mut self, state: TreeState) -> Self {
        self.state = Arc::new(state);
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &Arc<TreeState> {
        &self.state
    }

    /// The authority.
    #[must_use]
    pub fn authority(&self) -> &A {
        &self.authority
    }

    /// Mutable access to the authority, e.g. to push an out-of-band update.
    pub fn authority_mut(&mut self) -> &mut A {
        &mut self.authority
    }

    /// Another handle for publishing into this session's inbox.
    #[must_use]
    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    /// The configuration in effect.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of actions reduced so far (dispatched and pumped).
    #[must_use]
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Apply a local action, then forward it to the authority.
    ///
    /// # Errors
    ///
    /// [`SessionError::Tree`] when the reducer rejects the action. The
    /// authority is not told about rejected actions.
    pub fn dispatch(&mut self, action: Action) -> Result<&Arc<TreeState>, SessionError> {
        let request = match &action {
            Action::SelectNode { .. } if !self.config.forward_selection => None,
            _ => AuthorityRequest::from_action(&action, &self.state),
        };
        self.apply(action)?;
        if let Some(request) = request {
            self.authority.submit(request);
        }
        Ok(&self.state)
    }

    /// Apply queued authority actions, oldest first.
    ///
    /// Stops after `config.max_drain` actions when that is non-zero. Returns
    /// how many were applied.
    ///
    /// # Errors
    ///
    /// [`SessionError::Tree`] from the reducer; the failing action is
    /// consumed and later ones stay queued.
    pub fn pump(&mut self) -> Result<usize, SessionError> {
        let applied = self.drain(self.config.max_drain)?;
        if applied > 0 {
            tracing::debug!(target: "buildtree.session", applied, "inbox pumped");
        }
        Ok(applied)
    }

    /// Wait up to `timeout` for the first queued action, then keep draining
    /// like [`pump`](Self::pump).
    ///
    /// For authorities publishing from another thread.
    ///
    /// # Errors
    ///
    /// As for [`pump`](Self::pump).
    pub fn pump_timeout(&mut self, timeout: Duration) -> Result<usize, SessionError> {
        let Ok(action) = self.inbox.recv_timeout(timeout) else {
            return Ok(0);
        };
        self.apply(action)?;
        let rest = match self.config.max_drain {
            0 => 0,
            1 => return Ok(1),
            n => n - 1,
        };
        Ok(self.drain(rest)? + 1)
    }

    /// Apply up to `limit` queued actions; 0 means all of them.
    fn drain(&mut self, limit: usize) -> Result<usize, SessionError> {
        let mut applied = 0;
        while limit == 0 || applied < limit {
            let Ok(action) = self.inbox.try_recv() else {
                break;
            };
            self.apply(action)?;
            applied += 1;
        }
        Ok(applied)
    }

    fn apply(&mut self, action: Action) -> Result<(), SessionError> {
        self.state = reduce(&self.state, action)?;
        self.applied += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::{LocalAuthority, OfflineAuthority};
    use crate::config::AuthorityConfig;
    use buildtree_core::{Snapshot, TreeNode, find_node_by_id};

    /// Records every request it sees.
    #[derive(Debug, Default)]
    struct Recorder {
        requests: Vec<AuthorityRequest>,
    }

    impl Authority for Recorder {
        fn attach(&mut self, _notifier: Notifier) {}

        fn submit(&mut self, request: AuthorityRequest) {
            self.requests.push(request);
        }
    }

    fn seeded<A: Authority>(authority: A, config: SessionConfig) -> TreeSession<A> {
        TreeSession::with_config(authority, config)
            .with_state(TreeState::from_snapshot(Snapshot::sample()))
    }

    #[test]
    fn dispatch_forwards_after_applying() {
        let mut session = seeded(Recorder::default(), SessionConfig::default());
        let child = find_node_by_id(session.state().root(), "1001").unwrap().clone();

        session
            .dispatch(Action::add_child(Some(&child), TreeNode::new("Annex")))
            .unwrap();
        assert_eq!(session.state().root().unwrap().node_count(), 7);
        assert_eq!(
            session.authority().requests,
            vec![AuthorityRequest::AddNode {
                parent_id: Some("1001".into()),
                node: TreeNode::new("Annex"),
            }]
        );
        assert_eq!(session.applied(), 1);
    }

    #[test]
    fn selection_forwarding_can_be_disabled() {
        let config = SessionConfig {
            forward_selection: false,
            ..SessionConfig::default()
        };
        let mut session = seeded(Recorder::default(), config);
        let child = find_node_by_id(session.state().root(), "1001").unwrap().clone();

        session.dispatch(Action::select_node(Some(&child))).unwrap();
        assert_eq!(session.state().selected(), Some(child.key()));
        assert!(session.authority().requests.is_empty());
    }

    #[test]
    fn rejected_action_is_not_forwarded() {
        let mut session = TreeSession::new(Recorder::default());
        let err = session
            .dispatch(Action::remove_child(&TreeNode::new("x").with_id("1")))
            .unwrap_err();
        assert_eq!(err, SessionError::Tree(TreeError::EmptyTree));
        assert!(session.authority().requests.is_empty());
        assert_eq!(session.applied(), 0);
    }

    #[test]
    fn offline_session_keeps_pending_nodes() {
        let mut session = TreeSession::new(OfflineAuthority);
        session.dispatch(Action::add_child(None, TreeNode::new("Root"))).unwrap();
        assert_eq!(session.pump().unwrap(), 0);
        assert!(session.state().root().unwrap().is_pending());
    }

    #[test]
    fn pump_respects_max_drain() {
        let config = SessionConfig {
            max_drain: 2,
            ..SessionConfig::default()
        };
        let mut session = TreeSession::with_config(OfflineAuthority, config);
        let notifier = session.notifier();
        for _ in 0..3 {
            notifier.notify(Snapshot::sample());
        }
        assert_eq!(session.pump().unwrap(), 2);
        assert_eq!(session.pump().unwrap(), 1);
        assert_eq!(session.pump().unwrap(), 0);
    }

    #[test]
    fn pump_applies_in_arrival_order() {
        let mut session = TreeSession::new(OfflineAuthority);
        let notifier = session.notifier();
        notifier.notify(Snapshot::sample());
        notifier.notify(Snapshot::default());
        assert_eq!(session.pump().unwrap(), 2);
        assert!(session.state().is_empty());
    }

    #[test]
    fn local_authority_publishes_on_attach() {
        let config = SessionConfig {
            authority: AuthorityConfig {
                seed_sample: true,
                ..AuthorityConfig::default()
            },
            ..SessionConfig::default()
        };
        let authority = LocalAuthority::new(&config.authority);
        let mut session = TreeSession::with_config(authority, config);
        assert!(session.state().is_empty());
        assert_eq!(session.pump().unwrap(), 1);
        assert_eq!(session.state().to_snapshot(), Snapshot::sample());
    }

    #[test]
    fn pump_timeout_receives_from_another_thread() {
        let mut session = TreeSession::new(OfflineAuthority);
        let notifier = session.notifier();
        let publisher = std::thread::spawn(move || notifier.notify(Snapshot::sample()));

        let applied = session.pump_timeout(Duration::from_secs(5)).unwrap();
        assert!(publisher.join().unwrap());
        assert_eq!(applied, 1);
        assert_eq!(session.state().to_snapshot(), Snapshot::sample());
    }

    #[test]
    fn pump_timeout_with_empty_inbox_returns_zero() {
        let mut session = TreeSession::new(OfflineAuthority);
        assert_eq!(session.pump_timeout(Duration::from_millis(1)).unwrap(), 0);
    }
}
