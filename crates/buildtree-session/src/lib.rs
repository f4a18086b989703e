#![forbid(unsafe_code)]

//! Reducer-driven editing session for the building tree.
//!
//! - [`reduce`] - the pure `(state, action) -> state` transition
//! - [`TreeState`] - immutable session state (root plus selection)
//! - [`TreeSession`] - dispatch, authority forwarding and inbox pumping
//! - [`Authority`] - the seam to whatever owns the canonical tree
//! - [`SessionConfig`] - TOML/JSON configuration
//!
//! # Logging
//!
//! Emits `tracing` events under the `buildtree.reducer`,
//! `buildtree.authority` and `buildtree.session` targets. Install a
//! subscriber to see them.

pub mod action;
pub mod authority;
pub mod config;
pub mod reducer;
pub mod session;
pub mod state;

pub use action::{ADD_CHILD, Action, RECEIVE_TREE, REMOVE_CHILD, SELECT_NODE, TreePayload};
pub use authority::{Authority, AuthorityRequest, LocalAuthority, Notifier, OfflineAuthority};
pub use config::{AuthorityConfig, AuthorityMode, ConfigError, SessionConfig};
pub use reducer::reduce;
pub use session::{SessionError, TreeSession};
pub use state::TreeState;
