#![forbid(unsafe_code)]

//! Building tree core.
//!
//! The tree model and the pure functions the editing session is built on:
//!
//! - [`TreeNode`] / [`NodeKey`] - the recursive node and its version-scoped identity
//! - [`copy()`] / [`CopyOptions`] - copy-on-write engine with visit and exclude hooks
//! - [`insert`] / [`remove`] - mutation operators producing new tree versions
//! - [`find_node`] / [`find_node_by_id`] - pre-order lookups by identity or authority id
//! - [`Snapshot`] - the authority's JSON wire shape (feature `wire`)
//!
//! Nothing here mutates a tree after it has been handed out. Every operation
//! reads its input and returns a freshly built value.
//!
//! # Example
//!
//! ```
//! use buildtree_core::{TreeNode, find_node, insert, remove};
//!
//! let root = insert(None, None, &TreeNode::new("Root"));
//! let root = insert(Some(&root), Some(root.key()), &TreeNode::new("Hall"));
//! assert_eq!(root.children().len(), 1);
//!
//! let hall = root.children()[0].key();
//! let root = remove(Some(&root), hall).unwrap().unwrap();
//! assert!(root.is_leaf());
//! assert!(find_node(Some(&root), hall).is_none());
//! ```

pub mod copy;
pub mod error;
pub mod node;
pub mod ops;
pub mod query;
#[cfg(feature = "wire")]
pub mod wire;

pub use copy::{CopyOptions, Visitor, copy};
pub use error::TreeError;
#[cfg(feature = "wire")]
pub use error::WireError;
pub use node::{NodeKey, NodeValue, PreOrder, TreeNode};
pub use ops::{insert, remove, remove_last_child};
pub use query::{find_node, find_node_by_id, node_at_path, parent_of};
#[cfg(feature = "wire")]
pub use wire::Snapshot;
