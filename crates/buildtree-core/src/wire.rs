#![forbid(unsafe_code)]

//! Snapshot wire shape exchanged with the authority.
//!
//! ```json
//! { "root": { "id": "1000", "value": "Root", "children": [ ... ] } }
//! ```
//!
//! `id` is optional (pending nodes) and may arrive as a JSON integer; it is
//! normalized to a string. `children` is omitted for leaves. Keys and parent
//! handles never appear on the wire: decoding allocates fresh keys and
//! [`Snapshot::into_root`] links parent handles before the tree is shared.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::WireError;
use crate::node::TreeNode;

/// A whole-tree snapshot as published by the authority.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Root node, `None` for an empty tree.
    #[serde(default)]
    pub root: Option<TreeNode>,
}

impl Snapshot {
    /// Wrap an optional root.
    #[must_use]
    pub fn new(root: Option<TreeNode>) -> Self {
        Self { root }
    }

    /// Decode from JSON text.
    ///
    /// # Errors
    ///
    /// [`WireError::Json`] on syntax errors or a structurally invalid tree.
    pub fn from_json_str(s: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Decode from an already-parsed JSON value.
    ///
    /// `null` decodes to an empty snapshot.
    ///
    /// # Errors
    ///
    /// [`WireError::Json`] when the value does not have the snapshot shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self, WireError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Encode as compact JSON.
    ///
    /// # Errors
    ///
    /// [`WireError::Json`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode as indented JSON.
    ///
    /// # Errors
    ///
    /// [`WireError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Take the root with parent handles linked for this version.
    #[must_use]
    pub fn into_root(self) -> Option<TreeNode> {
        let mut root = self.root?;
        root.relink(None);
        Some(root)
    }

    /// The canonical sample building used by the local authority and tests.
    #[must_use]
    pub fn sample() -> Self {
        let root = TreeNode::new("Root")
            .with_id("1000")
            .child(
                TreeNode::new("Child")
                    .with_id("1001")
                    .child(TreeNode::new("GrandSon").with_id("1003"))
                    .child(TreeNode::new("GrandDaughter").with_id("1004")),
            )
            .child(
                TreeNode::new("Sibling")
                    .with_id("1002")
                    .child(TreeNode::new("StepChild").with_id("1005")),
            );
        Self::new(Some(root))
    }
}

/// Accept a string or integer id; normalize to a string.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(text) => text,
        RawId::Signed(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    }))
}
