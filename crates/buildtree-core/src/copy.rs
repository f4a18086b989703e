#![forbid(unsafe_code)]

//! Copy-on-write engine.
//!
//! Every structural change produces a brand-new tree through [`copy()`]. The
//! source tree is only ever read. Two hooks let callers reshape the result
//! while it is being built:
//!
//! - **visit**: called with `(original, produced)` after a node's children
//!   have been copied, so the caller can push or pop `produced` children.
//! - **exclude**: a node key dropped from the output together with its
//!   subtree.
//!
//! ```text
//! original            copy(.., exclude = B)
//!   A                   A'
//!   ├── B               └── C'
//!   │   └── D
//!   └── C
//! ```
//!
//! Produced nodes get fresh [`NodeKey`]s and children point at the produced
//! parent, never at the original one.

use crate::node::{NodeKey, TreeNode};

/// Callback invoked after a node's subtree has been copied.
pub type Visitor<'a> = &'a mut dyn FnMut(&TreeNode, &mut TreeNode);

/// Options for [`copy()`].
#[derive(Default)]
pub struct CopyOptions<'a> {
    clean: bool,
    visit: Option<Visitor<'a>>,
    parent_override: Option<Option<NodeKey>>,
    exclude: Option<NodeKey>,
}

impl std::fmt::Debug for CopyOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopyOptions")
            .field("clean", &self.clean)
            .field("visit", &self.visit.is_some())
            .field("parent_override", &self.parent_override)
            .field("exclude", &self.exclude)
            .finish()
    }
}

impl<'a> CopyOptions<'a> {
    /// Plain deep copy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Omit parent handles entirely (authority-bound copies).
    #[must_use]
    pub fn clean(mut self) -> Self {
        self.clean = true;
        self
    }

    /// Install a visitor.
    #[must_use]
    pub fn visit(mut self, visit: Visitor<'a>) -> Self {
        self.visit = Some(visit);
        self
    }

    /// Parent handle for the produced top node, instead of the original's.
    #[must_use]
    pub fn with_parent(mut self, parent: Option<NodeKey>) -> Self {
        self.parent_override = Some(parent);
        self
    }

    /// Drop the node with this key, subtree and all.
    #[must_use]
    pub fn exclude(mut self, key: NodeKey) -> Self {
        self.exclude = Some(key);
        self
    }
}

/// Deep-copy `node` into a new tree version.
///
/// Returns `None` when `node` is `None` or is itself the excluded node.
#[must_use]
pub fn copy(node: Option<&TreeNode>, mut options: CopyOptions<'_>) -> Option<TreeNode> {
    let node = node?;
    if options.exclude == Some(node.key) {
        #[cfg(feature = "tracing")]
        tracing::trace!(target: "buildtree.copy", key = %node.key, "top node excluded");
        return None;
    }
    let parent = options.parent_override.take().unwrap_or(node.parent);
    Some(copy_node(node, parent, &mut options))
}

/// Copy a node the caller already knows is not excluded.
pub(crate) fn copy_node(
    node: &TreeNode,
    parent: Option<NodeKey>,
    options: &mut CopyOptions<'_>,
) -> TreeNode {
    let mut produced = TreeNode {
        key: NodeKey::next(),
        id: node.id.clone(),
        value: node.value.clone(),
        children: Vec::with_capacity(node.children.len()),
        parent: if options.clean { None } else { parent },
    };

    for child in &node.children {
        if options.exclude == Some(child.key) {
            #[cfg(feature = "tracing")]
            tracing::trace!(target: "buildtree.copy", key = %child.key, "subtree excluded");
            continue;
        }
        let copied = copy_node(child, Some(produced.key), options);
        produced.children.push(copied);
    }

    if let Some(visit) = options.visit.as_deref_mut() {
        visit(node, &mut produced);
    }
    produced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TreeNode {
        TreeNode::new("A")
            .with_id("a")
            .child(
                TreeNode::new("B")
                    .with_id("b")
                    .child(TreeNode::new("D").with_id("d")),
            )
            .child(TreeNode::new("C").with_id("c"))
    }

    #[test]
    fn none_input_copies_nothing() {
        assert!(copy(None, CopyOptions::new()).is_none());
    }

    #[test]
    fn copy_is_structurally_equal_with_fresh_keys() {
        let original = sample();
        let produced = copy(Some(&original), CopyOptions::new()).unwrap();
        assert_eq!(produced, original);
        let old: Vec<_> = original.iter().map(TreeNode::key).collect();
        assert!(produced.iter().all(|n| !old.contains(&n.key())));
    }

    #[test]
    fn children_point_at_produced_parent() {
        let original = sample();
        let produced = copy(Some(&original), CopyOptions::new()).unwrap();
        let b = &produced.children()[0];
        assert_eq!(b.parent(), Some(produced.key()));
        assert_eq!(b.children()[0].parent(), Some(b.key()));
    }

    #[test]
    fn top_parent_defaults_to_original_and_can_be_overridden() {
        let original = sample();
        let b = &original.children()[0];
        let kept = copy(Some(b), CopyOptions::new()).unwrap();
        assert_eq!(kept.parent(), Some(original.key()));

        let detached = copy(Some(b), CopyOptions::new().with_parent(None)).unwrap();
        assert_eq!(detached.parent(), None);
    }

    #[test]
    fn clean_copy_has_no_parents() {
        let original = sample();
        let produced = copy(Some(&original), CopyOptions::new().clean()).unwrap();
        assert!(produced.iter().all(|n| n.parent().is_none()));
        assert_eq!(produced, original);
    }

    #[test]
    fn exclude_drops_subtree() {
        let original = sample();
        let b = original.children()[0].key();
        let produced = copy(Some(&original), CopyOptions::new().exclude(b)).unwrap();
        let ids: Vec<_> = produced.iter().filter_map(TreeNode::id).collect();
        assert_eq!(ids, ["a", "c"]);
        // Source untouched.
        assert_eq!(original.node_count(), 4);
    }

    #[test]
    fn excluding_top_node_yields_nothing() {
        let original = sample();
        assert!(copy(Some(&original), CopyOptions::new().exclude(original.key())).is_none());
    }

    #[test]
    fn visitor_runs_after_children_and_can_splice() {
        let original = sample();
        let mut order = Vec::new();
        let mut visit = |from: &TreeNode, to: &mut TreeNode| {
            order.push(from.id().unwrap_or_default().to_owned());
            if from.id() == Some("c") {
                to.push_child(TreeNode::new("E"));
            }
        };
        let produced = copy(Some(&original), CopyOptions::new().visit(&mut visit)).unwrap();
        assert_eq!(order, ["d", "b", "c", "a"]);
        assert_eq!(produced.children()[1].children().len(), 1);
        assert!(original.children()[1].is_leaf());
    }

    #[test]
    fn visitor_can_pop_last_child() {
        let original = sample();
        let mut visit = |from: &TreeNode, to: &mut TreeNode| {
            if from.id() == Some("a") {
                to.pop_child();
            }
        };
        let produced = copy(Some(&original), CopyOptions::new().visit(&mut visit)).unwrap();
        assert_eq!(produced.children().len(), 1);
        assert_eq!(produced.children()[0].id(), Some("b"));
    }
}
