use std::io::Write;
use std::path::PathBuf;

use buildtree_core::{NodeKey, Snapshot, TreeNode};
use clap::Args;

use crate::error::Result;
use crate::input::read_snapshot;

#[derive(Debug, Clone, Args)]
pub struct OutlineArgs {
    /// Snapshot JSON file (`-` for stdin).
    pub snapshot: PathBuf,
}

pub fn run_outline(args: OutlineArgs) -> Result<()> {
    let snapshot = read_snapshot(&args.snapshot)?;
    let mut out = std::io::stdout().lock();
    write_outline(&mut out, snapshot.root.as_ref(), None)?;
    Ok(())
}

/// One line per node, two spaces of indent per level.
///
/// Confirmed nodes show their id in brackets, pending ones `(pending)`. The
/// node whose key is `selected` is prefixed with `> `.
pub fn write_outline(
    out: &mut dyn Write,
    root: Option<&TreeNode>,
    selected: Option<NodeKey>,
) -> std::io::Result<()> {
    let Some(root) = root else {
        return writeln!(out, "(empty)");
    };
    write_node(out, root, 0, selected)
}

fn write_node(
    out: &mut dyn Write,
    node: &TreeNode,
    depth: usize,
    selected: Option<NodeKey>,
) -> std::io::Result<()> {
    let marker = if selected == Some(node.key()) { "> " } else { "" };
    let indent = "  ".repeat(depth);
    match node.id() {
        Some(id) => writeln!(out, "{indent}{marker}{} [{id}]", node.value())?,
        None => writeln!(out, "{indent}{marker}{} (pending)", node.value())?,
    }
    for child in node.children() {
        write_node(out, child, depth + 1, selected)?;
    }
    Ok(())
}

/// Render to a string.
#[must_use]
pub fn outline_string(snapshot: &Snapshot) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_outline(&mut buf, snapshot.root.as_ref(), None);
    String::from_utf8_lossy(&buf).into_owned()
}
