use std::io::Read;
use std::path::Path;

use buildtree_core::Snapshot;

use crate::error::{HarnessError, Result};

/// Read a file, `-` meaning stdin.
pub fn read_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    if !path.exists() {
        return Err(HarnessError::MissingPath {
            path: path.to_path_buf(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let text = read_text(path)?;
    let snapshot = Snapshot::from_json_str(&text)?;
    tracing::debug!(
        path = %path.display(),
        nodes = snapshot.root.as_ref().map_or(0, |root| root.node_count()),
        "snapshot loaded"
    );
    Ok(snapshot)
}
