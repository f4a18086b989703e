#![no_main]

use std::sync::Arc;

use buildtree_core::Snapshot;
use buildtree_session::{Action, TreeState, reduce};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 8192 {
        return;
    }

    // Decoding must never panic.
    if let Ok(snapshot) = Snapshot::from_json_str(text) {
        // Whatever decodes re-encodes and decodes to the same structure.
        let encoded = snapshot.to_json_string().expect("encode decoded snapshot");
        let again = Snapshot::from_json_str(&encoded).expect("decode re-encoded snapshot");
        assert_eq!(again, snapshot);

        if let Some(root) = snapshot.into_root() {
            for node in root.iter() {
                for child in node.children() {
                    assert_eq!(child.parent(), Some(node.key()), "parent handle not linked");
                }
            }
        }
    }

    // Raw payloads through the reducer never fail, malformed ones empty the tree.
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        let state = Arc::new(TreeState::new());
        let valid = Snapshot::from_value(value.clone()).is_ok();
        let next = reduce(&state, Action::receive_raw(value)).expect("receive never fails");
        if !valid {
            assert!(next.is_empty());
        }
        assert!(next.is_consistent());
    }
});
