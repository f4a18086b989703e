#![no_main]

use arbitrary::Arbitrary;
use buildtree_core::{Snapshot, TreeNode};
use buildtree_session::{
    Action, AuthorityConfig, LocalAuthority, SessionConfig, TreeSession, TreeState,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Add { at: u16, label: u8, with_id: bool },
    Remove { at: u16 },
    RemoveStale,
    Select { at: u16 },
    Deselect,
    Pump,
    Publish { sample: bool },
}

#[derive(Debug, Arbitrary)]
struct Input {
    seed_sample: bool,
    forward_selection: bool,
    max_drain: u8,
    ops: Vec<Op>,
}

fn pick(state: &TreeState, at: u16) -> Option<TreeNode> {
    let root = state.root()?;
    root.iter().nth(usize::from(at) % root.node_count()).cloned()
}

fn assert_invariants(state: &TreeState) {
    assert!(state.is_consistent(), "selection does not resolve");
    if let Some(root) = state.root() {
        assert_eq!(root.parent(), None);
        for node in root.iter() {
            for child in node.children() {
                assert_eq!(child.parent(), Some(node.key()), "parent handle not linked");
            }
        }
    }
}

fuzz_target!(|input: Input| {
    if input.ops.len() > 256 {
        return;
    }
    let config = SessionConfig {
        forward_selection: input.forward_selection,
        max_drain: usize::from(input.max_drain % 4),
        authority: AuthorityConfig {
            seed_sample: input.seed_sample,
            ..AuthorityConfig::default()
        },
    };
    let authority = LocalAuthority::new(&config.authority);
    let mut session = TreeSession::with_config(authority, config);
    let notifier = session.notifier();

    for op in input.ops {
        let state = session.state().clone();
        let action = match op {
            Op::Add { at, label, with_id } => {
                let node = TreeNode::new(format!("n{label}"));
                let node = if with_id { node.with_id(format!("f{label}")) } else { node };
                Action::add_child(pick(&state, at).as_ref(), node)
            }
            Op::Remove { at } => match pick(&state, at) {
                Some(target) => Action::remove_child(&target),
                None => continue,
            },
            Op::RemoveStale => {
                if state.is_empty() {
                    continue;
                }
                Action::remove_child(&TreeNode::new("stale"))
            }
            Op::Select { at } => Action::select_node(pick(&state, at).as_ref()),
            Op::Deselect => Action::select_node(None),
            Op::Pump => {
                session.pump().expect("authority snapshots always apply");
                assert_invariants(session.state());
                continue;
            }
            Op::Publish { sample } => {
                let snapshot = if sample { Snapshot::sample() } else { Snapshot::default() };
                notifier.notify(snapshot);
                continue;
            }
        };
        session.dispatch(action).expect("non-empty tree never rejects");
        assert_invariants(session.state());
    }
});
