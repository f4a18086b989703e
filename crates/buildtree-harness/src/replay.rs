use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use buildtree_core::Snapshot;
use buildtree_session::{
    Authority, AuthorityMode, LocalAuthority, OfflineAuthority, SessionConfig, TreeSession,
    TreeState,
};
use clap::Args;
use serde_json::{Value, json};

use crate::error::Result;
use crate::input::{read_snapshot, read_text};
use crate::outline::write_outline;
use crate::script::Script;

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// JSON script of steps to run.
    #[arg(long)]
    pub script: PathBuf,

    /// Starting tree (defaults to the sample building when the config asks
    /// for it, otherwise empty).
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Session config, TOML or `.json`.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the final state as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Final state of a replayed session.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub state: Arc<TreeState>,
    pub steps: usize,
    pub applied: u64,
    /// The authority's own tree, when there is one.
    pub authority: Option<Snapshot>,
}

impl ReplayReport {
    fn selected_label(&self) -> Value {
        match self.state.selected_node() {
            Some(node) => node.id().map_or_else(|| json!("(pending)"), |id| json!(id)),
            None => Value::Null,
        }
    }

    pub fn to_json(&self) -> Result<Value> {
        Ok(json!({
            "snapshot": serde_json::to_value(self.state.to_snapshot())?,
            "selected": self.selected_label(),
            "steps": self.steps,
            "applied": self.applied,
            "authority": self.authority.as_ref().map(serde_json::to_value).transpose()?,
        }))
    }
}

pub fn run_replay(args: ReplayArgs) -> Result<()> {
    let report = replay(&args)?;
    let mut out = std::io::stdout().lock();
    write_report(&mut out, &report, args.json)
}

pub fn replay(args: &ReplayArgs) -> Result<ReplayReport> {
    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    let script = Script::from_json_str(&read_text(&args.script)?)?;
    let seed = args.snapshot.as_deref().map(read_snapshot).transpose()?;
    tracing::info!(
        steps = script.steps.len(),
        mode = ?config.authority.mode,
        seeded = seed.is_some(),
        "replaying script"
    );

    match config.authority.mode {
        AuthorityMode::Local => {
            let authority = match seed {
                Some(snapshot) => LocalAuthority::with_snapshot(snapshot, &config.authority),
                None => LocalAuthority::new(&config.authority),
            };
            let mut session = TreeSession::with_config(authority, config);
            session.pump()?;
            let report = run_script(&mut session, &script)?;
            Ok(ReplayReport {
                authority: Some(session.authority().snapshot()),
                ..report
            })
        }
        AuthorityMode::Offline => {
            let state = seed.map(TreeState::from_snapshot).unwrap_or_default();
            let mut session = TreeSession::with_config(OfflineAuthority, config).with_state(state);
            run_script(&mut session, &script)
        }
    }
}

fn run_script<A: Authority>(session: &mut TreeSession<A>, script: &Script) -> Result<ReplayReport> {
    script.run(session)?;
    Ok(ReplayReport {
        state: Arc::clone(session.state()),
        steps: script.steps.len(),
        applied: session.applied(),
        authority: None,
    })
}

pub fn write_report(out: &mut dyn Write, report: &ReplayReport, as_json: bool) -> Result<()> {
    if as_json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report.to_json()?)?)?;
        return Ok(());
    }
    write_outline(out, report.state.root(), report.state.selected())?;
    let selected = match report.selected_label() {
        Value::String(label) => label,
        _ => "none".to_owned(),
    };
    writeln!(out, "selected: {selected}")?;
    writeln!(out, "steps: {}, actions applied: {}", report.steps, report.applied)?;
    Ok(())
}
