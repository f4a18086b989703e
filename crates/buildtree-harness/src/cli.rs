use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::logging;
use crate::outline::{OutlineArgs, run_outline};
use crate::replay::{ReplayArgs, run_replay};
use crate::sample::{SampleArgs, run_sample};

#[derive(Debug, Parser)]
#[command(
    name = "buildtree",
    about = "Inspect building tree snapshots and replay editing sessions",
    version
)]
pub struct Cli {
    /// Log filter directive, e.g. `buildtree.reducer=debug` (default: RUST_LOG, then warn).
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the sample building as a JSON snapshot.
    Sample(SampleArgs),

    /// Print a snapshot as an indented outline.
    Outline(OutlineArgs),

    /// Run a scripted editing session and print the final tree.
    Replay(ReplayArgs),
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log.as_deref())?;
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sample(args) => run_sample(args),
        Commands::Outline(args) => run_outline(args),
        Commands::Replay(args) => run_replay(args),
    }
}
