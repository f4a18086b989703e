use std::io::Write;

use buildtree_core::Snapshot;
use clap::Args;

use crate::error::Result;

#[derive(Debug, Clone, Default, Args)]
pub struct SampleArgs {
    /// Indent the JSON output.
    #[arg(long)]
    pub pretty: bool,
}

pub fn run_sample(args: SampleArgs) -> Result<()> {
    let mut out = std::io::stdout().lock();
    write_sample(&mut out, &args)
}

pub fn write_sample(out: &mut dyn Write, args: &SampleArgs) -> Result<()> {
    let snapshot = Snapshot::sample();
    let text = if args.pretty {
        snapshot.to_json_pretty()?
    } else {
        snapshot.to_json_string()?
    };
    writeln!(out, "{text}")?;
    Ok(())
}
