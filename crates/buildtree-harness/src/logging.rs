//! stderr logging for the harness binary.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::error::{HarnessError, Result};

const DEFAULT_FILTER: &str = "warn";

/// Resolve the filter: explicit directive, else `RUST_LOG`, else `warn`.
pub fn resolve_filter(directive: Option<&str>) -> Result<EnvFilter> {
    match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|e| HarnessError::invalid(format!("log filter {directive:?}: {e}"))),
        None => Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))),
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(directive: Option<&str>) -> Result<()> {
    let filter = resolve_filter(directive)?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .compact()
        .try_init();
    if installed.is_err() {
        tracing::debug!("subscriber already installed");
    }
    Ok(())
}
