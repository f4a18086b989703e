#![forbid(unsafe_code)]

//! The `buildtree` command-line harness.

pub mod cli;
pub mod error;
pub mod input;
pub mod logging;
pub mod outline;
pub mod replay;
pub mod sample;
pub mod script;

pub use cli::{Cli, Commands, run, run_from_env};
pub use error::{HarnessError, Result};
