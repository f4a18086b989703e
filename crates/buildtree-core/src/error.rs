#![forbid(unsafe_code)]

//! Error types for tree operations and the wire codec.

use std::fmt;

/// Caller precondition violations on tree mutation.
///
/// These are programming errors: the core never retries or recovers from
/// them, it hands them back to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Removal was requested on a tree that has no root.
    EmptyTree,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTree => f.write_str("attempt to remove a node from a non-existent tree"),
        }
    }
}

impl std::error::Error for TreeError {}

/// Snapshot payload could not be decoded.
#[cfg(feature = "wire")]
#[derive(Debug)]
pub enum WireError {
    /// Syntax or shape error reported by serde.
    Json(serde_json::Error),
}

#[cfg(feature = "wire")]
impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "malformed tree snapshot: {e}"),
        }
    }
}

#[cfg(feature = "wire")]
impl std::error::Error for WireError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
        }
    }
}

#[cfg(feature = "wire")]
impl From<serde_json::Error> for WireError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
