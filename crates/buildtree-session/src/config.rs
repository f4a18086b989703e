#![forbid(unsafe_code)]

//! Session configuration, loadable from TOML or JSON.
//!
//! ```toml
//! # buildtree.toml
//! forward_selection = true
//! max_drain = 0
//!
//! [authority]
//! mode = "local"
//! id_seed = 1005
//! seed_sample = true
//! ```
//!
//! Every field has a default, so an empty document is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Forward selection changes to the authority. Default: true.
    pub forward_selection: bool,
    /// Maximum authority actions applied per pump; 0 drains everything.
    /// Default: 0.
    pub max_drain: usize,
    /// Authority settings.
    pub authority: AuthorityConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            forward_selection: true,
            max_drain: 0,
            authority: AuthorityConfig::default(),
        }
    }
}

/// Which authority backs the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorityMode {
    /// In-process authority that confirms edits and assigns ids.
    #[default]
    Local,
    /// No authority; edits stay local and pending forever.
    Offline,
}

/// Authority parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Authority backing the session. Default: local.
    pub mode: AuthorityMode,
    /// Last id handed out; new nodes get `id_seed + 1` onwards. Default: 1005.
    pub id_seed: u64,
    /// Start the local authority with the sample building. Default: false.
    pub seed_sample: bool,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            mode: AuthorityMode::Local,
            id_seed: 1005,
            seed_sample: false,
        }
    }
}

impl SessionConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load by extension (`.json` is JSON, anything else TOML) and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.authority.id_seed == u64::MAX {
            errors.push("authority.id_seed must leave room for new ids".into());
        }
        if self.authority.seed_sample && self.authority.mode == AuthorityMode::Offline {
            errors.push("authority.seed_sample requires mode = \"local\"".into());
        }

        errors
    }
}

/// Errors from loading a [`SessionConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
