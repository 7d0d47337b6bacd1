//! Engine configuration: the operational knobs that govern a net's
//! logging, independent of its places, transitions, and tokens.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// Configuration for a [`crate::petri_net::net::PetriNet`].
///
/// `log_folder = None` (the default) runs with [`crate::logging::Logger::noop`]:
/// no filesystem access, no background thread. Setting it switches to a
/// [`crate::logging::FileLogSink`] rooted there, one `<name>.txt` per
/// process, opened in append mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub log_folder: Option<PathBuf>,
    /// Bound on the audit-log channel between the engine and its
    /// background sink thread.
    pub log_channel_capacity: usize,
    /// Passed straight through to
    /// [`crate::petri_net::engine::FiringEngine::reserve`] at
    /// construction time; `0` skips pre-sizing.
    pub deferred_shard_hint: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            log_folder: None,
            log_channel_capacity: 200,
            deferred_shard_hint: 0,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
