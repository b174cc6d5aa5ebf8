//! Engine configuration.
//!
//! Everything the command-line engine needs at startup:
//! - `SearchConfig`: Search parameters shared by `go` and self-play
//! - `SelfPlayConfig`: Self-play turn budget and intervals
//! - `ProtocolConfig`: `go` budget, model location, engine identity
//!
//! Loaded from TOML. Missing sections and keys fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mcts::SearchConfig;
use crate::training::SelfPlayConfig;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings for the line protocol.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Search iterations for each `go`.
    pub go_iterations: u32,

    /// Where the apprentice is loaded from and saved to.
    pub model_path: PathBuf,

    /// Reported by `uci` as `id name`.
    pub engine_name: String,

    /// Reported by `uci` as `id author`.
    pub engine_author: String,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            go_iterations: 150_000,
            model_path: PathBuf::from("apprentice.bin"),
            engine_name: "apprentice-mcts".to_string(),
            engine_author: "apprentice-mcts developers".to_string(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default tracing filter, overridden by `RUST_LOG`.
    pub log_level: String,

    pub search: SearchConfig,
    pub selfplay: SelfPlayConfig,
    pub protocol: ProtocolConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            search: SearchConfig::default(),
            selfplay: SelfPlayConfig::default(),
            protocol: ProtocolConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}
