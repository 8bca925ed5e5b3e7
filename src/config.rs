use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Knobs for the translators. Every field has a default, so an empty file
/// (or no file at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Model-name suffix that selects reasoning mode on the upstream.
    pub thinking_suffix: String,
    /// Type tag written into every translated error envelope.
    pub error_type: String,
    /// Ask the upstream to report usage on the last chunk of a stream.
    pub include_stream_usage: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            thinking_suffix: default_thinking_suffix(),
            error_type: default_error_type(),
            include_stream_usage: true,
        }
    }
}

fn default_thinking_suffix() -> String {
    "-thinking".to_string()
}

fn default_error_type() -> String {
    "relay_error".to_string()
}

impl RelayConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Search standard locations for a config file, falling back to defaults.
    /// Priority: CLI arg > CWD > XDG config > home dir
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        for candidate in config_search_paths() {
            if candidate.exists() {
                tracing::info!(path = %candidate.display(), "Loading config");
                return Self::load(&candidate);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }
}

#[must_use]
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("claude-relay.toml")];

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        paths.push(PathBuf::from(xdg).join("claude-relay").join("config.toml"));
    }
    if let Some(home) = home_dir() {
        paths.push(home.join(".config").join("claude-relay").join("config.toml"));
        paths.push(home.join(".claude-relay.toml"));
    }

    paths
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
