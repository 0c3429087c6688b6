//! Global configuration management
//!
//! Reads settings from `config.toml` in the config directory. Global settings
//! cover the default manifest, strict plugin scheduling and output format.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infra::dirs::SwallowerDirs;

/// Global configuration error types
#[derive(Error, Debug)]
pub enum GlobalConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    ReadError { path: String, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    ParseError { path: String, error: String },
}

/// Global configuration for swallower
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Run settings
    #[serde(default)]
    pub run: RunConfig,

    /// Output preferences
    #[serde(default)]
    pub output: OutputConfig,
}

/// Run settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Manifest file used when `--manifest` is not given
    pub manifest: Option<String>,

    /// Fail when plugins cannot be scheduled
    pub strict: Option<bool>,
}

/// Output preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Enable JSON output
    pub json: Option<bool>,
}

impl GlobalConfig {
    /// Load global configuration from the config directory
    ///
    /// A missing file yields the default configuration; an invalid one is an
    /// error.
    pub fn load(dirs: &SwallowerDirs) -> Result<Self, GlobalConfigError> {
        Self::load_from_path(&dirs.global_config_path())
    }

    /// Load global configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, GlobalConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| GlobalConfigError::ReadError {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| GlobalConfigError::ParseError {
            path: path.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Effective manifest file name
    #[must_use]
    pub fn manifest(&self) -> &str {
        self.run
            .manifest
            .as_deref()
            .unwrap_or(crate::config::defaults::DEFAULT_MANIFEST)
    }

    /// Whether stuck plugins fail a run
    #[must_use]
    pub fn strict(&self) -> bool {
        self.run
            .strict
            .unwrap_or(crate::config::defaults::DEFAULT_STRICT)
    }

    /// Whether JSON output is enabled
    #[must_use]
    pub fn json(&self) -> bool {
        self.output.json.unwrap_or(false)
    }
}
