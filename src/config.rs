//! Provides the model loader configuration.
//!
//! # Examples
//! ```
//! use scenery::config::LoaderConfig;
//!
//! let config = LoaderConfig::from_toml_str("base_dir = \"assets\"").unwrap();
//! assert!(config.allow_remote);
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Settings shared by every load issued through a [`ModelLoader`](crate::loader::ModelLoader).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory that relative paths are resolved against.
    pub base_dir: Option<PathBuf>,
    /// Whether `http://` and `https://` URLs may be fetched.
    pub allow_remote: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            allow_remote: true,
        }
    }
}

impl LoaderConfig {
    /// Parses a config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Resolves a local path against `base_dir`. Absolute paths pass through.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
