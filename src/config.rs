//! Pipeline configuration.
//!
//! The storage root and key prefix are explicit values loaded from a TOML
//! file (or assembled from CLI flags) and passed into the store and
//! locator at construction time. There are no module-level constants and
//! no process-wide singletons to reconfigure.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Config file looked up in the working directory when `--config` is not
/// given.
pub const DEFAULT_CONFIG_FILE: &str = "sluice.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Directory the filesystem object store is rooted at.
    pub root: PathBuf,

    /// Optional key prefix namespacing every task output, the way a bucket
    /// sub-path would.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl Config {
    /// Config for a bare storage root, no prefix. Used by the `--root`
    /// flag, which bypasses the config file.
    pub fn from_root(root: PathBuf) -> Self {
        Self {
            store: StoreConfig { root, prefix: None },
        }
    }
}

/// Loads and parses a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}
