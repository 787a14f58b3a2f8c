//! Device configuration file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use warden_engine::RuntimeConfig;
use warden_storage::DatabaseConfig;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV: &str = "WARDEN_CONFIG";

/// Top-level configuration. Every section is optional in the file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    pub database: DatabaseConfig,

    #[serde(flatten)]
    pub runtime: RuntimeConfig,

    /// Drive the simulated peripherals through a short walk-through after
    /// boot.
    pub simulate: bool,
}

impl WardenConfig {
    /// Load from the file named by `WARDEN_CONFIG`, or fall back to defaults.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("loading {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).context("invalid configuration")?;
        config.runtime.timing.validate()?;
        config.runtime.debounce.validate()?;
        Ok(config)
    }
}
