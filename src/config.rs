// src/config.rs
//! Runtime configuration: backing-table path and bind address.
//!
//! Resolution order:
//! 1) `$DASHBOARD_CONFIG_PATH` (must exist if set)
//! 2) `config/dashboard.toml`
//! 3) built-in defaults
//! `$DASHBOARD_DATA_PATH` overrides the data path from any of the above.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::table::loader::DEFAULT_DATA_PATH;

pub const ENV_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const ENV_DATA_PATH: &str = "DASHBOARD_DATA_PATH";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DashboardConfig {
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("parsing config from {}", path.display()))
    }

    /// Load with env + file fallbacks, then apply env overrides.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::from_file(&pb)?
        } else {
            let fallback = PathBuf::from("config/dashboard.toml");
            if fallback.exists() {
                Self::from_file(&fallback)?
            } else {
                Self::default()
            }
        };

        if let Ok(p) = std::env::var(ENV_DATA_PATH) {
            cfg.data_path = PathBuf::from(p);
        }
        Ok(cfg)
    }
}
