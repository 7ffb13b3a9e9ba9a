//! Optional TOML configuration file
//!
//! Every field is optional; command-line flags win over file values,
//! and anything left unset falls back to the built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_addr: Option<String>,
    pub api_password: Option<String>,
    pub agent: Option<String>,
    pub api_timeout_secs: Option<u64>,
    pub staging_dir: Option<String>,
    pub prod_dir: Option<String>,
    pub archive: Option<bool>,
    pub dry_run: Option<bool>,
    pub data_pieces: Option<u32>,
    pub parity_pieces: Option<u32>,
    pub check_interval_secs: Option<u64>,
    pub redundancy_threshold: Option<f64>,
    pub categories: Option<Vec<String>>,
    pub fingerprint: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: FileConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn load_if_present(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
