//! Engine configuration and validation

use std::path::PathBuf;
use std::time::Duration;

use harbor_store::RedundancyConfig;

use crate::errors::{Result, SyncError};
use crate::fingerprint::FingerprintKind;

/// Promotion scheduler settings.
#[derive(Debug, Clone)]
pub struct PromotionConfig {
    /// How often staging directory health is re-checked.
    pub interval: Duration,
    /// A staging child is promoted once its aggregate minimum
    /// redundancy strictly exceeds this.
    pub threshold: f64,
    /// Top-level category directories under staging to monitor.
    pub categories: Vec<String>,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            threshold: 1.0,
            categories: Vec::new(),
        }
    }
}

/// Configuration for one synchronized folder.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Local directory tree to mirror.
    pub root: PathBuf,
    /// Remote namespace prefix for fresh uploads.
    pub staging_dir: String,
    /// Remote namespace prefix for promoted directories.
    pub prod_dir: String,
    /// Skip the delete-before-reupload on changed files.
    pub archive: bool,
    /// Skip all remote mutation, only update the local index.
    pub dry_run: bool,
    pub redundancy: RedundancyConfig,
    pub fingerprint: FingerprintKind,
    pub promotion: PromotionConfig,
}

impl SyncConfig {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            staging_dir: "fuse/staging".to_string(),
            prod_dir: "fuse/prod".to_string(),
            archive: false,
            dry_run: false,
            redundancy: RedundancyConfig::default(),
            fingerprint: FingerprintKind::default(),
            promotion: PromotionConfig::default(),
        }
    }

    /// Reject invalid configurations before any watching begins.
    pub fn validate(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(SyncError::Config(format!(
                "root {} is not a directory",
                self.root.display()
            )));
        }
        if self.staging_dir.trim_matches('/').is_empty() {
            return Err(SyncError::Config("staging prefix is empty".to_string()));
        }
        if self.prod_dir.trim_matches('/').is_empty() {
            return Err(SyncError::Config("production prefix is empty".to_string()));
        }
        if self.staging_dir == self.prod_dir {
            return Err(SyncError::Config(
                "staging and production prefixes must differ".to_string(),
            ));
        }
        if self.redundancy.data_pieces == 0 {
            return Err(SyncError::Config("data pieces must be non-zero".to_string()));
        }
        if self.redundancy.parity_pieces == 0 {
            return Err(SyncError::Config(
                "parity pieces must be non-zero".to_string(),
            ));
        }
        if !self.promotion.threshold.is_finite() || self.promotion.threshold <= 0.0 {
            return Err(SyncError::Config(format!(
                "redundancy threshold {} must be a positive number",
                self.promotion.threshold
            )));
        }
        if self.promotion.interval.is_zero() {
            return Err(SyncError::Config(
                "promotion interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_validates() {
        let dir = TempDir::new().unwrap();
        let config = SyncConfig::new(dir.path().to_path_buf());
        config.validate().unwrap();
    }

    #[test]
    fn missing_root_is_rejected() {
        let config = SyncConfig::new(PathBuf::from("/nonexistent/root"));
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));
    }

    #[test]
    fn identical_prefixes_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = SyncConfig::new(dir.path().to_path_buf());
        config.prod_dir = config.staging_dir.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_threshold_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = SyncConfig::new(dir.path().to_path_buf());
        config.promotion.threshold = 0.0;
        assert!(config.validate().is_err());
        config.promotion.threshold = f64::NAN;
        assert!(config.validate().is_err());
    }
}
