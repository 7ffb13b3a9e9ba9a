//! Staging-to-production promotion scheduler
//!
//! A timer loop that re-fetches staging directory health from the
//! remote store on every tick (never cached) and renames sufficiently
//! replicated children into the production namespace. Transient remote
//! errors never stop the loop; only the shutdown signal does.

use std::sync::Arc;

use harbor_store::{RemotePath, RemoteStore};
use tokio::sync::watch;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::config::PromotionConfig;
use crate::errors::Result;

pub struct Promoter {
    config: PromotionConfig,
    staging: RemotePath,
    production: RemotePath,
    store: Arc<dyn RemoteStore>,
}

impl Promoter {
    pub fn new(
        config: PromotionConfig,
        staging: RemotePath,
        production: RemotePath,
        store: Arc<dyn RemoteStore>,
    ) -> Self {
        Self {
            config,
            staging,
            production,
            store,
        }
    }

    /// Run until shutdown. The first check happens one full interval
    /// after start.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.config.interval, self.config.interval);
        info!(
            interval = ?self.config.interval,
            threshold = self.config.threshold,
            categories = ?self.config.categories,
            "promotion scheduler started"
        );
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => self.run_once().await,
            }
        }
        info!("promotion scheduler stopped");
    }

    /// One scheduler tick: evaluate every configured category. A
    /// failing category is logged and does not block the others.
    pub async fn run_once(&self) {
        for category in &self.config.categories {
            if let Err(e) = self.check_category(category).await {
                warn!(category, error = %e, "failed to check staging directory");
            }
        }
    }

    async fn check_category(&self, category: &str) -> Result<()> {
        // An empty category name monitors the staging root itself.
        let dir = if category.is_empty() {
            self.staging.clone()
        } else {
            self.staging.join(category)?
        };
        let health = self.store.directory_health(&dir).await?;

        // The first entry is the queried directory itself, never a
        // promotable child.
        for child in health.directories.iter().skip(1) {
            if child.aggregate_min_redundancy <= self.config.threshold {
                debug!(
                    path = %child.path,
                    redundancy = child.aggregate_min_redundancy,
                    "below promotion threshold"
                );
                continue;
            }
            if let Err(e) = self.promote(&child.path).await {
                warn!(path = %child.path, error = %e, "promotion failed");
            }
        }
        Ok(())
    }

    async fn promote(&self, dir: &RemotePath) -> Result<()> {
        let target = dir.rebase(&self.staging, &self.production)?;
        info!(from = %dir, to = %target, "promoting directory");
        self.store.rename(dir, &target).await?;
        Ok(())
    }
}
