//! The synchronization engine
//!
//! Owns the local state index and drives it through three phases:
//! startup reconciliation (walk the tree, then converge against the
//! remote listing), then the live event dispatcher loop. The index is
//! never persisted; every start rebuilds it from a full walk plus a
//! remote listing, so reconciliation must be idempotent and safe to
//! re-run after a crash.
//!
//! All index mutation is confined to the task that owns the engine:
//! reconciliation runs to completion before the dispatcher starts, and
//! the dispatcher processes events strictly in arrival order.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use harbor_store::{RemotePath, RemoteStore};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::config::SyncConfig;
use crate::errors::{Result, SyncError};
use crate::fingerprint::{Fingerprint, FingerprintKind, Fingerprinter};
use crate::index::LocalIndex;
use crate::watcher::{FolderWatcher, FsEvent, FsEventKind};

pub struct SyncEngine {
    config: SyncConfig,
    store: Arc<dyn RemoteStore>,
    index: LocalIndex,
    watcher: FolderWatcher,
    fingerprinter: Fingerprinter,
    staging: RemotePath,
    production: RemotePath,
}

impl SyncEngine {
    /// Validate the configuration and set up the watcher on the root.
    /// No remote calls happen here.
    pub fn new(config: SyncConfig, store: Arc<dyn RemoteStore>) -> Result<Self> {
        config.validate()?;
        let mut config = config;
        config.root = config.root.canonicalize()?;

        let staging = RemotePath::new(&config.staging_dir)?;
        let production = RemotePath::new(&config.prod_dir)?;
        let fingerprinter = Fingerprinter::new(config.fingerprint);

        let mut watcher = FolderWatcher::new()?;
        watcher.watch(&config.root)?;

        Ok(Self {
            config,
            store,
            index: LocalIndex::new(),
            watcher,
            fingerprinter,
            staging,
            production,
        })
    }

    pub fn index(&self) -> &LocalIndex {
        &self.index
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Startup reconciliation: seed the index from a full local walk,
    /// then upload whatever the remote listing is missing, then
    /// re-check staging files whose remote size disagrees with local.
    ///
    /// Any failure here aborts startup; the engine never begins
    /// watching with a partially-seeded index.
    pub async fn reconcile(&mut self) -> Result<()> {
        let root = self.config.root.clone();
        self.walk_dir(&root)?;
        info!(
            files = self.index.file_count(),
            dirs = self.index.dir_count(),
            "local walk complete"
        );

        self.upload_non_existing().await?;
        self.upload_changed().await?;
        Ok(())
    }

    fn walk_dir(&mut self, dir: &Path) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let metadata = entry.metadata()?;

            if metadata.is_dir() {
                self.register_directory(&path)?;
                self.walk_dir(&path)?;
            } else if metadata.is_file() {
                let rel = self.relative(&path)?;
                let fingerprint = self.fingerprinter.fingerprint(&path)?;
                trace!(path = %rel.display(), fingerprint = fingerprint.as_str(), "indexed file");
                self.index.set_file(&rel, fingerprint);
            }
        }
        Ok(())
    }

    /// Upload every indexed file absent from both the staging and the
    /// production namespace.
    async fn upload_non_existing(&mut self) -> Result<()> {
        let mut listed: HashSet<RemotePath> = HashSet::new();
        for file in self.store.list_files(Some(&self.staging)).await? {
            listed.insert(file.path);
        }
        for file in self.store.list_files(Some(&self.production)).await? {
            listed.insert(file.path);
        }

        let tracked: Vec<PathBuf> = self.index.files().map(|(rel, _)| rel.clone()).collect();
        for rel in tracked {
            let in_staging = self.staging.join_path(&rel)?;
            let in_production = self.production.join_path(&rel)?;
            if listed.contains(&in_staging) || listed.contains(&in_production) {
                continue;
            }
            info!(path = %rel.display(), "uploading file missing from remote");
            let abs = self.config.root.join(&rel);
            self.handle_create(&abs).await?;
        }
        Ok(())
    }

    /// For every indexed file with a staging counterpart, take the
    /// remote-reported size as the fingerprint baseline and run the
    /// write path, so a real local/remote size mismatch re-uploads.
    /// Files only present in production are skipped on purpose: their
    /// fingerprint is not known locally yet.
    ///
    /// Only meaningful with size fingerprints; a content hash cannot be
    /// compared against a remote size, so blake3 mode skips this pass.
    async fn upload_changed(&mut self) -> Result<()> {
        if self.fingerprinter.kind() != FingerprintKind::Size {
            debug!("skipping remote-size comparison, fingerprints are content hashes");
            return Ok(());
        }

        let mut remote_sizes: HashMap<RemotePath, u64> = HashMap::new();
        for file in self.store.list_files(Some(&self.staging)).await? {
            remote_sizes.insert(file.path, file.size);
        }

        let tracked: Vec<PathBuf> = self.index.files().map(|(rel, _)| rel.clone()).collect();
        for rel in tracked {
            let remote = self.staging.join_path(&rel)?;
            let Some(size) = remote_sizes.get(&remote) else {
                continue;
            };
            self.index.set_file(&rel, Fingerprint::from_size(*size));
            let abs = self.config.root.join(&rel);
            self.handle_write(&abs).await?;
        }
        Ok(())
    }

    /// Live dispatcher loop. Consumes watcher events strictly in
    /// arrival order until the shutdown signal fires; remote failures
    /// on individual events are logged and the event is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut events = self
            .watcher
            .take_events()
            .ok_or_else(|| SyncError::Config("event stream already consumed".to_string()))?;
        let mut errors = self
            .watcher
            .take_errors()
            .ok_or_else(|| SyncError::Config("error stream already consumed".to_string()))?;

        info!(root = %self.config.root.display(), "watching for changes");
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    if let Err(e) = self.apply_event(event).await {
                        warn!(error = %e, "event handling failed");
                    }
                }
                Some(e) = errors.recv() => {
                    warn!(error = %e, "watcher fault");
                }
            }
        }
        info!("event dispatcher stopped");
        Ok(())
    }

    /// Apply one filesystem event to the index and the remote store.
    pub async fn apply_event(&mut self, event: FsEvent) -> Result<()> {
        trace!(path = %event.path.display(), kind = ?event.kind, "event");
        match event.kind {
            FsEventKind::Removed => self.on_removed(&event.path).await,
            FsEventKind::Created | FsEventKind::Written => {
                // A create or write may actually be a new directory;
                // directories join the watch set but are never uploaded.
                if event.path.is_dir() {
                    return self.register_directory(&event.path);
                }
                if event.kind == FsEventKind::Created {
                    self.create_with_retry(&event.path).await
                } else {
                    self.handle_write(&event.path).await
                }
            }
        }
    }

    fn register_directory(&mut self, path: &Path) -> Result<()> {
        let rel = self.relative(path)?;
        if self.index.has_dir(&rel) {
            trace!(path = %rel.display(), "directory already registered");
            return Ok(());
        }
        self.watcher.watch(path)?;
        self.index.mark_dir(&rel);
        info!(path = %rel.display(), "watching new directory");
        Ok(())
    }

    async fn on_removed(&mut self, path: &Path) -> Result<()> {
        let rel = self.relative(path)?;
        if self.index.has_dir(&rel) {
            // The OS drops the watch with the directory; prune the
            // entry so a recreated directory registers cleanly.
            self.index.remove_dir(&rel);
            debug!(path = %rel.display(), "pruned removed directory");
            return Ok(());
        }
        if self.index.get_file(&rel).is_none() {
            trace!(path = %rel.display(), "remove event for untracked path");
            return Ok(());
        }
        self.handle_remove(path).await
    }

    /// Handle a write: recompute the fingerprint and, if it differs
    /// from the indexed one, delete the old remote object (unless in
    /// archive mode) and re-upload. Writes to untracked files are
    /// ignored; no create was ever observed for them.
    async fn handle_write(&mut self, path: &Path) -> Result<()> {
        let rel = self.relative(path)?;
        let fingerprint = self.fingerprinter.fingerprint(path)?;
        match self.index.get_file(&rel) {
            None => {
                trace!(path = %rel.display(), "write event for untracked file");
                return Ok(());
            }
            Some(old) if *old == fingerprint => return Ok(()),
            Some(_) => {}
        }

        info!(path = %rel.display(), "change detected, reuploading");
        self.index.set_file(&rel, fingerprint);
        if !self.config.archive {
            self.handle_remove(path).await?;
        }
        self.handle_create(path).await
    }

    /// Upload a file to its staging mapping and record its fingerprint.
    async fn handle_create(&mut self, path: &Path) -> Result<()> {
        let rel = self.relative(path)?;
        let remote = self.staging.join_path(&rel)?;

        if !self.config.dry_run {
            debug!(path = %path.display(), remote = %remote, "uploading");
            self.store
                .upload_file(path, &remote, &self.config.redundancy)
                .await?;
        }

        let fingerprint = self.fingerprinter.fingerprint(path)?;
        self.index.set_file(&rel, fingerprint);
        Ok(())
    }

    /// Create notifications race with uploads the reconciliation (or a
    /// quick earlier event) already performed. On a create failure,
    /// check whether the remote already holds the object; if so clear
    /// it (unless archiving) and retry once. Best-effort recovery, not
    /// a transaction.
    async fn create_with_retry(&mut self, path: &Path) -> Result<()> {
        let Err(err) = self.handle_create(path).await else {
            return Ok(());
        };
        warn!(path = %path.display(), error = %err, "create failed, checking remote state");

        let rel = self.relative(path)?;
        let remote = self.staging.join_path(&rel)?;
        match self.store.file_exists(&remote).await {
            Ok(true) if !self.config.archive => {
                if let Err(e) = self.handle_remove(path).await {
                    warn!(remote = %remote, error = %e, "failed to clear stale remote object");
                }
            }
            Ok(_) => {}
            // Existence-check failure is non-fatal; the retry below
            // still reports the real outcome.
            Err(e) => warn!(remote = %remote, error = %e, "existence check failed"),
        }

        self.handle_create(path).await
    }

    /// Delete the remote object and drop the index entry. The index
    /// entry goes away whenever the delete call itself did not error.
    async fn handle_remove(&mut self, path: &Path) -> Result<()> {
        let rel = self.relative(path)?;
        let remote = self.staging.join_path(&rel)?;

        if !self.config.dry_run {
            debug!(remote = %remote, "deleting remote object");
            self.store.delete_file(&remote).await?;
        }

        self.index.remove_file(&rel);
        Ok(())
    }

    /// The single path normalization point: every index key and every
    /// remote mapping goes through here.
    fn relative(&self, path: &Path) -> Result<PathBuf> {
        path.strip_prefix(&self.config.root)
            .map(Path::to_path_buf)
            .map_err(|_| SyncError::OutsideRoot(path.to_path_buf()))
    }
}
