//! End-to-end scenario: initial sync, change detection, promotion
//!
//! A watched root holding `a.txt` (10 bytes) and `sub/b.txt` (5 bytes)
//! starts against an empty store, a.txt is then rewritten, and finally
//! the store reports `staging/sub` as sufficiently replicated.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use harborsync::store::{
    DirectoryHealth, DirectoryInfo, RedundancyConfig, RemoteFile, RemotePath, RemoteStore,
    StoreError,
};
use harborsync::sync::{
    FsEvent, FsEventKind, Promoter, PromotionConfig, SyncConfig, SyncEngine,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Upload(String),
    Delete(String),
    Rename(String, String),
}

#[derive(Default)]
struct RecordingStore {
    calls: Mutex<Vec<Call>>,
    files: Mutex<HashMap<RemotePath, u64>>,
    health: Mutex<HashMap<RemotePath, DirectoryHealth>>,
}

impl RecordingStore {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn report_health(&self, dir: &str, entries: &[(&str, f64)]) {
        let directories = entries
            .iter()
            .map(|(path, redundancy)| DirectoryInfo {
                path: RemotePath::new(path).unwrap(),
                aggregate_min_redundancy: *redundancy,
            })
            .collect();
        self.health.lock().unwrap().insert(
            RemotePath::new(dir).unwrap(),
            DirectoryHealth { directories },
        );
    }
}

#[async_trait]
impl RemoteStore for RecordingStore {
    async fn upload_file(
        &self,
        local: &Path,
        remote: &RemotePath,
        _redundancy: &RedundancyConfig,
    ) -> Result<(), StoreError> {
        let size = fs::metadata(local).map(|m| m.len()).unwrap_or(0);
        self.files.lock().unwrap().insert(remote.clone(), size);
        self.calls
            .lock()
            .unwrap()
            .push(Call::Upload(remote.to_string()));
        Ok(())
    }

    async fn delete_file(&self, remote: &RemotePath) -> Result<(), StoreError> {
        self.files.lock().unwrap().remove(remote);
        self.calls
            .lock()
            .unwrap()
            .push(Call::Delete(remote.to_string()));
        Ok(())
    }

    async fn list_files(
        &self,
        prefix: Option<&RemotePath>,
    ) -> Result<Vec<RemoteFile>, StoreError> {
        let files = self.files.lock().unwrap();
        Ok(files
            .iter()
            .filter(|(path, _)| prefix.map_or(true, |p| path.starts_with(p)))
            .map(|(path, size)| RemoteFile {
                path: path.clone(),
                size: *size,
            })
            .collect())
    }

    async fn directory_health(&self, remote: &RemotePath) -> Result<DirectoryHealth, StoreError> {
        Ok(self
            .health
            .lock()
            .unwrap()
            .get(remote)
            .cloned()
            .unwrap_or_default())
    }

    async fn rename(&self, from: &RemotePath, to: &RemotePath) -> Result<(), StoreError> {
        let mut files = self.files.lock().unwrap();
        let moved: Vec<(RemotePath, u64)> = files
            .iter()
            .filter(|(path, _)| path.starts_with(from))
            .map(|(path, size)| (path.rebase(from, to).unwrap(), *size))
            .collect();
        files.retain(|path, _| !path.starts_with(from));
        files.extend(moved);
        self.calls
            .lock()
            .unwrap()
            .push(Call::Rename(from.to_string(), to.to_string()));
        Ok(())
    }

    async fn file_exists(&self, remote: &RemotePath) -> Result<bool, StoreError> {
        Ok(self.files.lock().unwrap().contains_key(remote))
    }
}

#[tokio::test]
async fn initial_sync_change_and_promotion() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("a.txt"), vec![b'x'; 10]).unwrap();
    fs::create_dir(root.path().join("sub")).unwrap();
    fs::write(root.path().join("sub/b.txt"), vec![b'y'; 5]).unwrap();

    let recording = Arc::new(RecordingStore::default());
    let store: Arc<dyn RemoteStore> = recording.clone();

    let mut config = SyncConfig::new(root.path().to_path_buf());
    config.staging_dir = "staging".to_string();
    config.prod_dir = "production".to_string();

    // Startup against an empty store: exactly one upload per file.
    let mut engine = SyncEngine::new(config, store.clone()).unwrap();
    engine.reconcile().await.unwrap();

    let mut uploads = recording.calls();
    uploads.sort_by_key(|call| format!("{call:?}"));
    assert_eq!(
        uploads,
        vec![
            Call::Upload("staging/a.txt".to_string()),
            Call::Upload("staging/sub/b.txt".to_string()),
        ]
    );

    // Rewriting a.txt to 20 bytes: one delete, then one re-upload.
    recording.clear();
    fs::write(root.path().join("a.txt"), vec![b'x'; 20]).unwrap();
    let watched_root = engine.root().to_path_buf();
    engine
        .apply_event(FsEvent {
            path: watched_root.join("a.txt"),
            kind: FsEventKind::Written,
        })
        .await
        .unwrap();
    assert_eq!(
        recording.calls(),
        vec![
            Call::Delete("staging/a.txt".to_string()),
            Call::Upload("staging/a.txt".to_string()),
        ]
    );

    // The store now reports staging/sub as replicated past the
    // threshold: the whole directory is renamed into production.
    recording.clear();
    recording.report_health(
        "staging",
        &[("staging", 0.9), ("staging/sub", 1.5)],
    );

    let promoter = Promoter::new(
        PromotionConfig {
            // Monitor the staging root itself.
            categories: vec![String::new()],
            ..PromotionConfig::default()
        },
        RemotePath::new("staging").unwrap(),
        RemotePath::new("production").unwrap(),
        store,
    );
    promoter.run_once().await;

    assert_eq!(
        recording.calls(),
        vec![Call::Rename(
            "staging/sub".to_string(),
            "production/sub".to_string(),
        )]
    );
    assert!(recording
        .files
        .lock()
        .unwrap()
        .contains_key(&RemotePath::new("production/sub/b.txt").unwrap()));
}
