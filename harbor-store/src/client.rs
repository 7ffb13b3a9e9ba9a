//! The capability set the sync engine consumes from the remote store.
//!
//! The store itself (replication protocol, erasure coding, redundancy
//! computation) is an external system; the engine only observes it
//! through this interface.

use std::path::Path;

use async_trait::async_trait;

use crate::errors::Result;
use crate::path::RemotePath;
use crate::types::{DirectoryHealth, RedundancyConfig, RemoteFile};

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Upload a local file to `remote` with the given erasure coding
    /// parameters.
    async fn upload_file(
        &self,
        local: &Path,
        remote: &RemotePath,
        redundancy: &RedundancyConfig,
    ) -> Result<()>;

    /// Delete a remote object.
    async fn delete_file(&self, remote: &RemotePath) -> Result<()>;

    /// List remote files, optionally restricted to one namespace prefix.
    async fn list_files(&self, prefix: Option<&RemotePath>) -> Result<Vec<RemoteFile>>;

    /// Fetch replication health for a directory and its immediate
    /// children. Entry 0 of the result is the queried directory itself.
    async fn directory_health(&self, remote: &RemotePath) -> Result<DirectoryHealth>;

    /// Rename a remote path, carrying everything beneath it.
    async fn rename(&self, from: &RemotePath, to: &RemotePath) -> Result<()>;

    /// Whether the store has an object at `remote`.
    async fn file_exists(&self, remote: &RemotePath) -> Result<bool>;
}
