//! Remote store metadata types

use serde::{Deserialize, Serialize};

use crate::path::RemotePath;

/// Erasure coding parameters applied to uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedundancyConfig {
    pub data_pieces: u32,
    pub parity_pieces: u32,
}

impl Default for RedundancyConfig {
    fn default() -> Self {
        Self {
            data_pieces: 10,
            parity_pieces: 30,
        }
    }
}

/// A file known to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub path: RemotePath,
    pub size: u64,
}

/// Replication health of one remote directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryInfo {
    pub path: RemotePath,
    /// Worst-case replication factor among the directory's contents.
    pub aggregate_min_redundancy: f64,
}

/// Health listing for a remote directory. The first entry is always the
/// queried directory itself, followed by its immediate children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryHealth {
    pub directories: Vec<DirectoryInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_file_listing_parses() {
        let json = r#"{"path": "fuse/staging/movies/heat.mkv", "size": 4096}"#;
        let file: RemoteFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.path.as_str(), "fuse/staging/movies/heat.mkv");
        assert_eq!(file.size, 4096);
    }

    #[test]
    fn directory_health_parses_with_self_entry_first() {
        let json = r#"{
            "directories": [
                {"path": "fuse/staging/movies", "aggregate_min_redundancy": 0.4},
                {"path": "fuse/staging/movies/heat", "aggregate_min_redundancy": 1.5}
            ]
        }"#;
        let health: DirectoryHealth = serde_json::from_str(json).unwrap();
        assert_eq!(health.directories.len(), 2);
        assert_eq!(
            health.directories[0].path.as_str(),
            "fuse/staging/movies"
        );
        assert!(health.directories[1].aggregate_min_redundancy > 1.0);
    }

    #[test]
    fn invalid_remote_path_in_listing_is_rejected() {
        let json = r#"{"path": "../escape", "size": 1}"#;
        assert!(serde_json::from_str::<RemoteFile>(json).is_err());
    }
}
