//! In-memory index of known local files and directories
//!
//! Keys are always paths relative to the synchronized root; callers
//! normalize before touching the index. The index is plain data with no
//! external calls and is not internally synchronized: all mutation is
//! confined to the engine task that owns it.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::fingerprint::Fingerprint;

#[derive(Debug, Default)]
pub struct LocalIndex {
    files: HashMap<PathBuf, Fingerprint>,
    dirs: HashSet<PathBuf>,
}

impl LocalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_file(&mut self, path: &Path, fingerprint: Fingerprint) {
        self.files.insert(path.to_path_buf(), fingerprint);
    }

    pub fn remove_file(&mut self, path: &Path) {
        self.files.remove(path);
    }

    pub fn get_file(&self, path: &Path) -> Option<&Fingerprint> {
        self.files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &Fingerprint)> {
        self.files.iter()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Record a directory as registered (added to the watch set).
    pub fn mark_dir(&mut self, path: &Path) {
        self.dirs.insert(path.to_path_buf());
    }

    pub fn has_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    pub fn remove_dir(&mut self, path: &Path) {
        self.dirs.remove(path);
    }

    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_entries_round_trip() {
        let mut index = LocalIndex::new();
        let path = PathBuf::from("sub/b.txt");

        assert!(index.get_file(&path).is_none());
        index.set_file(&path, Fingerprint::from_size(5));
        assert_eq!(index.get_file(&path), Some(&Fingerprint::from_size(5)));

        index.set_file(&path, Fingerprint::from_size(20));
        assert_eq!(index.get_file(&path), Some(&Fingerprint::from_size(20)));
        assert_eq!(index.file_count(), 1);

        index.remove_file(&path);
        assert!(index.get_file(&path).is_none());
        assert_eq!(index.file_count(), 0);
    }

    #[test]
    fn dir_registration_is_idempotent() {
        let mut index = LocalIndex::new();
        let path = PathBuf::from("sub");

        assert!(!index.has_dir(&path));
        index.mark_dir(&path);
        index.mark_dir(&path);
        assert!(index.has_dir(&path));
        assert_eq!(index.dir_count(), 1);

        index.remove_dir(&path);
        assert!(!index.has_dir(&path));
    }
}
