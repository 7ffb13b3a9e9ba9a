//! Remote path handling and namespace rebasing
//!
//! A `RemotePath` is a normalized, `/`-separated path relative to the
//! store root. The staging and production namespaces are just path
//! prefixes, so moving an object between them is a pure prefix rebase
//! that leaves the suffix untouched.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, StoreError};

/// A normalized path inside the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemotePath(String);

impl RemotePath {
    /// Parse and normalize a remote path. Leading/trailing slashes are
    /// stripped; empty paths and `.`/`..` components are rejected.
    pub fn new(path: &str) -> Result<Self> {
        let mut components = Vec::new();
        for component in path.split('/') {
            match component {
                "" => continue,
                "." | ".." => return Err(StoreError::InvalidPath(path.to_string())),
                c => components.push(c),
            }
        }
        if components.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(Self(components.join("/")))
    }

    /// Append a further path segment (itself slash-separated).
    pub fn join(&self, suffix: &str) -> Result<Self> {
        let suffix = Self::new(suffix)?;
        Ok(Self(format!("{}/{}", self.0, suffix.0)))
    }

    /// Append a relative local filesystem path. Fails on non-UTF8
    /// components since the store API is string-keyed.
    pub fn join_path(&self, relative: &Path) -> Result<Self> {
        let mut joined = self.0.clone();
        for component in relative.components() {
            let part = component
                .as_os_str()
                .to_str()
                .ok_or_else(|| StoreError::InvalidPath(relative.display().to_string()))?;
            if part == "." || part == ".." || part.contains('/') {
                return Err(StoreError::InvalidPath(relative.display().to_string()));
            }
            joined.push('/');
            joined.push_str(part);
        }
        if joined == self.0 {
            return Err(StoreError::InvalidPath(relative.display().to_string()));
        }
        Ok(Self(joined))
    }

    /// Whether this path sits under `prefix` (component-wise, so
    /// `fuse/staging2` is not under `fuse/staging`).
    pub fn starts_with(&self, prefix: &RemotePath) -> bool {
        self.0 == prefix.0 || self.0.starts_with(&format!("{}/", prefix.0))
    }

    /// Move this path from one namespace prefix to another, preserving
    /// the suffix. The inverse rebase restores the original path.
    pub fn rebase(&self, from: &RemotePath, to: &RemotePath) -> Result<Self> {
        if self.0 == from.0 {
            return Ok(to.clone());
        }
        let suffix = self
            .0
            .strip_prefix(&format!("{}/", from.0))
            .ok_or_else(|| StoreError::NotUnderPrefix {
                path: self.0.clone(),
                prefix: from.0.clone(),
            })?;
        Ok(Self(format!("{}/{}", to.0, suffix)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RemotePath {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<RemotePath> for String {
    fn from(value: RemotePath) -> Self {
        value.0
    }
}
