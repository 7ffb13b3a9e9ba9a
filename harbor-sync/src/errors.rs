//! Error types for the sync engine

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("remote store error: {0}")]
    Store(#[from] harbor_store::StoreError),

    #[error("watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("path {0} is outside the synchronized root")]
    OutsideRoot(PathBuf),
}

pub type Result<T> = std::result::Result<T, SyncError>;
