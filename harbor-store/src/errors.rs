//! Error types for remote store operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid remote path: {0}")]
    InvalidPath(String),

    #[error("path {path} is not under prefix {prefix}")]
    NotUnderPrefix { path: String, prefix: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
