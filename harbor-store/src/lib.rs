//! Remote store client for harborsync
//!
//! This crate provides the interface boundary to the replicated remote
//! store:
//! - The [`RemoteStore`] capability trait consumed by the sync engine
//! - [`RemotePath`] namespace mapping (staging/production rebasing)
//! - Redundancy and directory health metadata types
//! - An HTTP client implementation ([`HttpStore`])

pub mod client;
pub mod errors;
pub mod http;
pub mod path;
pub mod types;

pub use client::RemoteStore;
pub use errors::{Result, StoreError};
pub use http::HttpStore;
pub use path::RemotePath;
pub use types::{DirectoryHealth, DirectoryInfo, RedundancyConfig, RemoteFile};
