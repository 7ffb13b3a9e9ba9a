//! Synchronization engine for harborsync
//!
//! This crate keeps a local directory tree mirrored into a remote,
//! replicated content store:
//! - Local state index of known files and directories
//! - Startup reconciliation against the remote listing
//! - Live event-driven upload/delete pipeline
//! - Background promotion of staging directories to production once
//!   the store reports sufficient redundancy

pub mod config;
pub mod engine;
pub mod errors;
pub mod fingerprint;
pub mod index;
pub mod promote;
pub mod watcher;

pub use config::{PromotionConfig, SyncConfig};
pub use engine::SyncEngine;
pub use errors::{Result, SyncError};
pub use fingerprint::{Fingerprint, FingerprintKind, Fingerprinter};
pub use index::LocalIndex;
pub use promote::Promoter;
pub use watcher::{FolderWatcher, FsEvent, FsEventKind};
