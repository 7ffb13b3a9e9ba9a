//! harborsync workspace root
//!
//! This crate serves as the root of the harborsync workspace and
//! contains integration tests that exercise the sync engine and the
//! promotion scheduler together.

// Re-export the member crates for integration testing
pub use harbor_store as store;
pub use harbor_sync as sync;
