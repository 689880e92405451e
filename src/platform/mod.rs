//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time
//! - Key-value storage (LocalStorage on web, JSON files natively)

pub mod storage;
pub mod time;

pub use storage::{MemoryStorage, Storage, StorageError};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
