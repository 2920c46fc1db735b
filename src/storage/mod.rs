//! The device storage boundary.
//!
//! The scanner never touches the transport directly; everything goes through
//! the [`Storage`] trait so the same walk works against a mounted SD card,
//! a serial-link proxy, or an in-memory fixture in tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::FileEntry;

pub mod local;

pub use local::LocalStorage;

/// Failures at the transport boundary. The scanner treats every variant the
/// same way: log, skip the file, keep walking.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("path not found: {0}")]
    NotFound(String),
    #[error("operation timed out: {0}")]
    Timeout(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Listing, reading and writing on the device hierarchy. Paths are absolute,
/// forward-slash separated device paths (`/ext/infrared/...`).
#[async_trait]
pub trait Storage: Send + Sync {
    /// Immediate entries of a directory, in transport listing order.
    async fn list_directory(&self, path: &str) -> Result<Vec<FileEntry>, StorageError>;

    /// Full content of a file as UTF-8 text.
    async fn read_file(&self, path: &str) -> Result<String, StorageError>;

    /// Replace a file's content. Used only by the metadata confirmation
    /// workflow, never by the scanner itself.
    async fn write_file(&self, path: &str, content: &str) -> Result<(), StorageError>;
}
