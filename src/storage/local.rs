use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use super::{Storage, StorageError};
use crate::types::FileEntry;

/// Storage over a host directory, e.g. the mountpoint of the removable medium.
/// Device paths (`/ext/infrared/...`) are joined onto `root` after stripping
/// the leading slash; `..` segments are rejected outright.
pub struct LocalStorage {
    root: PathBuf,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, read_timeout_ms: u64, write_timeout_ms: u64) -> Self {
        Self {
            root: root.into(),
            read_timeout: Duration::from_millis(read_timeout_ms.max(1)),
            write_timeout: Duration::from_millis(write_timeout_ms.max(1)),
        }
    }

    fn resolve(&self, device_path: &str) -> Result<PathBuf, StorageError> {
        let rel = device_path.trim_start_matches('/');
        let rel_path = Path::new(rel);
        if rel_path.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
            return Err(StorageError::Unavailable(format!(
                "refusing path with parent components: {}",
                device_path
            )));
        }
        Ok(self.root.join(rel_path))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn list_directory(&self, path: &str) -> Result<Vec<FileEntry>, StorageError> {
        let host = self.resolve(path)?;
        let mut rd = tokio::fs::read_dir(&host).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(path.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        let base = path.trim_end_matches('/');
        let mut entries = Vec::new();
        while let Some(ent) = rd.next_entry().await? {
            let name = ent.file_name().to_string_lossy().to_string();
            let md = match ent.metadata().await {
                Ok(md) => md,
                Err(e) => {
                    tracing::warn!("failed to stat {}/{}: {}", base, name, e);
                    continue;
                }
            };
            entries.push(FileEntry {
                path: format!("{}/{}", base, name),
                is_directory: md.is_dir(),
                size: if md.is_file() { Some(md.len()) } else { None },
                name,
            });
        }
        // Stable listing order; read_dir order is platform dependent.
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn read_file(&self, path: &str) -> Result<String, StorageError> {
        let host = self.resolve(path)?;
        let fut = tokio::fs::read_to_string(&host);
        match timeout(self.read_timeout, fut).await {
            Ok(Ok(content)) => Ok(content),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Ok(Err(e)) => Err(StorageError::Io(e)),
            Err(_) => Err(StorageError::Timeout(path.to_string())),
        }
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let host = self.resolve(path)?;
        let fut = tokio::fs::write(&host, content);
        match timeout(self.write_timeout, fut).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Ok(Err(e)) => Err(StorageError::Io(e)),
            Err(_) => Err(StorageError::Timeout(path.to_string())),
        }
    }
}
