//! JSON File History Repository
//!
//! Implements HistoryRepository as a pretty-printed JSON array on disk.

use crate::domain::entities::CaptureItem;
use crate::domain::ports::{HistoryRepository, StorageError};
use async_trait::async_trait;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File-backed history repository.
///
/// Each save writes its own uniquely named temp file in the target
/// directory and renames it over the target, so a crash mid-save leaves the
/// previous history intact and overlapping saves never share a temp file.
pub struct JsonFileHistoryRepository {
    path: PathBuf,
}

impl JsonFileHistoryRepository {
    /// Create a repository storing its history at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write `data` to `path` through a fresh temp file in the same directory.
fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl HistoryRepository for JsonFileHistoryRepository {
    async fn load(&self) -> Result<Vec<CaptureItem>, StorageError> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("no saved history at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let items: Vec<CaptureItem> = serde_json::from_slice(&data)?;
        tracing::debug!("read {} items from {}", items.len(), self.path.display());
        Ok(items)
    }

    async fn save(&self, history: &[CaptureItem]) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(history)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &data))
            .await
            .map_err(std::io::Error::other)??;

        tracing::debug!("saved {} items to {}", history.len(), self.path.display());
        Ok(())
    }
}
