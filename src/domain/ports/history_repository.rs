//! History Repository Port
//!
//! Defines the interface for durable storage of the clipboard history.

use crate::domain::entities::CaptureItem;
use async_trait::async_trait;

/// Errors raised by persistence adapters.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Durable storage for the ranked history.
///
/// The clipboard service saves after every mutation and loads once at
/// startup. A failed save never rolls back the in-memory history.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Load the saved history. A store that was never written yields an empty list.
    async fn load(&self) -> Result<Vec<CaptureItem>, StorageError>;

    /// Persist the given history, replacing what was saved before.
    async fn save(&self, history: &[CaptureItem]) -> Result<(), StorageError>;
}
