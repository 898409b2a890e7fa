//! In-Memory History Repository
//!
//! Implements HistoryRepository without touching the disk. Used when
//! persistence is disabled and in tests.

use crate::domain::entities::CaptureItem;
use crate::domain::ports::{HistoryRepository, StorageError};
use async_trait::async_trait;
use parking_lot::RwLock;

/// Repository that keeps the last saved history in memory.
#[derive(Default)]
pub struct InMemoryHistoryRepository {
    items: RwLock<Vec<CaptureItem>>,
}

impl InMemoryHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with a saved history.
    pub fn with_items(items: Vec<CaptureItem>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }

    /// The last saved history.
    pub fn saved(&self) -> Vec<CaptureItem> {
        self.items.read().clone()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn load(&self) -> Result<Vec<CaptureItem>, StorageError> {
        Ok(self.saved())
    }

    async fn save(&self, history: &[CaptureItem]) -> Result<(), StorageError> {
        *self.items.write() = history.to_vec();
        Ok(())
    }
}
