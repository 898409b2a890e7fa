//! Clipboard Service - Main application use case
//!
//! Owns the ranked history and is the single entry point for every
//! mutation, whether it comes from the clipboard poller, the user or a
//! peer. After a mutation that changed the observable history it
//! persists the new list and publishes it to the network.

use crate::domain::entities::CaptureItem;
use crate::domain::ports::{
    ClipboardError, ClipboardPort, HistoryPublisher, HistoryRepository, StorageError, SyncedHistory,
};
use crate::domain::services::{HistoryError, HistoryStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Clipboard service - main application use case.
///
/// The store lock only guards in-memory work; saving and publishing
/// happen after it is released. Saves are serialized by `persist_lock` and
/// always write the history as it is once the lock is held, so the file
/// never ends up behind memory.
pub struct ClipboardService {
    store: Mutex<HistoryStore>,
    persist_lock: tokio::sync::Mutex<()>,
    repository: Arc<dyn HistoryRepository>,
    clipboard: Option<Arc<dyn ClipboardPort>>,
    publisher: Option<Arc<dyn HistoryPublisher>>,
}

impl ClipboardService {
    /// Create a new clipboard service.
    pub fn new(
        store: HistoryStore,
        repository: Arc<dyn HistoryRepository>,
        clipboard: Option<Arc<dyn ClipboardPort>>,
        publisher: Option<Arc<dyn HistoryPublisher>>,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            persist_lock: tokio::sync::Mutex::new(()),
            repository,
            clipboard,
            publisher,
        }
    }

    /// Replace the in-memory history with what the repository holds.
    ///
    /// Nothing is saved or published. Duplicate content in the saved
    /// file keeps its first occurrence. Returns the number of items kept.
    pub async fn load(&self) -> Result<usize, StorageError> {
        let saved = self.repository.load().await?;

        let mut seen = HashSet::new();
        let items: Vec<CaptureItem> = saved
            .into_iter()
            .filter(|item| !item.content().is_empty() && seen.insert(item.content().to_string()))
            .collect();

        let mut store = self.store.lock();
        store.replace_all(items);
        tracing::info!("loaded {} history items", store.len());
        Ok(store.len())
    }

    /// Current ranked history.
    pub fn history(&self) -> Vec<CaptureItem> {
        self.store.lock().history()
    }

    pub fn max_size(&self) -> usize {
        self.store.lock().max_size()
    }

    /// Record newly copied content. Returns false for empty content.
    pub async fn capture(&self, content: &str) -> bool {
        if content.is_empty() {
            return false;
        }
        let changed = self.mutate(|store| store.capture(content));
        if changed {
            tracing::debug!("captured {} bytes", content.len());
            self.commit().await;
        }
        changed
    }

    /// Count a re-selection of `content`. Returns false if it is not in the history.
    pub async fn record_selection(&self, content: &str) -> bool {
        let mut found = false;
        let changed = self.mutate(|store| found = store.record_selection(content));
        if changed {
            self.commit().await;
        }
        found
    }

    /// Put `content` back on the clipboard and count the selection.
    pub async fn select(&self, content: &str) -> Result<bool, ClipboardError> {
        if let Some(clipboard) = &self.clipboard {
            clipboard.write(content).await?;
        }
        Ok(self.record_selection(content).await)
    }

    /// Remove every item.
    pub async fn clear(&self) {
        if self.mutate(HistoryStore::clear) {
            tracing::info!("history cleared");
            self.commit().await;
        }
    }

    /// Change the capacity, truncating the history right away.
    pub async fn set_max_size(&self, max_size: usize) -> Result<(), HistoryError> {
        let mut result = Ok(());
        let changed = self.mutate(|store| result = store.set_max_size(max_size));
        result?;

        tracing::info!("history capacity set to {}", max_size);
        if changed {
            self.commit().await;
        }
        Ok(())
    }

    /// Replace the whole history with a locally supplied list.
    pub async fn replace_all(&self, items: Vec<CaptureItem>) {
        if self.mutate(|store| store.replace_all(items)) {
            self.commit().await;
        }
    }

    /// Run `f` under the lock and report whether the visible history changed.
    fn mutate<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut HistoryStore),
    {
        let mut store = self.store.lock();
        let before = store.history();
        f(&mut store);
        store.items() != before.as_slice()
    }

    /// Persist and publish the latest history.
    async fn commit(&self) {
        let latest = self.save_latest().await;
        self.publish(latest);
    }

    /// Save the current history and return what was saved.
    async fn save_latest(&self) -> Vec<CaptureItem> {
        let _guard = self.persist_lock.lock().await;
        let latest = self.history();
        if let Err(e) = self.repository.save(&latest).await {
            tracing::error!("failed to save history: {}", e);
        }
        latest
    }

    fn publish(&self, history: Vec<CaptureItem>) {
        if let Some(publisher) = &self.publisher {
            publisher.publish(history);
        }
    }
}

#[async_trait]
impl SyncedHistory for ClipboardService {
    fn snapshot(&self) -> Vec<CaptureItem> {
        self.history()
    }

    /// Adopt a peer's history. It is always persisted, but only
    /// re-published when it changed something here, so peers converge
    /// instead of echoing forever.
    async fn apply_remote(&self, history: Vec<CaptureItem>) {
        let changed = self.mutate(|store| store.replace_all(history));
        let latest = self.save_latest().await;

        if changed {
            tracing::debug!("remote history applied, {} items", latest.len());
            self.publish(latest);
        } else {
            tracing::trace!("remote history identical to local");
        }
    }
}
