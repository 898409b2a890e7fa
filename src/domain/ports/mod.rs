mod clipboard_port;
mod history_publisher;
mod history_repository;
mod synced_history;

pub use clipboard_port::{ClipboardError, ClipboardPort};
pub use history_publisher::HistoryPublisher;
pub use history_repository::{HistoryRepository, StorageError};
pub use synced_history::SyncedHistory;
