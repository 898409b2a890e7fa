mod json_history_repo;
mod memory_history_repo;
mod system_clipboard;

pub use json_history_repo::JsonFileHistoryRepository;
pub use memory_history_repo::InMemoryHistoryRepository;
pub use system_clipboard::SystemClipboard;
