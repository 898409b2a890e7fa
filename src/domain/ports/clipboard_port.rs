//! Clipboard Port
//!
//! Defines the interface for reading and writing the OS clipboard.

use async_trait::async_trait;

/// Errors raised by clipboard adapters.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard not available: {0}")]
    Unavailable(String),
    #[error("clipboard access failed: {0}")]
    Failed(String),
}

/// Access to the system clipboard.
///
/// This is an outbound port: the poller reads through it and the
/// clipboard service writes through it when the user selects an item.
#[async_trait]
pub trait ClipboardPort: Send + Sync {
    /// Read the current clipboard text.
    async fn read(&self) -> Result<String, ClipboardError>;

    /// Replace the clipboard text.
    async fn write(&self, text: &str) -> Result<(), ClipboardError>;
}
