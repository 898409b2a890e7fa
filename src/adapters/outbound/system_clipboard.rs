//! System Clipboard Adapter
//!
//! Implements ClipboardPort on top of `arboard`. Every arboard call blocks,
//! so each one runs on the blocking pool.

use crate::domain::ports::{ClipboardError, ClipboardPort};
use async_trait::async_trait;

/// The desktop clipboard of the current session.
///
/// A fresh `arboard::Clipboard` is opened per call; holding one open would
/// tie the adapter to the thread that created it on some platforms.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ClipboardPort for SystemClipboard {
    async fn read(&self) -> Result<String, ClipboardError> {
        let result = blocking(|| arboard::Clipboard::new()?.get_text()).await?;
        read_result(result)
    }

    async fn write(&self, text: &str) -> Result<(), ClipboardError> {
        let text = text.to_string();
        let result = blocking(move || arboard::Clipboard::new()?.set_text(text)).await?;
        result.map_err(map_error)
    }
}

async fn blocking<T, F>(f: F) -> Result<Result<T, arboard::Error>, ClipboardError>
where
    F: FnOnce() -> Result<T, arboard::Error> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ClipboardError::Failed(format!("clipboard task failed: {}", e)))
}

/// Turn a raw read into the text the history sees.
///
/// Surrounding whitespace is trimmed. An empty clipboard, or one holding
/// only non-text content, reads as empty text.
fn read_result(result: Result<String, arboard::Error>) -> Result<String, ClipboardError> {
    match result {
        Ok(text) => Ok(text.trim().to_string()),
        Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
        Err(e) => Err(map_error(e)),
    }
}

fn map_error(e: arboard::Error) -> ClipboardError {
    match e {
        arboard::Error::ClipboardNotSupported => ClipboardError::Unavailable(e.to_string()),
        other => ClipboardError::Failed(other.to_string()),
    }
}
