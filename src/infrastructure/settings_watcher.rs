//! Settings File and Hot Reload
//!
//! The settings file is plain JSON:
//!
//! ```json
//! {"max_items": 50, "check_interval_ms": 500, "storage_path": "/data/history.json"}
//! ```
//!
//! All three keys are read at startup, with environment variables taking
//! precedence. Only `max_items` is applied again when the file changes
//! while running. Unknown keys are ignored so the file can be shared with
//! a UI.

use crate::application::ClipboardService;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::broadcast;

/// Contents of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// History capacity
    #[serde(default, alias = "max_history_size", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Clipboard poll interval; read at startup only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_interval_ms: Option<u64>,
    /// History file location; read at startup only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
}

/// Errors while reading the settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("invalid settings file {0:?}: {1}")]
    Parse(PathBuf, #[source] serde_json::Error),
}

fn parse_settings(path: &Path, read: std::io::Result<Vec<u8>>) -> Result<Option<RuntimeSettings>, SettingsError> {
    let data = match read {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SettingsError::Io(path.to_path_buf(), e)),
    };
    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|e| SettingsError::Parse(path.to_path_buf(), e))
}

/// Read the settings file. A missing file yields `None`.
pub async fn load_settings(path: &Path) -> Result<Option<RuntimeSettings>, SettingsError> {
    parse_settings(path, tokio::fs::read(path).await)
}

/// Blocking variant of [`load_settings`] for startup configuration.
pub fn read_settings(path: &Path) -> Result<Option<RuntimeSettings>, SettingsError> {
    parse_settings(path, std::fs::read(path))
}

/// File fingerprint used to detect edits.
type Stamp = (SystemTime, u64);

/// Polls the settings file and pushes changes into the clipboard service.
pub struct SettingsWatcher {
    path: PathBuf,
    service: Arc<ClipboardService>,
    poll_interval: Duration,
    last_stamp: Option<Stamp>,
}

impl SettingsWatcher {
    pub fn new(path: impl Into<PathBuf>, service: Arc<ClipboardService>, poll_interval: Duration) -> Self {
        Self {
            path: path.into(),
            service,
            poll_interval,
            last_stamp: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn stamp(&self) -> Option<Stamp> {
        let metadata = tokio::fs::metadata(&self.path).await.ok()?;
        let modified = metadata.modified().ok()?;
        Some((modified, metadata.len()))
    }

    /// Apply the file if it changed since the last check.
    ///
    /// Returns true when settings were read and applied.
    pub async fn check_once(&mut self) -> bool {
        let Some(stamp) = self.stamp().await else {
            return false;
        };
        if self.last_stamp == Some(stamp) {
            return false;
        }
        self.last_stamp = Some(stamp);

        match load_settings(&self.path).await {
            Ok(Some(settings)) => self.apply(&settings).await,
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("ignoring settings change: {}", e);
                false
            }
        }
    }

    /// Apply settings to the service. Invalid values are logged and skipped.
    pub async fn apply(&self, settings: &RuntimeSettings) -> bool {
        let Some(max_items) = settings.max_items else {
            return false;
        };
        if max_items == self.service.max_size() {
            return false;
        }
        match self.service.set_max_size(max_items).await {
            Ok(()) => {
                tracing::info!(path = ?self.path, "applied max_items={}", max_items);
                true
            }
            Err(e) => {
                tracing::warn!("ignoring max_items={}: {}", max_items, e);
                false
            }
        }
    }

    /// Check the file every poll interval until shutdown.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.check_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::debug!("settings watcher shutting down");
                    break;
                }
            }
        }
    }
}
