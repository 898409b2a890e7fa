//! Smart Clipboard Library
//!
//! Ranked, size-bounded clipboard history with peer-to-peer LAN sync.
//! The components are exposed for the binary, integration tests and use
//! as a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod replication;

// Re-export commonly used types
pub use application::ClipboardService;
pub use config::load_config;
pub use domain::entities::CaptureItem;
pub use domain::ports::{ClipboardPort, HistoryPublisher, HistoryRepository, SyncedHistory};
pub use domain::services::{HistoryError, HistoryStore};
pub use domain::value_objects::{InstanceId, PeerAddress};
pub use replication::{SyncAgent, SyncConfig};
