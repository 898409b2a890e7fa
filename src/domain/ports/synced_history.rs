//! Synced History Port
//!
//! Inbound port through which the sync tasks read the local history
//! and merge snapshots received from peers.

use crate::domain::entities::CaptureItem;
use async_trait::async_trait;

#[async_trait]
pub trait SyncedHistory: Send + Sync {
    /// Current ranked history (a copy).
    fn snapshot(&self) -> Vec<CaptureItem>;

    /// Replace the local history with a snapshot received from a peer.
    async fn apply_remote(&self, history: Vec<CaptureItem>);
}
