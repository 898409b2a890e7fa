//! History Publisher Port
//!
//! Outbound port used by the clipboard service to push a changed
//! history snapshot to the network.

use crate::domain::entities::CaptureItem;

/// Sink for changed history snapshots.
///
/// Implementations must not block the caller: publishing happens on the
/// mutation path, so any network work is dispatched to background tasks.
pub trait HistoryPublisher: Send + Sync {
    fn publish(&self, history: Vec<CaptureItem>);
}
