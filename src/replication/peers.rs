//! Peer Registry
//!
//! The set of known remote sync endpoints. Peers are only ever added;
//! there is no liveness tracking or expiry.

use crate::domain::value_objects::PeerAddress;
use dashmap::DashSet;

/// Deduplicated set of peer sync endpoints.
///
/// Backed by a `DashSet` so the discovery listener can insert while
/// senders take snapshots without a global lock.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: DashSet<PeerAddress>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer. Returns true if it was not known before.
    pub fn add_if_new(&self, peer: PeerAddress) -> bool {
        let added = self.peers.insert(peer);
        if added {
            tracing::info!("registered peer {}, total peers: {}", peer, self.peers.len());
        }
        added
    }

    /// Copy of the current peers, safe to iterate while sending.
    pub fn snapshot(&self) -> Vec<PeerAddress> {
        self.peers.iter().map(|entry| *entry.key()).collect()
    }

    pub fn contains(&self, peer: &PeerAddress) -> bool {
        self.peers.contains(peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
