//! Sync Sender
//!
//! Unicasts encoded history snapshots to peers. Every send uses its own
//! transient UDP socket: nothing is kept open between pushes and no
//! two sends contend for one socket.

use crate::domain::entities::CaptureItem;
use crate::domain::ports::HistoryPublisher;
use crate::domain::value_objects::{InstanceId, PeerAddress};
use crate::replication::codec::{self, EncodeError};
use crate::replication::peers::PeerRegistry;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::UdpSocket;

/// Errors from a single push.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("failed to open socket: {0}")]
    Bind(#[source] std::io::Error),
    #[error("failed to send to {peer}: {source}")]
    Send {
        peer: PeerAddress,
        #[source]
        source: std::io::Error,
    },
}

/// Pushes history snapshots to known peers.
#[derive(Clone)]
pub struct SyncSender {
    registry: Arc<PeerRegistry>,
    origin: InstanceId,
}

impl SyncSender {
    pub fn new(registry: Arc<PeerRegistry>, origin: InstanceId) -> Self {
        Self { registry, origin }
    }

    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    /// Push `history` to every known peer.
    ///
    /// The payload is encoded once. A failing peer is logged and skipped.
    /// Returns how many peers were sent to successfully.
    pub async fn push_to_all(&self, history: &[CaptureItem]) -> usize {
        let peers = self.registry.snapshot();
        if peers.is_empty() {
            tracing::debug!("no peers discovered, skipping history push");
            return 0;
        }

        let payload = match codec::encode_history(history, Some(self.origin)) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("failed to encode history of {} items: {}", history.len(), e);
                return 0;
            }
        };

        let mut sent = 0;
        for peer in &peers {
            match send_payload(*peer, &payload).await {
                Ok(()) => {
                    sent += 1;
                    tracing::debug!("sent {} history items to {}", history.len(), peer);
                }
                Err(e) => tracing::warn!("history push to {} failed: {}", peer, e),
            }
        }

        tracing::debug!("pushed history to {}/{} peers", sent, peers.len());
        sent
    }

    /// Push `history` to a single peer.
    pub async fn push_to_one(&self, peer: PeerAddress, history: &[CaptureItem]) -> Result<(), SendError> {
        let payload = codec::encode_history(history, Some(self.origin))?;
        send_payload(peer, &payload).await?;
        tracing::debug!("sent {} history items to {}", history.len(), peer);
        Ok(())
    }

    /// Push to one peer from a background task, logging failures.
    pub fn spawn_push_to_one(&self, peer: PeerAddress, history: Vec<CaptureItem>) {
        let sender = self.clone();
        tokio::spawn(async move {
            if let Err(e) = sender.push_to_one(peer, &history).await {
                tracing::warn!("bootstrap push to {} failed: {}", peer, e);
            }
        });
    }
}

impl HistoryPublisher for SyncSender {
    fn publish(&self, history: Vec<CaptureItem>) {
        let sender = self.clone();
        tokio::spawn(async move {
            sender.push_to_all(&history).await;
        });
    }
}

/// Unspecified local address of the same family as `peer`.
fn local_bind_addr(peer: &PeerAddress) -> SocketAddr {
    let ip = match peer.ip {
        IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    };
    SocketAddr::new(ip, 0)
}

/// Send one datagram to `peer` through a fresh socket.
async fn send_payload(peer: PeerAddress, payload: &[u8]) -> Result<(), SendError> {
    let socket = UdpSocket::bind(local_bind_addr(&peer))
        .await
        .map_err(SendError::Bind)?;
    socket
        .send_to(payload, peer.socket_addr())
        .await
        .map_err(|source| SendError::Send { peer, source })?;
    Ok(())
}
