//! Sync Receiver
//!
//! Listens on the sync port and merges every valid history snapshot into
//! the local history. Each datagram is handled in its own task; when two
//! snapshots race, whichever merge finishes last wins.

use crate::domain::ports::SyncedHistory;
use crate::domain::value_objects::InstanceId;
use crate::infrastructure::shutdown::ShutdownController;
use crate::replication::codec::{self, DecodeError};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// Largest datagram accepted on the sync port.
const RECV_BUFFER_SIZE: usize = 65_535;

/// What happened to one inbound datagram.
#[derive(Debug)]
pub enum ReceiveOutcome {
    /// The snapshot was merged; carries its item count
    Applied(usize),
    /// The snapshot came from this instance and was dropped
    OwnEcho,
    /// The datagram did not decode and was dropped
    Dropped(DecodeError),
}

/// Decode one datagram and merge it into `history`.
///
/// Nothing is applied unless the whole payload decodes.
pub async fn handle_datagram(
    history: &dyn SyncedHistory,
    instance_id: InstanceId,
    payload: &[u8],
    src: SocketAddr,
) -> ReceiveOutcome {
    let message = match codec::decode(payload) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("dropping undecodable sync datagram from {}: {}", src, e);
            return ReceiveOutcome::Dropped(e);
        }
    };

    if message.origin == Some(instance_id) {
        tracing::debug!("dropping own history echoed back by {}", src);
        return ReceiveOutcome::OwnEcho;
    }

    let count = message.history.len();
    tracing::info!("received {} history items from {}", count, src);
    history.apply_remote(message.history).await;
    ReceiveOutcome::Applied(count)
}

/// Receives history pushes from peers.
pub struct SyncReceiver {
    socket: Arc<UdpSocket>,
    history: Arc<dyn SyncedHistory>,
    instance_id: InstanceId,
    shutdown: ShutdownController,
}

impl SyncReceiver {
    pub fn new(
        socket: Arc<UdpSocket>,
        history: Arc<dyn SyncedHistory>,
        instance_id: InstanceId,
        shutdown: ShutdownController,
    ) -> Self {
        Self {
            socket,
            history,
            instance_id,
            shutdown,
        }
    }

    /// Receive until shutdown, spawning one merge task per datagram.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(self) {
        let mut shutdown_rx = self.shutdown.subscribe();
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, src)) => {
                            let payload = buf[..len].to_vec();
                            let history = self.history.clone();
                            let instance_id = self.instance_id;
                            let guard = self.shutdown.task_guard();
                            tokio::spawn(async move {
                                let _guard = guard;
                                handle_datagram(history.as_ref(), instance_id, &payload, src).await;
                            });
                        }
                        Err(e) => {
                            tracing::warn!("sync recv error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("sync receiver shutting down");
                    break;
                }
            }
        }
    }
}
