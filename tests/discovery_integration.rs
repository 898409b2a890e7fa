//! Integration tests for LAN Discovery
//!
//! Runs two sync agents on loopback with ephemeral ports. Each agent
//! announces to the other's discovery socket instead of broadcasting.

use async_trait::async_trait;
use parking_lot::Mutex;
use smart_clipboard::domain::entities::CaptureItem;
use smart_clipboard::domain::ports::SyncedHistory;
use smart_clipboard::domain::value_objects::PeerAddress;
use smart_clipboard::replication::{discovery, SyncAgent, SyncConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;

/// History that never changes and records what it receives.
struct RecordingHistory {
    own: Vec<CaptureItem>,
    received: Mutex<Vec<Vec<CaptureItem>>>,
}

impl RecordingHistory {
    fn new(own: Vec<CaptureItem>) -> Arc<Self> {
        Arc::new(Self {
            own,
            received: Mutex::new(Vec::new()),
        })
    }

    fn received(&self) -> Vec<Vec<CaptureItem>> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl SyncedHistory for RecordingHistory {
    fn snapshot(&self) -> Vec<CaptureItem> {
        self.own.clone()
    }

    async fn apply_remote(&self, history: Vec<CaptureItem>) {
        self.received.lock().push(history);
    }
}

async fn loopback_sockets() -> (UdpSocket, UdpSocket) {
    let sync = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let discovery = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    (sync, discovery)
}

fn config(target: SocketAddr) -> SyncConfig {
    SyncConfig::new()
        .bind_ip("127.0.0.1".parse().unwrap())
        .sync_port(0)
        .discovery_port(0)
        .broadcast_interval(Duration::from_millis(50))
        .discovery_targets(vec![target])
}

/// Build two agents that announce to each other.
async fn agent_pair() -> (SyncAgent, SyncAgent) {
    let (sync_a, disc_a) = loopback_sockets().await;
    let (sync_b, disc_b) = loopback_sockets().await;
    let target_a = disc_a.local_addr().unwrap();
    let target_b = disc_b.local_addr().unwrap();

    let a = SyncAgent::with_sockets(config(target_b), sync_a, disc_a).unwrap();
    let b = SyncAgent::with_sockets(config(target_a), sync_b, disc_b).unwrap();
    (a, b)
}

async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

/// Two fresh instances each end up with exactly the other as peer, and
/// each bootstraps the other exactly once.
#[tokio::test]
async fn test_two_instances_discover_each_other() {
    let (a, b) = agent_pair().await;
    let history_a = RecordingHistory::new(vec![CaptureItem::now("from a")]);
    let history_b = RecordingHistory::new(Vec::new());

    a.start(history_a.clone());
    b.start(history_b.clone());

    assert!(wait_until(|| a.peers().len() == 1 && b.peers().len() == 1).await);
    assert!(wait_until(|| !history_a.received().is_empty() && !history_b.received().is_empty()).await);

    // Let several more announcement rounds pass.
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(a.peers(), vec![PeerAddress::from(b.sync_addr())]);
    assert_eq!(b.peers(), vec![PeerAddress::from(a.sync_addr())]);

    let got_by_b = history_b.received();
    assert_eq!(got_by_b.len(), 1);
    assert_eq!(got_by_b[0][0].content(), "from a");

    let got_by_a = history_a.received();
    assert_eq!(got_by_a.len(), 1);
    assert!(got_by_a[0].is_empty());

    a.stop().await;
    b.stop().await;
}

/// Repeated announcements from one sender do not grow the registry.
#[tokio::test]
async fn test_repeated_announcements_register_once() {
    let (sync, disc) = loopback_sockets().await;
    let target = disc.local_addr().unwrap();
    let agent = SyncAgent::with_sockets(config("127.0.0.1:9".parse().unwrap()), sync, disc).unwrap();
    agent.start(RecordingHistory::new(Vec::new()));

    let peer_sync = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let announcement = discovery::announcement(peer_sync.local_addr().unwrap().port());
    let announcer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    for _ in 0..5 {
        announcer.send_to(announcement.as_bytes(), target).await.unwrap();
    }

    assert!(wait_until(|| agent.peers().len() == 1).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(agent.peers().len(), 1);

    // The new peer received exactly one bootstrap push.
    let mut buf = vec![0u8; 65535];
    let first = tokio::time::timeout(Duration::from_secs(2), peer_sync.recv_from(&mut buf)).await;
    assert!(first.is_ok());
    let second = tokio::time::timeout(Duration::from_millis(200), peer_sync.recv_from(&mut buf)).await;
    assert!(second.is_err());

    agent.stop().await;
}

/// Garbage on the discovery port is ignored.
#[tokio::test]
async fn test_foreign_datagrams_are_ignored() {
    let (sync, disc) = loopback_sockets().await;
    let target = disc.local_addr().unwrap();
    let agent = SyncAgent::with_sockets(config("127.0.0.1:9".parse().unwrap()), sync, disc).unwrap();
    agent.start(RecordingHistory::new(Vec::new()));

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let payloads: [&[u8]; 4] = [
        b"hello",
        b"SMART_CLIPBOARD_DISCOVER:",
        b"SMART_CLIPBOARD_DISCOVER:0",
        &[0xff, 0xfe],
    ];
    for payload in payloads {
        sender.send_to(payload, target).await.unwrap();
    }

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(agent.peers().is_empty());

    agent.stop().await;
}
