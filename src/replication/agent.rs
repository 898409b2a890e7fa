//! Sync Agent
//!
//! Owns the two sync sockets and orchestrates the discovery broadcaster,
//! the discovery listener and the sync receiver behind a single
//! start/stop interface.

use crate::domain::ports::SyncedHistory;
use crate::domain::value_objects::{InstanceId, PeerAddress};
use crate::infrastructure::shutdown::ShutdownController;
use crate::replication::config::{ConfigError, SyncConfig};
use crate::replication::discovery::{DiscoveryBroadcaster, DiscoveryListener, LocalEndpoint};
use crate::replication::peers::PeerRegistry;
use crate::replication::receiver::SyncReceiver;
use crate::replication::transport::SyncSender;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

/// Errors raised while setting up sync.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("invalid sync config: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to bind UDP port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read local socket address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// LAN sync agent.
///
/// Binding happens in [`SyncAgent::bind`] so port conflicts surface before
/// anything is spawned. [`SyncAgent::start`] wires the history in and
/// launches the background loops.
pub struct SyncAgent {
    config: SyncConfig,
    sync_socket: Arc<UdpSocket>,
    discovery_socket: Arc<UdpSocket>,
    sync_addr: SocketAddr,
    discovery_addr: SocketAddr,
    registry: Arc<PeerRegistry>,
    sender: SyncSender,
    shutdown: ShutdownController,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    running: AtomicBool,
}

impl SyncAgent {
    /// Validate the config and bind the sync and discovery sockets.
    pub async fn bind(config: SyncConfig) -> Result<Self, SyncError> {
        config.validate()?;

        let sync_socket = bind_udp(SocketAddr::new(config.bind_ip, config.sync_port)).await?;
        let discovery_socket = bind_udp(SocketAddr::new(config.bind_ip, config.discovery_port)).await?;
        Self::with_sockets(config, sync_socket, discovery_socket)
    }

    /// Build an agent around sockets that are already bound.
    ///
    /// The configured ports are ignored in favour of the sockets' own.
    pub fn with_sockets(
        mut config: SyncConfig,
        sync_socket: UdpSocket,
        discovery_socket: UdpSocket,
    ) -> Result<Self, SyncError> {
        let sync_addr = sync_socket.local_addr().map_err(SyncError::LocalAddr)?;
        let discovery_addr = discovery_socket.local_addr().map_err(SyncError::LocalAddr)?;
        config.sync_port = sync_addr.port();
        config.discovery_port = discovery_addr.port();
        config.validate()?;

        let registry = Arc::new(PeerRegistry::new());
        let sender = SyncSender::new(registry.clone(), config.instance_id);

        tracing::info!(
            "sync agent bound instance_id={} sync={} discovery={}",
            config.instance_id,
            sync_addr,
            discovery_addr
        );

        Ok(Self {
            config,
            sync_socket: Arc::new(sync_socket),
            discovery_socket: Arc::new(discovery_socket),
            sync_addr,
            discovery_addr,
            registry,
            sender,
            shutdown: ShutdownController::new(),
            tasks: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        })
    }

    pub fn instance_id(&self) -> InstanceId {
        self.config.instance_id
    }

    /// Sender to register as the history publisher.
    pub fn sender(&self) -> SyncSender {
        self.sender.clone()
    }

    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    /// Snapshot of the peers discovered so far.
    pub fn peers(&self) -> Vec<PeerAddress> {
        self.registry.snapshot()
    }

    /// Address the sync receiver is bound to.
    pub fn sync_addr(&self) -> SocketAddr {
        self.sync_addr
    }

    /// Address the discovery listener is bound to.
    pub fn discovery_addr(&self) -> SocketAddr {
        self.discovery_addr
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Launch the broadcaster, the discovery listener and the receiver.
    ///
    /// Calling this on an agent that is already running does nothing.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub fn start(&self, history: Arc<dyn SyncedHistory>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("sync agent already running");
            return;
        }
        if self.shutdown.is_shutdown() {
            tracing::warn!("sync agent was stopped and cannot be restarted");
            self.running.store(false, Ordering::SeqCst);
            return;
        }

        let sync_port = self.sync_addr.port();
        let broadcaster = self.broadcaster();
        let listener = DiscoveryListener::new(
            self.discovery_socket.clone(),
            self.registry.clone(),
            self.sender.clone(),
            history.clone(),
            LocalEndpoint::detect(sync_port),
        );
        let receiver = SyncReceiver::new(
            self.sync_socket.clone(),
            history,
            self.config.instance_id,
            self.shutdown.clone(),
        );

        let mut tasks = self.tasks.lock();
        tasks.push(tokio::spawn(broadcaster.run(self.shutdown.subscribe())));
        tasks.push(tokio::spawn(listener.run(self.shutdown.subscribe())));
        tasks.push(tokio::spawn(receiver.run()));

        tracing::info!(
            "sync agent started: receiving on {}, discovery on {}",
            self.sync_addr,
            self.discovery_addr
        );
    }

    /// Announcer for the ports actually bound, which differ from the
    /// configured ones for ephemeral or injected sockets.
    fn broadcaster(&self) -> DiscoveryBroadcaster {
        DiscoveryBroadcaster::new(
            self.sync_addr.port(),
            self.discovery_addr.port(),
            self.config.broadcast_interval,
            self.config.discovery_targets.clone(),
        )
    }

    /// Stop every loop and wait for in-flight merges to finish.
    pub async fn stop(&self) {
        tracing::info!("stopping sync agent");
        self.shutdown.shutdown();

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("sync task ended abnormally: {}", e);
            }
        }

        self.shutdown.wait_for_drain(self.config.drain_timeout).await;
        self.running.store(false, Ordering::SeqCst);
        tracing::info!("sync agent stopped");
    }
}

async fn bind_udp(addr: SocketAddr) -> Result<UdpSocket, SyncError> {
    UdpSocket::bind(addr).await.map_err(|source| SyncError::Bind {
        port: addr.port(),
        source,
    })
}
