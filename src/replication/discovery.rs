//! LAN Discovery
//!
//! Instances find each other by broadcasting a short ASCII announcement
//! on the discovery port:
//!
//! ```text
//! SMART_CLIPBOARD_DISCOVER:<sync port>
//! ```
//!
//! Receivers combine the sender's source IP with the announced port to
//! get the peer's sync endpoint. Announcement parsing and registry
//! updates are plain functions, separate from socket I/O, so they can
//! be tested without a network.

use crate::domain::ports::SyncedHistory;
use crate::domain::value_objects::PeerAddress;
use crate::replication::config::DISCOVERY_MAGIC;
use crate::replication::peers::PeerRegistry;
use crate::replication::transport::SyncSender;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;

/// Build the announcement payload for a sync port.
pub fn announcement(sync_port: u16) -> String {
    format!("{}:{}", DISCOVERY_MAGIC, sync_port)
}

/// Extract the announced sync port, or `None` if the payload is not a
/// valid announcement.
pub fn parse_announcement(payload: &[u8]) -> Option<u16> {
    let text = std::str::from_utf8(payload).ok()?;
    let port = text.strip_prefix(DISCOVERY_MAGIC)?.strip_prefix(':')?;
    match port.trim().parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

/// What a received datagram meant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// A peer not seen before; it should receive a bootstrap push
    NewPeer(PeerAddress),
    /// Re-announcement of a known peer
    KnownPeer(PeerAddress),
    /// Our own broadcast looping back
    OwnAnnouncement,
    /// Not a discovery announcement
    Ignored,
}

/// This instance's own sync endpoint(s), used to recognise its own
/// broadcasts when they come back.
#[derive(Debug, Clone)]
pub struct LocalEndpoint {
    sync_port: u16,
    addresses: HashSet<IpAddr>,
}

impl LocalEndpoint {
    pub fn new(sync_port: u16, addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            sync_port,
            addresses: addresses.into_iter().collect(),
        }
    }

    /// Endpoint for `sync_port` on every address of this host.
    pub fn detect(sync_port: u16) -> Self {
        let mut addresses: HashSet<IpAddr> = [
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(std::net::Ipv6Addr::LOCALHOST),
        ]
        .into_iter()
        .collect();

        match local_ip_address::list_afinet_netifas() {
            Ok(netifs) => addresses.extend(netifs.into_iter().map(|(_, ip)| ip)),
            Err(e) => tracing::warn!("failed to list local addresses: {}", e),
        }

        Self {
            sync_port,
            addresses,
        }
    }

    pub fn sync_port(&self) -> u16 {
        self.sync_port
    }

    pub fn is_self(&self, peer: &PeerAddress) -> bool {
        peer.port == self.sync_port && self.addresses.contains(&peer.ip)
    }
}

/// Interpret one discovery datagram and update the registry.
pub fn process_announcement(
    payload: &[u8],
    src: SocketAddr,
    registry: &PeerRegistry,
    local: &LocalEndpoint,
) -> DiscoveryOutcome {
    let Some(port) = parse_announcement(payload) else {
        return DiscoveryOutcome::Ignored;
    };

    let peer = PeerAddress::new(src.ip(), port);
    if local.is_self(&peer) {
        return DiscoveryOutcome::OwnAnnouncement;
    }

    if registry.add_if_new(peer) {
        DiscoveryOutcome::NewPeer(peer)
    } else {
        DiscoveryOutcome::KnownPeer(peer)
    }
}

/// One IPv4 address assigned to a network interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddress {
    pub name: String,
    pub ip: Ipv4Addr,
    pub up: bool,
    pub loopback: bool,
}

/// Addresses worth broadcasting from: interfaces that are up and not loopback.
pub fn select_broadcast_sources(addresses: Vec<InterfaceAddress>) -> Vec<(String, Ipv4Addr)> {
    addresses
        .into_iter()
        .filter(|addr| addr.up && !addr.loopback && !addr.ip.is_loopback())
        .map(|addr| (addr.name, addr.ip))
        .collect()
}

/// Up, non-loopback IPv4 interface addresses as `(interface name, address)`.
pub fn broadcast_sources() -> Vec<(String, Ipv4Addr)> {
    select_broadcast_sources(interface_addresses())
}

#[cfg(unix)]
fn interface_addresses() -> Vec<InterfaceAddress> {
    use nix::net::if_::InterfaceFlags;

    let ifaddrs = match nix::ifaddrs::getifaddrs() {
        Ok(ifaddrs) => ifaddrs,
        Err(e) => {
            tracing::warn!("failed to list network interfaces: {}", e);
            return Vec::new();
        }
    };

    ifaddrs
        .filter_map(|ifa| {
            let ip = ifa.address.as_ref()?.as_sockaddr_in()?.ip();
            Some(InterfaceAddress {
                name: ifa.interface_name,
                ip,
                up: ifa.flags.contains(InterfaceFlags::IFF_UP),
                loopback: ifa.flags.contains(InterfaceFlags::IFF_LOOPBACK),
            })
        })
        .collect()
}

// No interface flags here; every listed address counts as up.
#[cfg(not(unix))]
fn interface_addresses() -> Vec<InterfaceAddress> {
    let netifs = match local_ip_address::list_afinet_netifas() {
        Ok(netifs) => netifs,
        Err(e) => {
            tracing::warn!("failed to list network interfaces: {}", e);
            return Vec::new();
        }
    };

    netifs
        .into_iter()
        .filter_map(|(name, ip)| match ip {
            IpAddr::V4(v4) => Some(InterfaceAddress {
                name,
                ip: v4,
                up: true,
                loopback: v4.is_loopback(),
            }),
            _ => None,
        })
        .collect()
}

/// Periodically announces this instance on the local network.
pub struct DiscoveryBroadcaster {
    sync_port: u16,
    discovery_port: u16,
    interval: Duration,
    targets: Vec<SocketAddr>,
}

impl DiscoveryBroadcaster {
    pub fn new(sync_port: u16, discovery_port: u16, interval: Duration, targets: Vec<SocketAddr>) -> Self {
        Self {
            sync_port,
            discovery_port,
            interval,
            targets,
        }
    }

    /// Port the interface broadcasts are addressed to.
    pub fn discovery_port(&self) -> u16 {
        self.discovery_port
    }

    /// Send one round of announcements. Returns the number of datagrams sent.
    ///
    /// A failing interface or target is logged and does not stop the round.
    pub async fn announce_once(&self) -> usize {
        let message = announcement(self.sync_port);

        if !self.targets.is_empty() {
            let mut sent = 0;
            for target in &self.targets {
                let source = match target {
                    SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
                    SocketAddr::V6(_) => SocketAddr::from((std::net::Ipv6Addr::UNSPECIFIED, 0)),
                };
                match send_announcement(source, *target, message.as_bytes()).await {
                    Ok(()) => {
                        sent += 1;
                        tracing::debug!("sent discovery announcement to {}", target);
                    }
                    Err(e) => tracing::warn!("discovery announcement to {} failed: {}", target, e),
                }
            }
            return sent;
        }

        let broadcast = SocketAddr::from((Ipv4Addr::BROADCAST, self.discovery_port));
        let mut sent = 0;
        for (iface, ip) in broadcast_sources() {
            let source = SocketAddr::from((ip, 0));
            match send_announcement(source, broadcast, message.as_bytes()).await {
                Ok(()) => {
                    sent += 1;
                    tracing::debug!("sent discovery broadcast on {} ({})", iface, ip);
                }
                Err(e) => tracing::warn!("discovery broadcast on {} ({}) failed: {}", iface, ip, e),
            }
        }
        sent
    }

    /// Announce every interval until shutdown.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; announce one interval after start.
        timer.tick().await;

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    self.announce_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("discovery broadcaster shutting down");
                    break;
                }
            }
        }
    }
}

async fn send_announcement(source: SocketAddr, target: SocketAddr, payload: &[u8]) -> std::io::Result<()> {
    let socket = UdpSocket::bind(source).await?;
    socket.set_broadcast(true)?;
    socket.send_to(payload, target).await?;
    Ok(())
}

/// Receives announcements and bootstraps newly found peers.
pub struct DiscoveryListener {
    socket: Arc<UdpSocket>,
    registry: Arc<PeerRegistry>,
    sender: SyncSender,
    history: Arc<dyn SyncedHistory>,
    local: LocalEndpoint,
}

impl DiscoveryListener {
    pub fn new(
        socket: Arc<UdpSocket>,
        registry: Arc<PeerRegistry>,
        sender: SyncSender,
        history: Arc<dyn SyncedHistory>,
        local: LocalEndpoint,
    ) -> Self {
        Self {
            socket,
            registry,
            sender,
            history,
            local,
        }
    }

    /// Handle one datagram; a newly found peer gets the current history
    /// pushed to it right away.
    pub fn handle_datagram(&self, payload: &[u8], src: SocketAddr) -> DiscoveryOutcome {
        let outcome = process_announcement(payload, src, &self.registry, &self.local);
        match &outcome {
            DiscoveryOutcome::NewPeer(peer) => {
                tracing::info!("discovered peer at {}", peer);
                self.sender.spawn_push_to_one(*peer, self.history.snapshot());
            }
            DiscoveryOutcome::KnownPeer(peer) => {
                tracing::trace!("peer {} already known", peer);
            }
            DiscoveryOutcome::OwnAnnouncement => {}
            DiscoveryOutcome::Ignored => {
                tracing::debug!("ignoring non-discovery datagram from {}", src);
            }
        }
        outcome
    }

    /// Receive announcements until shutdown.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut buf = vec![0u8; 1024];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, src)) => {
                            self.handle_datagram(&buf[..len], src);
                        }
                        Err(e) => {
                            tracing::warn!("discovery recv error: {}", e);
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("discovery listener shutting down");
                    break;
                }
            }
        }
    }
}
