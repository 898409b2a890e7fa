//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

/// Sync endpoint of a remote instance.
///
/// Two addresses are the same peer only if both IP and port match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerAddress {
    pub ip: IpAddr,
    pub port: u16,
}

impl PeerAddress {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl From<SocketAddr> for PeerAddress {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl std::fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

/// Unique identifier of a running instance, carried in sync envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub uuid::Uuid);

impl InstanceId {
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_peer_address_equality_is_ip_and_port() {
        let a = PeerAddress::new("10.0.0.1".parse().unwrap(), 9999);
        let b = PeerAddress::new("10.0.0.1".parse().unwrap(), 9999);
        let c = PeerAddress::new("10.0.0.1".parse().unwrap(), 9000);
        let d = PeerAddress::new("10.0.0.2".parse().unwrap(), 9999);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);

        let set: HashSet<_> = [a, b, c, d].into_iter().collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_peer_address_display() {
        let peer = PeerAddress::new("192.168.1.7".parse().unwrap(), 9999);
        assert_eq!(peer.to_string(), "192.168.1.7:9999");
    }

    #[test]
    fn test_peer_address_from_socket_addr() {
        let addr: SocketAddr = "127.0.0.1:4242".parse().unwrap();
        let peer = PeerAddress::from(addr);
        assert_eq!(peer.port, 4242);
        assert_eq!(peer.socket_addr(), addr);
    }

    #[test]
    fn test_instance_ids_are_unique() {
        assert_ne!(InstanceId::random(), InstanceId::random());
    }
}
