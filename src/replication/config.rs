//! Sync Configuration
//!
//! Fixed protocol constants and the per-instance settings of the sync
//! subsystem.

use crate::domain::value_objects::InstanceId;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// UDP port on which instances receive history pushes.
pub const SYNC_PORT: u16 = 9999;

/// UDP port on which instances listen for discovery broadcasts.
pub const DISCOVERY_PORT: u16 = 9998;

/// Prefix identifying a discovery announcement.
pub const DISCOVERY_MAGIC: &str = "SMART_CLIPBOARD_DISCOVER";

/// Interval between two discovery broadcasts.
pub const BROADCAST_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for the sync agent.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Identifier carried in outgoing envelopes
    pub instance_id: InstanceId,

    /// Address both listeners bind to (default: 0.0.0.0)
    pub bind_ip: IpAddr,

    /// Port for history pushes (default: 9999, 0 picks an ephemeral port)
    pub sync_port: u16,

    /// Port for discovery announcements (default: 9998)
    pub discovery_port: u16,

    /// Discovery broadcast interval (default: 5s)
    pub broadcast_interval: Duration,

    /// Explicit announcement targets; when empty, every IPv4 interface
    /// broadcasts to 255.255.255.255
    pub discovery_targets: Vec<SocketAddr>,

    /// How long `stop` waits for in-flight merges (default: 2s)
    pub drain_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            instance_id: InstanceId::random(),
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            sync_port: SYNC_PORT,
            discovery_port: DISCOVERY_PORT,
            broadcast_interval: BROADCAST_INTERVAL,
            discovery_targets: Vec::new(),
            drain_timeout: Duration::from_secs(2),
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listen address.
    pub fn bind_ip(mut self, ip: IpAddr) -> Self {
        self.bind_ip = ip;
        self
    }

    /// Set the sync port.
    pub fn sync_port(mut self, port: u16) -> Self {
        self.sync_port = port;
        self
    }

    /// Set the discovery port.
    pub fn discovery_port(mut self, port: u16) -> Self {
        self.discovery_port = port;
        self
    }

    /// Set the broadcast interval.
    pub fn broadcast_interval(mut self, interval: Duration) -> Self {
        self.broadcast_interval = interval;
        self
    }

    /// Announce to these addresses instead of broadcasting.
    pub fn discovery_targets(mut self, targets: Vec<SocketAddr>) -> Self {
        self.discovery_targets = targets;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broadcast_interval.is_zero() {
            return Err(ConfigError::ZeroBroadcastInterval);
        }
        if self.discovery_targets.is_empty() && self.discovery_port == 0 {
            return Err(ConfigError::EphemeralDiscoveryPort);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("broadcast_interval must be positive")]
    ZeroBroadcastInterval,
    #[error("an ephemeral discovery port cannot be reached by broadcast; set discovery_targets")]
    EphemeralDiscoveryPort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.sync_port, 9999);
        assert_eq!(config.discovery_port, 9998);
        assert_eq!(config.broadcast_interval, Duration::from_secs(5));
        assert!(config.discovery_targets.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = SyncConfig::new()
            .bind_ip("127.0.0.1".parse().unwrap())
            .sync_port(0)
            .discovery_port(0)
            .broadcast_interval(Duration::from_millis(50))
            .discovery_targets(vec!["127.0.0.1:7000".parse().unwrap()]);

        assert_eq!(config.bind_ip.to_string(), "127.0.0.1");
        assert_eq!(config.sync_port, 0);
        assert_eq!(config.discovery_targets.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_interval() {
        let config = SyncConfig::new().broadcast_interval(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroBroadcastInterval));
    }

    #[test]
    fn test_validate_ephemeral_discovery_without_targets() {
        let config = SyncConfig::new().discovery_port(0);
        assert_eq!(config.validate(), Err(ConfigError::EphemeralDiscoveryPort));
    }

    #[test]
    fn test_each_config_gets_its_own_instance_id() {
        assert_ne!(SyncConfig::new().instance_id, SyncConfig::new().instance_id);
    }
}
