//! LAN Sync Module
//!
//! Keeps clipboard histories identical across instances on the same
//! local network, with no central server.
//!
//! ## Architecture
//!
//! - **Discovery**: every instance broadcasts `SMART_CLIPBOARD_DISCOVER:<port>`
//!   on UDP 9998 every 5 seconds and records the senders it hears
//! - **Sender**: pushes the full history as one JSON datagram to every
//!   known peer on UDP 9999 whenever it changes
//! - **Receiver**: merges every valid history it receives into the local one
//! - **Agent**: owns the sockets and orchestrates the loops
//!
//! ## How It Works
//!
//! 1. A newly discovered peer gets the current history pushed to it once
//! 2. Each local change pushes the whole history to all peers
//! 3. A received history replaces the local one, re-ranked and truncated
//! 4. Envelopes carry the sender's instance id, so a node drops its own echoes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use smart_clipboard::replication::{SyncAgent, SyncConfig};
//!
//! let agent = SyncAgent::bind(SyncConfig::default()).await?;
//! let service = Arc::new(ClipboardService::new(
//!     HistoryStore::new(100)?,
//!     repository,
//!     Some(clipboard),
//!     Some(Arc::new(agent.sender())),
//! ));
//! agent.start(service.clone());
//! ```

mod agent;
pub mod codec;
mod config;
pub mod discovery;
mod peers;
mod receiver;
mod transport;

pub use agent::{SyncAgent, SyncError};
pub use codec::{DecodeError, EncodeError, MessageKind, SyncMessage};
pub use config::{ConfigError, SyncConfig, BROADCAST_INTERVAL, DISCOVERY_MAGIC, DISCOVERY_PORT, SYNC_PORT};
pub use discovery::{DiscoveryBroadcaster, DiscoveryListener, DiscoveryOutcome, InterfaceAddress, LocalEndpoint};
pub use peers::PeerRegistry;
pub use receiver::{ReceiveOutcome, SyncReceiver};
pub use transport::{SendError, SyncSender};
