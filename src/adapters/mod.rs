//! Adapters
//!
//! Inbound adapters drive the application (the clipboard poller);
//! outbound adapters implement the domain ports (storage, clipboard).

pub mod inbound;
pub mod outbound;
