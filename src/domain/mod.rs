//! Domain Layer
//!
//! Entities, value objects, the ranked history store and the ports the
//! core talks to. Nothing in here performs I/O.

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::CaptureItem;
pub use value_objects::{InstanceId, PeerAddress};
