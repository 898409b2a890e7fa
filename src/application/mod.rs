//! Application Layer
//!
//! Use cases that coordinate the domain with its ports.

mod clipboard_service;

pub use clipboard_service::ClipboardService;
