//! Infrastructure Layer
//!
//! Cross-cutting concerns and infrastructure components.

pub mod settings_watcher;
pub mod shutdown;

pub use settings_watcher::{load_settings, read_settings, RuntimeSettings, SettingsError, SettingsWatcher};
pub use shutdown::{shutdown_signal, ShutdownController, TaskGuard};
