use crate::infrastructure::settings_watcher::{read_settings, RuntimeSettings};
use crate::replication::{SyncConfig, DISCOVERY_PORT, SYNC_PORT};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR: &str = "smart-clipboard";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // History settings
    pub max_items: usize,
    pub check_interval_ms: u64,
    pub storage_path: PathBuf,
    pub debug: bool,

    // Runtime settings file
    pub settings_path: PathBuf,
    pub settings_poll_ms: u64,

    // LAN sync settings
    pub sync_enabled: bool,
    pub sync_port: u16,
    pub discovery_port: u16,
    pub discovery_targets: Vec<SocketAddr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_items: 100,
            check_interval_ms: 1000,
            storage_path: default_storage_path(),
            debug: false,
            settings_path: default_settings_path(),
            settings_poll_ms: 2000,
            sync_enabled: true,
            sync_port: SYNC_PORT,
            discovery_port: DISCOVERY_PORT,
            discovery_targets: Vec::new(),
        }
    }
}

impl Config {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn settings_poll_interval(&self) -> Duration {
        Duration::from_millis(self.settings_poll_ms)
    }

    /// Sync agent settings derived from this config.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::new()
            .sync_port(self.sync_port)
            .discovery_port(self.discovery_port)
            .discovery_targets(self.discovery_targets.clone())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_items == 0 {
            return Err(ConfigError::ZeroMaxItems);
        }
        if self.check_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("check_interval_ms"));
        }
        if self.settings_poll_ms == 0 {
            return Err(ConfigError::ZeroInterval("settings_poll_ms"));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_items must be positive")]
    ZeroMaxItems,
    #[error("{0} must be positive")]
    ZeroInterval(&'static str),
    #[error("invalid discovery target {0:?}, expected ip:port")]
    InvalidTarget(String),
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("history.json")
}

fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("settings.json")
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn parse_targets(value: &str) -> Result<Vec<SocketAddr>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(|_| ConfigError::InvalidTarget(s.to_string())))
        .collect()
}

/// Load the config from the environment and the settings file it names.
///
/// A missing settings file is fine; a malformed one is an error.
pub fn load_config() -> anyhow::Result<Config> {
    let var = |key: &str| std::env::var(key).ok();

    let settings_path = var("SMART_CLIPBOARD_SETTINGS_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(default_settings_path);
    let settings = read_settings(&settings_path)?;

    load_config_from(var, settings.as_ref())
}

/// Build the config from a variable lookup and optional settings file
/// contents. Variables win over the file, the file over defaults.
/// Unparseable numbers fall back to the next source.
pub fn load_config_from(
    var: impl Fn(&str) -> Option<String>,
    settings: Option<&RuntimeSettings>,
) -> anyhow::Result<Config> {
    let defaults = Config::default();
    let file = settings.cloned().unwrap_or_default();

    let max_items = var("SMART_CLIPBOARD_MAX_ITEMS")
        .and_then(|v| v.parse().ok())
        .or(file.max_items)
        .unwrap_or(defaults.max_items);

    let check_interval_ms = var("SMART_CLIPBOARD_CHECK_INTERVAL_MS")
        .and_then(|v| v.parse().ok())
        .or(file.check_interval_ms)
        .unwrap_or(defaults.check_interval_ms);

    let storage_path = var("SMART_CLIPBOARD_STORAGE_PATH")
        .map(PathBuf::from)
        .or(file.storage_path)
        .unwrap_or(defaults.storage_path);

    let debug = var("DEBUG").is_some();

    // Runtime settings file
    let settings_path = var("SMART_CLIPBOARD_SETTINGS_PATH")
        .map(PathBuf::from)
        .unwrap_or(defaults.settings_path);

    let settings_poll_ms = var("SMART_CLIPBOARD_SETTINGS_POLL_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.settings_poll_ms);

    // LAN sync settings
    let sync_enabled = var("SMART_CLIPBOARD_SYNC_ENABLED")
        .map(|v| parse_flag(&v))
        .unwrap_or(defaults.sync_enabled);

    let sync_port = var("SMART_CLIPBOARD_SYNC_PORT")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.sync_port);

    let discovery_port = var("SMART_CLIPBOARD_DISCOVERY_PORT")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.discovery_port);

    let discovery_targets = match var("SMART_CLIPBOARD_DISCOVERY_TARGETS") {
        Some(v) => parse_targets(&v)?,
        None => Vec::new(),
    };

    let cfg = Config {
        max_items,
        check_interval_ms,
        storage_path,
        debug,
        settings_path,
        settings_poll_ms,
        sync_enabled,
        sync_port,
        discovery_port,
        discovery_targets,
    };
    cfg.validate()?;
    Ok(cfg)
}
