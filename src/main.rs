//! Smart Clipboard - clipboard history with LAN sync
//!
//! This is the composition root that wires together all the components.

use smart_clipboard::adapters::inbound::ClipboardPoller;
use smart_clipboard::adapters::outbound::{JsonFileHistoryRepository, SystemClipboard};
use smart_clipboard::application::ClipboardService;
use smart_clipboard::config::load_config;
use smart_clipboard::domain::ports::{ClipboardPort, HistoryPublisher, SyncedHistory};
use smart_clipboard::domain::services::HistoryStore;
use smart_clipboard::infrastructure::{shutdown_signal, SettingsWatcher, ShutdownController};
use smart_clipboard::replication::SyncAgent;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(log_level).init();

    tracing::info!(
        "starting smart-clipboard max_items={} storage={} sync={}",
        cfg.max_items,
        cfg.storage_path.display(),
        cfg.sync_enabled
    );

    // ===== COMPOSITION ROOT =====

    // 1. Outbound adapters
    let repository = Arc::new(JsonFileHistoryRepository::new(&cfg.storage_path));
    let clipboard: Arc<dyn ClipboardPort> = Arc::new(SystemClipboard::new());

    // 2. Sync agent; a bind failure only disables sync
    let agent = if cfg.sync_enabled {
        match SyncAgent::bind(cfg.sync_config()).await {
            Ok(agent) => Some(agent),
            Err(e) => {
                tracing::error!("LAN sync disabled: {}", e);
                None
            }
        }
    } else {
        tracing::info!("LAN sync disabled by configuration");
        None
    };
    let publisher = agent
        .as_ref()
        .map(|a| Arc::new(a.sender()) as Arc<dyn HistoryPublisher>);

    // 3. Application service
    let store = HistoryStore::new(cfg.max_items)?;
    let service = Arc::new(ClipboardService::new(
        store,
        repository,
        Some(clipboard.clone()),
        publisher,
    ));
    if let Err(e) = service.load().await {
        tracing::error!("failed to load saved history, starting empty: {}", e);
    }

    // 4. Background tasks
    let shutdown = ShutdownController::new();

    if let Some(agent) = &agent {
        agent.start(service.clone() as Arc<dyn SyncedHistory>);
    }

    let mut settings = SettingsWatcher::new(
        &cfg.settings_path,
        service.clone(),
        cfg.settings_poll_interval(),
    );
    settings.check_once().await;
    let settings_task = tokio::spawn(settings.run(shutdown.subscribe()));

    let poller = ClipboardPoller::new(clipboard, service.clone(), cfg.check_interval());
    let poller_task = tokio::spawn(poller.run(shutdown.subscribe()));

    // 5. Run until Ctrl+C / SIGTERM
    shutdown_signal(shutdown.clone()).await;

    if let Some(agent) = &agent {
        agent.stop().await;
    }
    for task in [poller_task, settings_task] {
        if tokio::time::timeout(Duration::from_secs(2), task).await.is_err() {
            tracing::warn!("background task did not stop in time");
        }
    }

    tracing::info!("smart-clipboard stopped with {} items", service.history().len());
    Ok(())
}
