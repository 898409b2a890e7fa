//! Clipboard Poller
//!
//! Polls the system clipboard at a fixed interval and feeds new content
//! into the clipboard service.

use crate::application::ClipboardService;
use crate::domain::ports::ClipboardPort;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Inbound adapter turning clipboard changes into captures.
///
/// Content that was already on the clipboard at startup is remembered
/// but not captured. After that, a capture happens only when the
/// clipboard differs from what was last seen, so leaving the same text
/// on the clipboard does not refresh its timestamp every tick.
pub struct ClipboardPoller {
    clipboard: Arc<dyn ClipboardPort>,
    service: Arc<ClipboardService>,
    interval: Duration,
    last_seen: Option<String>,
}

impl ClipboardPoller {
    pub fn new(clipboard: Arc<dyn ClipboardPort>, service: Arc<ClipboardService>, interval: Duration) -> Self {
        Self {
            clipboard,
            service,
            interval,
            last_seen: None,
        }
    }

    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    /// Remember the current clipboard content without capturing it.
    pub async fn prime(&mut self) {
        match self.clipboard.read().await {
            Ok(content) if !content.is_empty() => {
                tracing::info!("initial clipboard content primed ({} bytes)", content.len());
                self.last_seen = Some(content);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("initial clipboard read failed: {}", e),
        }
    }

    /// Read the clipboard once. Returns true if something was captured.
    pub async fn poll_once(&mut self) -> bool {
        let content = match self.clipboard.read().await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("clipboard read failed: {}", e);
                return false;
            }
        };

        if content.is_empty() || self.last_seen.as_deref() == Some(content.as_str()) {
            return false;
        }

        let captured = self.service.capture(&content).await;
        self.last_seen = Some(content);
        captured
    }

    /// Prime, then poll every interval until shutdown.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        self.prime().await;

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await;

        tracing::info!("clipboard poller started, interval {:?}", self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("clipboard poller shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::InMemoryHistoryRepository;
    use crate::domain::entities::CaptureItem;
    use crate::domain::ports::ClipboardError;
    use crate::domain::services::HistoryStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Clipboard that returns scripted reads; the last one repeats.
    struct ScriptedClipboard {
        reads: Mutex<VecDeque<Result<String, String>>>,
    }

    impl ScriptedClipboard {
        fn new(reads: &[Result<&str, &str>]) -> Arc<Self> {
            Arc::new(Self {
                reads: Mutex::new(
                    reads
                        .iter()
                        .copied()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
            })
        }
    }

    #[async_trait]
    impl ClipboardPort for ScriptedClipboard {
        async fn read(&self) -> Result<String, ClipboardError> {
            let mut reads = self.reads.lock();
            let next = if reads.len() > 1 {
                reads.pop_front()
            } else {
                reads.front().cloned()
            };
            match next {
                Some(Ok(text)) => Ok(text),
                Some(Err(msg)) => Err(ClipboardError::Failed(msg)),
                None => Ok(String::new()),
            }
        }

        async fn write(&self, _text: &str) -> Result<(), ClipboardError> {
            Ok(())
        }
    }

    fn service() -> Arc<ClipboardService> {
        Arc::new(ClipboardService::new(
            HistoryStore::new(10).unwrap(),
            Arc::new(InMemoryHistoryRepository::new()),
            None,
            None,
        ))
    }

    fn contents(service: &ClipboardService) -> Vec<String> {
        service.history().into_iter().map(CaptureItem::into_content).collect()
    }

    #[tokio::test]
    async fn test_prime_does_not_capture_startup_content() {
        let service = service();
        let clipboard = ScriptedClipboard::new(&[Ok("already there"), Ok("already there")]);
        let mut poller = ClipboardPoller::new(clipboard, service.clone(), Duration::from_millis(10));

        poller.prime().await;
        assert_eq!(poller.last_seen(), Some("already there"));

        assert!(!poller.poll_once().await);
        assert!(service.history().is_empty());
    }

    #[tokio::test]
    async fn test_new_content_is_captured_once() {
        let service = service();
        let clipboard = ScriptedClipboard::new(&[Ok("a"), Ok("a"), Ok("b")]);
        let mut poller = ClipboardPoller::new(clipboard, service.clone(), Duration::from_millis(10));

        assert!(poller.poll_once().await);
        assert!(!poller.poll_once().await);
        assert!(poller.poll_once().await);

        assert_eq!(contents(&service), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_copying_back_old_content_recaptures_it() {
        let service = service();
        let clipboard = ScriptedClipboard::new(&[Ok("a"), Ok("b"), Ok("a")]);
        let mut poller = ClipboardPoller::new(clipboard, service.clone(), Duration::from_millis(10));

        for _ in 0..3 {
            poller.poll_once().await;
        }

        assert_eq!(contents(&service), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_and_failed_reads_are_skipped() {
        let service = service();
        let clipboard = ScriptedClipboard::new(&[Ok(""), Err("xclip missing"), Ok("after")]);
        let mut poller = ClipboardPoller::new(clipboard, service.clone(), Duration::from_millis(10));

        assert!(!poller.poll_once().await);
        assert!(!poller.poll_once().await);
        assert_eq!(poller.last_seen(), None);
        assert!(poller.poll_once().await);

        assert_eq!(contents(&service), vec!["after"]);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let service = service();
        let clipboard = ScriptedClipboard::new(&[Ok(""), Ok("copied")]);
        let poller = ClipboardPoller::new(clipboard, service.clone(), Duration::from_millis(10));
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(poller.run(rx));
        for _ in 0..50 {
            if !service.history().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(contents(&service), vec!["copied"]);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
