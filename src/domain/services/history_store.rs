//! History Store - Ranked, size-bounded clipboard history
//!
//! Pure domain logic with no I/O and no locking. The owner (the clipboard
//! service) serializes access.
//!
//! ## Ranking
//!
//! Items are ordered by click count (descending), then by capture time
//! (most recent first). The whole list is re-sorted after every mutation:
//! a single click can move an item arbitrarily far up, so incremental
//! repositioning is not enough.

use crate::domain::entities::CaptureItem;
use chrono::{DateTime, Utc};

/// Errors raised by the history store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("history capacity must be positive")]
    InvalidCapacity,
}

/// Ranked, de-duplicated, size-bounded list of capture items.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    items: Vec<CaptureItem>,
    max_size: usize,
}

impl HistoryStore {
    /// Create an empty store holding at most `max_size` items.
    pub fn new(max_size: usize) -> Result<Self, HistoryError> {
        if max_size == 0 {
            return Err(HistoryError::InvalidCapacity);
        }
        Ok(Self {
            items: Vec::new(),
            max_size,
        })
    }

    /// Create a store seeded with previously saved items.
    pub fn with_items(max_size: usize, items: Vec<CaptureItem>) -> Result<Self, HistoryError> {
        let mut store = Self::new(max_size)?;
        store.replace_all(items);
        Ok(store)
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, content: &str) -> bool {
        self.items.iter().any(|item| item.content() == content)
    }

    /// Capture `content` now.
    pub fn capture(&mut self, content: &str) {
        self.capture_at(content, Utc::now());
    }

    /// Capture `content` with an explicit timestamp.
    ///
    /// Re-capturing existing content replaces the old item but keeps its
    /// click count. Empty content is ignored.
    pub fn capture_at(&mut self, content: &str, at: DateTime<Utc>) {
        if content.is_empty() {
            return;
        }

        let click_count = match self.items.iter().position(|item| item.content() == content) {
            Some(idx) => self.items.remove(idx).click_count,
            None => 0,
        };

        // Newest at the front so the stable sort lets it win timestamp ties.
        self.items.insert(0, CaptureItem::new(content, at, click_count));
        self.rerank();
    }

    /// Count a user re-selection of `content`. Returns false if absent.
    pub fn record_selection(&mut self, content: &str) -> bool {
        match self.items.iter_mut().find(|item| item.content() == content) {
            Some(item) => {
                item.click_count = item.click_count.saturating_add(1);
                self.rerank();
                true
            }
            None => false,
        }
    }

    /// Replace the whole list, e.g. with a snapshot received from a peer.
    ///
    /// The caller must not pass two items with the same content.
    pub fn replace_all(&mut self, items: Vec<CaptureItem>) {
        self.items = items;
        self.rerank();
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Change the capacity, truncating immediately if the list is too long.
    pub fn set_max_size(&mut self, max_size: usize) -> Result<(), HistoryError> {
        if max_size == 0 {
            return Err(HistoryError::InvalidCapacity);
        }
        self.max_size = max_size;
        self.items.truncate(max_size);
        Ok(())
    }

    /// Copy of the current ranked list.
    pub fn history(&self) -> Vec<CaptureItem> {
        self.items.clone()
    }

    /// Borrow the current ranked list.
    pub fn items(&self) -> &[CaptureItem] {
        &self.items
    }

    fn rerank(&mut self) {
        self.items.sort_by(CaptureItem::rank_cmp);
        self.items.truncate(self.max_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn contents(store: &HistoryStore) -> Vec<&str> {
        store.items().iter().map(CaptureItem::content).collect()
    }

    #[test]
    fn test_new_rejects_zero_capacity() {
        assert_eq!(HistoryStore::new(0).unwrap_err(), HistoryError::InvalidCapacity);
    }

    #[test]
    fn test_capture_empty_is_noop() {
        let mut store = HistoryStore::new(5).unwrap();
        store.capture("");
        assert!(store.is_empty());
    }

    #[test]
    fn test_capture_twice_keeps_single_item_and_click_count() {
        let mut store = HistoryStore::new(5).unwrap();
        store.capture_at("hello", t(0));
        store.record_selection("hello");
        store.record_selection("hello");
        store.capture_at("hello", t(10));

        assert_eq!(store.len(), 1);
        let item = &store.items()[0];
        assert_eq!(item.click_count, 2);
        assert_eq!(item.captured_at, t(10));
    }

    #[test]
    fn test_recapture_moves_to_front_by_recency() {
        // maxSize=5: hello, world, hello -> [hello, world]
        let mut store = HistoryStore::new(5).unwrap();
        store.capture_at("hello", t(0));
        store.capture_at("world", t(1));
        store.capture_at("hello", t(2));

        assert_eq!(contents(&store), vec!["hello", "world"]);
        assert_eq!(store.items()[0].click_count, 0);
        assert_eq!(store.items()[1].click_count, 0);
    }

    #[test]
    fn test_selection_outranks_recency() {
        let mut store = HistoryStore::new(5).unwrap();
        store.capture_at("hello", t(0));
        store.capture_at("world", t(1));
        store.capture_at("hello", t(2));

        assert!(store.record_selection("world"));
        assert_eq!(contents(&store), vec!["world", "hello"]);
        assert_eq!(store.items()[0].click_count, 1);
    }

    #[test]
    fn test_record_selection_absent_is_noop() {
        let mut store = HistoryStore::new(5).unwrap();
        store.capture_at("a", t(0));
        assert!(!store.record_selection("missing"));
        assert_eq!(store.items()[0].click_count, 0);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = HistoryStore::new(3).unwrap();
        for (i, c) in ["one", "two", "three", "four"].iter().enumerate() {
            store.capture_at(c, t(i as i64));
        }
        assert_eq!(contents(&store), vec!["four", "three", "two"]);
    }

    #[test]
    fn test_eviction_spares_clicked_items() {
        let mut store = HistoryStore::new(2).unwrap();
        store.capture_at("keep", t(0));
        store.record_selection("keep");
        store.capture_at("b", t(1));
        store.capture_at("c", t(2));

        assert_eq!(contents(&store), vec!["keep", "c"]);
    }

    #[test]
    fn test_same_timestamp_newest_capture_wins_tie() {
        let mut store = HistoryStore::new(5).unwrap();
        store.capture_at("first", t(0));
        store.capture_at("second", t(0));
        assert_eq!(contents(&store), vec!["second", "first"]);
    }

    #[test]
    fn test_click_count_dominates_any_timestamp() {
        let mut store = HistoryStore::new(10).unwrap();
        store.capture_at("ancient", t(-100_000));
        store.record_selection("ancient");
        for i in 0..5 {
            store.capture_at(&format!("new-{i}"), t(i));
        }

        let items = store.items();
        assert_eq!(items[0].content(), "ancient");
        for pair in items.windows(2) {
            if pair[0].click_count != pair[1].click_count {
                assert!(pair[0].click_count > pair[1].click_count);
            } else {
                assert!(pair[0].captured_at >= pair[1].captured_at);
            }
        }
    }

    #[test]
    fn test_replace_all_reranks_and_truncates() {
        let mut store = HistoryStore::new(2).unwrap();
        store.replace_all(vec![
            CaptureItem::new("a", t(0), 0),
            CaptureItem::new("b", t(5), 0),
            CaptureItem::new("c", t(1), 4),
        ]);
        assert_eq!(contents(&store), vec!["c", "b"]);
    }

    #[test]
    fn test_replace_all_with_own_history_is_idempotent() {
        let mut store = HistoryStore::new(4).unwrap();
        store.capture_at("a", t(0));
        store.capture_at("b", t(1));
        store.capture_at("c", t(1));
        store.record_selection("a");

        let before = store.history();
        store.replace_all(store.history());
        assert_eq!(store.history(), before);
    }

    #[test]
    fn test_clear_empties() {
        let mut store = HistoryStore::new(3).unwrap();
        store.capture_at("a", t(0));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_max_size_truncates_immediately() {
        let mut store = HistoryStore::new(5).unwrap();
        for i in 0..5 {
            store.capture_at(&i.to_string(), t(i));
        }
        store.set_max_size(2).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(contents(&store), vec!["4", "3"]);
        assert_eq!(store.max_size(), 2);
    }

    #[test]
    fn test_set_max_size_rejects_zero() {
        let mut store = HistoryStore::new(5).unwrap();
        store.capture_at("a", t(0));
        assert_eq!(store.set_max_size(0), Err(HistoryError::InvalidCapacity));
        assert_eq!(store.max_size(), 5);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_history_is_a_snapshot() {
        let mut store = HistoryStore::new(5).unwrap();
        store.capture_at("a", t(0));
        let snapshot = store.history();
        store.capture_at("b", t(1));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_length_bounded_after_every_operation() {
        let mut store = HistoryStore::new(3).unwrap();
        let base = t(0);
        for i in 0..20i64 {
            let content = format!("item-{}", i % 7);
            match i % 4 {
                0 | 1 => store.capture_at(&content, base + Duration::seconds(i)),
                2 => {
                    store.record_selection(&content);
                }
                _ => {
                    let mut items = store.history();
                    items.push(CaptureItem::new(format!("remote-{i}"), base, 0));
                    store.replace_all(items);
                }
            }
            assert!(store.len() <= store.max_size());
        }
    }

    #[test]
    fn test_with_items_seeds_ranked() {
        let store = HistoryStore::with_items(
            5,
            vec![CaptureItem::new("old", t(0), 0), CaptureItem::new("new", t(9), 0)],
        )
        .unwrap();
        assert_eq!(contents(&store), vec!["new", "old"]);
        assert!(store.contains("old"));
    }
}
