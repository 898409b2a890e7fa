//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the clipboard history domain.
//! They have no I/O dependencies and contain only business logic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of characters kept in a preview before truncation.
pub const PREVIEW_CHARS: usize = 100;

/// Marker appended to a truncated preview.
pub const PREVIEW_ELLIPSIS: &str = "...";

/// One clipboard entry in the history.
///
/// The preview is always derived from the content: it is recomputed on
/// construction, on [`CaptureItem::set_content`] and when an item is
/// deserialized, so a stale or forged preview never survives. Both fields
/// are private for that reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CaptureItemRecord")]
pub struct CaptureItem {
    /// Full captured text
    content: String,
    /// When this content was (re-)captured
    #[serde(rename = "timestamp")]
    pub captured_at: DateTime<Utc>,
    /// Short form of the content for display
    preview: String,
    /// How many times the user re-selected this item
    pub click_count: u32,
}

impl CaptureItem {
    /// Create an item captured at `captured_at`.
    pub fn new(content: impl Into<String>, captured_at: DateTime<Utc>, click_count: u32) -> Self {
        let content = content.into();
        let preview = make_preview(&content);
        Self {
            content,
            captured_at,
            preview,
            click_count,
        }
    }

    /// Create an item captured now with no clicks.
    pub fn now(content: impl Into<String>) -> Self {
        Self::new(content, Utc::now(), 0)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    /// Replace the content and re-derive the preview.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.preview = make_preview(&self.content);
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// Ranking order: higher click count first, then most recent first.
    pub fn rank_cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .click_count
            .cmp(&self.click_count)
            .then_with(|| other.captured_at.cmp(&self.captured_at))
    }
}

/// Serialized shape of a [`CaptureItem`]; the preview is accepted but ignored.
#[derive(Deserialize)]
struct CaptureItemRecord {
    content: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    #[allow(dead_code)]
    preview: Option<String>,
    #[serde(default)]
    click_count: u32,
}

impl From<CaptureItemRecord> for CaptureItem {
    fn from(record: CaptureItemRecord) -> Self {
        CaptureItem::new(record.content, record.timestamp, record.click_count)
    }
}

/// Build the display preview for some content.
pub fn make_preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        None => content.to_string(),
        Some((cut, _)) => {
            let mut preview = String::with_capacity(cut + PREVIEW_ELLIPSIS.len());
            preview.push_str(&content[..cut]);
            preview.push_str(PREVIEW_ELLIPSIS);
            preview
        }
    }
}
