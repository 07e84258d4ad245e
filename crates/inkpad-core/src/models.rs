//! Core data models: documents, drafts, and editing contexts.
//!
//! These types are persisted as JSON through the
//! [`PersistentStore`](crate::store::PersistentStore), so field names are
//! camelCase on the wire.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when a body has no usable first line.
pub const UNTITLED: &str = "Untitled";

/// Context sentinel for documents that did not come from a feed item.
pub const NEW_CONTEXT: &str = "new";

/// A named, persisted unit of authored content (a "creation").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Discovery-feed item this document was started from.
    pub external_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub word_count: usize,
}

/// Partial update applied by [`HistoryManager::update`](crate::history::HistoryManager::update).
///
/// `None` fields are left untouched. `external_ref` is only applied to a
/// document that has none yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub external_ref: Option<String>,
}

impl DocumentPatch {
    pub fn body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.external_ref.is_none()
    }
}

/// An editing slot: the external reference a session was opened for, or
/// the `"new"` sentinel. Scopes exactly one [`Draft`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftContext(String);

impl DraftContext {
    pub fn new_document() -> Self {
        Self(NEW_CONTEXT.to_string())
    }

    pub fn for_ref(external_ref: Option<&str>) -> Self {
        match external_ref {
            Some(r) if !r.trim().is_empty() => Self(r.to_string()),
            _ => Self::new_document(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DraftContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Best-effort recovery snapshot of the most recent unsaved edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub body: String,
    pub external_ref: Option<String>,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// Title for a draft: the first non-empty line with heading markup
/// stripped, or [`UNTITLED`].
pub fn derive_title(body: &str) -> String {
    body.lines()
        .map(strip_heading_markup)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Text of the first ATX heading in `body`, if any.
pub fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .filter(|line| heading_marker_len(line) > 0)
        .map(strip_heading_markup)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// Title for a document committed from `body`: the first heading, falling
/// back to the first non-empty line. Empty for a blank body.
pub fn document_title(body: &str) -> String {
    first_heading(body).unwrap_or_else(|| {
        body.lines()
            .map(strip_heading_markup)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .to_string()
    })
}

/// Character count of `body`, excluding ATX heading markers.
///
/// Counts characters rather than whitespace-separated words so CJK text is
/// measured the same way as latin text.
pub fn word_count(body: &str) -> usize {
    let markers: usize = body.lines().map(heading_marker_len).sum();
    body.chars().count() - markers
}

/// Estimated reading time in whole minutes at 400 characters per minute.
pub fn reading_minutes(chars: usize) -> usize {
    chars.div_ceil(400)
}

fn strip_heading_markup(line: &str) -> &str {
    let trimmed = line.trim();
    let marker = heading_marker_len(trimmed);
    trimmed[marker..].trim()
}

/// Number of `#` characters opening an ATX heading on this line, or 0.
fn heading_marker_len(line: &str) -> usize {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return 0;
    }
    let rest = &line[indent..];
    let hashes = rest.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return 0;
    }
    match rest[hashes..].chars().next() {
        None | Some(' ') | Some('\t') => hashes,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_title_strips_heading_markup() {
        assert_eq!(derive_title("# Hello\n\nWorld"), "Hello");
        assert_eq!(derive_title("\n\n### Deep  \nmore"), "Deep");
        assert_eq!(derive_title("plain first line\n# later"), "plain first line");
    }

    #[test]
    fn derive_title_falls_back_for_blank_bodies() {
        assert_eq!(derive_title(""), UNTITLED);
        assert_eq!(derive_title("  \n#\n"), UNTITLED);
    }

    #[test]
    fn document_title_prefers_first_heading() {
        assert_eq!(document_title("intro\n\n## Real title\n"), "Real title");
        assert_eq!(document_title("just text"), "just text");
        assert_eq!(document_title(""), "");
    }

    #[test]
    fn hashtags_are_not_headings() {
        assert_eq!(first_heading("#hashtag\n"), None);
        assert_eq!(word_count("#tag"), 4);
    }

    #[test]
    fn word_count_excludes_heading_markers() {
        assert_eq!(word_count("# Hello\n\nWorld"), 13);
        assert_eq!(word_count("hello"), 5);
        assert_eq!(word_count("## 你好"), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn reading_time_rounds_up() {
        assert_eq!(reading_minutes(0), 0);
        assert_eq!(reading_minutes(1), 1);
        assert_eq!(reading_minutes(400), 1);
        assert_eq!(reading_minutes(401), 2);
    }

    #[test]
    fn blank_external_ref_maps_to_new_context() {
        assert_eq!(DraftContext::for_ref(None).as_str(), "new");
        assert_eq!(DraftContext::for_ref(Some("  ")).as_str(), "new");
        assert_eq!(DraftContext::for_ref(Some("hot-1")).as_str(), "hot-1");
    }

    #[test]
    fn document_json_is_camel_case() {
        let doc = Document {
            id: "d1".into(),
            title: "T".into(),
            body: "b".into(),
            external_ref: Some("hot-1".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            word_count: 1,
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"externalRef\":\"hot-1\""));
        assert!(json.contains("\"wordCount\":1"));
    }
}
