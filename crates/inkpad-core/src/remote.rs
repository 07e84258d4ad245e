//! Remote service contract.
//!
//! The [`RemoteService`] trait is the session's only view of the content
//! backend: mirroring a saved document, and the two LLM-backed title
//! helpers. Calls are async (via `async-trait`) and are never retried here;
//! the caller applies its own timeout.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Body of a remote document save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePayload {
    /// Discovery-feed item the document was started from.
    #[serde(rename = "hotId")]
    pub external_ref: Option<String>,
    /// Full markdown source.
    pub markdown: String,
    /// Rendered HTML, as shown in the preview.
    pub html: String,
}

/// One building block identified in a title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleElement {
    /// The words of the title that form this element.
    pub text: String,
    /// Element category, e.g. "number", "contrast", "audience".
    pub category: String,
    /// Why the element works.
    pub explain: String,
}

/// Structured breakdown of why a title attracts readers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleAnalysis {
    pub title: String,
    /// Reader psychology the title plays on, one point per entry.
    pub psychology: Vec<String>,
    pub elements: Vec<TitleElement>,
    /// The reusable pattern behind the title.
    pub routine: String,
    /// Topics and situations the pattern fits.
    pub scenario: String,
}

#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Mirror a saved document to the backend.
    async fn save_document(&self, payload: &SavePayload) -> Result<()>;

    /// Suggest up to `count` titles for `topic` (an article or a headline).
    async fn generate_titles(&self, topic: &str, count: usize) -> Result<Vec<String>>;

    async fn analyze_title(&self, title: &str) -> Result<TitleAnalysis>;
}
