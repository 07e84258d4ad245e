//! Typed render options, the renderer contract, a memoizing render cache,
//! and preview state.
//!
//! The markdown grammar itself lives behind [`MarkdownRenderer`]; this
//! module only guarantees that identical `(config, text)` inputs produce
//! identical HTML, that failures (including panics) become an inline error
//! fragment instead of propagating, and that the last good HTML stays
//! visible while a re-render is pending.

use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::RenderError;

/// Visual theme of the rendered article.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Default,
    Grace,
    Simple,
}

/// Which image attribute becomes the figure caption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Legend {
    None,
    Alt,
    Title,
    #[default]
    AltTitle,
    TitleAlt,
}

impl Legend {
    /// Caption for an image with the given alt text and title.
    pub fn caption<'a>(self, alt: &'a str, title: &'a str) -> Option<&'a str> {
        let pick = |first: &'a str, second: &'a str| {
            [first, second].into_iter().find(|s| !s.trim().is_empty())
        };
        match self {
            Legend::None => None,
            Legend::Alt => pick(alt, ""),
            Legend::Title => pick(title, ""),
            Legend::AltTitle => pick(alt, title),
            Legend::TitleAlt => pick(title, alt),
        }
    }
}

/// Renderer options.
///
/// Every field has a default, so a partial `[render]` TOML table
/// deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub theme: Theme,
    /// Accent color as `#rrggbb`.
    pub primary_color: String,
    /// CSS font stack.
    pub fonts: String,
    pub font_size: String,
    /// First-line paragraph indent.
    pub indent: bool,
    pub justify: bool,
    /// Collect link URLs into a numbered references section.
    pub citations: bool,
    /// Prefix a word count / reading time block.
    pub reading_time: bool,
    /// macOS-style window header on code blocks.
    pub mac_code_block: bool,
    pub line_numbers: bool,
    pub legend: Legend,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Default,
            primary_color: "#0F4C81".to_string(),
            fonts: r#"-apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif"#
                .to_string(),
            font_size: "16px".to_string(),
            indent: false,
            justify: false,
            citations: true,
            reading_time: true,
            mac_code_block: true,
            line_numbers: true,
            legend: Legend::AltTitle,
        }
    }
}

/// The pure markdown-to-HTML function.
///
/// Implementations must be deterministic: the same config and text always
/// yield the same HTML.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, config: &RenderConfig, text: &str) -> Result<String, RenderError>;
}

/// Default number of memoized renders.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Memoizing wrapper around a [`MarkdownRenderer`].
///
/// Entries are keyed by the SHA-256 of the serialized config and the text,
/// and evicted oldest-first beyond `capacity`. Failed renders are not
/// memoized.
pub struct RenderCache {
    renderer: Arc<dyn MarkdownRenderer>,
    capacity: usize,
    entries: HashMap<String, String>,
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

impl RenderCache {
    pub fn new(renderer: Arc<dyn MarkdownRenderer>) -> Self {
        Self::with_capacity(renderer, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(renderer: Arc<dyn MarkdownRenderer>, capacity: usize) -> Self {
        Self {
            renderer,
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Render `text`, returning cached HTML when available. Never fails.
    pub fn render(&mut self, config: &RenderConfig, text: &str) -> String {
        let key = cache_key(config, text);
        if let Some(html) = self.entries.get(&key) {
            self.hits += 1;
            return html.clone();
        }
        self.misses += 1;

        let renderer = &self.renderer;
        let outcome = catch_unwind(AssertUnwindSafe(|| renderer.render(config, text)));
        match outcome {
            Ok(Ok(html)) => {
                self.insert(key, html.clone());
                html
            }
            Ok(Err(e)) => {
                warn!(error = %e, chars = text.len(), "markdown render failed");
                error_fragment(&e.0)
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "renderer panicked".to_string());
                warn!(error = %message, chars = text.len(), "markdown renderer panicked");
                error_fragment(&message)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    fn insert(&mut self, key: String, html: String) {
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, html);
    }
}

fn cache_key(config: &RenderConfig, text: &str) -> String {
    let mut hasher = Sha256::new();
    // RenderConfig serialization cannot fail: plain strings, bools and enums.
    hasher.update(serde_json::to_vec(config).unwrap_or_default());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Inline HTML shown in place of the preview when rendering fails.
pub fn error_fragment(message: &str) -> String {
    format!(
        r#"<div class="render-error" style="color: red; padding: 20px;">Render error: {}</div>"#,
        escape_html(message)
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// What the preview pane shows.
///
/// The last rendered HTML is kept while a re-render is pending;
/// [`is_rendering`](Preview::is_rendering) reports the pending state.
pub struct Preview {
    cache: RenderCache,
    config: RenderConfig,
    html: String,
    rendering: bool,
    renders: u64,
}

impl Preview {
    pub fn new(cache: RenderCache, config: RenderConfig) -> Self {
        Self {
            cache,
            config,
            html: String::new(),
            rendering: false,
            renders: 0,
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    /// Number of render passes performed (cache hits included).
    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// The text changed; a render is scheduled but has not run yet.
    pub fn mark_stale(&mut self) {
        self.rendering = true;
    }

    pub fn render_now(&mut self, text: &str) -> &str {
        self.html = self.cache.render(&self.config, text);
        self.rendering = false;
        self.renders += 1;
        &self.html
    }

    /// Swap the config and re-render `text` immediately.
    pub fn reconfigure(&mut self, config: RenderConfig, text: &str) -> &str {
        self.config = config;
        self.render_now(text)
    }
}
