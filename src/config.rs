//! Configuration parsing and validation.
//!
//! Inkpad is configured with a TOML file (default `./config/inkpad.toml`).
//! Every section is optional; a missing key takes the default shown below.
//!
//! ```toml
//! [store]
//! path = "./data/inkpad.json"
//!
//! [editor]
//! render_debounce_ms = 300
//! autosave_debounce_ms = 3000
//! draft_freshness_hours = 24
//! history_max_count = 50
//! on_navigation = "always_create"   # or "resume_matching"
//! placeholder = "# Start writing\n\n"
//!
//! [render]
//! theme = "default"
//! primary_color = "#0F4C81"
//!
//! [remote]
//! base_url = "http://localhost:3001"
//! timeout_secs = 30
//! ```

use anyhow::{Context, Result};
use inkpad_core::render::RenderConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::{NavigationPolicy, SessionSettings};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub render: RenderConfig,
    /// Absent means offline: saves stay local, titles come from templates.
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./data/inkpad.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditorConfig {
    #[serde(default = "default_render_debounce_ms")]
    pub render_debounce_ms: u64,
    #[serde(default = "default_autosave_debounce_ms")]
    pub autosave_debounce_ms: u64,
    #[serde(default = "default_draft_freshness_hours")]
    pub draft_freshness_hours: u64,
    #[serde(default = "default_history_max_count")]
    pub history_max_count: usize,
    #[serde(default)]
    pub on_navigation: NavigationPolicy,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            render_debounce_ms: default_render_debounce_ms(),
            autosave_debounce_ms: default_autosave_debounce_ms(),
            draft_freshness_hours: default_draft_freshness_hours(),
            history_max_count: default_history_max_count(),
            on_navigation: NavigationPolicy::default(),
            placeholder: default_placeholder(),
        }
    }
}

fn default_render_debounce_ms() -> u64 {
    300
}
fn default_autosave_debounce_ms() -> u64 {
    3000
}
fn default_draft_freshness_hours() -> u64 {
    24
}
fn default_history_max_count() -> usize {
    50
}
fn default_placeholder() -> String {
    "# Start writing\n\n".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    /// Base URL of the content backend, without the `/api` suffix.
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Defaults for every section, no remote. Used when no config file exists.
    pub fn minimal() -> Self {
        Self {
            store: StoreConfig::default(),
            editor: EditorConfig::default(),
            render: RenderConfig::default(),
            remote: None,
        }
    }

    pub fn session_settings(&self) -> SessionSettings {
        let editor = &self.editor;
        SessionSettings {
            render_debounce: Duration::from_millis(editor.render_debounce_ms),
            autosave_debounce: Duration::from_millis(editor.autosave_debounce_ms),
            draft_freshness: Duration::from_secs(editor.draft_freshness_hours * 60 * 60),
            history_max_count: editor.history_max_count,
            on_navigation: editor.on_navigation,
            placeholder: editor.placeholder.clone(),
            render: self.render.clone(),
            remote_timeout: Duration::from_secs(
                self.remote
                    .as_ref()
                    .map_or(default_timeout_secs(), |r| r.timeout_secs),
            ),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate editor
    if config.editor.render_debounce_ms == 0 {
        anyhow::bail!("editor.render_debounce_ms must be > 0");
    }
    if config.editor.autosave_debounce_ms == 0 {
        anyhow::bail!("editor.autosave_debounce_ms must be > 0");
    }
    if config.editor.draft_freshness_hours == 0 {
        anyhow::bail!("editor.draft_freshness_hours must be > 0");
    }
    if config.editor.history_max_count < 1 {
        anyhow::bail!("editor.history_max_count must be >= 1");
    }

    // Validate render
    if !is_hex_color(&config.render.primary_color) {
        anyhow::bail!(
            "render.primary_color must be a #rrggbb hex color, got '{}'",
            config.render.primary_color
        );
    }

    // Validate remote
    if let Some(remote) = &config.remote {
        if remote.timeout_secs < 1 {
            anyhow::bail!("remote.timeout_secs must be >= 1");
        }
        if !(remote.base_url.starts_with("http://") || remote.base_url.starts_with("https://")) {
            anyhow::bail!(
                "remote.base_url must start with http:// or https://, got '{}'",
                remote.base_url
            );
        }
    }

    Ok(())
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
