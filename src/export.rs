//! Export a history document for a publishing platform.
//!
//! Each platform's editor takes pasted markdown a little differently; see
//! [`inkpad_core::publish::export`]. If `output` is `Some`, writes to that
//! file path. Otherwise writes to stdout for piping.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};
use inkpad_core::clock::SystemClock;
use inkpad_core::history::HistoryManager;
use inkpad_core::publish::{self, Platform};

use crate::config::Config;
use crate::file_store::open_store;

/// Body of document `id` (or the active document) formatted for `platform`.
pub fn export_document(config: &Config, id: Option<&str>, platform: Platform) -> Result<String> {
    let store = open_store(config)?;
    let history = HistoryManager::load(store, Arc::new(SystemClock), config.editor.history_max_count);
    let doc = match id {
        Some(id) => match history.get(id) {
            Some(doc) => doc,
            None => bail!("document not found: {}", id),
        },
        None => match history.active().or_else(|| history.most_recent()) {
            Some(doc) => doc,
            None => bail!("history is empty"),
        },
    };
    Ok(publish::export(&doc.body, platform))
}

pub fn run_export(
    config: &Config,
    id: Option<&str>,
    platform: Platform,
    output: Option<&Path>,
) -> Result<()> {
    let text = export_document(config, id, platform)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &text)?;
            eprintln!(
                "Exported {} characters for {} to {}",
                text.chars().count(),
                platform,
                path.display()
            );
        }
        None => {
            println!("{}", text);
        }
    }

    Ok(())
}
