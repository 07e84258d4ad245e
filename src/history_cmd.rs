//! `inkpad history ...`: inspect and manage the history collection.

use std::sync::Arc;

use anyhow::{bail, Result};
use inkpad_core::clock::SystemClock;
use inkpad_core::history::HistoryManager;
use inkpad_core::models::Document;

use crate::config::Config;
use crate::file_store::open_store;

fn load(config: &Config) -> Result<HistoryManager> {
    let store = open_store(config)?;
    Ok(HistoryManager::load(
        store,
        Arc::new(SystemClock),
        config.editor.history_max_count,
    ))
}

fn print_row(doc: &Document, active: bool) {
    let marker = if active { "*" } else { " " };
    let title = if doc.title.is_empty() { "(untitled)" } else { doc.title.as_str() };
    println!(
        "{} {}  {}  {:>6} chars  {}",
        marker,
        doc.id,
        doc.updated_at.format("%Y-%m-%d %H:%M"),
        doc.word_count,
        title
    );
}

fn print_list<'a>(docs: impl IntoIterator<Item = &'a Document>, active: Option<&str>) {
    let mut any = false;
    for doc in docs {
        print_row(doc, active == Some(doc.id.as_str()));
        any = true;
    }
    if !any {
        println!("No documents.");
    }
}

pub fn run_history_list(config: &Config) -> Result<()> {
    let history = load(config)?;
    print_list(history.documents(), history.active_id());
    Ok(())
}

pub fn run_history_search(config: &Config, keyword: &str) -> Result<()> {
    let history = load(config)?;
    print_list(history.search(keyword), history.active_id());
    Ok(())
}

pub fn run_history_show(config: &Config, id: &str) -> Result<()> {
    let history = load(config)?;
    let Some(doc) = history.get(id) else {
        bail!("document not found: {}", id);
    };

    println!("--- Document ---");
    println!("id:           {}", doc.id);
    println!(
        "title:        {}",
        if doc.title.is_empty() { "(untitled)" } else { doc.title.as_str() }
    );
    if let Some(ref external_ref) = doc.external_ref {
        println!("external_ref: {}", external_ref);
    }
    println!("created_at:   {}", doc.created_at.to_rfc3339());
    println!("updated_at:   {}", doc.updated_at.to_rfc3339());
    println!("word_count:   {}", doc.word_count);
    println!("active:       {}", history.active_id() == Some(id));
    println!();

    println!("--- Body ---");
    println!("{}", doc.body);
    Ok(())
}

pub fn run_history_delete(config: &Config, id: &str) -> Result<()> {
    let mut history = load(config)?;
    if !history.remove(id) {
        bail!("document not found: {}", id);
    }
    println!("Deleted {}", id);
    Ok(())
}

pub fn run_history_activate(config: &Config, id: &str) -> Result<()> {
    let mut history = load(config)?;
    if !history.set_active(id) {
        bail!("document not found: {}", id);
    }
    println!("Active document: {}", id);
    Ok(())
}

pub fn run_history_clear(config: &Config) -> Result<()> {
    let mut history = load(config)?;
    let count = history.len();
    history.clear();
    println!("Cleared {} documents.", count);
    Ok(())
}
