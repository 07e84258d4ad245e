//! `inkpad draft ...`: inspect or discard the draft of one context.
//!
//! A context is an external ref, or `new` for documents started without one.

use std::sync::Arc;

use anyhow::{bail, Result};
use inkpad_core::clock::SystemClock;
use inkpad_core::drafts::DraftManager;
use inkpad_core::models::DraftContext;

use crate::config::Config;
use crate::file_store::open_store;

fn manager(config: &Config) -> Result<DraftManager> {
    let store = open_store(config)?;
    Ok(DraftManager::new(
        store,
        Arc::new(SystemClock),
        config.session_settings().draft_freshness,
    ))
}

pub fn run_draft_show(config: &Config, context: &str) -> Result<()> {
    let drafts = manager(config)?;
    let context = DraftContext::for_ref(Some(context));
    let Some(draft) = drafts.load(&context) else {
        bail!("no draft for context: {}", context);
    };

    println!("--- Draft ---");
    println!("context:      {}", context);
    println!("title:        {}", draft.title);
    if let Some(ref external_ref) = draft.external_ref {
        println!("external_ref: {}", external_ref);
    }
    println!("updated_at:   {}", draft.updated_at.to_rfc3339());
    println!("fresh:        {}", drafts.is_fresh(&draft));
    println!();

    println!("--- Body ---");
    println!("{}", draft.body);
    Ok(())
}

pub fn run_draft_discard(config: &Config, context: &str) -> Result<()> {
    let drafts = manager(config)?;
    let context = DraftContext::for_ref(Some(context));
    drafts.discard(&context);
    println!("Discarded draft for {}", context);
    Ok(())
}
