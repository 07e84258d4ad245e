//! `inkpad edit`: drive one editing session from a file.
//!
//! The file's content is typed into the session line by line, then the
//! command sleeps until each pending debounce deadline and ticks the
//! session until nothing is left to do. The result is the same state an
//! interactive host would reach once the user stops typing.
//!
//! An accepted draft recovery is committed to history first; the file is
//! then typed into a new document so the recovered text is never
//! overwritten.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use inkpad_core::clock::SystemClock;
use inkpad_core::error::SessionError;

use crate::config::Config;
use crate::file_store::open_store;
use crate::markdown::PulldownRenderer;
use crate::remote;
use crate::session::{Launch, Phase, RecoveryChoice, Session};

/// Answer to a pending draft recovery, given up front on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Recover {
    Accept,
    Discard,
}

impl From<Recover> for RecoveryChoice {
    fn from(r: Recover) -> Self {
        match r {
            Recover::Accept => RecoveryChoice::Accept,
            Recover::Discard => RecoveryChoice::Discard,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EditOptions<'a> {
    pub external_ref: Option<&'a str>,
    pub title: Option<&'a str>,
    pub recover: Option<Recover>,
    pub save: bool,
}

pub async fn run_edit(config: &Config, file: &Path, opts: EditOptions<'_>) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let store = open_store(config)?;
    let launch = Launch::navigate(opts.external_ref, opts.title);
    let mut session = Session::open(
        store,
        Arc::new(PulldownRenderer::new()),
        Arc::new(SystemClock),
        config.session_settings(),
        launch,
    );

    if session.phase() == Phase::Reconciling {
        let Some(prompt) = session.recovery_prompt() else {
            bail!("session is reconciling without a recovery prompt");
        };
        let Some(choice) = opts.recover else {
            eprintln!(
                "A newer draft exists for '{}' (saved {}, title: {}).",
                prompt.context,
                prompt.draft.updated_at.to_rfc3339(),
                prompt.draft.title
            );
            bail!("draft recovery pending; re-run with --recover accept or --recover discard");
        };
        session.resolve_recovery(choice.into())?;
        match choice {
            Recover::Accept => {
                // The recovered text now lives in history; the file goes
                // into a document of its own.
                let recovered = session.document_id().unwrap_or("(none)").to_string();
                eprintln!("Draft recovered into document {}.", recovered);
                session.start_new(opts.title, opts.external_ref)?;
            }
            Recover::Discard => eprintln!("Draft discarded."),
        }
    }

    session.set_text("")?;
    for line in content.split_inclusive('\n') {
        session.type_text(line)?;
    }
    settle(&mut session).await;

    let status = session.status();
    let id = session.document_id().unwrap_or("(none)").to_string();
    println!(
        "Document {} ({} chars, {} min read)",
        id, status.chars, status.reading_minutes
    );

    if opts.save {
        let remote = remote::from_config(config)?;
        match session.save(remote.as_ref()).await {
            Ok(id) => println!("Saved {}", id),
            Err(e @ SessionError::RemoteSave { .. }) => {
                session.close();
                bail!("{} (saved locally; retry later)", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    session.close();
    Ok(())
}

/// Sleep until each debounce deadline and tick until the session is quiet.
async fn settle(session: &mut Session) {
    while let Some(wait) = session.time_until_due() {
        tokio::time::sleep(wait).await;
        session.tick();
    }
}
