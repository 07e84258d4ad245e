//! # Inkpad CLI (`inkpad`)
//!
//! The `inkpad` binary drives editing sessions from the command line and
//! manages what they persist: history documents, drafts, rendered previews
//! and platform exports.
//!
//! ## Usage
//!
//! ```bash
//! inkpad --config ./config/inkpad.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `inkpad edit <file>` | Type a file into an editing session and let it settle |
//! | `inkpad render <file>` | Render markdown to preview HTML |
//! | `inkpad history <action>` | List, search, show, delete, activate or clear documents |
//! | `inkpad draft <action> <context>` | Show or discard the draft of a context |
//! | `inkpad titles <action>` | Generate or analyze titles via the remote |
//! | `inkpad export [id] --platform <p>` | Format a document for a publishing platform |
//!
//! ## Examples
//!
//! ```bash
//! # Start a document from a discovery-feed item and mirror it remotely
//! inkpad edit post.md --ref hot-42 --title "Hello" --save
//!
//! # Recover the unsaved draft left by a crashed session
//! inkpad edit post.md --recover accept
//!
//! # Search the history
//! inkpad history search "release notes"
//!
//! # Condensed copy for Toutiao
//! inkpad export --platform toutiao --output out/toutiao.md
//! ```

use clap::{Parser, Subcommand};
use inkpad::edit::{EditOptions, Recover};
use inkpad::titles::DEFAULT_TITLE_COUNT;
use inkpad::{config, draft_cmd, edit, export, history_cmd, logging, preview, titles};
use inkpad_core::publish::Platform;
use std::path::PathBuf;

/// Inkpad CLI: a headless authoring-session engine for markdown content.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist every setting takes its default.
#[derive(Parser)]
#[command(
    name = "inkpad",
    about = "Inkpad: a headless authoring-session engine for markdown content",
    version,
    long_about = "Inkpad keeps a markdown document, its drafts and history, and its rendered \
    preview consistent while you type, and mirrors saved documents to a content backend."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/inkpad.toml`. Store, editor, render and remote
    /// settings are read from this file.
    #[arg(long, global = true, default_value = "./config/inkpad.toml")]
    config: PathBuf,

    /// Log debug output to stderr. `INKPAD_LOG` takes precedence.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Type a file into an editing session.
    ///
    /// Opens a session (navigating from `--ref`/`--title` when given),
    /// replaces the buffer with the file's content, waits for the render
    /// and auto-save debounce windows to pass, and closes the session.
    Edit {
        /// Markdown file to type in.
        file: PathBuf,

        /// External ref (discovery-feed item) the document starts from.
        #[arg(long = "ref")]
        external_ref: Option<String>,

        /// Suggested title for a navigated document.
        #[arg(long)]
        title: Option<String>,

        /// Answer to a pending draft recovery.
        #[arg(long, value_enum)]
        recover: Option<Recover>,

        /// Mirror the document to the remote backend after editing.
        #[arg(long)]
        save: bool,
    },

    /// Render a markdown file to preview HTML.
    Render {
        file: PathBuf,

        /// Write the HTML here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Inspect and manage the history collection.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Inspect or discard drafts.
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },

    /// Title suggestions and analysis.
    ///
    /// Uses the `[remote]` backend; without one, suggestions come from
    /// built-in templates and analysis is unavailable.
    Titles {
        #[command(subcommand)]
        action: TitlesAction,
    },

    /// Format a document for a publishing platform.
    Export {
        /// Document id. Defaults to the active document.
        id: Option<String>,

        /// Target platform: `markdown`, `wechat`, `toutiao` or `zhihu`.
        #[arg(long, short)]
        platform: Platform,

        /// Write here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// History subcommands.
#[derive(Subcommand)]
enum HistoryAction {
    /// List documents, most recently updated first. `*` marks the active one.
    List,
    /// Case-insensitive search over titles and bodies.
    Search { keyword: String },
    /// Print a document's metadata and body.
    Show { id: String },
    /// Delete a document.
    Delete { id: String },
    /// Make a document active (the one `edit` resumes).
    Activate { id: String },
    /// Delete every document.
    Clear,
}

/// Draft subcommands. `context` is an external ref, or `new`.
#[derive(Subcommand)]
enum DraftAction {
    Show { context: String },
    Discard { context: String },
}

/// Title subcommands.
#[derive(Subcommand)]
enum TitlesAction {
    /// Suggest titles for a topic or article.
    Generate {
        topic: String,

        #[arg(long, default_value_t = DEFAULT_TITLE_COUNT)]
        count: usize,
    },
    /// Break down why a title works.
    Analyze { title: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // Every setting has a default, so a missing file is not an error
    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        config::Config::minimal()
    };

    match cli.command {
        Commands::Edit {
            file,
            external_ref,
            title,
            recover,
            save,
        } => {
            let opts = EditOptions {
                external_ref: external_ref.as_deref(),
                title: title.as_deref(),
                recover,
                save,
            };
            edit::run_edit(&cfg, &file, opts).await?;
        }
        Commands::Render { file, output } => {
            preview::run_render(&cfg, &file, output.as_deref())?;
        }
        Commands::History { action } => match action {
            HistoryAction::List => history_cmd::run_history_list(&cfg)?,
            HistoryAction::Search { keyword } => history_cmd::run_history_search(&cfg, &keyword)?,
            HistoryAction::Show { id } => history_cmd::run_history_show(&cfg, &id)?,
            HistoryAction::Delete { id } => history_cmd::run_history_delete(&cfg, &id)?,
            HistoryAction::Activate { id } => history_cmd::run_history_activate(&cfg, &id)?,
            HistoryAction::Clear => history_cmd::run_history_clear(&cfg)?,
        },
        Commands::Draft { action } => match action {
            DraftAction::Show { context } => draft_cmd::run_draft_show(&cfg, &context)?,
            DraftAction::Discard { context } => draft_cmd::run_draft_discard(&cfg, &context)?,
        },
        Commands::Titles { action } => match action {
            TitlesAction::Generate { topic, count } => {
                titles::run_titles_generate(&cfg, &topic, count).await?;
            }
            TitlesAction::Analyze { title } => {
                titles::run_titles_analyze(&cfg, &title).await?;
            }
        },
        Commands::Export {
            id,
            platform,
            output,
        } => {
            export::run_export(&cfg, id.as_deref(), platform, output.as_deref())?;
        }
    }

    Ok(())
}
