//! # Inkpad
//!
//! A headless authoring-session engine for a markdown content editor.
//!
//! Inkpad keeps an in-memory document, its persisted draft and history, its
//! rendered preview and its scroll position consistent under rapid input,
//! without losing work across reloads, navigation or crashes. The pure
//! session components live in `inkpad-core`; this crate wires them to a
//! JSON-file store, a pulldown-cmark renderer, an HTTP backend and the
//! `inkpad` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ keystrokes │──▶│   Session    │──▶│ Render Cache │──▶ preview HTML
//! └────────────┘   │ (live buffer)│   └──────────────┘
//!                  └──────┬───────┘
//!             ┌───────────┼─────────────┐
//!             ▼           ▼             ▼
//!        ┌─────────┐ ┌─────────┐  ┌──────────┐
//!        │ Drafts  │ │ History │  │  Remote  │
//!        └────┬────┘ └────┬────┘  │ (HTTP)   │
//!             └─────┬─────┘       └──────────┘
//!                   ▼
//!            PersistentStore
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! inkpad edit post.md --ref hot-42     # type a file into a session
//! inkpad history list                  # show saved documents
//! inkpad render post.md > post.html    # preview HTML
//! inkpad export <id> --platform toutiao
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`session`] | Editing session controller |
//! | [`file_store`] | JSON-file persistent store |
//! | [`markdown`] | pulldown-cmark renderer |
//! | [`remote`] | HTTP and offline remote services |
//! | [`logging`] | tracing subscriber setup |
//! | [`edit`] | `inkpad edit` |
//! | [`preview`] | `inkpad render` |
//! | [`history_cmd`] | `inkpad history` |
//! | [`draft_cmd`] | `inkpad draft` |
//! | [`titles`] | `inkpad titles` |
//! | [`export`] | `inkpad export` |

pub mod config;
pub mod draft_cmd;
pub mod edit;
pub mod export;
pub mod file_store;
pub mod history_cmd;
pub mod logging;
pub mod markdown;
pub mod preview;
pub mod remote;
pub mod session;
pub mod titles;
