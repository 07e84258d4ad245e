//! # Inkpad Core
//!
//! Runtime-free building blocks for the Inkpad authoring session: data
//! models, the persistent store abstraction, the debouncer, the render cache,
//! draft and history management, and scroll synchronization.
//!
//! This crate contains no tokio, HTTP, or filesystem I/O. Time comes from an
//! injected [`clock::Clock`] and persistence from a
//! [`store::PersistentStore`], so every component can be driven
//! deterministically from tests or from a host event loop.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Documents, drafts, contexts, and derived fields |
//! | [`store`] | Key/value store trait, key layout, in-memory backend |
//! | [`scheduler`] | Poll-driven debouncer |
//! | [`render`] | Typed render config, renderer trait, memoizing cache, preview state |
//! | [`drafts`] | Per-context recovery snapshots |
//! | [`history`] | Bounded, ordered document collection |
//! | [`echo`] | Suppress-echo guard for mutually observing values |
//! | [`scroll`] | Proportional editor/preview scroll sync |
//! | [`format`] | Markdown formatting actions over a selection |
//! | [`publish`] | Platform-specific export of a document |
//! | [`remote`] | Remote save / title service contract |

pub mod clock;
pub mod drafts;
pub mod echo;
pub mod error;
pub mod format;
pub mod history;
pub mod models;
pub mod publish;
pub mod remote;
pub mod render;
pub mod scheduler;
pub mod scroll;
pub mod store;
