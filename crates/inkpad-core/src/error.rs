//! Error taxonomy shared by the core components.
//!
//! Storage and render failures are recovered locally by the components that
//! hit them; only [`SessionError`] is meant to reach a user.

use thiserror::Error;

/// Failure reported by a [`PersistentStore`](crate::store::PersistentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing medium refused the write because it is full.
    #[error("storage quota exceeded writing '{key}': {needed} bytes needed, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    /// The backing medium could not be read or written.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure reported by a [`MarkdownRenderer`](crate::render::MarkdownRenderer).
#[derive(Debug, Error)]
#[error("render failed: {0}")]
pub struct RenderError(pub String);

/// Errors surfaced by the editing session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Input or persistence was attempted before the draft recovery
    /// prompt was answered.
    #[error("a draft recovery decision is pending")]
    AwaitingRecovery,

    #[error("no draft recovery decision is pending")]
    NoRecoveryPending,

    #[error("session is closed")]
    Closed,

    #[error("unknown document: {0}")]
    UnknownDocument(String),

    /// Save was asked for a blank buffer with no document behind it.
    #[error("nothing to save: the buffer is empty")]
    EmptyDocument,

    #[error("edit range {start}..{end} is not valid for a buffer of {len} bytes")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// The remote mirror rejected or never answered the save. Local state
    /// has already been committed.
    #[error("remote save failed: {message}")]
    RemoteSave { message: String },
}

impl SessionError {
    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::RemoteSave { .. })
    }
}
