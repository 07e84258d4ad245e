//! Persistent key/value storage abstraction.
//!
//! The [`PersistentStore`] trait is the only way the core touches durable
//! state. It is deliberately tiny (get, set, remove over string keys) so it
//! can be backed by a JSON file, an embedded database, or an in-memory map.
//!
//! Implementations must be `Send + Sync`; the session shares one store
//! between its draft and history managers.
//!
//! # Key layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `draft:<context>` | JSON [`Draft`](crate::models::Draft) |
//! | `history:list` | JSON array of [`Document`](crate::models::Document) |
//! | `history:active` | Active document id (plain string) |

pub mod memory;

use crate::error::StoreError;
use crate::models::DraftContext;

/// Abstract key/value backend.
///
/// Writes may fail (quota exceeded, medium unavailable). Callers in this
/// crate treat every failure as best-effort: they log and continue.
pub trait PersistentStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Storage keys used by the core.
pub mod keys {
    use super::DraftContext;

    pub const HISTORY_LIST: &str = "history:list";
    pub const HISTORY_ACTIVE: &str = "history:active";
    pub const DRAFT_PREFIX: &str = "draft:";

    pub fn draft(context: &DraftContext) -> String {
        format!("{}{}", DRAFT_PREFIX, context.as_str())
    }
}
