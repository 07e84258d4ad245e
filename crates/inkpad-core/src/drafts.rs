//! Per-context recovery snapshots.
//!
//! A [`Draft`] is the most recent unsaved edit for one [`DraftContext`],
//! stored under `draft:<context>`. Drafts are best-effort: write failures
//! are logged and swallowed, and a malformed stored draft loads as absent.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::StoreError;
use crate::models::{derive_title, Draft, DraftContext};
use crate::store::{keys, PersistentStore};

/// Default age after which a draft is no longer offered for recovery.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(24 * 60 * 60);

pub struct DraftManager {
    store: Arc<dyn PersistentStore>,
    clock: Arc<dyn Clock>,
    freshness: chrono::Duration,
}

impl DraftManager {
    pub fn new(store: Arc<dyn PersistentStore>, clock: Arc<dyn Clock>, freshness: Duration) -> Self {
        Self {
            store,
            clock,
            freshness: chrono::Duration::from_std(freshness).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Snapshot `body` for `context`.
    ///
    /// Blank bodies are skipped. Returns the draft that was written, or
    /// `None` when nothing was stored.
    pub fn save(&self, context: &DraftContext, body: &str, external_ref: Option<&str>) -> Option<Draft> {
        if body.trim().is_empty() {
            return None;
        }
        let draft = Draft {
            body: body.to_string(),
            external_ref: external_ref.map(str::to_string),
            title: derive_title(body),
            updated_at: self.clock.now(),
        };
        let key = keys::draft(context);
        let result = serde_json::to_string(&draft)
            .map_err(StoreError::from)
            .and_then(|json| self.store.set(&key, &json));
        match result {
            Ok(()) => {
                debug!(%context, "draft saved");
                Some(draft)
            }
            Err(e) => {
                warn!(%key, %context, error = %e, "failed to save draft");
                None
            }
        }
    }

    pub fn load(&self, context: &DraftContext) -> Option<Draft> {
        let key = keys::draft(context);
        match self.store.get(&key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(draft) => Some(draft),
                Err(e) => {
                    warn!(%key, %context, error = %e, "ignoring malformed draft");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(%key, %context, error = %e, "failed to read draft");
                None
            }
        }
    }

    pub fn discard(&self, context: &DraftContext) {
        let key = keys::draft(context);
        if let Err(e) = self.store.remove(&key) {
            warn!(%key, %context, error = %e, "failed to discard draft");
        }
    }

    /// Whether `draft` is younger than the freshness window.
    pub fn is_fresh(&self, draft: &Draft) -> bool {
        self.clock.now() - draft.updated_at < self.freshness
    }

    /// The draft for `context` if it should be offered for recovery: it
    /// differs from `baseline`, is fresh, and is not blank.
    pub fn recovery_candidate(&self, context: &DraftContext, baseline: &str) -> Option<Draft> {
        self.load(context).filter(|draft| {
            draft.body != baseline && self.is_fresh(draft) && !draft.body.trim().is_empty()
        })
    }
}
