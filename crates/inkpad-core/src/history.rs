//! Bounded, ordered collection of authored documents.
//!
//! The [`HistoryManager`] owns the in-memory list and mirrors every mutation
//! to the [`PersistentStore`] under `history:list` (the whole list as JSON)
//! and `history:active` (the active id). Persistence is best-effort: a failed
//! write is logged and the in-memory state stays authoritative.
//!
//! Ordering and bounds:
//!
//! - The list is always sorted by `updated_at`, newest first. Documents that
//!   tie keep their relative order, except that the one just mutated goes
//!   ahead of its ties.
//! - At most `max_count` documents are kept. Overflow evicts the oldest
//!   documents first but never the active one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::StoreError;
use crate::models::{first_heading, word_count, Document, DocumentPatch};
use crate::store::{keys, PersistentStore};

pub struct HistoryManager {
    store: Arc<dyn PersistentStore>,
    clock: Arc<dyn Clock>,
    max_count: usize,
    documents: Vec<Document>,
    active_id: Option<String>,
}

impl HistoryManager {
    /// Load the persisted history.
    ///
    /// An unreadable or malformed list loads as empty. A stored active id
    /// that no longer names a document is ignored.
    pub fn load(store: Arc<dyn PersistentStore>, clock: Arc<dyn Clock>, max_count: usize) -> Self {
        let mut documents: Vec<Document> = match store.get(keys::HISTORY_LIST) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(docs) => docs,
                Err(e) => {
                    warn!(key = keys::HISTORY_LIST, error = %e, "ignoring malformed history");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = keys::HISTORY_LIST, error = %e, "failed to read history");
                Vec::new()
            }
        };

        let mut seen = std::collections::HashSet::new();
        documents.retain(|d| seen.insert(d.id.clone()));
        documents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let active_id = match store.get(keys::HISTORY_ACTIVE) {
            Ok(id) => id.filter(|id| documents.iter().any(|d| &d.id == id)),
            Err(e) => {
                warn!(key = keys::HISTORY_ACTIVE, error = %e, "failed to read active document");
                None
            }
        };

        let mut history = Self {
            store,
            clock,
            max_count: max_count.max(1),
            documents,
            active_id,
        };
        if history.documents.len() > history.max_count {
            history.evict_overflow(&[]);
            history.persist_list();
        }
        debug!(count = history.documents.len(), "history loaded");
        history
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// All documents, newest first.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Document> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn most_recent(&self) -> Option<&Document> {
        self.documents.first()
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Newest document started from `external_ref`.
    pub fn find_by_external_ref(&self, external_ref: &str) -> Option<&Document> {
        self.documents
            .iter()
            .find(|d| d.external_ref.as_deref() == Some(external_ref))
    }

    /// Add a document at the front of the list and make it active.
    ///
    /// A blank `title` is derived from the first heading of `body`.
    pub fn create(&mut self, title: &str, body: &str, external_ref: Option<&str>) -> String {
        let id = self.fresh_id();
        let now = self.stamp(None);
        let title = if title.trim().is_empty() {
            first_heading(body).unwrap_or_default()
        } else {
            title.to_string()
        };
        self.documents.insert(
            0,
            Document {
                id: id.clone(),
                title,
                body: body.to_string(),
                external_ref: external_ref
                    .filter(|r| !r.trim().is_empty())
                    .map(str::to_string),
                created_at: now,
                updated_at: now,
                word_count: word_count(body),
            },
        );

        let previous: Vec<String> = self.active_id.replace(id.clone()).into_iter().collect();
        self.evict_overflow(&previous);

        debug!(id = %id, "document created");
        self.persist_list();
        self.persist_active();
        id
    }

    /// Merge `patch` into document `id` and re-sort by `updated_at`.
    ///
    /// `updated_at` always advances, even for an empty patch. The sort is
    /// stable, so a document whose stamp ties with its neighbours keeps its
    /// place. Returns `None` for an unknown id.
    pub fn update(&mut self, id: &str, patch: DocumentPatch) -> Option<&Document> {
        let index = self.documents.iter().position(|d| d.id == id)?;
        let stamp = self.stamp(Some(self.documents[index].updated_at));
        let doc = &mut self.documents[index];

        if let Some(title) = patch.title {
            doc.title = title;
        }
        if let Some(body) = patch.body {
            doc.word_count = word_count(&body);
            doc.body = body;
        }
        if doc.external_ref.is_none() {
            doc.external_ref = patch.external_ref.filter(|r| !r.trim().is_empty());
        }
        doc.updated_at = stamp;

        self.documents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.persist_list();
        self.get(id)
    }

    /// Delete document `id`. Deleting the active document clears the active
    /// pointer; no other document is promoted.
    pub fn remove(&mut self, id: &str) -> bool {
        let Some(index) = self.documents.iter().position(|d| d.id == id) else {
            return false;
        };
        self.documents.remove(index);
        self.persist_list();
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
            self.persist_active();
        }
        debug!(id, "document removed");
        true
    }

    /// Case-insensitive substring search over title and body. A blank
    /// keyword matches everything.
    pub fn search(&self, keyword: &str) -> Vec<&Document> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return self.documents.iter().collect();
        }
        self.documents
            .iter()
            .filter(|d| {
                d.title.to_lowercase().contains(&needle) || d.body.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Mark `id` active. Returns `false` for an unknown id.
    pub fn set_active(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.active_id = Some(id.to_string());
        self.persist_active();
        true
    }

    /// Drop every document and the active pointer.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.active_id = None;
        for key in [keys::HISTORY_LIST, keys::HISTORY_ACTIVE] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "failed to clear history");
            }
        }
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Timestamp for a mutation: never earlier than the newest document or
    /// the document's own previous stamp.
    fn stamp(&self, previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
        let now = self.clock.now();
        let floor = self
            .documents
            .first()
            .map(|d| d.updated_at)
            .into_iter()
            .chain(previous)
            .max();
        match floor {
            Some(floor) if floor > now => floor,
            _ => now,
        }
    }

    /// Evict from the oldest end until within `max_count`. The active
    /// document and `protected` ids are skipped; if nothing else is left,
    /// only the active document is spared.
    fn evict_overflow(&mut self, protected: &[String]) {
        while self.documents.len() > self.max_count {
            let active = self.active_id.as_deref();
            let spared = |d: &Document| {
                Some(d.id.as_str()) == active || protected.iter().any(|p| p == &d.id)
            };
            let victim = self
                .documents
                .iter()
                .rposition(|d| !spared(d))
                .or_else(|| {
                    self.documents
                        .iter()
                        .rposition(|d| Some(d.id.as_str()) != active)
                });
            match victim {
                Some(index) => {
                    let evicted = self.documents.remove(index);
                    debug!(id = %evicted.id, "evicted from history");
                }
                None => break,
            }
        }
    }

    fn persist_list(&self) {
        let result = serde_json::to_string(&self.documents)
            .map_err(StoreError::from)
            .and_then(|json| self.store.set(keys::HISTORY_LIST, &json));
        if let Err(e) = result {
            warn!(key = keys::HISTORY_LIST, error = %e, "failed to persist history");
        }
    }

    fn persist_active(&self) {
        let result = match &self.active_id {
            Some(id) => self.store.set(keys::HISTORY_ACTIVE, id),
            None => self.store.remove(keys::HISTORY_ACTIVE),
        };
        if let Err(e) = result {
            warn!(key = keys::HISTORY_ACTIVE, error = %e, "failed to persist active document");
        }
    }
}
