//! Editing session controller.
//!
//! A [`Session`] owns the live text buffer and composes the core
//! components around it: the [`HistoryManager`], the [`DraftManager`], the
//! render [`Preview`], and the [`ScrollSync`]. It is driven by a
//! single-threaded host loop:
//!
//! - input methods ([`set_text`](Session::set_text),
//!   [`insert`](Session::insert), [`apply_format`](Session::apply_format),
//!   ...) update the buffer synchronously and (re)start two independent
//!   debouncers, one for rendering and one for auto-save
//! - [`tick`](Session::tick) fires whichever debouncers are due; the host
//!   calls it from its timer, at [`next_deadline`](Session::next_deadline)
//! - [`on_frame`](Session::on_frame) releases the scroll echo guard once
//!   per animation frame
//! - [`save`](Session::save) commits locally and mirrors the document to
//!   the remote service
//!
//! # Phases
//!
//! ```text
//! Initializing ──▶ Reconciling ──▶ Editing ⇄ Persisting ──▶ Closed
//!        └─────────────────────────▲
//! ```
//!
//! `Reconciling` is entered only when a recoverable draft exists for the
//! session's context. Until the host answers it with
//! [`resolve_recovery`](Session::resolve_recovery), input and saves are
//! refused with [`SessionError::AwaitingRecovery`] and nothing is
//! auto-saved.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use inkpad_core::clock::Clock;
use inkpad_core::drafts::{DraftManager, DEFAULT_FRESHNESS};
use inkpad_core::error::SessionError;
use inkpad_core::format::{self, FormatAction, Selection};
use inkpad_core::history::HistoryManager;
use inkpad_core::models::{document_title, reading_minutes, Document, DocumentPatch, Draft, DraftContext};
use inkpad_core::publish::{self, Platform};
use inkpad_core::remote::{RemoteService, SavePayload};
use inkpad_core::render::{MarkdownRenderer, Preview, RenderCache, RenderConfig};
use inkpad_core::scheduler::Debouncer;
use inkpad_core::scroll::{Pane, ScrollCommand, ScrollSync};
use inkpad_core::store::PersistentStore;

/// What to do when the session is opened for an external ref or title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPolicy {
    /// Always start a new document.
    #[default]
    AlwaysCreate,
    /// Reopen the newest document with the same external ref, if any.
    ResumeMatching,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub render_debounce: Duration,
    pub autosave_debounce: Duration,
    pub draft_freshness: Duration,
    pub history_max_count: usize,
    pub on_navigation: NavigationPolicy,
    /// Initial buffer for a document started without a title.
    pub placeholder: String,
    pub render: RenderConfig,
    pub remote_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            render_debounce: Duration::from_millis(300),
            autosave_debounce: Duration::from_millis(3000),
            draft_freshness: DEFAULT_FRESHNESS,
            history_max_count: 50,
            on_navigation: NavigationPolicy::AlwaysCreate,
            placeholder: "# Start writing\n\n".to_string(),
            render: RenderConfig::default(),
            remote_timeout: Duration::from_secs(30),
        }
    }
}

/// How the session was opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Launch {
    /// Discovery-feed item the user navigated from.
    pub external_ref: Option<String>,
    /// Suggested title carried by the navigation.
    pub title: Option<String>,
}

impl Launch {
    /// Open without navigation: resume the last document or start fresh.
    pub fn resume() -> Self {
        Self::default()
    }

    pub fn navigate(external_ref: Option<&str>, title: Option<&str>) -> Self {
        let clean = |s: Option<&str>| {
            s.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            external_ref: clean(external_ref),
            title: clean(title),
        }
    }

    fn is_navigation(&self) -> bool {
        self.external_ref.is_some() || self.title.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Reconciling,
    Editing,
    Persisting,
    Closed,
}

/// A stored draft that differs from what the session opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPrompt {
    pub context: DraftContext,
    pub draft: Draft,
    /// Buffer content the session opened with.
    pub baseline: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryChoice {
    Accept,
    Discard,
}

/// What a [`Session::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub rendered: bool,
    pub autosaved: bool,
}

impl TickOutcome {
    pub fn is_idle(&self) -> bool {
        !self.rendered && !self.autosaved
    }
}

/// Status line for the live buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub chars: usize,
    pub reading_minutes: usize,
    pub phase: Phase,
    pub dirty: bool,
    pub rendering: bool,
}

pub struct Session {
    settings: SessionSettings,
    clock: Arc<dyn Clock>,
    history: HistoryManager,
    drafts: DraftManager,
    preview: Preview,
    scroll: ScrollSync,
    render_timer: Debouncer<()>,
    autosave_timer: Debouncer<()>,
    phase: Phase,
    buffer: String,
    context: DraftContext,
    external_ref: Option<String>,
    document_id: Option<String>,
    recovery: Option<RecoveryPrompt>,
    dirty: bool,
}

impl Session {
    /// Mount a session: load history, pick the document, render it, and
    /// check for a recoverable draft.
    pub fn open(
        store: Arc<dyn PersistentStore>,
        renderer: Arc<dyn MarkdownRenderer>,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
        launch: Launch,
    ) -> Self {
        let history = HistoryManager::load(store.clone(), clock.clone(), settings.history_max_count);
        let drafts = DraftManager::new(store, clock.clone(), settings.draft_freshness);
        let preview = Preview::new(RenderCache::new(renderer), settings.render.clone());
        let render_timer = Debouncer::new(settings.render_debounce, clock.clone());
        let autosave_timer = Debouncer::new(settings.autosave_debounce, clock.clone());

        let mut session = Self {
            settings,
            clock,
            history,
            drafts,
            preview,
            scroll: ScrollSync::new(),
            render_timer,
            autosave_timer,
            phase: Phase::Initializing,
            buffer: String::new(),
            context: DraftContext::new_document(),
            external_ref: None,
            document_id: None,
            recovery: None,
            dirty: false,
        };
        session.mount(launch);
        session
    }

    fn mount(&mut self, launch: Launch) {
        if launch.is_navigation() {
            let resumed = match (&self.settings.on_navigation, &launch.external_ref) {
                (NavigationPolicy::ResumeMatching, Some(r)) => {
                    self.history.find_by_external_ref(r).map(|d| d.id.clone())
                }
                _ => None,
            };
            match resumed {
                Some(id) => self.attach(&id),
                None => {
                    let baseline = match &launch.title {
                        Some(title) => format!("# {}\n\n", title),
                        None => self.settings.placeholder.clone(),
                    };
                    let id = self.history.create(
                        launch.title.as_deref().unwrap_or(""),
                        &baseline,
                        launch.external_ref.as_deref(),
                    );
                    self.buffer = baseline;
                    self.bind(Some(id), launch.external_ref);
                }
            }
        } else {
            let resumed = self
                .history
                .active()
                .or_else(|| self.history.most_recent())
                .map(|d| d.id.clone());
            match resumed {
                Some(id) => self.attach(&id),
                None => {
                    self.buffer = self.settings.placeholder.clone();
                    self.bind(None, None);
                }
            }
        }
        info!(
            document = ?self.document_id,
            context = %self.context,
            "session opened"
        );

        self.preview.render_now(&self.buffer);

        match self.drafts.recovery_candidate(&self.context, &self.buffer) {
            Some(draft) => {
                debug!(context = %self.context, "recoverable draft found");
                self.recovery = Some(RecoveryPrompt {
                    context: self.context.clone(),
                    draft,
                    baseline: self.buffer.clone(),
                });
                self.phase = Phase::Reconciling;
            }
            None => self.phase = Phase::Editing,
        }
    }

    /// Load document `id` into the buffer and make it active.
    fn attach(&mut self, id: &str) {
        let Some(doc) = self.history.get(id) else {
            return;
        };
        self.buffer = doc.body.clone();
        let external_ref = doc.external_ref.clone();
        self.history.set_active(id);
        self.bind(Some(id.to_string()), external_ref);
    }

    fn bind(&mut self, document_id: Option<String>, external_ref: Option<String>) {
        self.context = DraftContext::for_ref(external_ref.as_deref());
        self.external_ref = external_ref;
        self.document_id = document_id;
        self.dirty = false;
    }

    // ── accessors ──────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn html(&self) -> &str {
        self.preview.html()
    }

    pub fn is_rendering(&self) -> bool {
        self.preview.is_rendering()
    }

    /// Number of render passes since the session opened.
    pub fn render_count(&self) -> u64 {
        self.preview.renders()
    }

    pub fn render_config(&self) -> &RenderConfig {
        self.preview.config()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn context(&self) -> &DraftContext {
        &self.context
    }

    pub fn external_ref(&self) -> Option<&str> {
        self.external_ref.as_deref()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document_id.as_deref().and_then(|id| self.history.get(id))
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn recovery_prompt(&self) -> Option<&RecoveryPrompt> {
        self.recovery.as_ref()
    }

    /// Earliest instant at which [`tick`](Session::tick) has work to do.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        [self.render_timer.deadline(), self.autosave_timer.deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// How long the host may sleep before the next [`tick`](Session::tick)
    /// has work. Zero when work is already due.
    pub fn time_until_due(&self) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| (deadline - self.clock.now()).to_std().unwrap_or_default())
    }

    pub fn status(&self) -> Status {
        let chars = self.buffer.chars().count();
        Status {
            chars,
            reading_minutes: reading_minutes(chars),
            phase: self.phase,
            dirty: self.dirty,
            rendering: self.preview.is_rendering(),
        }
    }

    // ── reconciliation ─────────────────────────────────────────

    pub fn resolve_recovery(&mut self, choice: RecoveryChoice) -> Result<(), SessionError> {
        if self.phase == Phase::Closed {
            return Err(SessionError::Closed);
        }
        let prompt = self.recovery.take().ok_or(SessionError::NoRecoveryPending)?;
        match choice {
            RecoveryChoice::Accept => {
                info!(context = %prompt.context, "draft recovered");
                self.buffer = prompt.draft.body;
                if self.external_ref.is_none() {
                    self.external_ref = prompt.draft.external_ref;
                }
                self.commit();
                self.preview.render_now(&self.buffer);
            }
            RecoveryChoice::Discard => {
                info!(context = %prompt.context, "draft discarded");
                self.drafts.discard(&prompt.context);
            }
        }
        self.phase = Phase::Editing;
        Ok(())
    }

    // ── input ──────────────────────────────────────────────────

    fn ensure_editable(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Closed => Err(SessionError::Closed),
            Phase::Reconciling => Err(SessionError::AwaitingRecovery),
            _ => Ok(()),
        }
    }

    /// Buffer changed: mark the preview stale and restart both debouncers.
    fn touched(&mut self) {
        self.dirty = true;
        self.preview.mark_stale();
        self.render_timer.schedule(());
        self.autosave_timer.schedule(());
    }

    /// Replace the whole buffer.
    pub fn set_text(&mut self, text: &str) -> Result<(), SessionError> {
        self.ensure_editable()?;
        if self.buffer != text {
            self.buffer = text.to_string();
            self.touched();
        }
        Ok(())
    }

    /// Insert `text` at byte offset `at`.
    pub fn insert(&mut self, at: usize, text: &str) -> Result<(), SessionError> {
        self.replace_range(at, at, text)
    }

    /// Replace bytes `start..end` with `text`.
    pub fn replace_range(&mut self, start: usize, end: usize, text: &str) -> Result<(), SessionError> {
        self.ensure_editable()?;
        Selection { start, end }.validate(&self.buffer)?;
        self.buffer.replace_range(start..end, text);
        self.touched();
        Ok(())
    }

    /// Append `text` at the end of the buffer.
    pub fn type_text(&mut self, text: &str) -> Result<(), SessionError> {
        let end = self.buffer.len();
        self.replace_range(end, end, text)
    }

    /// Apply a toolbar formatting action. Returns the selection to show
    /// afterwards, or `None` when the action did not apply.
    pub fn apply_format(
        &mut self,
        selection: Selection,
        action: FormatAction,
    ) -> Result<Option<Selection>, SessionError> {
        self.ensure_editable()?;
        match format::apply(&self.buffer, selection, action)? {
            Some(formatted) => {
                self.buffer = formatted.text;
                self.touched();
                Ok(Some(formatted.selection))
            }
            None => Ok(None),
        }
    }

    /// Make `title` the document title: replace the first level-1 heading
    /// of the buffer, or prepend one.
    pub fn apply_title(&mut self, title: &str) -> Result<(), SessionError> {
        self.ensure_editable()?;
        let title = title.trim();
        let heading = format!("# {}", title);
        let mut offset = 0;
        let mut replaced = None;
        for line in self.buffer.split_inclusive('\n') {
            let content = line.trim_end_matches(['\n', '\r']);
            if content == "#" || content.starts_with("# ") {
                replaced = Some((offset, offset + content.len()));
                break;
            }
            offset += line.len();
        }
        match replaced {
            Some((start, end)) => self.buffer.replace_range(start..end, &heading),
            None => self.buffer.insert_str(0, &format!("{}\n\n", heading)),
        }
        self.touched();
        Ok(())
    }

    // ── event loop ─────────────────────────────────────────────

    /// Fire due debounced work against the current buffer.
    pub fn tick(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        if matches!(self.phase, Phase::Closed | Phase::Reconciling) {
            return outcome;
        }
        if self.render_timer.poll().is_some() {
            self.preview.render_now(&self.buffer);
            outcome.rendered = true;
        }
        if self.autosave_timer.poll().is_some() {
            self.autosave();
            outcome.autosaved = true;
        }
        outcome
    }

    /// Animation frame boundary.
    pub fn on_frame(&mut self) {
        self.scroll.on_frame();
    }

    pub fn on_scroll(&mut self, pane: Pane, scroll_top: f64) -> Option<ScrollCommand> {
        self.scroll.on_scroll(pane, scroll_top)
    }

    pub fn resize_pane(&mut self, pane: Pane, scroll_height: f64, client_height: f64) {
        self.scroll.resize(pane, scroll_height, client_height);
    }

    pub fn scroll(&self) -> &ScrollSync {
        &self.scroll
    }

    /// Swap renderer options and re-render immediately.
    pub fn set_render_config(&mut self, config: RenderConfig) -> Result<(), SessionError> {
        if self.phase == Phase::Closed {
            return Err(SessionError::Closed);
        }
        self.render_timer.cancel_all();
        self.preview.reconfigure(config, &self.buffer);
        Ok(())
    }

    // ── persistence ────────────────────────────────────────────

    fn autosave(&mut self) {
        self.drafts
            .save(&self.context, &self.buffer, self.external_ref.as_deref());
        self.commit();
    }

    /// Write the buffer into the session's document, creating it on the
    /// first commit of a fresh session.
    fn commit(&mut self) {
        let title = document_title(&self.buffer);
        let existing = self
            .document_id
            .as_deref()
            .filter(|id| self.history.get(id).is_some())
            .map(str::to_string);
        match existing {
            Some(id) => {
                let mut patch = DocumentPatch::body(self.buffer.clone());
                if !title.is_empty() {
                    patch.title = Some(title);
                }
                patch.external_ref = self.external_ref.clone();
                self.history.update(&id, patch);
            }
            None => {
                if self.buffer.trim().is_empty() {
                    return;
                }
                let id = self
                    .history
                    .create(&title, &self.buffer, self.external_ref.as_deref());
                self.document_id = Some(id);
            }
        }
        self.dirty = false;
    }

    /// Flush pending work into the current document and cancel its timers.
    fn flush_outgoing(&mut self) {
        if self.render_timer.flush().is_some() {
            self.preview.render_now(&self.buffer);
        }
        if self.autosave_timer.flush().is_some() || self.dirty {
            self.autosave();
        }
        self.render_timer.cancel_all();
        self.autosave_timer.cancel_all();
    }

    /// Local half of [`save`](Self::save). `Persisting` only spans this
    /// synchronous part, so a dropped save future cannot strand the phase.
    fn persist_locally(&mut self) -> Result<(String, SavePayload), SessionError> {
        self.phase = Phase::Persisting;
        self.autosave_timer.cancel_all();
        self.commit();

        let Some(id) = self.document_id.clone() else {
            // A blank buffer never gets a document; keep the draft and any
            // pending autosave as they were.
            self.phase = Phase::Editing;
            if self.dirty {
                self.autosave_timer.schedule(());
            }
            return Err(SessionError::EmptyDocument);
        };
        self.drafts.discard(&self.context);
        if self.render_timer.flush().is_some() || self.preview.is_rendering() {
            self.preview.render_now(&self.buffer);
        }
        let payload = SavePayload {
            external_ref: self.external_ref.clone(),
            markdown: self.buffer.clone(),
            html: self.preview.html().to_string(),
        };
        self.phase = Phase::Editing;
        Ok((id, payload))
    }

    /// Explicit save: commit locally, promote the draft, then mirror the
    /// document to `remote`.
    ///
    /// Local state is committed before the remote call. A remote failure
    /// or timeout is returned as a retryable [`SessionError::RemoteSave`]
    /// and leaves local state as committed. A blank buffer with no document
    /// is refused with [`SessionError::EmptyDocument`] and changes nothing.
    pub async fn save(&mut self, remote: &dyn RemoteService) -> Result<String, SessionError> {
        self.ensure_editable()?;
        let (id, payload) = self.persist_locally()?;

        let result = tokio::time::timeout(self.settings.remote_timeout, remote.save_document(&payload)).await;
        match result {
            Ok(Ok(())) => {
                info!(document = %id, "document saved");
                Ok(id)
            }
            Ok(Err(e)) => {
                warn!(document = %id, error = %e, "remote save failed");
                Err(SessionError::RemoteSave {
                    message: format!("{:#}", e),
                })
            }
            Err(_) => {
                warn!(document = %id, timeout = ?self.settings.remote_timeout, "remote save timed out");
                Err(SessionError::RemoteSave {
                    message: format!("timed out after {:?}", self.settings.remote_timeout),
                })
            }
        }
    }

    // ── document management ────────────────────────────────────

    /// Open history document `id` in place of the current one.
    pub fn switch_to(&mut self, id: &str) -> Result<(), SessionError> {
        self.ensure_editable()?;
        if self.history.get(id).is_none() {
            return Err(SessionError::UnknownDocument(id.to_string()));
        }
        self.flush_outgoing();
        self.attach(id);
        self.preview.render_now(&self.buffer);
        debug!(document = id, "switched document");
        Ok(())
    }

    /// Start a new document. Returns its id.
    pub fn start_new(&mut self, title: Option<&str>, external_ref: Option<&str>) -> Result<String, SessionError> {
        self.ensure_editable()?;
        self.flush_outgoing();
        let launch = Launch::navigate(external_ref, title);
        let baseline = match &launch.title {
            Some(t) => format!("# {}\n\n", t),
            None => self.settings.placeholder.clone(),
        };
        let id = self.history.create(
            launch.title.as_deref().unwrap_or(""),
            &baseline,
            launch.external_ref.as_deref(),
        );
        self.buffer = baseline;
        self.bind(Some(id.clone()), launch.external_ref);
        self.preview.render_now(&self.buffer);
        Ok(id)
    }

    /// Delete a history document. Deleting the open document keeps the
    /// buffer but detaches it; the next commit creates a new document.
    pub fn delete_document(&mut self, id: &str) -> Result<bool, SessionError> {
        if self.phase == Phase::Closed {
            return Err(SessionError::Closed);
        }
        if self.document_id.as_deref() == Some(id) {
            self.autosave_timer.cancel_all();
            self.document_id = None;
            self.dirty = true;
        }
        Ok(self.history.remove(id))
    }

    /// The buffer formatted for `platform`.
    pub fn export(&self, platform: Platform) -> String {
        publish::export(&self.buffer, platform)
    }

    /// Tear down: force a final draft save (unless a recovery decision is
    /// pending) and cancel all timers. Idempotent.
    pub fn close(&mut self) {
        if self.phase == Phase::Closed {
            return;
        }
        if self.phase != Phase::Reconciling && self.dirty {
            self.drafts
                .save(&self.context, &self.buffer, self.external_ref.as_deref());
        }
        self.render_timer.cancel_all();
        self.autosave_timer.cancel_all();
        self.phase = Phase::Closed;
        debug!(context = %self.context, "session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
