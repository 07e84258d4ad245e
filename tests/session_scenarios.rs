//! End-to-end session scenarios through the public API, driven by a
//! manual clock.

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use inkpad::file_store::JsonFileStore;
use inkpad::markdown::PulldownRenderer;
use inkpad::session::{Launch, Phase, RecoveryChoice, Session, SessionSettings};
use inkpad_core::clock::ManualClock;
use inkpad_core::drafts::{DraftManager, DEFAULT_FRESHNESS};
use inkpad_core::error::SessionError;
use inkpad_core::models::DraftContext;
use inkpad_core::remote::{RemoteService, SavePayload, TitleAnalysis};
use inkpad_core::store::memory::MemoryStore;
use inkpad_core::store::PersistentStore;
use tempfile::TempDir;

fn open(
    store: Arc<dyn PersistentStore>,
    clock: &Arc<ManualClock>,
    settings: SessionSettings,
    launch: Launch,
) -> Session {
    Session::open(
        store,
        Arc::new(PulldownRenderer::new()),
        clock.clone(),
        settings,
        launch,
    )
}

fn type_slowly(session: &mut Session, clock: &ManualClock, text: &str, gap_ms: i64) {
    for c in text.chars() {
        session.type_text(&c.to_string()).unwrap();
        clock.advance_ms(gap_ms);
        session.tick();
    }
}

#[test]
fn hot_42_typing_becomes_a_titled_document() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::fixed());
    let mut session = open(
        store.clone(),
        &clock,
        SessionSettings::default(),
        Launch::navigate(Some("hot-42"), None),
    );
    session.set_text("").unwrap();
    type_slowly(&mut session, &clock, "# Hello\n\nWorld", 40);

    clock.advance_ms(3_000);
    let outcome = session.tick();
    assert!(outcome.autosaved);

    let doc = session.document().unwrap();
    assert_eq!(doc.title, "Hello");
    assert_eq!(doc.word_count, 13);
    assert_eq!(doc.external_ref.as_deref(), Some("hot-42"));
    assert!(store.contains_key("draft:hot-42"));
}

#[test]
fn stale_draft_prompts_and_discard_keeps_baseline() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::fixed());
    let drafts = DraftManager::new(store.clone(), clock.clone(), DEFAULT_FRESHNESS);
    drafts.save(&DraftContext::new_document(), "# Old draft", None).unwrap();
    clock.advance(chrono::Duration::hours(2));

    let settings = SessionSettings {
        placeholder: "# Fresh start".to_string(),
        ..SessionSettings::default()
    };
    let mut session = open(store.clone(), &clock, settings, Launch::resume());

    assert_eq!(session.phase(), Phase::Reconciling);
    let prompt = session.recovery_prompt().unwrap();
    assert_eq!(prompt.draft.body, "# Old draft");
    assert_eq!(prompt.baseline, "# Fresh start");

    session.resolve_recovery(RecoveryChoice::Discard).unwrap();
    assert_eq!(session.phase(), Phase::Editing);
    assert_eq!(session.text(), "# Fresh start");
    assert!(!store.contains_key("draft:new"));
}

#[test]
fn expired_draft_is_not_offered() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::fixed());
    let drafts = DraftManager::new(store.clone(), clock.clone(), DEFAULT_FRESHNESS);
    drafts.save(&DraftContext::new_document(), "# Old draft", None).unwrap();
    clock.advance(chrono::Duration::hours(25));

    let session = open(store, &clock, SessionSettings::default(), Launch::resume());
    assert_eq!(session.phase(), Phase::Editing);
    assert!(session.recovery_prompt().is_none());
}

#[test]
fn burst_of_input_renders_once() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::fixed());
    let mut session = open(store, &clock, SessionSettings::default(), Launch::resume());
    let initial = session.render_count();

    type_slowly(&mut session, &clock, "abcdefghij", 50);
    assert_eq!(session.render_count(), initial);
    assert!(session.is_rendering());

    clock.advance_ms(300);
    assert!(session.tick().rendered);
    assert_eq!(session.render_count(), initial + 1);
    assert!(session.html().contains("abcdefghij"));
    assert!(!session.is_rendering());
}

#[test]
fn history_overflow_spares_the_previous_active_document() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::fixed());
    let settings = SessionSettings {
        history_max_count: 3,
        ..SessionSettings::default()
    };
    let mut session = open(store, &clock, settings, Launch::navigate(None, Some("one")));
    let one = session.document_id().unwrap().to_string();
    clock.advance_ms(10);
    let two = session.start_new(Some("two"), None).unwrap();
    clock.advance_ms(10);
    let three = session.start_new(Some("three"), None).unwrap();

    // reopen the oldest, then overflow while it is active
    session.switch_to(&one).unwrap();
    clock.advance_ms(10);
    let four = session.start_new(Some("four"), None).unwrap();

    let history = session.history();
    assert_eq!(history.len(), 3);
    assert!(history.get(&one).is_some());
    assert!(history.get(&two).is_none());
    assert!(history.get(&three).is_some());
    assert_eq!(history.active_id(), Some(four.as_str()));
}

struct FailingRemote;

#[async_trait]
impl RemoteService for FailingRemote {
    async fn save_document(&self, _payload: &SavePayload) -> anyhow::Result<()> {
        bail!("backend unavailable")
    }

    async fn generate_titles(&self, _topic: &str, _count: usize) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn analyze_title(&self, _title: &str) -> anyhow::Result<TitleAnalysis> {
        bail!("backend unavailable")
    }
}

struct HangingRemote;

#[async_trait]
impl RemoteService for HangingRemote {
    async fn save_document(&self, _payload: &SavePayload) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }

    async fn generate_titles(&self, _topic: &str, _count: usize) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn analyze_title(&self, _title: &str) -> anyhow::Result<TitleAnalysis> {
        Ok(TitleAnalysis::default())
    }
}

#[tokio::test]
async fn remote_failure_keeps_local_commit_and_is_retryable() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::fixed());
    let mut session = open(store.clone(), &clock, SessionSettings::default(), Launch::resume());
    session.set_text("# Saved locally\n\nbody").unwrap();

    let err = session.save(&FailingRemote).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(err.to_string().contains("backend unavailable"));

    assert_eq!(session.phase(), Phase::Editing);
    assert_eq!(session.document().unwrap().title, "Saved locally");
    assert!(!store.contains_key("draft:new"));
    assert!(!session.is_dirty());
    assert!(session.next_deadline().is_none());
}

#[tokio::test]
async fn remote_save_times_out() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::fixed());
    let settings = SessionSettings {
        remote_timeout: Duration::from_millis(50),
        ..SessionSettings::default()
    };
    let mut session = open(store, &clock, settings, Launch::resume());
    session.set_text("# Slow").unwrap();

    match session.save(&HangingRemote).await {
        Err(SessionError::RemoteSave { message }) => assert!(message.contains("timed out")),
        other => panic!("expected a remote save error, got {:?}", other.map(|_| ())),
    }
    assert!(session.document().is_some());
}

#[tokio::test]
async fn save_is_refused_while_reconciling() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::fixed());
    let drafts = DraftManager::new(store.clone(), clock.clone(), DEFAULT_FRESHNESS);
    drafts.save(&DraftContext::new_document(), "# Pending", None).unwrap();

    let mut session = open(store, &clock, SessionSettings::default(), Launch::resume());
    assert!(matches!(
        session.save(&FailingRemote).await,
        Err(SessionError::AwaitingRecovery)
    ));
}

#[tokio::test]
async fn abandoned_save_leaves_the_session_editable() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::fixed());
    let mut session = open(store, &clock, SessionSettings::default(), Launch::resume());
    session.set_text("# Abandoned").unwrap();

    // the caller gives up long before the session's own timeout
    let abandoned = tokio::time::timeout(Duration::from_millis(20), session.save(&HangingRemote)).await;
    assert!(abandoned.is_err());

    assert_eq!(session.phase(), Phase::Editing);
    assert_eq!(session.document().unwrap().title, "Abandoned");
    session.type_text(" more").unwrap();
    assert!(session.is_dirty());
}

#[tokio::test]
async fn saving_a_blank_detached_buffer_keeps_the_draft() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::fixed());
    let mut session = open(store.clone(), &clock, SessionSettings::default(), Launch::resume());
    session.set_text("# Keep me").unwrap();
    clock.advance_ms(3_000);
    assert!(session.tick().autosaved);
    let id = session.document_id().unwrap().to_string();

    assert!(session.delete_document(&id).unwrap());
    session.set_text("").unwrap();

    assert!(matches!(
        session.save(&FailingRemote).await,
        Err(SessionError::EmptyDocument)
    ));
    assert!(store.contains_key("draft:new"));
    assert_eq!(session.phase(), Phase::Editing);
    assert!(session.history().is_empty());
}

#[test]
fn work_survives_a_reload_from_disk() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("inkpad.json");
    let clock = Arc::new(ManualClock::fixed());

    let id = {
        let store = Arc::new(JsonFileStore::open(&path).unwrap());
        let mut session = open(store, &clock, SessionSettings::default(), Launch::resume());
        session.set_text("# Persisted\n\ntext").unwrap();
        clock.advance_ms(3_000);
        assert!(session.tick().autosaved);
        session.document_id().unwrap().to_string()
    };

    let store = Arc::new(JsonFileStore::open(&path).unwrap());
    let session = open(store, &clock, SessionSettings::default(), Launch::resume());
    assert_eq!(session.document_id(), Some(id.as_str()));
    assert_eq!(session.text(), "# Persisted\n\ntext");
    assert_eq!(session.phase(), Phase::Editing);
}

#[test]
fn crash_before_autosave_offers_the_draft() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("inkpad.json");
    let clock = Arc::new(ManualClock::fixed());

    {
        let store = Arc::new(JsonFileStore::open(&path).unwrap());
        let mut session = open(store, &clock, SessionSettings::default(), Launch::resume());
        session.set_text("# Unsaved work").unwrap();
        // dropping the session forces a final draft save
    }

    let store = Arc::new(JsonFileStore::open(&path).unwrap());
    let mut session = open(store, &clock, SessionSettings::default(), Launch::resume());
    assert_eq!(session.phase(), Phase::Reconciling);
    session.resolve_recovery(RecoveryChoice::Accept).unwrap();
    assert_eq!(session.text(), "# Unsaved work");
    assert_eq!(session.document().unwrap().title, "Unsaved work");
}
