//! `HttpRemote` against an in-process axum backend.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use inkpad::config::RemoteConfig;
use inkpad::markdown::PulldownRenderer;
use inkpad::remote::HttpRemote;
use inkpad::session::{Launch, Session, SessionSettings};
use inkpad_core::clock::ManualClock;
use inkpad_core::remote::RemoteService;
use inkpad_core::store::memory::MemoryStore;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Backend {
    saved: Arc<Mutex<Vec<Value>>>,
    fail_saves: bool,
}

async fn save(State(backend): State<Backend>, Json(body): Json<Value>) -> StatusCode {
    if backend.fail_saves {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    backend.saved.lock().unwrap().push(body);
    StatusCode::OK
}

async fn generate(Json(body): Json<Value>) -> Json<Value> {
    let topic = body["article"].as_str().unwrap_or_default().to_string();
    let count = body["count"].as_u64().unwrap_or(0) as usize;
    let titles: Vec<Value> = (1..=count)
        .map(|i| json!({ "title": format!("{topic} #{i}") }))
        .collect();
    Json(json!({ "code": 0, "message": "ok", "data": { "titles": titles } }))
}

async fn analyze(Json(body): Json<Value>) -> Json<Value> {
    if body["title"] == "forbidden" {
        return Json(json!({ "code": 40001, "message": "rejected by moderation", "data": null }));
    }
    Json(json!({
        "code": 0,
        "message": "ok",
        "data": {
            "psychology": ["curiosity gap"],
            "elements": [{ "text": "3", "category": "number", "explain": "concrete" }],
            "routine": "number + promise"
        }
    }))
}

async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/creation", post(save))
        .route("/api/generate/titles", post(generate))
        .route("/api/titles/analyze", post(analyze))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn remote(base_url: String) -> HttpRemote {
    HttpRemote::new(&RemoteConfig {
        base_url,
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn session_save_posts_markdown_and_html() {
    let backend = Backend::default();
    let base_url = spawn_backend(backend.clone()).await;
    let remote = remote(base_url);

    let clock = Arc::new(ManualClock::fixed());
    let mut session = Session::open(
        Arc::new(MemoryStore::new()),
        Arc::new(PulldownRenderer::new()),
        clock,
        SessionSettings::default(),
        Launch::navigate(Some("hot-42"), Some("Hello")),
    );
    session.type_text("World").unwrap();
    let id = session.save(&remote).await.unwrap();
    assert_eq!(session.document_id(), Some(id.as_str()));

    let saved = backend.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0]["hotId"], "hot-42");
    assert_eq!(saved[0]["markdown"], "# Hello\n\nWorld");
    assert!(saved[0]["html"].as_str().unwrap().contains("Hello</h1>"));
}

#[tokio::test]
async fn http_error_becomes_retryable_session_error() {
    let backend = Backend {
        fail_saves: true,
        ..Backend::default()
    };
    let base_url = spawn_backend(backend).await;
    let remote = remote(base_url);

    let mut session = Session::open(
        Arc::new(MemoryStore::new()),
        Arc::new(PulldownRenderer::new()),
        Arc::new(ManualClock::fixed()),
        SessionSettings::default(),
        Launch::resume(),
    );
    session.set_text("# Kept").unwrap();
    let err = session.save(&remote).await.unwrap_err();
    assert!(err.is_retryable());
    assert!(err.to_string().contains("500"));
    assert_eq!(session.document().unwrap().body, "# Kept");
}

#[tokio::test]
async fn generate_titles_unwraps_envelope() {
    let base_url = spawn_backend(Backend::default()).await;
    let titles = remote(base_url).generate_titles("rust", 3).await.unwrap();
    assert_eq!(titles, vec!["rust #1", "rust #2", "rust #3"]);
}

#[tokio::test]
async fn analyze_title_fills_defaults_and_reports_business_errors() {
    let base_url = spawn_backend(Backend::default()).await;
    let remote = remote(base_url);

    let analysis = remote.analyze_title("3 ways to win").await.unwrap();
    assert_eq!(analysis.title, "3 ways to win");
    assert_eq!(analysis.psychology, vec!["curiosity gap"]);
    assert_eq!(analysis.elements[0].category, "number");
    assert!(analysis.scenario.is_empty());

    let err = remote.analyze_title("forbidden").await.unwrap_err();
    assert!(err.to_string().contains("rejected by moderation"));
}

#[tokio::test]
async fn unreachable_backend_is_an_error() {
    // bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = remote(format!("http://{}", addr)).generate_titles("x", 1).await;
    assert!(result.is_err());
}
