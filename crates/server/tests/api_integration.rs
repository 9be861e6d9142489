//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use docqa_core::Config;
use docqa_ingest::Chunk;
use docqa_llm::provider::mock::MockLlmProvider;
use docqa_llm::{LlmError, RagPipeline};
use docqa_server::state::AppState;
use docqa_server::{build_router, startup};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "docqa-test-boundary";

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    mock: Arc<MockLlmProvider>,
    dir: TempDir,
}

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.document.upload_path = dir.path().join("uploads").join("document.pdf");
    config
}

fn app_with(mock: MockLlmProvider, configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    configure(&mut config);

    let mock = Arc::new(mock);
    let pipeline = RagPipeline::new(mock.clone(), 3, Duration::from_secs(5));
    let state = Arc::new(AppState::new(&config, pipeline).unwrap());
    let router = build_router(
        state.clone(),
        &config.server,
        config.document.upload_enabled,
    );
    TestApp {
        router,
        state,
        mock,
        dir,
    }
}

fn app() -> TestApp {
    app_with(MockLlmProvider::with_fragments(&["Hel", "lo wor", "ld"]), |_| {})
}

fn chunks(contents: &[&str]) -> Vec<Chunk> {
    contents
        .iter()
        .enumerate()
        .map(|(i, c)| Chunk {
            index: i,
            word_offset: i * 10,
            content: c.to_string(),
        })
        .collect()
}

fn rag_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/rag")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload_request(field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Single-page PDF with one line of Helvetica text.
fn minimal_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 712 Td ({}) Tj ET", text);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>".to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, object) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, object).as_bytes());
    }
    let xref = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .as_bytes(),
    );
    pdf
}

// ── /health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_empty_store() {
    let app = app();
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["state"], "empty");
    assert_eq!(body["chunks"], 0);
    assert!(body["source"].is_null());
}

#[tokio::test]
async fn health_reports_loaded_document() {
    let app = app();
    app.state.store.replace(chunks(&["a", "b"]), "manual.pdf").await;

    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (_, body) = send(&app.router, request).await;

    assert_eq!(body["state"], "ready");
    assert_eq!(body["chunks"], 2);
    assert_eq!(body["source"], "manual.pdf");
    assert!(body["loaded_at"].is_string());
}

// ── /rag ─────────────────────────────────────────────────────────

#[tokio::test]
async fn rag_without_document_never_calls_provider() {
    let app = app();
    let (status, body) = send(&app.router, rag_request(json!({ "query": "anything" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "error": "PDF data not loaded. Please upload a PDF or check server logs." })
    );
    assert_eq!(app.mock.calls(), 0);
}

#[tokio::test]
async fn rag_answers_from_loaded_chunks() {
    let app = app();
    app.state
        .store
        .replace(chunks(&["intro text", "the budget is five", "appendix"]), "report.pdf")
        .await;

    let (status, body) = send(&app.router, rag_request(json!({ "query": "budget" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "answer": "Hello world" }));
    assert_eq!(app.mock.calls(), 1);

    let prompt = &app.mock.prompts()[0];
    assert!(prompt.contains("the budget is five"));
    assert!(prompt.ends_with("Question: budget\nAnswer:"));
}

#[tokio::test]
async fn rag_with_missing_query_is_validation_error() {
    let app = app();
    app.state.store.replace(chunks(&["a"]), "a.pdf").await;

    let (status, body) = send(&app.router, rag_request(json!({ "question": "wrong key" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    assert_eq!(app.mock.calls(), 0);
}

#[tokio::test]
async fn rag_generation_failure_is_reported_as_error() {
    let app = app_with(
        MockLlmProvider::failing(|| LlmError::ApiError {
            status: 503,
            body: "overloaded".into(),
        }),
        |_| {},
    );
    app.state.store.replace(chunks(&["a"]), "a.pdf").await;

    let (status, body) = send(&app.router, rag_request(json!({ "query": "a" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to generate answer"));
    assert!(body.get("answer").is_none());
}

#[tokio::test]
async fn status_code_mode_uses_real_statuses() {
    let app = app_with(
        MockLlmProvider::failing(|| LlmError::AuthError("bad key".into())),
        |config| config.server.error_status_codes = true,
    );

    let (status, _) = send(&app.router, rag_request(json!({ "query": "a" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.state.store.replace(chunks(&["a"]), "a.pdf").await;
    let (status, body) = send(&app.router, rag_request(json!({ "query": "a" }))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
}

// ── /upload ──────────────────────────────────────────────────────

#[tokio::test]
async fn upload_rejects_non_pdf_and_keeps_store() {
    let app = app();
    app.state.store.replace(chunks(&["kept"]), "old.pdf").await;

    let (status, body) = send(&app.router, upload_request("file", "notes.txt", b"hello")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "error": "Only PDF files are supported." }));

    let snapshot = app.state.store.snapshot().await;
    assert_eq!(snapshot.chunks[0].content, "kept");
    assert!(!app.dir.path().join("uploads").join("document.pdf").exists());
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let app = app();
    let (_, body) = send(&app.router, upload_request("attachment", "a.pdf", b"%PDF")).await;
    assert_eq!(body, json!({ "error": "No file provided" }));
}

#[tokio::test]
async fn unparseable_pdf_leaves_previous_chunks_live() {
    let app = app();
    app.state.store.replace(chunks(&["kept"]), "old.pdf").await;

    let (_, body) = send(
        &app.router,
        upload_request("file", "broken.PDF", b"definitely not a pdf"),
    )
    .await;

    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to process PDF"));
    let snapshot = app.state.store.snapshot().await;
    assert_eq!(snapshot.source.as_deref(), Some("old.pdf"));
    assert_eq!(snapshot.chunks.len(), 1);
    assert!(!app.dir.path().join("uploads").join("document.pdf").exists());
}

#[tokio::test]
async fn rejected_upload_keeps_disk_and_store_in_sync() {
    let app = app();
    let upload_path = app.dir.path().join("uploads").join("document.pdf");

    let pdf = minimal_pdf("alpha beta gamma");
    let (_, body) = send(&app.router, upload_request("file", "good.pdf", &pdf)).await;
    assert_eq!(body["chunks"], 1);

    let (_, body) = send(&app.router, upload_request("file", "broken.pdf", b"garbage bytes")).await;
    assert!(body["error"].is_string());

    let snapshot = app.state.store.snapshot().await;
    assert_eq!(snapshot.source.as_deref(), Some("good.pdf"));
    assert!(snapshot.chunks[0].content.contains("alpha"));
    assert_eq!(std::fs::read(&upload_path).unwrap(), pdf);
}

#[tokio::test]
async fn upload_then_ask() {
    let app = app();

    let pdf = minimal_pdf("alpha beta gamma");
    let (status, body) = send(&app.router, upload_request("file", "greek.pdf", &pdf)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "PDF uploaded and processed successfully.");
    assert_eq!(body["chunks"], 1);
    assert!(app.dir.path().join("uploads").join("document.pdf").exists());

    let (_, body) = send(&app.router, rag_request(json!({ "query": "beta" }))).await;
    assert_eq!(body["answer"], "Hello world");
    let prompt = &app.mock.prompts()[0];
    assert!(prompt.contains("alpha"));
    assert!(prompt.contains("gamma"));
}

#[tokio::test]
async fn upload_route_absent_when_disabled() {
    let app = app_with(MockLlmProvider::with_fragments(&["x"]), |config| {
        config.document.upload_enabled = false;
    });
    let response = app
        .router
        .clone()
        .oneshot(upload_request("file", "a.pdf", b"%PDF"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ── startup & CORS ───────────────────────────────────────────────

#[tokio::test]
async fn missing_startup_pdf_is_an_error() {
    let app = app();
    let missing = app.dir.path().join("nope.pdf");
    let err = startup::load_startup_pdf(&app.state, &missing)
        .await
        .unwrap_err();
    assert!(format!("{:#}", err).contains("not found"));
    assert!(app.state.store.snapshot().await.is_empty());
}

#[tokio::test]
async fn startup_pdf_populates_store() {
    let app = app();
    let path = app.dir.path().join("startup.pdf");
    std::fs::write(&path, minimal_pdf("delta epsilon")).unwrap();

    let count = startup::load_startup_pdf(&app.state, &path).await.unwrap();
    assert_eq!(count, 1);
    let snapshot = app.state.store.snapshot().await;
    assert_eq!(snapshot.source.as_deref(), Some("startup.pdf"));
}

#[tokio::test]
async fn default_cors_allows_any_origin() {
    let app = app();
    let request = Request::get("/health")
        .header(header::ORIGIN, "http://example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn cors_allow_list_only_echoes_listed_origins() {
    let app = app_with(MockLlmProvider::with_fragments(&["x"]), |config| {
        config.server.cors_origin = "http://allowed.test".into();
    });

    let allowed = Request::get("/health")
        .header(header::ORIGIN, "http://allowed.test")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(allowed).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://allowed.test"
    );

    let other = Request::get("/health")
        .header(header::ORIGIN, "http://other.test")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(other).await.unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
