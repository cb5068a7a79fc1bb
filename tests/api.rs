//! End-to-end API tests with deterministic providers
//!
//! The Ollama providers are swapped for mocks so the full
//! upload -> chunk -> embed -> index -> query path runs without a model
//! server.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use minirag::config::RagConfig;
use minirag::error::Result;
use minirag::providers::{EmbeddingProvider, LlmProvider};
use minirag::server::state::AppState;
use minirag::server::RagServer;

/// Deterministic embedder: character histogram folded into 8 dimensions.
/// Identical text always embeds identically, so retrieval is reproducible.
struct MockEmbedder;

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; 8];
        for (i, b) in text.bytes().enumerate() {
            v[(b as usize + i) % 8] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in v.iter_mut() {
                *x /= norm;
            }
        }
        Ok(v)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// LLM that answers by echoing the retrieved context, so assertions can
/// check grounding without a real model.
struct EchoLlm;

#[async_trait]
impl LlmProvider for EchoLlm {
    async fn generate_answer(&self, _question: &str, context: &str) -> Result<String> {
        Ok(format!("Based on the documents: {}", context))
    }

    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "echo-v0"
    }
}

fn test_config(data_dir: &std::path::Path) -> RagConfig {
    let mut config = RagConfig::default().with_data_dir(data_dir);
    // MockEmbedder produces 8-dimensional vectors.
    config.index.dimensions = 8;
    config
}

fn test_state(data_dir: &std::path::Path) -> AppState {
    AppState::with_providers(
        test_config(data_dir),
        Arc::new(MockEmbedder),
        Arc::new(EchoLlm),
    )
    .unwrap()
}

fn test_router(data_dir: &std::path::Path) -> axum::Router {
    let state = test_state(data_dir);
    RagServer::with_state(test_config(data_dir), state).build_router()
}

fn multipart_upload(filename: &str, content: &[u8]) -> Request<Body> {
    let boundary = "test-boundary-7e58";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

fn query_request(prompt: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/query")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "prompt": prompt }).to_string(),
        ))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_running() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "running");
}

#[tokio::test]
async fn query_before_upload_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    let response = router
        .oneshot(query_request("What color is the sky?"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["detail"],
        "Index not initialized. Upload a document first."
    );
}

#[tokio::test]
async fn upload_then_query_answers_from_document() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    let response = router
        .clone()
        .oneshot(multipart_upload("notes.txt", b"The sky is blue."))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["filename"], "notes.txt");
    assert_eq!(json["status"], "Indexed successfully");

    let response = router
        .oneshot(query_request("What color is the sky?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let answer = json["response"].as_str().unwrap();
    assert!(answer.contains("blue"), "answer should quote the document");
}

#[tokio::test]
async fn unsupported_file_type_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    let response = router
        .oneshot(multipart_upload("archive.zip", b"PK\x03\x04"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert!(json["detail"]
        .as_str()
        .unwrap()
        .contains("Unsupported file type"));
}

#[tokio::test]
async fn duplicate_upload_appends_to_index() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path());
    let router = RagServer::with_state(test_config(dir.path()), state.clone()).build_router();

    let response = router
        .clone()
        .oneshot(multipart_upload("notes.txt", b"The sky is blue."))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let after_first = state.index().len();

    let response = router
        .oneshot(multipart_upload("notes.txt", b"The sky is blue."))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // No dedup: the second upload's chunks land next to the first's.
    assert_eq!(state.index().len(), after_first * 2);
    assert_eq!(state.index().document_count(), 2);
}

#[tokio::test]
async fn index_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let router = test_router(dir.path());
        let response = router
            .oneshot(multipart_upload("facts.md", b"# Facts\n\nOctopuses have three hearts."))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // New state over the same data dir picks up the persisted snapshot.
    let router = test_router(dir.path());
    let response = router
        .oneshot(query_request("How many hearts does an octopus have?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["response"].as_str().unwrap().contains("three hearts"));
}

#[tokio::test]
async fn metrics_endpoint_does_not_track_itself() {
    let dir = tempfile::tempdir().unwrap();
    let router = test_router(dir.path());

    // Drive one tracked request, then scrape twice.
    router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    router
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let response = router
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("rag_requests_total"));
    assert!(!text.contains("path=\"/metrics\""));
}
