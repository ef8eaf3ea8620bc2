//! API Integration Tests
//!
//! Drive the router in-process with mock providers; no network access.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use profrag_api::{create_router, create_router_for_testing, state::AppState};
use profrag_core::config::AppConfig;
use profrag_core::testing::{ScriptedChat, StaticEmbedder, StaticIndex};
use profrag_rag::ProfessorRag;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn router_with(embedder: StaticEmbedder, index: StaticIndex, chat: ScriptedChat) -> Router {
    let mut config = AppConfig::default();
    config.openai.api_key = Some("test-openai-key".to_string());
    config.pinecone.api_key = Some("test-pinecone-key".to_string());

    let rag = ProfessorRag::new(
        Arc::new(embedder),
        Arc::new(index),
        Arc::new(chat),
        config.rag.clone(),
    );
    create_router(Arc::new(AppState::new(config, rag)))
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_readiness_check() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["ready"], true);
    assert_eq!(json["checks"]["vector_index"], "rag");
}

#[tokio::test]
async fn test_readiness_without_keys() {
    let config = AppConfig::default();
    let rag = ProfessorRag::new(
        Arc::new(StaticEmbedder::default()),
        Arc::new(StaticIndex::default()),
        Arc::new(ScriptedChat::default()),
        config.rag.clone(),
    );
    let app = create_router(Arc::new(AppState::new(config, rag)));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["ready"], false);
    assert_eq!(json["checks"]["openai_configured"], false);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["uptime_seconds"].is_number());
    assert!(json["total_requests"].is_number());
    assert!(json["failed_requests"].is_number());
    assert!(json["requests_per_second"].is_number());
}

#[tokio::test]
async fn test_metrics_count_failures() {
    let app = create_router_for_testing();

    let response = app
        .clone()
        .oneshot(create_json_request("POST", "/api/chat", Some(json!([]))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["total_requests"], 2);
    assert_eq!(json["failed_requests"], 1);
}

#[tokio::test]
async fn test_openapi_document() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/api/chat"]["post"].is_object());
}

// =============================================================================
// Chat API Tests
// =============================================================================

#[tokio::test]
async fn test_chat_streams_plain_text() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/chat",
        Some(json!([
            { "role": "user", "content": "best professor for algorithms?" }
        ])),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert!(response.headers().contains_key("x-request-id"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"Dr. X is great");
}

#[tokio::test]
async fn test_chat_with_history() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/chat",
        Some(json!([
            { "role": "system", "content": "be brief" },
            { "role": "user", "content": "I study CS" },
            { "role": "assistant", "content": "Which course?" },
            { "role": "user", "content": "Databases" }
        ])),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_chat_empty_conversation() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(create_json_request("POST", "/api/chat", Some(json!([]))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_chat_blank_last_message() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/chat",
        Some(json!([{ "role": "user", "content": "   " }])),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_malformed_json() {
    let app = create_router_for_testing();

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_chat_unknown_role() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/chat",
        Some(json!([{ "role": "tool", "content": "hi" }])),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_embedding_failure() {
    let app = router_with(
        StaticEmbedder::failing(),
        StaticIndex::default(),
        ScriptedChat::default(),
    );

    let request = create_json_request(
        "POST",
        "/api/chat",
        Some(json!([{ "role": "user", "content": "q" }])),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UPSTREAM_ERROR");
    assert!(json["details"].as_str().unwrap().contains("Embedding"));
}

#[tokio::test]
async fn test_chat_completion_rejected() {
    let app = router_with(
        StaticEmbedder::default(),
        StaticIndex::default(),
        ScriptedChat::failing(),
    );

    let request = create_json_request(
        "POST",
        "/api/chat",
        Some(json!([{ "role": "user", "content": "q" }])),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_chat_mid_stream_failure_truncates_body() {
    let app = router_with(
        StaticEmbedder::default(),
        StaticIndex::default(),
        ScriptedChat::new(["Dr. ", "A"]).then_error("connection reset"),
    );

    let request = create_json_request(
        "POST",
        "/api/chat",
        Some(json!([{ "role": "user", "content": "q" }])),
    );

    let response = app.oneshot(request).await.unwrap();

    // Headers were already committed when the failure happened
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await;
    assert!(body.is_err());
}
