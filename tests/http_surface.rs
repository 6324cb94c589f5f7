//! End-to-end HTTP surface tests driven through `tower::ServiceExt::oneshot`
//! against in-memory store/blob/identity doubles and a stub chat provider —
//! no live DynamoDB/S3/Cognito/Bedrock is required.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use rag_chat_gateway::config::Config;
use rag_chat_gateway::identity::memory::MemoryIdentity;
use rag_chat_gateway::providers::testing::StubProvider;
use rag_chat_gateway::state::AppState;
use rag_chat_gateway::store::memory::{MemoryBlobStore, MemoryKvStore};

fn test_app() -> axum::Router {
    let state = AppState::new(
        Arc::new(MemoryKvStore::new()),
        Arc::new(MemoryBlobStore::new()),
        Arc::new(MemoryIdentity::new()),
        Arc::new(StubProvider::default()),
        Arc::new(StubProvider::default()),
        Arc::new(Config::default()),
    );
    rag_chat_gateway::create_router(state)
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = test_app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn models_endpoint_lists_registry_entries() {
    let app = test_app();
    let request = Request::builder().uri("/models").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["models"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn options_preflight_is_handled_without_routing_to_a_handler() {
    let app = test_app();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/chat")
        .header("origin", "https://example.com")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn chat_without_bearer_token_is_unauthorized() {
    let app = test_app();
    let request = json_request(
        "POST",
        "/chat",
        json!({ "model": "gemini-3-flash-preview", "messages": [{"role": "user", "content": "hi"}] }),
    );
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_then_chat_turn_persists_a_conversation() {
    let app = test_app();

    let signup_request = json_request(
        "POST",
        "/auth/signup",
        json!({ "email": "alice@example.com", "password": "password123", "name": "Alice" }),
    );
    let (status, signup_body) = send(app.clone(), signup_request).await;
    assert_eq!(status, StatusCode::OK);
    let user_id = signup_body["userId"].as_str().unwrap().to_string();

    let chat_request = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {user_id}"))
        .body(Body::from(
            json!({
                "model": "us.anthropic.claude-sonnet-4-5-20250929-v1:0",
                "messages": [{"role": "user", "content": "How old is Alice?"}],
                "saveHistory": true,
            })
            .to_string(),
        ))
        .unwrap();
    let (status, chat_body) = send(app.clone(), chat_request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chat_body["provider"], "bedrock");
    let conversation_id = chat_body["conversationId"].as_str().unwrap().to_string();

    let get_request = Request::builder()
        .uri(format!("/conversations/{conversation_id}"))
        .body(Body::empty())
        .unwrap();
    let (status, conv_body) = send(app, get_request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(conv_body["conversation"]["messageCount"], 2);
}

#[tokio::test]
async fn admin_users_rejects_plain_user_role() {
    let app = test_app();

    let signup_request = json_request(
        "POST",
        "/auth/signup",
        json!({ "email": "bob@example.com", "password": "password123", "name": "Bob" }),
    );
    let (_, signup_body) = send(app.clone(), signup_request).await;
    let user_id = signup_body["userId"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri("/admin/users")
        .header("authorization", format!("Bearer {user_id}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
