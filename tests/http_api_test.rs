//! End-to-end requests against the router: JWT auth, the send/list/read
//! endpoints and JSON error bodies, all over the in-memory stores.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use jsonwebtoken::{encode, EncodingKey, Header};
use tower::ServiceExt;

use chat_service::config::Config;
use chat_service::middleware::auth::Claims;
use chat_service::models::UserId;
use chat_service::routes::build_router;
use chat_service::services::chat_service::ChatService;
use chat_service::services::user_directory::StaticUserDirectory;
use chat_service::state::AppState;
use chat_service::store::memory::{MemoryConversationStore, MemoryMessageStore};

const SECRET: &str = "test-secret";

fn test_state(users: &[&str]) -> AppState {
    let directory = StaticUserDirectory::new(users.iter().map(|u| UserId::new(*u)));
    let chat = ChatService::new(
        Arc::new(MemoryConversationStore::new()),
        Arc::new(MemoryMessageStore::new()),
        Arc::new(directory),
    );
    AppState {
        chat: Arc::new(chat),
        config: Arc::new(Config {
            database_url: "postgres://localhost/test".into(),
            port: 3000,
            jwt_secret: SECRET.into(),
        }),
    }
}

fn bearer(sub: &str) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        exp: chrono::Utc::now().timestamp() + 600,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

fn post_json(uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_open_but_api_requires_auth() {
    let router = build_router(test_state(&["alice", "bob"]));

    let response = router
        .clone()
        .oneshot(get("/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(get("/api/v1/conversations", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = router
        .oneshot(get("/api/v1/conversations", Some("Bearer junk")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn send_then_list_round_trip() {
    let router = build_router(test_state(&["alice", "bob"]));
    let alice = bearer("alice");
    let bob = bearer("bob");

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/messages",
            Some(&alice),
            serde_json::json!({"receiver_id": "bob", "content": "Hello!"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let message = json_body(response).await;
    assert_eq!(message["content"], "Hello!");
    assert_eq!(message["conversation_id"], "conv_alice_bob");
    assert_eq!(message["message_type"], "text");

    // bob sees one conversation with one unread message
    let response = router
        .clone()
        .oneshot(get("/api/v1/conversations", Some(&bob)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summaries = json_body(response).await;
    assert_eq!(summaries.as_array().unwrap().len(), 1);
    assert_eq!(summaries[0]["unread_count"], 1);
    assert_eq!(summaries[0]["other_participant"], "alice");

    // bob pages through the messages
    let response = router
        .clone()
        .oneshot(get(
            "/api/v1/conversations/conv_alice_bob/messages?skip=0&take=10",
            Some(&bob),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let messages = json_body(response).await;
    assert_eq!(messages.as_array().unwrap().len(), 1);

    // bob marks the conversation read
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/conversations/conv_alice_bob/read",
            Some(&bob),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(get("/api/v1/conversations", Some(&bob)))
        .await
        .unwrap();
    let summaries = json_body(response).await;
    assert_eq!(summaries[0]["unread_count"], 0);
}

#[tokio::test]
async fn validation_failures_return_structured_400() {
    let router = build_router(test_state(&["alice", "bob"]));
    let alice = bearer("alice");

    let response = router
        .oneshot(post_json(
            "/api/v1/messages",
            Some(&alice),
            serde_json::json!({"receiver_id": "bob", "content": "   "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error_type"], "validation_error");
}

#[tokio::test]
async fn outsiders_get_403_on_message_listing() {
    let router = build_router(test_state(&["alice", "bob", "mallory"]));
    let alice = bearer("alice");
    let mallory = bearer("mallory");

    router
        .clone()
        .oneshot(post_json(
            "/api/v1/messages",
            Some(&alice),
            serde_json::json!({"receiver_id": "bob", "content": "secret"}),
        ))
        .await
        .unwrap();

    let response = router
        .oneshot(get(
            "/api/v1/conversations/conv_alice_bob/messages",
            Some(&mallory),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn archive_endpoint_toggles_the_flag() {
    let router = build_router(test_state(&["alice", "bob"]));
    let alice = bearer("alice");

    router
        .clone()
        .oneshot(post_json(
            "/api/v1/messages",
            Some(&alice),
            serde_json::json!({"receiver_id": "bob", "content": "hi"}),
        ))
        .await
        .unwrap();

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/conversations/conv_alice_bob/archive",
            Some(&alice),
            serde_json::json!({"archived": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(get("/api/v1/conversations", Some(&alice)))
        .await
        .unwrap();
    let summaries = json_body(response).await;
    assert_eq!(summaries[0]["conversation"]["is_archived"], true);
}
