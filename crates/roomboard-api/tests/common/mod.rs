#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use roomboard_api::{AppState, AppStateInner};
use roomboard_db::Database;
use roomboard_gateway::{BroadcastScope, Hub};

pub fn test_state(scope: BroadcastScope) -> AppState {
    test_state_with_limit(scope, 1024 * 1024)
}

pub fn test_state_with_limit(scope: BroadcastScope, max_upload_bytes: usize) -> AppState {
    Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        hub: Hub::new(scope),
        upload_dir: temp_upload_dir(),
        max_upload_bytes,
    })
}

pub fn temp_upload_dir() -> PathBuf {
    std::env::temp_dir().join(format!("roomboard-test-{}", Uuid::new_v4()))
}

pub async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn post_message(app: &Router, room_id: &str, content: &str) -> Value {
    let (status, body) = send_json(
        app,
        "POST",
        "/messages",
        Some(serde_json::json!({
            "room_id": room_id,
            "content": content,
            "sender_name": "alice",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create failed: {}", body);
    body
}

pub async fn vote(app: &Router, message_id: &str, user: &str, vote_type: &str) -> (StatusCode, Value) {
    send_json(
        app,
        "POST",
        &format!("/messages/{}/vote", message_id),
        Some(serde_json::json!({ "user_name": user, "vote_type": vote_type })),
    )
    .await
}

/// Message ids as they appear on the push channel.
pub fn wire_id(message: &Value) -> String {
    let id: Uuid = message["id"].as_str().unwrap().parse().unwrap();
    id.simple().to_string()
}
