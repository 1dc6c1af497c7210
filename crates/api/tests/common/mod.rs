#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use venuebook_api::auth::jwt::JwtConfig;
use venuebook_api::auth::password::hash_password;
use venuebook_api::config::{ServerConfig, StorageBackend};
use venuebook_api::notifications::NotificationRouter;
use venuebook_api::router::build_app_router;
use venuebook_api::state::AppState;
use venuebook_core::roles::Role;
use venuebook_core::types::DbId;
use venuebook_db::models::user::CreateUser;
use venuebook_db::{MemoryStore, UserStore};
use venuebook_events::EventBus;

pub const TEST_PASSWORD: &str = "password123";

/// Build a test `ServerConfig` with safe defaults and the in-memory backend.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        storage_backend: StorageBackend::Memory,
        database_url: None,
        seed_demo_data: false,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
    }
}

/// Build the full application router over `store`, with the notification
/// router running in the background.
///
/// Must be called from inside a Tokio runtime.
pub fn build_test_app(store: Arc<MemoryStore>) -> Router {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());
    tokio::spawn(NotificationRouter::new(store.clone()).run(event_bus.subscribe()));

    let state = AppState {
        store,
        config: Arc::new(config.clone()),
        event_bus,
        decision_lock: Arc::default(),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Account helpers
// ---------------------------------------------------------------------------

/// Sign up through the API and return `(access_token, user_id)`.
pub async fn signup(app: Router, name: &str, email: &str, role: &str) -> (String, DbId) {
    let body = serde_json::json!({
        "name": name,
        "email": email,
        "password": TEST_PASSWORD,
        "role": role,
    });
    let response = post_json(app, "/api/v1/auth/signup", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    (
        json["access_token"].as_str().unwrap().to_string(),
        json["user"]["id"].as_i64().unwrap(),
    )
}

/// Log in through the API and return the full auth response.
pub async fn login(app: Router, email: &str, role: &str) -> Value {
    let body = serde_json::json!({ "email": email, "password": TEST_PASSWORD, "role": role });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

/// Admins cannot sign up, so create one directly in the store and log in.
pub async fn admin_token(app: Router, store: &MemoryStore) -> (String, DbId) {
    let user = store
        .create_user(&CreateUser {
            name: "Admin User".to_string(),
            email: "admin@edu.com".to_string(),
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            role: Role::Admin,
        })
        .await
        .unwrap();
    let json = login(app, "admin@edu.com", "admin").await;
    (json["access_token"].as_str().unwrap().to_string(), user.id)
}

// ---------------------------------------------------------------------------
// Booking helpers
// ---------------------------------------------------------------------------

/// A valid LT1 submission for a single hourly slot.
pub fn venue_booking(slot: &str) -> Value {
    serde_json::json!({
        "venue_id": 1,
        "purpose": "Club Meeting",
        "description": "Weekly meeting of the Robotics Club",
        "attendees": 45,
        "time_slots": [slot],
        "target_audience": "2nd Year",
    })
}

/// Submit a booking and return the created booking JSON.
pub async fn submit(app: Router, token: &str, body: Value) -> Value {
    let response = post_json_auth(app, "/api/v1/bookings", token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// Poll the unread count until it reaches `expected` or a second passes.
///
/// Notifications are written by a background task, so they lag the request
/// that triggered them.
pub async fn wait_for_unread(app: Router, token: &str, expected: i64) -> i64 {
    let mut count = 0;
    for _ in 0..50 {
        let response = get_auth(app.clone(), "/api/v1/notifications/unread-count", token).await;
        count = body_json(response).await["data"]["count"].as_i64().unwrap();
        if count >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    count
}
