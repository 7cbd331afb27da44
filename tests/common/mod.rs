// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use ga_dashboard::config::{Config, GoogleEndpoints};
use ga_dashboard::db::FirestoreDb;
use ga_dashboard::middleware::auth::create_jwt;
use ga_dashboard::models::{PropertyId, StoredToken};
use ga_dashboard::routes::create_router;
use ga_dashboard::services::google_oauth::build_http_client;
use ga_dashboard::services::{reporting, GoogleService};
use ga_dashboard::time_utils::format_utc_rfc3339;
use ga_dashboard::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with in-memory storage, Google pointed at `google_base_url`.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(google_base_url: &str) -> (axum::Router, Arc<AppState>) {
    create_test_app_with_db(google_base_url, FirestoreDb::new_in_memory())
}

/// Create a test app with the given database.
#[allow(dead_code)]
pub fn create_test_app_with_db(
    google_base_url: &str,
    db: FirestoreDb,
) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.google = GoogleEndpoints::with_base_url(google_base_url);
    build_app(config, db)
}

/// Create a test app with a specific frontend URL (cookie attribute tests).
#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    build_app(config, FirestoreDb::new_in_memory())
}

fn build_app(config: Config, db: FirestoreDb) -> (axum::Router, Arc<AppState>) {
    let http = build_http_client(&config).expect("HTTP client should build");
    let google = GoogleService::new(&config, http, db.clone());

    let state = Arc::new(AppState { config, db, google });

    (create_router(state.clone()), state)
}

/// Session JWT for `user_id` signed with the app's key.
#[allow(dead_code)]
pub fn session_for(state: &AppState, user_id: &str) -> String {
    create_jwt(user_id, None, &state.config.session_signing_key).unwrap()
}

/// Store a Google token for `user_id` expiring `expires_in_secs` from now.
#[allow(dead_code)]
pub async fn seed_token(
    state: &AppState,
    user_id: &str,
    access_token: &str,
    refresh_token: &str,
    expires_in_secs: i64,
) {
    let now = chrono::Utc::now();
    let token = StoredToken {
        user_id: user_id.to_string(),
        access_token: access_token.to_string(),
        refresh_token: refresh_token.to_string(),
        expires_at: format_utc_rfc3339(now + chrono::Duration::seconds(expires_in_secs)),
        scope: "https://www.googleapis.com/auth/analytics.readonly".to_string(),
        updated_at: format_utc_rfc3339(now),
    };
    state.db.upsert_token(&token).await.unwrap();
}

/// Select a GA4 property for `user_id`.
#[allow(dead_code)]
pub async fn seed_property(state: &AppState, user_id: &str, property_id: &str) {
    let property = PropertyId::parse(property_id).unwrap();
    reporting::select_property(&state.db, user_id, Some(&property))
        .await
        .unwrap();
}

/// Authenticated GET request.
#[allow(dead_code)]
pub fn authed_get(uri: &str, jwt: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("ga_session={}", jwt))
        .body(Body::empty())
        .unwrap()
}

/// Authenticated JSON POST request.
#[allow(dead_code)]
pub fn authed_post_json(uri: &str, jwt: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, format!("ga_session={}", jwt))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// `Location` header of a redirect.
#[allow(dead_code)]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
        .to_string()
}
