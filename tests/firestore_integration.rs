// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running and are skipped
//! otherwise (FIRESTORE_EMULATOR_HOST unset).

use ga_dashboard::models::{StoredToken, User, UserSettings};

mod common;
use common::test_db;

/// Generate a unique user ID for test isolation.
fn unique_user_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("it-user-{}", nanos)
}

fn test_token(user_id: &str, access: &str, refresh: &str) -> StoredToken {
    StoredToken {
        user_id: user_id.to_string(),
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        expires_at: "2030-01-01T00:00:00Z".to_string(),
        scope: "https://www.googleapis.com/auth/analytics.readonly".to_string(),
        updated_at: chrono::Utc::now().to_rfc3339(),
    }
}

#[tokio::test]
async fn test_user_upsert_and_get() {
    require_emulator!();
    let db = test_db().await;
    let user_id = unique_user_id();

    let user = User {
        user_id: user_id.clone(),
        email: Some("test@example.com".to_string()),
        name: Some("Test User".to_string()),
        picture: None,
        created_at: chrono::Utc::now().to_rfc3339(),
        last_active: chrono::Utc::now().to_rfc3339(),
    };
    db.upsert_user(&user).await.unwrap();

    let fetched = db.get_user(&user_id).await.unwrap().unwrap();
    assert_eq!(fetched.email.as_deref(), Some("test@example.com"));
    assert_eq!(fetched.name.as_deref(), Some("Test User"));
}

#[tokio::test]
async fn test_token_upsert_replaces_and_delete_removes() {
    require_emulator!();
    let db = test_db().await;
    let user_id = unique_user_id();

    db.upsert_token(&test_token(&user_id, "ya29.one", "1//r"))
        .await
        .unwrap();
    db.upsert_token(&test_token(&user_id, "ya29.two", "1//r"))
        .await
        .unwrap();

    let fetched = db.get_token(&user_id).await.unwrap().unwrap();
    assert_eq!(fetched.access_token, "ya29.two");

    db.delete_token(&user_id).await.unwrap();
    assert!(db.get_token(&user_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_settings_round_trip_with_cleared_property() {
    require_emulator!();
    let db = test_db().await;
    let user_id = unique_user_id();

    let mut settings = UserSettings {
        user_id: user_id.clone(),
        ga_property_id: Some("98765".to_string()),
        updated_at: chrono::Utc::now().to_rfc3339(),
    };
    db.upsert_settings(&settings).await.unwrap();
    let fetched = db.get_settings(&user_id).await.unwrap().unwrap();
    assert_eq!(fetched.ga_property_id.as_deref(), Some("98765"));

    settings.ga_property_id = None;
    db.upsert_settings(&settings).await.unwrap();
    let fetched = db.get_settings(&user_id).await.unwrap().unwrap();
    assert!(fetched.ga_property_id.is_none());
}
