// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage)
//! - Google tokens (one document per user, upsert semantics)
//! - User settings (selected GA4 property)
//!
//! Every write is a whole-document upsert keyed by user ID, so concurrent
//! writers for the same user resolve as last-write-wins.

use crate::db::collections;
use crate::db::memory::MemoryStore;
use crate::error::AppError;
use crate::models::{StoredToken, User, UserSettings};
use std::sync::Arc;

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<MemoryStore>),
    /// Every call fails (tests for storage failures).
    Offline,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    backend: Backend,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create an in-memory store (local development and tests).
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::default())),
        }
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Offline,
        }
    }

    fn offline() -> AppError {
        AppError::Database("Database not connected (offline mode)".to_string())
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by their Google subject.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::USERS)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.users.get(user_id).map(|u| u.clone())),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: User = client
                    .fluent()
                    .update()
                    .in_col(collections::USERS)
                    .document_id(&user.user_id)
                    .object(user)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(store) => {
                store.users.insert(user.user_id.clone(), user.clone());
            }
            Backend::Offline => return Err(Self::offline()),
        }
        Ok(())
    }

    // ─── Token Operations ────────────────────────────────────────

    /// Get the stored Google token for a user.
    pub async fn get_token(&self, user_id: &str) -> Result<Option<StoredToken>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::GOOGLE_TOKENS)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.tokens.get(user_id).map(|t| t.clone())),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Store a user's Google token, replacing any previous one.
    pub async fn upsert_token(&self, token: &StoredToken) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: StoredToken = client
                    .fluent()
                    .update()
                    .in_col(collections::GOOGLE_TOKENS)
                    .document_id(&token.user_id)
                    .object(token)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(store) => {
                store.tokens.insert(token.user_id.clone(), token.clone());
            }
            Backend::Offline => return Err(Self::offline()),
        }
        Ok(())
    }

    /// Delete a user's Google token.
    pub async fn delete_token(&self, user_id: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                client
                    .fluent()
                    .delete()
                    .from(collections::GOOGLE_TOKENS)
                    .document_id(user_id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(store) => {
                store.tokens.remove(user_id);
            }
            Backend::Offline => return Err(Self::offline()),
        }
        Ok(())
    }

    // ─── Settings Operations ─────────────────────────────────────

    /// Get a user's settings.
    pub async fn get_settings(&self, user_id: &str) -> Result<Option<UserSettings>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::USER_SETTINGS)
                .obj()
                .one(user_id)
                .await
                .map_err(|e| AppError::Database(e.to_string())),
            Backend::Memory(store) => Ok(store.settings.get(user_id).map(|s| s.clone())),
            Backend::Offline => Err(Self::offline()),
        }
    }

    /// Create or replace a user's settings.
    pub async fn upsert_settings(&self, settings: &UserSettings) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(client) => {
                let _: UserSettings = client
                    .fluent()
                    .update()
                    .in_col(collections::USER_SETTINGS)
                    .document_id(&settings.user_id)
                    .object(settings)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
            Backend::Memory(store) => {
                store
                    .settings
                    .insert(settings.user_id.clone(), settings.clone());
            }
            Backend::Offline => return Err(Self::offline()),
        }
        Ok(())
    }
}
