// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! High-level Google service: OAuth callback handling and the token gate in
//! front of every Analytics call.
//!
//! Token lifecycle:
//! - every successful code exchange upserts the user's `google_tokens` row
//! - a missing row or empty access token fails closed with
//!   [`AppError::ProviderTokenMissing`]
//! - an expired token with a stored refresh token is refreshed before use
//! - a 401 from Google triggers one refresh and one retry; a second failure
//!   surfaces as [`AppError::ProviderTokenExpired`]

use crate::config::{Config, GoogleEndpoints};
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{StoredToken, User};
use crate::services::analytics::AnalyticsClient;
use crate::services::google_oauth::{GoogleOAuthClient, GoogleTokenResponse, GoogleUserInfo};
use crate::time_utils::format_utc_rfc3339;
use chrono::{Duration, Utc};
use std::future::Future;

/// Lifetime assumed when Google's token response carries no `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Result of handling the OAuth callback.
#[derive(Debug, Clone)]
pub struct OAuthResult {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Google service that manages the token lifecycle and API access.
#[derive(Clone)]
pub struct GoogleService {
    oauth: GoogleOAuthClient,
    http: reqwest::Client,
    endpoints: GoogleEndpoints,
    db: FirestoreDb,
}

impl GoogleService {
    pub fn new(config: &Config, http: reqwest::Client, db: FirestoreDb) -> Self {
        Self {
            oauth: GoogleOAuthClient::new(config, http.clone()),
            http,
            endpoints: config.google.clone(),
            db,
        }
    }

    pub fn oauth(&self) -> &GoogleOAuthClient {
        &self.oauth
    }

    // ─── OAuth Callback Handling ─────────────────────────────────────────────

    /// Exchange the code, resolve the identity, store profile and token.
    pub async fn handle_oauth_callback(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<OAuthResult, AppError> {
        let tokens = self.oauth.exchange_code(code, redirect_uri).await?;

        if !tokens.has_access_token() {
            return Err(AppError::GoogleApi(
                "Token exchange returned no access token".to_string(),
            ));
        }

        let info = self.oauth.get_userinfo(&tokens.access_token).await?;
        if info.sub.is_empty() {
            return Err(AppError::GoogleApi("Userinfo returned no subject".to_string()));
        }

        if let Err(e) = self.record_user(&info).await {
            tracing::warn!(error = %e, "Failed to store user profile, continuing anyway");
        }

        self.store_exchanged_token(&info.sub, &tokens).await?;

        tracing::info!(
            user_id = %info.sub,
            has_refresh_token = tokens.refresh_token().is_some(),
            expires_in = ?tokens.expires_in,
            "OAuth callback handled, user and token stored"
        );

        Ok(OAuthResult {
            user_id: info.sub,
            email: info.email,
            name: info.name,
        })
    }

    /// Create the profile on first sign-in, refresh it afterwards.
    async fn record_user(&self, info: &GoogleUserInfo) -> Result<(), AppError> {
        let now = format_utc_rfc3339(Utc::now());
        let created_at = self
            .db
            .get_user(&info.sub)
            .await?
            .map(|existing| existing.created_at)
            .unwrap_or_else(|| now.clone());

        let user = User {
            user_id: info.sub.clone(),
            email: info.email.clone(),
            name: info.name.clone(),
            picture: info.picture.clone(),
            created_at,
            last_active: now,
        };

        self.db.upsert_user(&user).await
    }

    /// Upsert the user's token from a token endpoint response.
    ///
    /// Google omits the refresh token on some responses; the stored one is
    /// kept in that case so it is never overwritten with nothing.
    pub async fn store_exchanged_token(
        &self,
        user_id: &str,
        tokens: &GoogleTokenResponse,
    ) -> Result<StoredToken, AppError> {
        let previous = match tokens.refresh_token() {
            Some(_) => None,
            None => self.db.get_token(user_id).await?,
        };

        let now = Utc::now();
        let lifetime = tokens
            .expires_in
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        let refresh_token = tokens
            .refresh_token()
            .map(str::to_string)
            .or_else(|| previous.as_ref().map(|p| p.refresh_token.clone()))
            .unwrap_or_default();

        let scope = tokens
            .scope
            .clone()
            .or_else(|| previous.as_ref().map(|p| p.scope.clone()))
            .unwrap_or_default();

        let stored = StoredToken {
            user_id: user_id.to_string(),
            access_token: tokens.access_token.clone(),
            refresh_token,
            expires_at: format_utc_rfc3339(now + Duration::seconds(lifetime)),
            scope,
            updated_at: format_utc_rfc3339(now),
        };

        self.db.upsert_token(&stored).await?;
        Ok(stored)
    }

    // ─── Token Gate ──────────────────────────────────────────────────────────

    /// Stored token for the user, or [`AppError::ProviderTokenMissing`].
    pub async fn require_token(&self, user_id: &str) -> Result<StoredToken, AppError> {
        match self.db.get_token(user_id).await? {
            Some(token) if token.has_access_token() => Ok(token),
            Some(_) => {
                tracing::info!(user_id, "Stored Google token has empty access token");
                Err(AppError::ProviderTokenMissing)
            }
            None => Err(AppError::ProviderTokenMissing),
        }
    }

    /// Exchange the stored refresh token for a new access token and persist it.
    async fn refresh(&self, token: &StoredToken) -> Result<StoredToken, AppError> {
        let user_id = token.user_id.as_str();

        if !token.has_refresh_token() {
            return Err(AppError::ProviderTokenExpired(
                "No refresh token stored; sign in again".to_string(),
            ));
        }

        tracing::info!(user_id, "Refreshing Google access token");

        let response = match self.oauth.refresh_token(&token.refresh_token).await {
            Ok(response) if response.has_access_token() => response,
            Ok(_) => {
                return Err(AppError::ProviderTokenExpired(
                    "Refresh returned no access token".to_string(),
                ))
            }
            Err(AppError::ProviderTokenExpired(reason)) => {
                // The grant is dead (revoked consent or expired refresh token).
                if let Err(e) = self.db.delete_token(user_id).await {
                    tracing::warn!(error = %e, user_id, "Failed to delete revoked token");
                }
                return Err(AppError::ProviderTokenExpired(reason));
            }
            Err(e) => return Err(e),
        };

        let refreshed = self.store_exchanged_token(user_id, &response).await?;
        tracing::info!(user_id, expires_at = %refreshed.expires_at, "Google token refreshed");
        Ok(refreshed)
    }

    /// Run an Analytics call with a token obtained from [`Self::require_token`].
    ///
    /// The closure receives a client bound to the current access token and
    /// may be invoked twice: once with the stored token and, if Google
    /// rejects it, once more after a refresh.
    pub async fn with_analytics<T, F, Fut>(
        &self,
        mut token: StoredToken,
        call: F,
    ) -> Result<T, AppError>
    where
        F: Fn(AnalyticsClient) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let user_id = token.user_id.clone();
        let mut refreshed = false;

        if token.is_expired_at(Utc::now()) && token.has_refresh_token() {
            tracing::info!(user_id = %user_id, "Stored Google token expired");
            token = self.refresh(&token).await?;
            refreshed = true;
        }

        match call(self.analytics_client(&token)).await {
            Err(AppError::GoogleTokenRejected) if !refreshed => {
                tracing::info!(user_id = %user_id, "Google rejected access token, refreshing once");
                let token = self.refresh(&token).await?;
                match call(self.analytics_client(&token)).await {
                    Err(AppError::GoogleTokenRejected) => Err(AppError::ProviderTokenExpired(
                        "Google rejected the refreshed access token".to_string(),
                    )),
                    other => other,
                }
            }
            Err(AppError::GoogleTokenRejected) => Err(AppError::ProviderTokenExpired(
                "Google rejected the refreshed access token".to_string(),
            )),
            other => other,
        }
    }

    /// Per-request client; the access token is passed in, never shared.
    fn analytics_client(&self, token: &StoredToken) -> AnalyticsClient {
        AnalyticsClient::new(self.http.clone(), &self.endpoints, token.access_token.clone())
    }
}
