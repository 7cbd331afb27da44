// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth 2.0 client.
//!
//! Handles:
//! - Building the authorization URL (offline access, forced consent)
//! - Authorization code exchange
//! - Refresh token exchange
//! - Userinfo lookup for the signed-in identity

use crate::config::{Config, GoogleEndpoints};
use crate::error::AppError;
use anyhow::Context;
use serde::Deserialize;

/// Scopes requested at sign-in.
pub const SCOPES: &[&str] = &[
    "openid",
    "email",
    "profile",
    "https://www.googleapis.com/auth/analytics.readonly",
];

/// Build the shared HTTP client used for every call to Google.
pub fn build_http_client(config: &Config) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.google_http_timeout)
        .build()
        .context("failed building Google HTTP client")
}

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    endpoints: GoogleEndpoints,
}

impl GoogleOAuthClient {
    /// Create a new OAuth client with the app's credentials.
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            endpoints: config.google.clone(),
        }
    }

    /// Authorization URL the browser is sent to.
    ///
    /// `access_type=offline` plus `prompt=consent` makes Google issue a
    /// refresh token on every sign-in, not only the first.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
             access_type=offline&prompt=consent&include_granted_scopes=true&state={}",
            self.endpoints.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&SCOPES.join(" ")),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<GoogleTokenResponse, AppError> {
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Token exchange failed: {}", e)))?;

        self.check_token_response(response, "Token exchange").await
    }

    /// Mint a new access token from a refresh token.
    ///
    /// A revoked or expired refresh token comes back as
    /// [`AppError::ProviderTokenExpired`].
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<GoogleTokenResponse, AppError> {
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Token refresh request failed: {}", e)))?;

        self.check_token_response(response, "Token refresh").await
    }

    /// Get the signed-in user's identity.
    pub async fn get_userinfo(&self, access_token: &str) -> Result<GoogleUserInfo, AppError> {
        let response = self
            .http
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(format!("Userinfo request failed: {}", e)))?;

        crate::services::analytics::check_response_json(response).await
    }

    /// Check a token endpoint response and parse it.
    async fn check_token_response(
        &self,
        response: reqwest::Response,
        what: &str,
    ) -> Result<GoogleTokenResponse, AppError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| AppError::GoogleApi(format!("Failed to parse token response: {}", e)));
        }

        let body = response.text().await.unwrap_or_default();
        let error: Option<TokenErrorResponse> = serde_json::from_str(&body).ok();

        match error {
            Some(err) if err.error == "invalid_grant" => {
                let description = err
                    .error_description
                    .unwrap_or_else(|| "Token has been expired or revoked.".to_string());
                tracing::warn!(status = %status, description = %description, "{} rejected grant", what);
                Err(AppError::ProviderTokenExpired(description))
            }
            Some(err) => {
                tracing::error!(status = %status, error = %err.error, "{} failed", what);
                Err(AppError::GoogleApi(format!(
                    "{} failed with status {}: {}",
                    what,
                    status,
                    err.error_description.unwrap_or(err.error)
                )))
            }
            None => {
                tracing::error!(status = %status, body = %body, "{} failed", what);
                Err(AppError::GoogleApi(format!(
                    "{} failed with status {}",
                    what, status
                )))
            }
        }
    }
}

/// Token endpoint response.
#[derive(Clone, Deserialize)]
pub struct GoogleTokenResponse {
    #[serde(default)]
    pub access_token: String,
    /// Only present on consent (and always with `prompt=consent`).
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl GoogleTokenResponse {
    pub fn has_access_token(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    /// The refresh token, if Google returned a non-empty one.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }
}

/// OAuth error body, e.g. `{"error":"invalid_grant","error_description":"..."}`.
#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// OpenID Connect userinfo response.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    /// Stable Google account ID.
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_requests_offline_analytics_access() {
        let config = Config::test_default();
        let client = GoogleOAuthClient::new(&config, reqwest::Client::new());

        let url = client.authorize_url("http://localhost:8080/auth/callback", "st4te");

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=test_client_id.apps.googleusercontent.com"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fcallback"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("analytics.readonly"));
        assert!(url.contains("state=st4te"));
    }

    #[test]
    fn test_token_response_optional_fields() {
        let resp: GoogleTokenResponse =
            serde_json::from_str(r#"{"access_token":"ya29.a","expires_in":3599}"#).unwrap();
        assert!(resp.has_access_token());
        assert_eq!(resp.expires_in, Some(3599));
        assert!(resp.refresh_token().is_none());

        let resp: GoogleTokenResponse =
            serde_json::from_str(r#"{"access_token":"","refresh_token":""}"#).unwrap();
        assert!(!resp.has_access_token());
        assert!(resp.refresh_token().is_none());
    }
}
