// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No valid app session (cookie or bearer JWT).
    #[error("Authentication required")]
    Unauthorized,

    /// The user has an app session but no usable Google token on file.
    #[error("No Google access token available")]
    ProviderTokenMissing,

    /// The stored Google token was rejected and could not be refreshed.
    #[error("Google access token expired or revoked: {0}")]
    ProviderTokenExpired(String),

    /// The user has not picked a GA4 property yet.
    #[error("No property selected")]
    NoPropertySelected,

    #[error("Invalid property ID: {0}")]
    InvalidPropertyId(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Google rejected the access token (HTTP 401).
    #[error("Google rejected the access token")]
    GoogleTokenRejected,

    #[error("Google API error: {0}")]
    GoogleApi(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for failures that should send the client back through Google sign-in.
    pub fn requires_reauthorization(&self) -> bool {
        matches!(
            self,
            AppError::ProviderTokenMissing
                | AppError::ProviderTokenExpired(_)
                | AppError::GoogleTokenRejected
        )
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "not_authenticated",
                Some("No valid session".to_string()),
            ),
            AppError::ProviderTokenMissing => {
                tracing::warn!("Reporting call without a stored Google token");
                (
                    StatusCode::UNAUTHORIZED,
                    "provider_token_missing",
                    Some("No access token available".to_string()),
                )
            }
            AppError::ProviderTokenExpired(msg) => {
                tracing::warn!(error = %msg, "Google token expired and not refreshable");
                (
                    StatusCode::UNAUTHORIZED,
                    "provider_token_expired",
                    Some(msg.clone()),
                )
            }
            AppError::GoogleTokenRejected => {
                tracing::warn!("Google rejected access token");
                (
                    StatusCode::UNAUTHORIZED,
                    "provider_token_expired",
                    Some("Google rejected the access token".to_string()),
                )
            }
            AppError::NoPropertySelected => (
                StatusCode::BAD_REQUEST,
                "no_property_selected",
                Some("No property selected".to_string()),
            ),
            AppError::InvalidPropertyId(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_property_id",
                Some(msg.clone()),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::GoogleApi(msg) => {
                tracing::error!(error = %msg, "Google API error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "analytics_api_error",
                    Some(msg.clone()),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        if self.requires_reauthorization() {
            tracing::info!(error_code = error, "Client must sign in with Google again");
        }

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
