// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup. On Cloud Run they are injected as
//! environment variables through secret bindings; locally they come from `.env`.

use std::env;
use std::time::Duration;

/// Which storage backend to connect at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Cloud Firestore (or the emulator when FIRESTORE_EMULATOR_HOST is set).
    Firestore,
    /// Process-local maps, lost on restart. Local development only.
    Memory,
}

/// Google endpoints used by the OAuth and Analytics clients.
///
/// Overridable so integration tests can point them at a mock server.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    /// Analytics Data API base, e.g. `https://analyticsdata.googleapis.com/v1beta`
    pub analytics_data_url: String,
    /// Analytics Admin API base, e.g. `https://analyticsadmin.googleapis.com/v1beta`
    pub analytics_admin_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            analytics_data_url: "https://analyticsdata.googleapis.com/v1beta".to_string(),
            analytics_admin_url: "https://analyticsadmin.googleapis.com/v1beta".to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// Point every endpoint at one base URL (mock servers in tests).
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            auth_url: format!("{}/o/oauth2/v2/auth", base),
            token_url: format!("{}/token", base),
            userinfo_url: format!("{}/v1/userinfo", base),
            analytics_data_url: format!("{}/data/v1beta", base),
            analytics_admin_url: format!("{}/admin/v1beta", base),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Frontend URL for post-login redirects (no trailing slash)
    pub frontend_url: String,
    /// Public URL of this API, used to build the OAuth redirect URI
    pub api_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Storage backend selection
    pub storage: StorageBackend,
    /// Timeout for every outbound call to Google
    pub google_http_timeout: Duration,
    /// Google endpoints
    pub google: GoogleEndpoints,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub session_signing_key: Vec<u8>,
    /// HMAC key for the OAuth state parameter
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test_client_id.apps.googleusercontent.com".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            api_url: "http://localhost:8080".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            storage: StorageBackend::Memory,
            google_http_timeout: Duration::from_secs(5),
            google: GoogleEndpoints::default(),
            google_client_secret: "test_secret".to_string(),
            session_signing_key: b"test_session_key_32_bytes_min!!!".to_vec(),
            oauth_state_key: b"test_oauth_state_key_32_bytes!!!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = GoogleEndpoints::default();
        let storage = match env::var("STORAGE").as_deref() {
            Ok("memory") => StorageBackend::Memory,
            Ok("firestore") | Err(_) => StorageBackend::Firestore,
            Ok(_) => return Err(ConfigError::Invalid("STORAGE")),
        };

        Ok(Self {
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            api_url: env::var("API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            storage,
            google_http_timeout: Duration::from_secs(
                env::var("GOOGLE_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            google: GoogleEndpoints {
                auth_url: env::var("GOOGLE_AUTH_URL").unwrap_or(defaults.auth_url),
                token_url: env::var("GOOGLE_TOKEN_URL").unwrap_or(defaults.token_url),
                userinfo_url: env::var("GOOGLE_USERINFO_URL").unwrap_or(defaults.userinfo_url),
                analytics_data_url: env::var("GA_DATA_API_URL")
                    .unwrap_or(defaults.analytics_data_url),
                analytics_admin_url: env::var("GA_ADMIN_API_URL")
                    .unwrap_or(defaults.analytics_admin_url),
            },

            // Secrets - from env (Cloud Run secret bindings in prod)
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            session_signing_key: env::var("SESSION_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("SESSION_SIGNING_KEY"))?
                .into_bytes(),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
        })
    }

    /// Redirect URI registered with Google for the authorization callback.
    pub fn oauth_redirect_uri(&self) -> String {
        format!("{}/auth/callback", self.api_url)
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }

    /// Absolute frontend URL for a path such as `/setup`.
    pub fn frontend_path(&self, path: &str) -> String {
        format!("{}{}", self.frontend_url, path)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
