// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in routes.
//!
//! The callback never returns an error body: every failure lands the browser
//! on the frontend's `/login` page.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::middleware::auth::{
    create_jwt, oauth_nonce_cookie, removal_cookie, session_cookie, OAUTH_NONCE_COOKIE,
    SESSION_COOKIE,
};
use crate::services::oauth_state::{generate_nonce, sign_state, verify_state};
use crate::services::reporting;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", get(auth_start))
        .route("/auth/callback", get(auth_callback))
        .route("/auth/logout", get(logout_redirect).post(logout))
}

/// 302 Found to `location`.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn now_millis() -> u128 {
    chrono::Utc::now().timestamp_millis().max(0) as u128
}

/// Start OAuth flow - redirect to Google's consent screen.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Response)> {
    let nonce = generate_nonce()?;
    let oauth_state = sign_state(&nonce, now_millis(), &state.config.oauth_state_key)?;

    let auth_url = state
        .google
        .oauth()
        .authorize_url(&state.config.oauth_redirect_uri(), &oauth_state);

    tracing::info!(
        redirect_uri = %state.config.oauth_redirect_uri(),
        "Starting OAuth flow, redirecting to Google"
    );

    let jar = jar.add(oauth_nonce_cookie(nonce, state.config.secure_cookies()));
    Ok((jar, found(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens, create session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Response) {
    let login_url = state.config.frontend_path("/login");

    // The nonce is single-use whatever the outcome.
    let nonce = jar.get(OAUTH_NONCE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(removal_cookie(
        OAUTH_NONCE_COOKIE,
        "/auth",
        state.config.secure_cookies(),
    ));

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return (jar, found(&login_url));
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        tracing::warn!("OAuth callback without authorization code");
        return (jar, found(&login_url));
    };

    let state_valid = match (params.state.as_deref(), nonce.as_deref()) {
        (Some(oauth_state), Some(nonce)) => verify_state(
            oauth_state,
            nonce,
            now_millis(),
            &state.config.oauth_state_key,
        ),
        _ => false,
    };
    if !state_valid {
        tracing::warn!("Invalid or missing OAuth state, refusing callback");
        return (jar, found(&login_url));
    }

    tracing::info!("Exchanging authorization code for tokens");

    let oauth_result = match state
        .google
        .handle_oauth_callback(&code, &state.config.oauth_redirect_uri())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "OAuth callback failed");
            return (jar, found(&login_url));
        }
    };

    let jwt = match create_jwt(
        &oauth_result.user_id,
        oauth_result.email.as_deref(),
        &state.config.session_signing_key,
    ) {
        Ok(jwt) => jwt,
        Err(e) => {
            tracing::error!(error = %e, "JWT creation failed");
            return (jar, found(&login_url));
        }
    };

    // Users who already picked a property go straight to the dashboard.
    let destination = match reporting::selected_property(&state.db, &oauth_result.user_id).await {
        Ok(Some(_)) => "/dashboard",
        Ok(None) => "/setup",
        Err(e) => {
            tracing::warn!(error = %e, "Settings lookup failed, sending user to setup");
            "/setup"
        }
    };

    tracing::info!(
        user_id = %oauth_result.user_id,
        name = oauth_result.name.as_deref().unwrap_or(""),
        destination,
        "Sign-in complete"
    );

    let jar = jar.add(session_cookie(jwt, state.config.secure_cookies()));
    (jar, found(&state.config.frontend_path(destination)))
}

/// Sign out (API clients): clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let secure = state.config.secure_cookies();
    (
        jar.remove(removal_cookie(SESSION_COOKIE, "/", secure)),
        StatusCode::NO_CONTENT,
    )
}

/// Sign out (browser navigation): clear the session cookie and go to login.
async fn logout_redirect(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Response) {
    let jar = jar.remove(removal_cookie(
        SESSION_COOKIE,
        "/",
        state.config.secure_cookies(),
    ));
    (jar, found(&state.config.frontend_path("/login")))
}
