// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::settings::is_numeric_id;
use crate::models::PropertyId;
use crate::services::analytics::{AccountSummary, PropertySummary};
use crate::services::reporting::{self, SetupStage};
use crate::services::{ReportRange, RunReportResponse};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/analytics/data", get(get_analytics_data))
        .route("/api/analytics/properties", get(get_properties))
        .route("/api/analytics/select-property", post(select_property))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    /// What the user still has to do before reports are available
    pub stage: SetupStage,
    pub property_id: Option<String>,
}

/// Get current user profile and setup stage.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state.db.get_user(&user.user_id).await?;
    let token = state.db.get_token(&user.user_id).await?;
    let property = reporting::selected_property(&state.db, &user.user_id).await?;

    let stage = SetupStage::from_parts(token.as_ref(), property.as_ref());

    Ok(Json(UserResponse {
        user_id: user.user_id,
        email: profile.as_ref().and_then(|p| p.email.clone()),
        name: profile.as_ref().and_then(|p| p.name.clone()),
        picture: profile.and_then(|p| p.picture),
        stage,
        property_id: property.map(|p| p.as_str().to_string()),
    }))
}

// ─── Analytics Data ──────────────────────────────────────────

#[derive(Deserialize)]
struct DataQuery {
    /// `24h`, `7d` or `28d` (default `7d`)
    range: Option<String>,
}

#[derive(Serialize)]
pub struct AnalyticsDataResponse {
    pub report: RunReportResponse,
    pub property_id: String,
    pub range: ReportRange,
}

/// Sessions report for the selected property.
///
/// Gate order: provider token (401), then selected property (400).
async fn get_analytics_data(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<DataQuery>,
) -> Result<Json<AnalyticsDataResponse>> {
    let token = state.google.require_token(&user.user_id).await?;
    let property = reporting::require_property(&state.db, &user.user_id).await?;
    let range = match params.range.as_deref() {
        Some(raw) => raw.parse::<ReportRange>()?,
        None => ReportRange::default(),
    };

    tracing::debug!(
        user_id = %user.user_id,
        property = %property,
        range = %range,
        "Fetching analytics data"
    );

    let report = state
        .google
        .with_analytics(token, |client| {
            let property = &property;
            async move { client.run_sessions_report(property, range).await }
        })
        .await?;

    Ok(Json(AnalyticsDataResponse {
        report,
        property_id: property.as_str().to_string(),
        range,
    }))
}

// ─── Property Picker ─────────────────────────────────────────

#[derive(Deserialize)]
struct PropertiesQuery {
    #[serde(rename = "accountId")]
    account_id: Option<String>,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum PropertiesResponse {
    Accounts { accounts: Vec<AccountSummary> },
    Properties { properties: Vec<PropertySummary> },
}

/// Without `accountId`, list accounts; with it, list that account's properties.
async fn get_properties(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<PropertiesQuery>,
) -> Result<Json<PropertiesResponse>> {
    let token = state.google.require_token(&user.user_id).await?;

    let account_id = params.account_id.filter(|id| !id.is_empty());
    if let Some(id) = account_id.as_deref() {
        if !is_numeric_id(id) {
            return Err(AppError::BadRequest(
                "Invalid 'accountId' parameter: expected numeric ID".to_string(),
            ));
        }
    }

    let response = match account_id {
        None => {
            let accounts = state
                .google
                .with_analytics(token, |client| async move { client.list_accounts().await })
                .await?;
            PropertiesResponse::Accounts { accounts }
        }
        Some(account_id) => {
            let properties = state
                .google
                .with_analytics(token, |client| {
                    let account_id = account_id.as_str();
                    async move { client.list_properties(account_id).await }
                })
                .await?;
            PropertiesResponse::Properties { properties }
        }
    };

    Ok(Json(response))
}

#[derive(Deserialize)]
struct SelectPropertyRequest {
    /// Numeric string, or `null` to clear the selection. Required.
    #[serde(rename = "propertyId")]
    property_id: serde_json::Value,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Store or clear the user's GA4 property.
async fn select_property(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<SelectPropertyRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>> {
    let Json(request) =
        payload.map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;

    let property = match request.property_id {
        serde_json::Value::Null => None,
        serde_json::Value::String(raw) => Some(PropertyId::parse(&raw).ok_or_else(|| {
            AppError::InvalidPropertyId(
                "Invalid property ID format. Expected numeric ID.".to_string(),
            )
        })?),
        _ => {
            return Err(AppError::InvalidPropertyId(
                "propertyId must be a string or null".to_string(),
            ))
        }
    };

    reporting::select_property(&state.db, &user.user_id, property.as_ref()).await?;

    Ok(Json(SuccessResponse { success: true }))
}
