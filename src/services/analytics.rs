// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Analytics 4 Data and Admin API client.
//!
//! A client is built per request around one access token; nothing about the
//! caller's credentials outlives the request.

use crate::config::GoogleEndpoints;
use crate::error::AppError;
use crate::models::PropertyId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Admin API page size for account/property listings.
const ADMIN_PAGE_SIZE: u32 = 200;
/// Upper bound on pages followed for one listing.
const MAX_ADMIN_PAGES: usize = 10;

/// Time window of the sessions report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ReportRange {
    #[serde(rename = "24h")]
    Last24Hours,
    #[default]
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "28d")]
    Last28Days,
}

impl ReportRange {
    /// `(startDate, endDate)` in the Data API's relative date syntax.
    fn date_range(self) -> (&'static str, &'static str) {
        match self {
            ReportRange::Last24Hours => ("yesterday", "today"),
            ReportRange::Last7Days => ("7daysAgo", "yesterday"),
            ReportRange::Last28Days => ("28daysAgo", "yesterday"),
        }
    }

    /// Hourly buckets for the last day, daily otherwise.
    fn dimension(self) -> &'static str {
        match self {
            ReportRange::Last24Hours => "dateHour",
            ReportRange::Last7Days | ReportRange::Last28Days => "date",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportRange::Last24Hours => "24h",
            ReportRange::Last7Days => "7d",
            ReportRange::Last28Days => "28d",
        }
    }
}

impl fmt::Display for ReportRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportRange {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(ReportRange::Last24Hours),
            "7d" => Ok(ReportRange::Last7Days),
            "28d" => Ok(ReportRange::Last28Days),
            other => Err(AppError::BadRequest(format!(
                "Invalid 'range' parameter '{}': expected 24h, 7d or 28d",
                other
            ))),
        }
    }
}

// ─── Data API types ──────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReportRequest<'a> {
    dimensions: [NamedField<'a>; 1],
    metrics: [NamedField<'a>; 1],
    date_ranges: [DateRange<'a>; 1],
    order_bys: [OrderBy<'a>; 1],
    keep_empty_rows: bool,
}

#[derive(Serialize)]
struct NamedField<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DateRange<'a> {
    start_date: &'a str,
    end_date: &'a str,
}

#[derive(Serialize)]
struct OrderBy<'a> {
    dimension: DimensionOrderBy<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DimensionOrderBy<'a> {
    dimension_name: &'a str,
}

/// `runReport` response, re-serialized in the Data API's own shape.
///
/// The API omits `rows` when there is no data; here it is always present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    pub dimension_headers: Vec<DimensionHeader>,
    #[serde(default)]
    pub metric_headers: Vec<MetricHeader>,
    #[serde(default)]
    pub rows: Vec<ReportRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DimensionHeader {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricHeader {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[serde(default)]
    pub dimension_values: Vec<ReportValue>,
    #[serde(default)]
    pub metric_values: Vec<ReportValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportValue {
    #[serde(default)]
    pub value: String,
}

// ─── Admin API types ─────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListAccountsResponse {
    #[serde(default)]
    accounts: Vec<AdminResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPropertiesResponse {
    #[serde(default)]
    properties: Vec<AdminResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminResource {
    /// Resource name, e.g. `accounts/123` or `properties/456`
    #[serde(default)]
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    create_time: Option<String>,
    #[serde(default)]
    update_time: Option<String>,
}

impl AdminResource {
    /// Numeric ID after the collection prefix.
    fn id(&self) -> String {
        self.name
            .split_once('/')
            .map(|(_, id)| id.to_string())
            .unwrap_or_default()
    }

    fn label(&self) -> String {
        self.display_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// GA account as listed for the property picker.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub full_name: String,
}

/// GA4 property as listed for the property picker.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PropertySummary {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

// ─── Client ──────────────────────────────────────────────────

/// Analytics API client bound to one access token.
pub struct AnalyticsClient {
    http: reqwest::Client,
    data_url: String,
    admin_url: String,
    access_token: String,
}

impl AnalyticsClient {
    pub fn new(
        http: reqwest::Client,
        endpoints: &GoogleEndpoints,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            data_url: endpoints.analytics_data_url.clone(),
            admin_url: endpoints.analytics_admin_url.clone(),
            access_token: access_token.into(),
        }
    }

    /// Sessions per day (or per hour for `24h`) for a property.
    pub async fn run_sessions_report(
        &self,
        property: &PropertyId,
        range: ReportRange,
    ) -> Result<RunReportResponse, AppError> {
        let url = format!("{}/{}:runReport", self.data_url, property.resource_name());
        let (start_date, end_date) = range.date_range();
        let dimension = range.dimension();

        let body = RunReportRequest {
            dimensions: [NamedField { name: dimension }],
            metrics: [NamedField { name: "sessions" }],
            date_ranges: [DateRange {
                start_date,
                end_date,
            }],
            order_bys: [OrderBy {
                dimension: DimensionOrderBy {
                    dimension_name: dimension,
                },
            }],
            keep_empty_rows: true,
        };

        tracing::debug!(property = %property, range = %range, "Running sessions report");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(e.to_string()))?;

        check_response_json(response).await
    }

    /// List the GA accounts the user can see.
    pub async fn list_accounts(&self) -> Result<Vec<AccountSummary>, AppError> {
        let url = format!("{}/accounts", self.admin_url);
        let mut accounts = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_ADMIN_PAGES {
            let mut query = vec![("pageSize", ADMIN_PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let page: ListAccountsResponse = self.get_json(&url, &query).await?;
            accounts.extend(page.accounts.iter().map(|a| AccountSummary {
                id: a.id(),
                name: a.label(),
                full_name: a.name.clone(),
            }));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(count = accounts.len(), "Listed GA accounts");
        Ok(accounts)
    }

    /// List the GA4 properties under an account.
    pub async fn list_properties(
        &self,
        account_id: &str,
    ) -> Result<Vec<PropertySummary>, AppError> {
        let url = format!("{}/properties", self.admin_url);
        let mut properties = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_ADMIN_PAGES {
            let mut query = vec![
                ("filter", format!("parent:accounts/{}", account_id)),
                ("pageSize", ADMIN_PAGE_SIZE.to_string()),
            ];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            let page: ListPropertiesResponse = self.get_json(&url, &query).await?;
            properties.extend(page.properties.into_iter().map(|p| PropertySummary {
                id: p.id(),
                name: p.label(),
                full_name: p.name.clone(),
                create_time: p.create_time,
                update_time: p.update_time,
            }));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(account_id, count = properties.len(), "Listed GA properties");
        Ok(properties)
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::GoogleApi(e.to_string()))?;

        check_response_json(response).await
    }
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Deserialize)]
struct GoogleErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Check response status and parse the JSON body.
///
/// 401 becomes [`AppError::GoogleTokenRejected`] so callers can refresh.
pub(crate) async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| AppError::GoogleApi(format!("JSON parse error: {}", e)));
    }

    if status.as_u16() == 401 {
        return Err(AppError::GoogleTokenRejected);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<GoogleErrorEnvelope>(&body) {
        Ok(envelope) => match envelope.error.status {
            Some(code) => format!("{}: {}", code, envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => body,
    };

    if status.as_u16() == 429 {
        tracing::warn!("Google API rate limit hit (429)");
    }

    Err(AppError::GoogleApi(format!("HTTP {}: {}", status, message)))
}
