// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod analytics;
pub mod google;
pub mod google_oauth;
pub mod oauth_state;
pub mod reporting;

pub use analytics::{AnalyticsClient, ReportRange, RunReportResponse};
pub use google::{GoogleService, OAuthResult};
pub use google_oauth::{GoogleOAuthClient, GoogleTokenResponse};
pub use reporting::SetupStage;
