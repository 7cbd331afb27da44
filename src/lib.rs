// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! GA Dashboard: Google Analytics 4 sessions dashboard backend
//!
//! This crate provides the backend API that signs users in with Google,
//! stores their Analytics access tokens, remembers the GA4 property they
//! picked, and proxies sessions reports from the Data API.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::GoogleService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub google: GoogleService,
}
