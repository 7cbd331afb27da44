// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod settings;
pub mod token;
pub mod user;

pub use settings::{PropertyId, UserSettings};
pub use token::StoredToken;
pub use user::User;
