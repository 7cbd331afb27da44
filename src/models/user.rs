//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore, captured from Google's userinfo endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Google account subject (also used as document ID)
    pub user_id: String,
    /// Email address (may be None if the scope was not granted)
    pub email: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Profile picture URL
    pub picture: Option<String>,
    /// When user first signed in
    pub created_at: String,
    /// Last sign-in timestamp
    pub last_active: String,
}
