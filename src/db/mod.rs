//! Database layer (Firestore, with an in-memory backend for local runs and tests).

pub mod firestore;
mod memory;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Google OAuth tokens (keyed by user_id)
    pub const GOOGLE_TOKENS: &str = "google_tokens";
    /// Selected GA4 property (keyed by user_id)
    pub const USER_SETTINGS: &str = "user_settings";
}
