// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store mirroring the Firestore collections.

use crate::models::{StoredToken, User, UserSettings};
use dashmap::DashMap;

/// One map per collection, keyed by document ID (the user ID).
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub(crate) users: DashMap<String, User>,
    pub(crate) tokens: DashMap<String, StoredToken>,
    pub(crate) settings: DashMap<String, UserSettings>,
}
