// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user settings (`user_settings` collection).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-user settings. One document per user, keyed by user ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSettings {
    pub user_id: String,
    /// Selected GA4 property (numeric string), `None` when cleared
    pub ga_property_id: Option<String>,
    pub updated_at: String,
}

impl UserSettings {
    /// The selected property, if one is set and well-formed.
    pub fn property_id(&self) -> Option<PropertyId> {
        let raw = self.ga_property_id.as_deref()?;
        match PropertyId::parse(raw) {
            Some(id) => Some(id),
            None => {
                tracing::warn!(
                    user_id = %self.user_id,
                    ga_property_id = raw,
                    "Ignoring malformed stored property ID"
                );
                None
            }
        }
    }
}

/// GA4 property ID: a non-empty string of ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyId(String);

impl PropertyId {
    pub fn parse(raw: &str) -> Option<Self> {
        is_numeric_id(raw).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource name used by the Analytics APIs, e.g. `properties/12345`.
    pub fn resource_name(&self) -> String {
        format!("properties/{}", self.0)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Matches `^\d+$`.
pub fn is_numeric_id(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_id_accepts_digits() {
        let id = PropertyId::parse("12345").unwrap();
        assert_eq!(id.as_str(), "12345");
        assert_eq!(id.resource_name(), "properties/12345");
    }

    #[test]
    fn test_property_id_rejects_non_digits() {
        for raw in ["abc", "", "123a", " 123", "12 3", "-1", "properties/123", "１２３"] {
            assert!(PropertyId::parse(raw).is_none(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_settings_property_id() {
        let mut settings = UserSettings {
            user_id: "u".to_string(),
            ga_property_id: Some("98765".to_string()),
            updated_at: String::new(),
        };
        assert_eq!(settings.property_id().unwrap().as_str(), "98765");

        settings.ga_property_id = None;
        assert!(settings.property_id().is_none());

        settings.ga_property_id = Some("not-a-number".to_string());
        assert!(settings.property_id().is_none());
    }
}
