// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reporting target (selected GA4 property) and setup progress.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{PropertyId, StoredToken, UserSettings};
use crate::time_utils::format_utc_rfc3339;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Where a signed-in user stands on the way to viewing reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum SetupStage {
    /// Signed in, but no usable Google token: re-run sign-in.
    NeedsToken,
    /// Token on file, no property chosen: show the setup picker.
    NeedsProperty,
    Ready,
}

impl SetupStage {
    pub fn from_parts(token: Option<&StoredToken>, property: Option<&PropertyId>) -> Self {
        match (token.filter(|t| t.has_access_token()), property) {
            (None, _) => SetupStage::NeedsToken,
            (Some(_), None) => SetupStage::NeedsProperty,
            (Some(_), Some(_)) => SetupStage::Ready,
        }
    }
}

/// The user's selected property, if any.
pub async fn selected_property(
    db: &FirestoreDb,
    user_id: &str,
) -> Result<Option<PropertyId>, AppError> {
    Ok(db
        .get_settings(user_id)
        .await?
        .and_then(|settings| settings.property_id()))
}

/// The user's selected property, or [`AppError::NoPropertySelected`].
pub async fn require_property(db: &FirestoreDb, user_id: &str) -> Result<PropertyId, AppError> {
    selected_property(db, user_id)
        .await?
        .ok_or(AppError::NoPropertySelected)
}

/// Store or clear (`None`) the user's property selection.
pub async fn select_property(
    db: &FirestoreDb,
    user_id: &str,
    property: Option<&PropertyId>,
) -> Result<UserSettings, AppError> {
    let settings = UserSettings {
        user_id: user_id.to_string(),
        ga_property_id: property.map(|p| p.as_str().to_string()),
        updated_at: format_utc_rfc3339(chrono::Utc::now()),
    };

    db.upsert_settings(&settings).await?;

    match property {
        Some(p) => tracing::info!(user_id, property = %p, "Property selected"),
        None => tracing::info!(user_id, "Property selection cleared"),
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(access: &str) -> StoredToken {
        StoredToken {
            user_id: "u1".to_string(),
            access_token: access.to_string(),
            refresh_token: String::new(),
            expires_at: "2030-01-01T00:00:00Z".to_string(),
            scope: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_setup_stage_transitions() {
        let property = PropertyId::parse("123").unwrap();

        assert_eq!(SetupStage::from_parts(None, None), SetupStage::NeedsToken);
        assert_eq!(
            SetupStage::from_parts(None, Some(&property)),
            SetupStage::NeedsToken
        );
        assert_eq!(
            SetupStage::from_parts(Some(&token("")), Some(&property)),
            SetupStage::NeedsToken
        );
        assert_eq!(
            SetupStage::from_parts(Some(&token("ya29")), None),
            SetupStage::NeedsProperty
        );
        assert_eq!(
            SetupStage::from_parts(Some(&token("ya29")), Some(&property)),
            SetupStage::Ready
        );
    }

    #[tokio::test]
    async fn test_select_then_clear_property() {
        let db = FirestoreDb::new_in_memory();
        assert!(matches!(
            require_property(&db, "u1").await,
            Err(AppError::NoPropertySelected)
        ));

        let property = PropertyId::parse("98765").unwrap();
        select_property(&db, "u1", Some(&property)).await.unwrap();
        assert_eq!(require_property(&db, "u1").await.unwrap(), property);

        select_property(&db, "u1", None).await.unwrap();
        assert!(matches!(
            require_property(&db, "u1").await,
            Err(AppError::NoPropertySelected)
        ));
    }
}
