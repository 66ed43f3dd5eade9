//! Per-identity profile record and the partial update the editor submits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::identity::IdentityId;
use crate::domain::validation::{FormInput, fields};

/// Maximum bio length in characters.
pub const BIO_MAX: usize = 500;

/// Descriptive record owned by a single identity.
///
/// ## Invariants
/// - Keyed 1:1 by `identity_id`; provisioned by the identity provider when the
///   account is created and never deleted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub identity_id: IdentityId,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub graduation_year: Option<i32>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Fresh row as provisioned at sign-up.
    #[must_use]
    pub fn provisioned(
        identity_id: IdentityId,
        full_name: Option<String>,
        graduation_year: Option<i32>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            identity_id,
            full_name,
            bio: None,
            graduation_year,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply `update`, stamping `updated_at`.
    pub fn apply(&mut self, update: &ProfileUpdate, now: DateTime<Utc>) {
        self.full_name.clone_from(&update.full_name);
        self.bio.clone_from(&update.bio);
        self.graduation_year = update.graduation_year;
        self.avatar_url.clone_from(&update.avatar_url);
        self.updated_at = now;
    }

    /// Values to pre-fill the editor form with; absent fields become blank.
    #[must_use]
    pub fn to_form(&self) -> FormInput {
        FormInput::new()
            .with(fields::FULL_NAME, self.full_name.clone().unwrap_or_default())
            .with(fields::BIO, self.bio.clone().unwrap_or_default())
            .with(
                fields::GRADUATION_YEAR,
                self.graduation_year
                    .map(|year| year.to_string())
                    .unwrap_or_default(),
            )
            .with(fields::AVATAR_URL, self.avatar_url.clone().unwrap_or_default())
    }
}

/// Editable profile fields; blank inputs are stored as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub graduation_year: Option<i32>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    /// Build from a form that already passed the profile schema.
    pub(crate) fn from_validated(input: &FormInput) -> Self {
        Self {
            full_name: input.non_blank(fields::FULL_NAME),
            bio: input.non_blank(fields::BIO),
            graduation_year: input
                .non_blank(fields::GRADUATION_YEAR)
                .and_then(|year| year.parse().ok()),
            avatar_url: input.non_blank(fields::AVATAR_URL),
        }
    }
}
