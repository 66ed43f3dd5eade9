//! Wire DTOs for the GoTrue and PostgREST APIs.
//!
//! Responses decode into these first, then map into domain records in one
//! pass; request bodies borrow from domain values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{EmailAddress, Identity, IdentityId, Profile, ProfileUpdate, SignUpRequest};

#[derive(Debug, Serialize)]
pub(super) struct PasswordGrantDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshGrantDto<'a> {
    pub(super) refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct SignUpBodyDto<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpMetadataDto<'a>,
}

/// User metadata the profile provisioning trigger reads.
#[derive(Debug, Serialize)]
struct SignUpMetadataDto<'a> {
    full_name: &'a str,
    graduation_year: i32,
}

impl<'a> From<&'a SignUpRequest> for SignUpBodyDto<'a> {
    fn from(request: &'a SignUpRequest) -> Self {
        Self {
            email: request.email().as_ref(),
            password: request.password(),
            data: SignUpMetadataDto {
                full_name: request.display_name(),
                graduation_year: request.graduation_year(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    id: String,
    email: Option<String>,
    email_confirmed_at: Option<DateTime<Utc>>,
}

impl UserDto {
    pub(super) fn into_identity(self) -> Result<Identity, String> {
        let id = IdentityId::new(&self.id).map_err(|error| format!("user id: {error}"))?;
        let raw_email = self
            .email
            .ok_or_else(|| format!("user {} has no email", self.id))?;
        let email = EmailAddress::new(raw_email).map_err(|error| format!("user email: {error}"))?;
        Ok(Identity::new(id, email, self.email_confirmed_at.is_some()))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct SessionDto {
    pub(super) access_token: String,
    pub(super) refresh_token: String,
    pub(super) user: UserDto,
}

/// Sign-up answers with a session when confirmation is off, or with the bare
/// user when a confirmation email was sent.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum SignUpResponseDto {
    Session(SessionDto),
    PendingConfirmation(UserDto),
}

/// Error body; GoTrue has used several field layouts over time.
#[derive(Debug, Default, Deserialize)]
pub(super) struct AuthErrorDto {
    error_code: Option<String>,
    error: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
}

impl AuthErrorDto {
    /// Machine code and human message, preferring the newest fields.
    pub(super) fn into_parts(self) -> (Option<String>, Option<String>) {
        let message = self
            .msg
            .or(self.error_description)
            .or(self.message)
            .or_else(|| self.error.clone());
        let code = self.error_code.or(self.error);
        (code, message)
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProfileRowDto {
    user_id: String,
    full_name: Option<String>,
    bio: Option<String>,
    graduation_year: Option<i32>,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRowDto {
    pub(super) fn into_profile(self) -> Result<Profile, String> {
        let identity_id =
            IdentityId::new(&self.user_id).map_err(|error| format!("profile user_id: {error}"))?;
        Ok(Profile {
            identity_id,
            full_name: self.full_name,
            bio: self.bio,
            graduation_year: self.graduation_year,
            avatar_url: self.avatar_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// PATCH body; absent values are sent as explicit `null`.
#[derive(Debug, Serialize)]
pub(super) struct ProfilePatchDto<'a> {
    full_name: Option<&'a str>,
    bio: Option<&'a str>,
    graduation_year: Option<i32>,
    avatar_url: Option<&'a str>,
}

impl<'a> From<&'a ProfileUpdate> for ProfilePatchDto<'a> {
    fn from(update: &'a ProfileUpdate) -> Self {
        Self {
            full_name: update.full_name.as_deref(),
            bio: update.bio.as_deref(),
            graduation_year: update.graduation_year,
            avatar_url: update.avatar_url.as_deref(),
        }
    }
}
