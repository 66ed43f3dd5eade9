//! PostgREST-backed profile repository.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use tracing::debug;

use super::dto::{ProfilePatchDto, ProfileRowDto};
use super::{SupabaseConnection, body_preview, status_message};
use crate::domain::ports::{ProfileRepository, ProfileRepositoryError};
use crate::domain::{IdentityId, Profile, ProfileUpdate};

const PROFILES_PATH: &str = "rest/v1/profiles";

/// Profile repository over the `profiles` table.
///
/// Rows are filtered by `user_id`; row-level security on the table is the
/// remote ownership check.
pub struct SupabaseProfileRepository {
    connection: Arc<SupabaseConnection>,
}

impl SupabaseProfileRepository {
    pub(super) fn new(connection: Arc<SupabaseConnection>) -> Self {
        Self { connection }
    }

    fn rows_url(&self, identity_id: &IdentityId) -> Result<Url, ProfileRepositoryError> {
        let mut url = self.connection.endpoint(PROFILES_PATH).map_err(|error| {
            ProfileRepositoryError::connection(format!("invalid endpoint: {error}"))
        })?;
        url.query_pairs_mut()
            .append_pair("user_id", &format!("eq.{identity_id}"));
        Ok(url)
    }
}

impl std::fmt::Debug for SupabaseProfileRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseProfileRepository")
            .field("connection", &self.connection)
            .finish()
    }
}

#[async_trait]
impl ProfileRepository for SupabaseProfileRepository {
    async fn fetch_by_identity(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Option<Profile>, ProfileRepositoryError> {
        let mut url = self.rows_url(identity_id)?;
        url.query_pairs_mut().append_pair("select", "*");
        let body = send(self.connection.request(Method::GET, url)).await?;
        let profile = parse_rows(&body)?;
        if profile.is_none() {
            debug!(identity = %identity_id, "no profile row");
        }
        Ok(profile)
    }

    async fn update_by_identity(
        &self,
        identity_id: &IdentityId,
        update: &ProfileUpdate,
    ) -> Result<(), ProfileRepositoryError> {
        let url = self.rows_url(identity_id)?;
        let builder = self
            .connection
            .request(Method::PATCH, url)
            .header("Prefer", "return=minimal")
            .json(&ProfilePatchDto::from(update));
        send(builder).await?;
        Ok(())
    }
}

async fn send(builder: reqwest::RequestBuilder) -> Result<Vec<u8>, ProfileRepositoryError> {
    let response = builder.send().await.map_err(map_transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

fn parse_rows(body: &[u8]) -> Result<Option<Profile>, ProfileRepositoryError> {
    let rows: Vec<ProfileRowDto> = serde_json::from_slice(body).map_err(|error| {
        ProfileRepositoryError::decode(format!(
            "invalid profiles payload: {error}; body: {}",
            body_preview(body)
        ))
    })?;
    rows.into_iter()
        .next()
        .map(ProfileRowDto::into_profile)
        .transpose()
        .map_err(ProfileRepositoryError::decode)
}

fn map_transport_error(error: reqwest::Error) -> ProfileRepositoryError {
    ProfileRepositoryError::connection(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ProfileRepositoryError {
    let message = status_message(status, body);
    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            ProfileRepositoryError::connection(message)
        }
        _ => ProfileRepositoryError::query(message),
    }
}
