//! Driven port for the structured profile store.
use async_trait::async_trait;

use crate::domain::identity::IdentityId;
use crate::domain::profile::{Profile, ProfileUpdate};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile repository adapters.
    pub enum ProfileRepositoryError {
        /// Store connection could not be established.
        Connection { message: String } => "profile repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "profile repository query failed: {message}",
        /// Stored row could not be mapped into a profile.
        Decode { message: String } => "profile repository returned an unreadable row: {message}",
    }
}

/// Profile persistence keyed by identity.
///
/// Callers must only pass the identity id of the current session; adapters
/// are not assumed to enforce ownership remotely.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch the profile row for `identity_id`; `Ok(None)` when none exists yet.
    async fn fetch_by_identity(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Option<Profile>, ProfileRepositoryError>;

    /// Apply `update` to the row owned by `identity_id`.
    async fn update_by_identity(
        &self,
        identity_id: &IdentityId,
        update: &ProfileUpdate,
    ) -> Result<(), ProfileRepositoryError>;
}
