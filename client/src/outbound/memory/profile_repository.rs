//! Profile rows held in a map keyed by identity.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{ProfileRepository, ProfileRepositoryError};
use crate::domain::{IdentityId, Profile, ProfileOperation, ProfileUpdate};

#[derive(Default)]
struct Rows {
    profiles: HashMap<IdentityId, Profile>,
    failures: VecDeque<(ProfileOperation, ProfileRepositoryError)>,
}

impl Rows {
    fn take_failure(&mut self, operation: ProfileOperation) -> Option<ProfileRepositoryError> {
        let index = self
            .failures
            .iter()
            .position(|(scripted, _)| *scripted == operation)?;
        self.failures.remove(index).map(|(_, error)| error)
    }
}

/// Profile store living in process memory.
///
/// Updates to a missing row succeed without effect, matching a filtered
/// `UPDATE` that touches no rows.
pub struct InMemoryProfileRepository {
    rows: Mutex<Rows>,
    clock: Arc<dyn Clock>,
}

impl InMemoryProfileRepository {
    /// Empty store stamping updates with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            rows: Mutex::new(Rows::default()),
            clock,
        }
    }

    fn rows(&self) -> MutexGuard<'_, Rows> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert the row created alongside a new account.
    pub fn provision(&self, profile: Profile) {
        debug!(identity = %profile.identity_id, "profile provisioned");
        self.rows()
            .profiles
            .insert(profile.identity_id.clone(), profile);
    }

    /// Create a row for `identity_id` stamped with the store clock.
    pub fn provision_for(
        &self,
        identity_id: IdentityId,
        full_name: Option<String>,
        graduation_year: Option<i32>,
    ) {
        let now = self.clock.utc();
        self.provision(Profile::provisioned(identity_id, full_name, graduation_year, now));
    }

    /// Stored row for `identity_id`, bypassing scripted failures.
    pub fn get(&self, identity_id: &IdentityId) -> Option<Profile> {
        self.rows().profiles.get(identity_id).cloned()
    }

    /// Make the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: ProfileOperation, error: ProfileRepositoryError) {
        self.rows().failures.push_back((operation, error));
    }
}

impl std::fmt::Debug for InMemoryProfileRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryProfileRepository")
            .field("rows", &self.rows().profiles.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn fetch_by_identity(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Option<Profile>, ProfileRepositoryError> {
        let mut rows = self.rows();
        if let Some(error) = rows.take_failure(ProfileOperation::Load) {
            return Err(error);
        }
        Ok(rows.profiles.get(identity_id).cloned())
    }

    async fn update_by_identity(
        &self,
        identity_id: &IdentityId,
        update: &ProfileUpdate,
    ) -> Result<(), ProfileRepositoryError> {
        let now = self.clock.utc();
        let mut rows = self.rows();
        if let Some(error) = rows.take_failure(ProfileOperation::Update) {
            return Err(error);
        }
        match rows.profiles.get_mut(identity_id) {
            Some(profile) => profile.apply(update, now),
            None => debug!(identity = %identity_id, "update matched no profile row"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixtureClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn clock() -> Arc<FixtureClock> {
        Arc::new(FixtureClock::default())
    }

    fn id(raw: &str) -> IdentityId {
        IdentityId::new(raw).expect("id")
    }

    #[rstest]
    #[tokio::test]
    async fn update_stamps_time_and_fetch_returns_it(clock: Arc<FixtureClock>) {
        let repository = InMemoryProfileRepository::new(clock.clone());
        repository.provision_for(id("ada"), Some("Ada".to_owned()), Some(2010));
        clock.advance_seconds(60);

        let update = ProfileUpdate {
            full_name: Some("Ada King".to_owned()),
            ..ProfileUpdate::default()
        };
        repository
            .update_by_identity(&id("ada"), &update)
            .await
            .expect("update");
        let profile = repository
            .fetch_by_identity(&id("ada"))
            .await
            .expect("fetch")
            .expect("row");

        assert_eq!(profile.full_name.as_deref(), Some("Ada King"));
        assert_eq!(profile.graduation_year, None);
        assert_eq!((profile.updated_at - profile.created_at).num_seconds(), 60);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_rows_fetch_as_none_and_updates_are_noops(clock: Arc<FixtureClock>) {
        let repository = InMemoryProfileRepository::new(clock);

        repository
            .update_by_identity(&id("ghost"), &ProfileUpdate::default())
            .await
            .expect("noop update");

        assert_eq!(
            repository.fetch_by_identity(&id("ghost")).await.expect("fetch"),
            None
        );
    }

    #[rstest]
    #[tokio::test]
    async fn scripted_failure_applies_once_to_its_operation(clock: Arc<FixtureClock>) {
        let repository = InMemoryProfileRepository::new(clock);
        repository.provision_for(id("ada"), None, None);
        repository.fail_next(
            ProfileOperation::Update,
            ProfileRepositoryError::connection("down"),
        );

        assert!(repository.fetch_by_identity(&id("ada")).await.is_ok());
        assert!(
            repository
                .update_by_identity(&id("ada"), &ProfileUpdate::default())
                .await
                .is_err()
        );
        assert!(
            repository
                .update_by_identity(&id("ada"), &ProfileUpdate::default())
                .await
                .is_ok()
        );
    }
}
