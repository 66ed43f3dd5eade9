//! Profile read-modify-write cycle for the editor view.
//!
//! The editor is bound to the session store and always acts for the identity
//! the store holds at call time. A call still awaiting the repository when
//! the view unmounts, or when the session moves to another identity,
//! completes as [`Completion::Discarded`] without touching state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument, warn};

use crate::domain::error::{ActionError, ProfileOperation};
use crate::domain::identity::IdentityId;
use crate::domain::pending::PendingFlag;
use crate::domain::ports::{ProfileRepository, ProfileRepositoryError};
use crate::domain::profile::Profile;
use crate::domain::session_store::SessionStore;
use crate::domain::validation::{CredentialValidator, FormInput};

/// Result of a call that may outlive its view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<T> {
    /// The view was still mounted and the result was applied.
    Applied(T),
    /// The view unmounted or the session changed hands first; nothing was
    /// applied.
    Discarded,
}

impl<T> Completion<T> {
    /// Applied value, if any.
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Discarded => None,
        }
    }

    /// Whether the result was dropped instead of applied.
    pub fn is_discarded(&self) -> bool {
        matches!(self, Self::Discarded)
    }
}

/// Per-view profile editor.
pub struct ProfileEditor<R> {
    store: SessionStore,
    repository: Arc<R>,
    validator: CredentialValidator,
    mounted: AtomicBool,
    saving: PendingFlag,
    profile: Mutex<Option<Profile>>,
}

impl<R> ProfileEditor<R> {
    /// Mount an editor bound to `store`.
    pub fn new(store: SessionStore, repository: Arc<R>, validator: CredentialValidator) -> Self {
        Self {
            store,
            repository,
            validator,
            mounted: AtomicBool::new(true),
            saving: PendingFlag::new(),
            profile: Mutex::new(None),
        }
    }

    /// Stop applying results; pending calls resolve as discarded.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    /// Whether the view is still mounted.
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Whether a submit is in flight.
    pub fn is_saving(&self) -> bool {
        self.saving.is_pending()
    }

    /// Last profile applied to the view.
    pub fn profile(&self) -> Option<Profile> {
        self.cached().clone()
    }

    /// Form values to pre-fill the editor with; blank until a profile loads.
    pub fn form(&self) -> FormInput {
        self.cached()
            .as_ref()
            .map(Profile::to_form)
            .unwrap_or_default()
    }

    fn cached(&self) -> MutexGuard<'_, Option<Profile>> {
        self.profile.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_identity(&self) -> Result<IdentityId, ActionError> {
        self.store
            .current()
            .identity()
            .map(|identity| identity.id().clone())
            .ok_or(ActionError::NotAuthenticated)
    }

    /// Whether results for `identity_id` may still reach the view.
    fn accepts(&self, identity_id: &IdentityId) -> bool {
        if !self.is_mounted() {
            debug!("profile call resolved after unmount; discarded");
            return false;
        }
        let session = self.store.current();
        let current = session.identity().map(|identity| identity.id());
        if current != Some(identity_id) {
            debug!(
                requested = %identity_id,
                current = ?current,
                "profile call resolved for a previous identity; discarded"
            );
            return false;
        }
        true
    }

    fn apply(
        &self,
        identity_id: &IdentityId,
        profile: Option<Profile>,
    ) -> Completion<Option<Profile>> {
        if !self.accepts(identity_id) {
            return Completion::Discarded;
        }
        *self.cached() = profile.clone();
        Completion::Applied(profile)
    }

    fn fail(
        &self,
        identity_id: &IdentityId,
        operation: ProfileOperation,
        error: ProfileRepositoryError,
    ) -> Result<Completion<Option<Profile>>, ActionError> {
        if !self.accepts(identity_id) {
            debug!(?operation, %error, "stale profile failure dropped");
            return Ok(Completion::Discarded);
        }
        warn!(
            ?operation,
            error_kind = error.kind(),
            %error,
            "profile repository call failed"
        );
        Err(ActionError::repository(operation, error))
    }
}

impl<R> ProfileEditor<R>
where
    R: ProfileRepository,
{
    /// Fetch the signed-in identity's profile.
    ///
    /// # Errors
    /// [`ActionError::NotAuthenticated`] without a session identity;
    /// [`ActionError::Repository`] when the fetch fails while mounted.
    #[instrument(skip_all)]
    pub async fn load(&self) -> Result<Completion<Option<Profile>>, ActionError> {
        let identity_id = self.current_identity()?;
        self.fetch(&identity_id).await
    }

    /// Validate and save the editor form, then re-read the stored profile.
    ///
    /// The input is only borrowed, so the user's edits survive a failure.
    #[instrument(skip_all)]
    pub async fn submit(
        &self,
        input: &FormInput,
    ) -> Result<Completion<Option<Profile>>, ActionError> {
        let update = self.validator.profile_edit(input)?;
        let identity_id = self.current_identity()?;
        let _saving = self.saving.begin();
        if let Err(error) = self
            .repository
            .update_by_identity(&identity_id, &update)
            .await
        {
            return self.fail(&identity_id, ProfileOperation::Update, error);
        }
        info!("profile updated");
        self.fetch(&identity_id).await
    }

    async fn fetch(
        &self,
        identity_id: &IdentityId,
    ) -> Result<Completion<Option<Profile>>, ActionError> {
        match self.repository.fetch_by_identity(identity_id).await {
            Ok(profile) => Ok(self.apply(identity_id, profile)),
            Err(error) => self.fail(identity_id, ProfileOperation::Load, error),
        }
    }
}

impl<R> std::fmt::Debug for ProfileEditor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileEditor")
            .field("mounted", &self.is_mounted())
            .field("saving", &self.is_saving())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "profile_service_tests.rs"]
mod tests;
