//! Sign-in, sign-up and sign-out actions.
//!
//! The service validates locally, calls the identity gateway and classifies
//! failures. It never writes the session: a successful call is reflected in
//! the store through the gateway's change notification.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::auth_error::AuthError;
use crate::domain::error::ActionError;
use crate::domain::pending::PendingFlag;
use crate::domain::ports::{IdentityGateway, IdentityGatewayError};
use crate::domain::validation::{CredentialValidator, FormInput};

/// Account actions backed by an identity gateway.
#[derive(Clone)]
pub struct AccountService<G> {
    gateway: Arc<G>,
    validator: CredentialValidator,
    pending: PendingFlag,
}

impl<G> AccountService<G> {
    /// Create a service over `gateway`.
    pub fn new(gateway: Arc<G>, validator: CredentialValidator) -> Self {
        Self {
            gateway,
            validator,
            pending: PendingFlag::new(),
        }
    }

    /// Whether a gateway call is in flight.
    pub fn is_submitting(&self) -> bool {
        self.pending.is_pending()
    }

    /// Shared handle to the in-flight indicator.
    pub fn pending(&self) -> PendingFlag {
        self.pending.clone()
    }
}

impl<G> AccountService<G>
where
    G: IdentityGateway,
{
    /// Sign in with the email and password from the form.
    ///
    /// # Errors
    /// [`ActionError::Validation`] before any network call, otherwise
    /// [`ActionError::Auth`] with the classified provider failure.
    #[instrument(skip_all)]
    pub async fn sign_in(&self, input: &FormInput) -> Result<(), ActionError> {
        let credentials = self.validator.login(input)?;
        let _pending = self.pending.begin();
        self.gateway
            .sign_in(&credentials)
            .await
            .map_err(|error| classify("sign_in", &error))?;
        info!("sign-in accepted");
        Ok(())
    }

    /// Register a new account from the sign-up form.
    ///
    /// The provider provisions the profile row; an email confirmation may be
    /// required before the first sign-in.
    #[instrument(skip_all)]
    pub async fn sign_up(&self, input: &FormInput) -> Result<(), ActionError> {
        let request = self.validator.registration(input)?.into_sign_up_request();
        let _pending = self.pending.begin();
        self.gateway
            .sign_up(&request)
            .await
            .map_err(|error| classify("sign_up", &error))?;
        info!(graduation_year = request.graduation_year(), "sign-up accepted");
        Ok(())
    }

    /// End the current session.
    #[instrument(skip_all)]
    pub async fn sign_out(&self) -> Result<(), ActionError> {
        let _pending = self.pending.begin();
        self.gateway
            .sign_out()
            .await
            .map_err(|error| classify("sign_out", &error))?;
        info!("sign-out accepted");
        Ok(())
    }
}

fn classify(action: &'static str, error: &IdentityGatewayError) -> AuthError {
    let kind = AuthError::classify(error);
    warn!(
        action,
        error_kind = error.kind(),
        %error,
        auth_error = ?kind,
        "identity gateway call failed"
    );
    kind
}

impl<G> std::fmt::Debug for AccountService<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("submitting", &self.is_submitting())
            .finish_non_exhaustive()
    }
}
