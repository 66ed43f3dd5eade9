//! Driven port for the external identity provider.
//!
//! The provider owns accounts, credentials and session continuity. The core
//! only needs sign-up, sign-in, sign-out, a one-shot "current session" probe
//! and a standing change stream; everything else about the provider stays
//! behind this trait.

use async_trait::async_trait;

use crate::domain::auth::{LoginCredentials, SignUpRequest};
use crate::domain::identity::Identity;
use crate::domain::session::SessionChange;
use crate::domain::subscription::{Listener, Subscription};

use super::define_port_error;

define_port_error! {
    /// Raw failures reported by identity gateway adapters.
    ///
    /// `Rejected` carries whatever the provider said; classification into
    /// [`crate::domain::AuthError`] happens in the domain.
    pub enum IdentityGatewayError {
        /// The provider answered and refused the request.
        Rejected { code: Option<String>, message: String } => "identity provider rejected the request: {message}",
        /// The provider could not be reached.
        Transport { message: String } => "identity provider unreachable: {message}",
        /// The provider answered with a payload the adapter could not read.
        Decode { message: String } => "identity provider response could not be decoded: {message}",
    }
}

/// Callback invoked for each provider session change.
pub type SessionChangeListener = Listener<SessionChange>;

/// Contract the core consumes from the identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// Create an account. The provider also provisions the profile record.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), IdentityGatewayError>;

    /// Start a session with email and password.
    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<(), IdentityGatewayError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), IdentityGatewayError>;

    /// One-shot probe for the session the provider currently holds.
    async fn current_session(&self) -> Result<Option<Identity>, IdentityGatewayError>;

    /// Register for change notifications until the handle is dropped.
    fn on_session_change(&self, listener: SessionChangeListener) -> Subscription;
}
