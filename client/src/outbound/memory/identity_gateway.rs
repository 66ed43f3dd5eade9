//! Identity provider simulated in process memory.
//!
//! Accounts are keyed by normalised email. Errors mirror the codes and
//! messages the hosted provider returns so the domain classifies them the
//! same way.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::InMemoryProfileRepository;
use crate::domain::ports::{IdentityGateway, IdentityGatewayError, SessionChangeListener};
use crate::domain::{
    EmailAddress, Identity, IdentityId, ListenerRegistry, LoginCredentials, SessionChange,
    SessionEvent, SignUpRequest, Subscription,
};

const MIN_PROVIDER_PASSWORD: usize = 6;

/// Gateway call a scripted failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    SignUp,
    SignIn,
    SignOut,
    CurrentSession,
}

struct Account {
    identity_id: IdentityId,
    email: EmailAddress,
    password: Zeroizing<String>,
    confirmed: bool,
}

impl Account {
    fn identity(&self) -> Identity {
        Identity::new(self.identity_id.clone(), self.email.clone(), self.confirmed)
    }
}

#[derive(Default)]
struct Directory {
    accounts: HashMap<String, Account>,
    current: Option<Identity>,
    failures: VecDeque<(GatewayOperation, IdentityGatewayError)>,
}

impl Directory {
    fn take_failure(&mut self, operation: GatewayOperation) -> Result<(), IdentityGatewayError> {
        let Some(index) = self
            .failures
            .iter()
            .position(|(scripted, _)| *scripted == operation)
        else {
            return Ok(());
        };
        match self.failures.remove(index) {
            Some((_, error)) => Err(error),
            None => Ok(()),
        }
    }
}

/// Deterministic identity provider for tests and local development.
///
/// Sign-up provisions the profile row in the paired repository. With email
/// confirmation enabled, new accounts cannot sign in until
/// [`InMemoryIdentityGateway::confirm_email`] runs; otherwise sign-up starts a
/// session immediately.
pub struct InMemoryIdentityGateway {
    directory: Mutex<Directory>,
    changes: ListenerRegistry<SessionChange>,
    profiles: Arc<InMemoryProfileRepository>,
    require_confirmation: bool,
}

impl InMemoryIdentityGateway {
    /// Gateway provisioning profiles into `profiles`; confirmation not required.
    pub fn new(profiles: Arc<InMemoryProfileRepository>) -> Self {
        Self {
            directory: Mutex::new(Directory::default()),
            changes: ListenerRegistry::new(),
            profiles,
            require_confirmation: false,
        }
    }

    /// Require email confirmation before a new account may sign in.
    #[must_use]
    pub fn requiring_email_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    fn directory(&self) -> MutexGuard<'_, Directory> {
        self.directory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: GatewayOperation, error: IdentityGatewayError) {
        self.directory().failures.push_back((operation, error));
    }

    /// Mark the account for `email` as confirmed.
    ///
    /// Returns `false` when no such account exists. Emits `UserUpdated` when
    /// the account is the signed-in one.
    pub fn confirm_email(&self, email: &str) -> bool {
        let change = {
            let mut directory = self.directory();
            let key = normalise(email);
            let Some(account) = directory.accounts.get_mut(&key) else {
                return false;
            };
            account.confirmed = true;
            let identity = account.identity();
            let is_current = directory
                .current
                .as_ref()
                .is_some_and(|current| current.id() == identity.id());
            if is_current {
                directory.current = Some(identity.clone());
            }
            is_current.then_some(SessionChange {
                event: SessionEvent::UserUpdated,
                identity: Some(identity),
            })
        };
        if let Some(change) = change {
            self.changes.notify(&change);
        }
        true
    }

    /// Deliver an out-of-band change, such as a sign-out in another tab.
    pub fn simulate(&self, change: SessionChange) {
        self.directory().current.clone_from(&change.identity);
        debug!(event = ?change.event, "simulated session change");
        self.changes.notify(&change);
    }

    /// Expire the current session.
    pub fn expire_session(&self) {
        self.simulate(SessionChange::signed_out());
    }

    /// Refresh the current session's token; identity is unchanged.
    pub fn refresh_token(&self) {
        let identity = self.directory().current.clone();
        self.simulate(SessionChange {
            event: SessionEvent::TokenRefreshed,
            identity,
        });
    }

    /// Identity the provider currently holds a session for.
    pub fn current_identity(&self) -> Option<Identity> {
        self.directory().current.clone()
    }

    /// Number of live change subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.changes.len()
    }

    fn start_session(&self, identity: Identity) {
        self.directory().current = Some(identity.clone());
        self.changes.notify(&SessionChange::signed_in(identity));
    }
}

impl std::fmt::Debug for InMemoryIdentityGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let directory = self.directory();
        f.debug_struct("InMemoryIdentityGateway")
            .field("accounts", &directory.accounts.len())
            .field("signed_in", &directory.current.is_some())
            .field("require_confirmation", &self.require_confirmation)
            .finish_non_exhaustive()
    }
}

fn normalise(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid_credentials() -> IdentityGatewayError {
    IdentityGatewayError::rejected(
        Some("invalid_credentials".to_owned()),
        "Invalid login credentials",
    )
}

#[async_trait]
impl IdentityGateway for InMemoryIdentityGateway {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), IdentityGatewayError> {
        let identity = {
            let mut directory = self.directory();
            directory.take_failure(GatewayOperation::SignUp)?;
            let key = request.email().normalized();
            if directory.accounts.contains_key(&key) {
                return Err(IdentityGatewayError::rejected(
                    Some("user_already_exists".to_owned()),
                    "User already registered",
                ));
            }
            if request.password().chars().count() < MIN_PROVIDER_PASSWORD {
                return Err(IdentityGatewayError::rejected(
                    Some("weak_password".to_owned()),
                    "Password should be at least 6 characters",
                ));
            }
            let identity_id = IdentityId::new(Uuid::new_v4().to_string())
                .map_err(|error| IdentityGatewayError::decode(error.to_string()))?;
            let account = Account {
                identity_id,
                email: request.email().clone(),
                password: Zeroizing::new(request.password().to_owned()),
                confirmed: !self.require_confirmation,
            };
            let identity = account.identity();
            directory.accounts.insert(key, account);
            identity
        };

        self.profiles.provision_for(
            identity.id().clone(),
            Some(request.display_name().to_owned()),
            Some(request.graduation_year()),
        );
        info!(identity = %identity.id(), "account registered");
        if !self.require_confirmation {
            self.start_session(identity);
        }
        Ok(())
    }

    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<(), IdentityGatewayError> {
        let identity = {
            let mut directory = self.directory();
            directory.take_failure(GatewayOperation::SignIn)?;
            let account = directory
                .accounts
                .get(&credentials.email().normalized())
                .ok_or_else(invalid_credentials)?;
            if account.password.as_str() != credentials.password() {
                return Err(invalid_credentials());
            }
            if !account.confirmed {
                return Err(IdentityGatewayError::rejected(
                    Some("email_not_confirmed".to_owned()),
                    "Email not confirmed",
                ));
            }
            account.identity()
        };
        self.start_session(identity);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityGatewayError> {
        {
            let mut directory = self.directory();
            directory.take_failure(GatewayOperation::SignOut)?;
            directory.current = None;
        }
        self.changes.notify(&SessionChange::signed_out());
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Identity>, IdentityGatewayError> {
        let mut directory = self.directory();
        directory.take_failure(GatewayOperation::CurrentSession)?;
        Ok(directory.current.clone())
    }

    fn on_session_change(&self, listener: SessionChangeListener) -> Subscription {
        self.changes.register(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AuthError, CredentialValidator, FormInput, validation::fields};
    use crate::test_support::FixtureClock;
    use mockable::Clock;
    use rstest::{fixture, rstest};

    struct Harness {
        gateway: InMemoryIdentityGateway,
        profiles: Arc<InMemoryProfileRepository>,
        validator: CredentialValidator,
        events: Arc<Mutex<Vec<SessionEvent>>>,
        _subscription: Subscription,
    }

    fn build_harness(require_confirmation: bool) -> Harness {
        let clock: Arc<dyn Clock> = Arc::new(FixtureClock::default());
        let profiles = Arc::new(InMemoryProfileRepository::new(Arc::clone(&clock)));
        let mut gateway = InMemoryIdentityGateway::new(Arc::clone(&profiles));
        if require_confirmation {
            gateway = gateway.requiring_email_confirmation();
        }
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let subscription = gateway.on_session_change(Arc::new(move |change: &SessionChange| {
            sink.lock().expect("events").push(change.event);
        }));
        Harness {
            gateway,
            profiles,
            validator: CredentialValidator::new(clock),
            events,
            _subscription: subscription,
        }
    }

    #[fixture]
    fn harness() -> Harness {
        build_harness(false)
    }

    impl Harness {
        fn request(&self, email: &str) -> SignUpRequest {
            let form = FormInput::new()
                .with(fields::FIRST_NAME, "Ada")
                .with(fields::LAST_NAME, "Lovelace")
                .with(fields::EMAIL, email)
                .with(fields::GRADUATION_YEAR, "2010")
                .with(fields::PASSWORD, "analytical")
                .with(fields::CONFIRM_PASSWORD, "analytical");
            self.validator
                .registration(&form)
                .expect("valid registration")
                .into_sign_up_request()
        }

        fn credentials(&self, email: &str, password: &str) -> LoginCredentials {
            LoginCredentials::try_from_parts(email, password).expect("credentials")
        }

        fn events(&self) -> Vec<SessionEvent> {
            self.events.lock().expect("events").clone()
        }
    }

    #[rstest]
    #[tokio::test]
    async fn sign_up_provisions_profile_and_starts_session(harness: Harness) {
        harness
            .gateway
            .sign_up(&harness.request("ada@example.com"))
            .await
            .expect("sign up");

        let identity = harness.gateway.current_identity().expect("signed in");
        let profile = harness.profiles.get(identity.id()).expect("profile row");
        assert_eq!(profile.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(profile.graduation_year, Some(2010));
        assert_eq!(harness.events(), vec![SessionEvent::SignedIn]);
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively(harness: Harness) {
        harness
            .gateway
            .sign_up(&harness.request("ada@example.com"))
            .await
            .expect("first sign up");

        let error = harness
            .gateway
            .sign_up(&harness.request("ADA@example.com"))
            .await
            .expect_err("duplicate");

        assert_eq!(
            AuthError::classify(&error),
            AuthError::AlreadyRegistered,
            "{error:?}"
        );
    }

    #[rstest]
    #[tokio::test]
    async fn unconfirmed_account_cannot_sign_in_until_confirmed() {
        let harness = build_harness(true);
        harness
            .gateway
            .sign_up(&harness.request("ada@example.com"))
            .await
            .expect("sign up");
        assert!(harness.gateway.current_identity().is_none());

        let credentials = harness.credentials("ada@example.com", "analytical");
        let error = harness
            .gateway
            .sign_in(&credentials)
            .await
            .expect_err("unconfirmed");
        assert!(error.to_string().contains("Email not confirmed"));

        assert!(harness.gateway.confirm_email("Ada@Example.com"));
        harness.gateway.sign_in(&credentials).await.expect("confirmed");
        let identity = harness.gateway.current_identity().expect("signed in");
        assert!(identity.email_verified());
    }

    #[rstest]
    #[case("ada@example.com", "wrong-password")]
    #[case("nobody@example.com", "analytical")]
    #[tokio::test]
    async fn bad_credentials_share_one_error(
        harness: Harness,
        #[case] email: &str,
        #[case] password: &str,
    ) {
        harness
            .gateway
            .sign_up(&harness.request("ada@example.com"))
            .await
            .expect("sign up");

        let error = harness
            .gateway
            .sign_in(&harness.credentials(email, password))
            .await
            .expect_err("bad credentials");

        assert_eq!(error, invalid_credentials());
    }

    #[rstest]
    #[tokio::test]
    async fn scripted_probe_failure_is_consumed_once(harness: Harness) {
        harness.gateway.fail_next(
            GatewayOperation::CurrentSession,
            IdentityGatewayError::transport("offline"),
        );

        assert!(harness.gateway.current_session().await.is_err());
        assert_eq!(harness.gateway.current_session().await, Ok(None));
    }

    #[rstest]
    #[tokio::test]
    async fn out_of_band_events_reach_subscribers(harness: Harness) {
        harness
            .gateway
            .sign_up(&harness.request("ada@example.com"))
            .await
            .expect("sign up");

        harness.gateway.refresh_token();
        harness.gateway.expire_session();
        harness.gateway.sign_out().await.expect("sign out");

        assert_eq!(
            harness.events(),
            vec![
                SessionEvent::SignedIn,
                SessionEvent::TokenRefreshed,
                SessionEvent::SignedOut,
                SessionEvent::SignedOut,
            ]
        );
        assert!(harness.gateway.current_identity().is_none());
    }
}
