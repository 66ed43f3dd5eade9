//! Test utilities for the client crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`) via
//! the `test-support` feature.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{
    IdentityGateway, IdentityGatewayError, Navigator, SessionChangeListener,
};
use crate::domain::{
    EmailAddress, Identity, IdentityId, ListenerRegistry, LoginCredentials, Route, SessionChange,
    SessionStore, SignUpRequest, Subscription,
};

/// Settable clock; defaults to 2026-06-15T12:00:00Z.
pub struct FixtureClock(Mutex<DateTime<Utc>>);

impl FixtureClock {
    /// Clock frozen at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Clock frozen at midday UTC on the given date.
    pub fn at_date(year: i32, month: u32, day: u32) -> Self {
        let now = match Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).single() {
            Some(now) => now,
            None => panic!("invalid fixture date {year}-{month}-{day}"),
        };
        Self::new(now)
    }

    /// Move the clock forward.
    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FixtureClock {
    fn default() -> Self {
        Self::at_date(2026, 6, 15)
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Navigator double that records every redirect.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirects issued so far, in order.
    pub fn redirects(&self) -> Vec<Route> {
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: Route) {
        self.redirects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}

/// Identity gateway double with a fixed probe answer and a manual change
/// stream.
#[derive(Debug, Default)]
pub struct StubIdentityGateway {
    probe: Mutex<Option<Identity>>,
    changes: ListenerRegistry<SessionChange>,
}

impl StubIdentityGateway {
    /// Gateway whose probe reports `identity` as signed in.
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            probe: Mutex::new(Some(identity)),
            changes: ListenerRegistry::new(),
        }
    }

    /// Gateway whose probe reports no session.
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Deliver `change` to every subscriber.
    pub fn emit(&self, change: SessionChange) {
        *self.probe.lock().unwrap_or_else(PoisonError::into_inner) = change.identity.clone();
        self.changes.notify(&change);
    }

    /// Number of live change subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.changes.len()
    }

    /// Store initialised against this gateway.
    pub async fn resolved_store(&self) -> SessionStore {
        let store = SessionStore::new();
        store.initialize(self).await;
        store
    }
}

#[async_trait]
impl IdentityGateway for StubIdentityGateway {
    async fn sign_up(&self, _request: &SignUpRequest) -> Result<(), IdentityGatewayError> {
        Ok(())
    }

    async fn sign_in(&self, _credentials: &LoginCredentials) -> Result<(), IdentityGatewayError> {
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityGatewayError> {
        self.emit(SessionChange::signed_out());
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Identity>, IdentityGatewayError> {
        Ok(self
            .probe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn on_session_change(&self, listener: SessionChangeListener) -> Subscription {
        self.changes.register(listener)
    }
}

/// Identity with a derived example address.
pub fn identity(id: &str) -> Identity {
    let Ok(identity_id) = IdentityId::new(id) else {
        panic!("invalid fixture identity id {id:?}");
    };
    let Ok(email) = EmailAddress::new(format!("{id}@example.com")) else {
        panic!("invalid fixture email for {id:?}");
    };
    Identity::new(identity_id, email, true)
}
