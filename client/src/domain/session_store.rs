//! Single source of truth for the visitor's session.
//!
//! The store bootstraps once from the identity gateway and then follows the
//! gateway's change stream. Writes commit in arrival order; a bootstrap probe
//! that answers after a notification has already been applied is discarded
//! so a stale answer cannot overwrite a newer state.
//!
//! Broadcasts are serialised: a write made from inside a listener is queued
//! and delivered after the current snapshot has reached every listener, so
//! listeners observe writes in commit order and end on the committed state.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, info, warn};

use crate::domain::identity::Identity;
use crate::domain::ports::IdentityGateway;
use crate::domain::session::{Session, SessionChange};
use crate::domain::subscription::{Listener, ListenerRegistry, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorePhase {
    Idle,
    /// Probe in flight and no notification applied yet.
    Bootstrapping,
    Resolved,
    TornDown,
}

#[derive(Debug)]
struct StoreState {
    session: Session,
    phase: StorePhase,
    /// Committed snapshots not yet broadcast, oldest first.
    outbox: VecDeque<Session>,
    /// Set while some caller is draining `outbox`.
    delivering: bool,
}

impl StoreState {
    /// Queue the current session for broadcast.
    ///
    /// Returns `true` when the caller must drain the queue itself.
    fn commit(&mut self) -> bool {
        self.outbox.push_back(self.session.clone());
        !std::mem::replace(&mut self.delivering, true)
    }
}

struct StoreInner {
    state: Mutex<StoreState>,
    listeners: ListenerRegistry<Session>,
    gateway_subscription: Mutex<Option<Subscription>>,
}

impl StoreInner {
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn gateway_subscription(&self) -> MutexGuard<'_, Option<Subscription>> {
        self.gateway_subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Broadcast queued snapshots until the queue is empty.
    fn deliver(&self) {
        let _draining = Draining(self);
        loop {
            let next = {
                let mut state = self.state();
                match state.outbox.pop_front() {
                    Some(snapshot) => snapshot,
                    None => {
                        state.delivering = false;
                        return;
                    }
                }
            };
            self.listeners.notify(&next);
        }
    }

    fn apply_change(&self, change: &SessionChange) {
        let (authenticated, drain) = {
            let mut state = self.state();
            if state.phase == StorePhase::TornDown {
                debug!(event = ?change.event, "session change after teardown ignored");
                return;
            }
            let was_loading = state.session.is_loading();
            state.session.set_identity(change.identity.clone());
            state.session.finish_loading();
            state.phase = StorePhase::Resolved;
            if was_loading {
                info!(
                    authenticated = state.session.is_authenticated(),
                    "session resolved by notification"
                );
            }
            (state.session.is_authenticated(), state.commit())
        };
        debug!(event = ?change.event, authenticated, "session change applied");
        if drain {
            self.deliver();
        } else {
            debug!(event = ?change.event, "broadcast queued behind delivery in progress");
        }
    }

    fn apply_probe(&self, identity: Option<Identity>) {
        let (authenticated, drain) = {
            let mut state = self.state();
            if state.phase != StorePhase::Bootstrapping {
                debug!(phase = ?state.phase, "stale session probe discarded");
                return;
            }
            state.session.set_identity(identity);
            state.session.finish_loading();
            state.phase = StorePhase::Resolved;
            (state.session.is_authenticated(), state.commit())
        };
        info!(authenticated, "session resolved by probe");
        if drain {
            self.deliver();
        }
    }
}

/// Releases the delivery slot if a listener panics mid-broadcast.
struct Draining<'a>(&'a StoreInner);

impl Drop for Draining<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut state = self.0.state();
            state.outbox.clear();
            state.delivering = false;
        }
    }
}

/// Holds the current [`Session`] and broadcasts every change.
///
/// Cloning yields another handle to the same store. The gateway subscription
/// is released by [`SessionStore::teardown`] or when the last handle drops.
///
/// # Examples
/// ```
/// use ecoba_client::SessionStore;
///
/// let store = SessionStore::new();
/// assert!(store.current().is_loading());
/// ```
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

impl SessionStore {
    /// Create an idle store in the loading state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(StoreState {
                    session: Session::loading(),
                    phase: StorePhase::Idle,
                    outbox: VecDeque::new(),
                    delivering: false,
                }),
                listeners: ListenerRegistry::new(),
                gateway_subscription: Mutex::new(None),
            }),
        }
    }

    /// Subscribe to `gateway` and resolve the session with one probe.
    ///
    /// Only the first call has any effect. A failing probe resolves to signed
    /// out rather than leaving the store loading.
    pub async fn initialize<G>(&self, gateway: &G)
    where
        G: IdentityGateway + ?Sized,
    {
        {
            let mut state = self.inner.state();
            if state.phase != StorePhase::Idle {
                debug!(phase = ?state.phase, "session store already initialised");
                return;
            }
            state.phase = StorePhase::Bootstrapping;
        }

        let weak: Weak<StoreInner> = Arc::downgrade(&self.inner);
        let subscription = gateway.on_session_change(Arc::new(move |change: &SessionChange| {
            if let Some(inner) = weak.upgrade() {
                inner.apply_change(change);
            }
        }));
        {
            let mut slot = self.inner.gateway_subscription();
            if self.inner.state().phase == StorePhase::TornDown {
                drop(slot);
                subscription.unsubscribe();
                return;
            }
            *slot = Some(subscription);
        }

        let identity = match gateway.current_session().await {
            Ok(identity) => identity,
            Err(error) => {
                warn!(
                    error_kind = error.kind(),
                    %error,
                    "session probe failed; treating visitor as signed out"
                );
                None
            }
        };
        self.inner.apply_probe(identity);
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.inner.state().session.clone()
    }

    /// Register `listener` for every subsequent session write.
    ///
    /// Listeners run in registration order with the post-write snapshot.
    /// A write made from inside a listener is delivered once the current
    /// broadcast finishes. Dropping the returned handle unsubscribes.
    pub fn subscribe(&self, listener: Listener<Session>) -> Subscription {
        self.inner.listeners.register(listener)
    }

    /// Release the gateway subscription and ignore every later write.
    ///
    /// Calling this more than once is harmless.
    pub fn teardown(&self) {
        {
            let mut state = self.inner.state();
            if state.phase == StorePhase::TornDown {
                return;
            }
            state.phase = StorePhase::TornDown;
        }
        let subscription = self.inner.gateway_subscription().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
        debug!("session store torn down");
    }

    /// Whether [`SessionStore::teardown`] has run.
    pub fn is_torn_down(&self) -> bool {
        self.inner.state().phase == StorePhase::TornDown
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state();
        f.debug_struct("SessionStore")
            .field("session", &state.session)
            .field("phase", &state.phase)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "session_store_tests.rs"]
mod tests;
