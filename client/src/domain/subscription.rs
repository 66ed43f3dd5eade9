//! Observer registry with scoped unsubscribe handles.
//!
//! Both the session store (towards the presentation layer) and identity
//! gateway adapters (towards the store) broadcast through a
//! [`ListenerRegistry`]. Registration hands back a [`Subscription`]; dropping
//! it, or calling [`Subscription::unsubscribe`], removes the listener exactly
//! once.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Shared callback invoked with each broadcast value.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct RegistryState<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

impl<T> RegistryState<T> {
    fn remove(&mut self, id: u64) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }
}

/// Ordered set of listeners.
///
/// ## Invariants
/// - Listeners run in registration order.
/// - A notification runs against the listeners registered when it started;
///   listeners added from inside a callback first see the next notification.
pub struct ListenerRegistry<T> {
    state: Arc<Mutex<RegistryState<T>>>,
}

impl<T: 'static> ListenerRegistry<T> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register `listener` and return the handle that removes it.
    pub fn register(&self, listener: Listener<T>) -> Subscription {
        let id = {
            let mut state = lock(&self.state);
            let id = state.next_id;
            state.next_id += 1;
            state.listeners.push((id, listener));
            id
        };
        let registry: Weak<Mutex<RegistryState<T>>> = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = registry.upgrade() {
                lock(&state).remove(id);
            }
        })
    }

    /// Invoke every currently registered listener with `value`.
    ///
    /// The registry lock is released before callbacks run so listeners may
    /// register or unsubscribe without deadlocking.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<Listener<T>> = lock(&self.state)
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(value);
        }
    }

    /// Number of live listeners.
    pub fn len(&self) -> usize {
        lock(&self.state).listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &lock(&self.state).listeners.len())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle that releases a registration when dropped.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a release action that runs exactly once.
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Subscription with nothing to release.
    pub fn detached() -> Self {
        Self { release: None }
    }

    /// Release the registration now.
    pub fn unsubscribe(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
