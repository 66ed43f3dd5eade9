//! Session snapshot and the change events the identity provider emits.

use serde::{Deserialize, Serialize};

use crate::domain::identity::Identity;

/// Authentication status observed by the client.
///
/// ## Invariants
/// - `is_loading` is `true` only before the bootstrap probe resolves.
/// - `identity.is_some()` means the visitor is authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    identity: Option<Identity>,
    is_loading: bool,
}

impl Session {
    /// Session state before the bootstrap probe has resolved.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            identity: None,
            is_loading: true,
        }
    }

    /// Resolved session for the given identity (or signed out when `None`).
    #[must_use]
    pub const fn resolved(identity: Option<Identity>) -> Self {
        Self {
            identity,
            is_loading: false,
        }
    }

    /// Cached identity, absent when signed out or still loading.
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Whether the bootstrap probe is still outstanding.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Whether a signed-in identity is present.
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub(crate) fn set_identity(&mut self, identity: Option<Identity>) {
        self.identity = identity;
    }

    pub(crate) fn finish_loading(&mut self) {
        self.is_loading = false;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::loading()
    }
}

/// Why the provider's session changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEvent {
    /// Session restored when a subscription is first established.
    InitialSession,
    /// A sign-in completed here or in another tab.
    SignedIn,
    /// A sign-out happened here, in another tab, or the session expired.
    SignedOut,
    /// Access token refreshed; identity unchanged.
    TokenRefreshed,
    /// Identity attributes (for example email confirmation) changed.
    UserUpdated,
}

/// Notification payload delivered on the provider's change stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    /// Event classification.
    pub event: SessionEvent,
    /// Identity after the change; `None` when signed out.
    pub identity: Option<Identity>,
}

impl SessionChange {
    /// Signed-in notification for `identity`.
    #[must_use]
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            event: SessionEvent::SignedIn,
            identity: Some(identity),
        }
    }

    /// Signed-out notification.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            event: SessionEvent::SignedOut,
            identity: None,
        }
    }
}
