//! Redirect policy and header affordances derived from the session.
//!
//! Views declare an access level. A [`NavigationGuard`] turns each observed
//! [`Session`] into a [`GuardAction`], suppressing repeats so a view is
//! redirected once per transition rather than once per notification.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::debug;

use crate::domain::ports::Navigator;
use crate::domain::session::Session;
use crate::domain::session_store::SessionStore;
use crate::domain::subscription::Subscription;

/// Views of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Landing,
    SignIn,
    SignUp,
    ProfileEditor,
    Events,
    Groups,
    Donate,
    AskAi,
}

impl Route {
    /// Every route, in navigation-bar order followed by the account views.
    pub const ALL: [Self; 8] = [
        Self::Landing,
        Self::Events,
        Self::Donate,
        Self::Groups,
        Self::AskAi,
        Self::SignIn,
        Self::SignUp,
        Self::ProfileEditor,
    ];

    /// URL path of the view.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::SignIn => "/login",
            Self::SignUp => "/register",
            Self::ProfileEditor => "/profile",
            Self::Events => "/events",
            Self::Groups => "/groups",
            Self::Donate => "/donate",
            Self::AskAi => "/ask-ai",
        }
    }

    /// Resolve a URL path, ignoring a trailing slash.
    ///
    /// # Examples
    /// ```
    /// use ecoba_client::domain::Route;
    ///
    /// assert_eq!(Route::from_path("/profile/"), Some(Route::ProfileEditor));
    /// assert_eq!(Route::from_path("/nowhere"), None);
    /// ```
    pub fn from_path(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        let normalised = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL
            .into_iter()
            .find(|route| route.path() == normalised)
    }

    /// Who may see the view.
    pub const fn access(self) -> ViewAccess {
        match self {
            Self::ProfileEditor => ViewAccess::RequiresAuthenticated,
            Self::SignIn | Self::SignUp => ViewAccess::AnonymousOnly,
            Self::Landing | Self::Events | Self::Groups | Self::Donate | Self::AskAi => {
                ViewAccess::Public
            }
        }
    }
}

/// Access level a view declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewAccess {
    Public,
    RequiresAuthenticated,
    AnonymousOnly,
}

/// Authentication status as far as navigation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// The bootstrap probe has not resolved yet.
    Unknown,
    Unauthenticated,
    Authenticated,
}

impl From<&Session> for AuthState {
    fn from(session: &Session) -> Self {
        if session.is_loading() {
            Self::Unknown
        } else if session.is_authenticated() {
            Self::Authenticated
        } else {
            Self::Unauthenticated
        }
    }
}

/// What a guarded view should do for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "route")]
pub enum GuardAction {
    ShowLoading,
    Render,
    Redirect(Route),
}

/// Per-view redirect policy.
///
/// ## Invariants
/// - Never redirects while the state is [`AuthState::Unknown`].
/// - Yields at most one action per distinct observed state in a row.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    route: Route,
    last: Option<AuthState>,
}

impl NavigationGuard {
    /// Guard for `route`, with no state observed yet.
    pub fn new(route: Route) -> Self {
        Self { route, last: None }
    }

    /// Route being guarded.
    pub fn route(&self) -> Route {
        self.route
    }

    /// Decide what to do for `session`; `None` when the state is unchanged.
    pub fn evaluate(&mut self, session: &Session) -> Option<GuardAction> {
        let state = AuthState::from(session);
        if self.last == Some(state) {
            return None;
        }
        self.last = Some(state);
        Some(Self::decide(self.route.access(), state))
    }

    fn decide(access: ViewAccess, state: AuthState) -> GuardAction {
        match (state, access) {
            (AuthState::Unknown, _) => GuardAction::ShowLoading,
            (AuthState::Unauthenticated, ViewAccess::RequiresAuthenticated) => {
                GuardAction::Redirect(Route::SignIn)
            }
            (AuthState::Authenticated, ViewAccess::AnonymousOnly) => {
                GuardAction::Redirect(Route::Landing)
            }
            _ => GuardAction::Render,
        }
    }
}

struct GuardCell {
    guard: NavigationGuard,
    current: GuardAction,
}

/// A mounted view wired to session changes.
///
/// Redirects go through the [`Navigator`]; dropping the view unsubscribes.
pub struct GuardedView {
    cell: Arc<Mutex<GuardCell>>,
    _subscription: Subscription,
}

impl GuardedView {
    /// Mount `route`, acting on the current session and every later change.
    pub fn mount(store: &SessionStore, route: Route, navigator: Arc<dyn Navigator>) -> Self {
        let cell = Arc::new(Mutex::new(GuardCell {
            guard: NavigationGuard::new(route),
            current: GuardAction::ShowLoading,
        }));
        let listener_cell = Arc::clone(&cell);
        let listener_navigator = Arc::clone(&navigator);
        let subscription = store.subscribe(Arc::new(move |session: &Session| {
            react(&listener_cell, listener_navigator.as_ref(), session);
        }));
        react(&cell, navigator.as_ref(), &store.current());
        Self {
            cell,
            _subscription: subscription,
        }
    }

    /// Most recent decision for this view.
    pub fn action(&self) -> GuardAction {
        self.cell
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
    }
}

impl std::fmt::Debug for GuardedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedView")
            .field("action", &self.action())
            .finish_non_exhaustive()
    }
}

fn react(cell: &Mutex<GuardCell>, navigator: &dyn Navigator, session: &Session) {
    let (route, action) = {
        let mut cell = cell.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(action) = cell.guard.evaluate(session) else {
            return;
        };
        cell.current = action;
        (cell.guard.route(), action)
    };
    if let GuardAction::Redirect(target) = action {
        debug!(from = route.path(), to = target.path(), "guard redirect");
        navigator.redirect(target);
    }
}

/// Header actions available for a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Affordances {
    pub sign_in: bool,
    pub sign_up: bool,
    pub profile: bool,
    pub sign_out: bool,
}

impl Affordances {
    /// Derive header actions; nothing account-related shows while loading.
    pub fn for_session(session: &Session) -> Self {
        match AuthState::from(session) {
            AuthState::Unknown => Self::default(),
            AuthState::Unauthenticated => Self {
                sign_in: true,
                sign_up: true,
                ..Self::default()
            },
            AuthState::Authenticated => Self {
                profile: true,
                sign_out: true,
                ..Self::default()
            },
        }
    }
}
