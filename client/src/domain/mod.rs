//! Domain primitives, state machines and driving services.
//!
//! Purpose: keep every rule about who is signed in, what a valid form looks
//! like and where a visitor may navigate independent of the identity
//! provider and profile store behind the ports.
//!
//! Public surface:
//! - `SessionStore`: single source of truth for the current `Session`.
//! - `CredentialValidator` / `validate`: schema-driven form validation.
//! - `AccountService`: sign-in, sign-up and sign-out actions.
//! - `ProfileEditor`: profile read-modify-write cycle.
//! - `NavigationGuard` / `GuardedView`: redirect policy.

pub mod account_service;
pub mod auth;
pub mod auth_error;
pub mod error;
pub mod identity;
pub mod navigation;
pub mod notice;
pub mod pending;
pub mod ports;
pub mod profile;
pub mod profile_service;
pub mod session;
pub mod session_store;
pub mod subscription;
pub mod validation;

pub use self::account_service::AccountService;
pub use self::auth::{LoginCredentials, Registration, SignUpRequest};
pub use self::auth_error::AuthError;
pub use self::error::{ActionError, ProfileOperation};
pub use self::identity::{EmailAddress, Identity, IdentityId, IdentityValidationError};
pub use self::navigation::{
    Affordances, AuthState, GuardAction, GuardedView, NavigationGuard, Route, ViewAccess,
};
pub use self::notice::{Notice, NoticeVariant};
pub use self::pending::{PendingFlag, PendingGuard};
pub use self::profile::{BIO_MAX, Profile, ProfileUpdate};
pub use self::profile_service::{Completion, ProfileEditor};
pub use self::session::{Session, SessionChange, SessionEvent};
pub use self::session_store::SessionStore;
pub use self::subscription::{Listener, ListenerRegistry, Subscription};
pub use self::validation::{
    CredentialValidator, FieldSpec, FormInput, FormKind, FormSchema, Rule, ValidationResult,
    validate,
};

/// Convenient action result alias.
///
/// # Examples
/// ```
/// use ecoba_client::domain::{ActionError, ActionResult};
///
/// fn handler() -> ActionResult<()> {
///     Err(ActionError::NotAuthenticated)
/// }
/// assert!(handler().is_err());
/// ```
pub type ActionResult<T> = Result<T, ActionError>;
