//! Outcome errors of the imperative actions.
//!
//! Each action returns `Result<_, ActionError>`; the presentation layer shows
//! field errors inline and everything else through [`ActionError::notice`].

use serde::Serialize;

use crate::domain::auth_error::AuthError;
use crate::domain::notice::Notice;
use crate::domain::ports::ProfileRepositoryError;
use crate::domain::validation::{PASSWORD_MISMATCH, ValidationResult, fields};

/// Stable machine-readable code for an [`ActionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The submitted form failed validation.
    InvalidInput,
    /// The identity provider refused the request.
    AuthRejected,
    /// The profile store failed.
    ProfileUnavailable,
    /// The action needs a signed-in identity.
    Unauthorized,
}

/// Profile repository call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileOperation {
    Load,
    Update,
}

impl ProfileOperation {
    fn failure_message(self) -> &'static str {
        match self {
            Self::Load => "Failed to load profile. Please try again.",
            Self::Update => "Failed to update profile. Please try again.",
        }
    }
}

/// Why an action did not complete.
///
/// # Examples
/// ```
/// use ecoba_client::domain::{ActionError, AuthError};
/// use ecoba_client::domain::error::ErrorCode;
///
/// let err = ActionError::from(AuthError::AlreadyRegistered);
/// assert_eq!(err.code(), ErrorCode::AuthRejected);
/// assert!(err.notice().is_some());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("form validation failed")]
    Validation(ValidationResult),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("profile {operation:?} failed: {source}")]
    Repository {
        operation: ProfileOperation,
        #[source]
        source: ProfileRepositoryError,
    },
    #[error("no signed-in identity")]
    NotAuthenticated,
}

impl ActionError {
    pub(crate) fn repository(operation: ProfileOperation, source: ProfileRepositoryError) -> Self {
        Self::Repository { operation, source }
    }

    /// Machine-readable classification.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::InvalidInput,
            Self::Auth(_) => ErrorCode::AuthRejected,
            Self::Repository { .. } => ErrorCode::ProfileUnavailable,
            Self::NotAuthenticated => ErrorCode::Unauthorized,
        }
    }

    /// Field errors when the failure was local validation.
    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            Self::Validation(result) => Some(result),
            _ => None,
        }
    }

    /// Notification to show, if the failure is not already rendered inline.
    ///
    /// Field errors are shown next to their inputs; only a password mismatch
    /// is also raised as a notice.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Validation(result) => result
                .error_for(fields::CONFIRM_PASSWORD)
                .filter(|message| *message == PASSWORD_MISMATCH)
                .map(|title| {
                    Notice::destructive(title.to_owned(), "Please make sure your passwords match.")
                }),
            Self::Auth(kind) => Some(Notice::destructive(
                "Authentication failed",
                kind.user_message(),
            )),
            Self::Repository { operation, .. } => {
                Some(Notice::destructive("Error", operation.failure_message()))
            }
            Self::NotAuthenticated => Some(Notice::destructive(
                "Not signed in",
                "Please sign in to continue.",
            )),
        }
    }
}

impl From<ValidationResult> for ActionError {
    fn from(result: ValidationResult) -> Self {
        Self::Validation(result)
    }
}
