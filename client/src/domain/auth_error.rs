//! User-facing classification of identity provider failures.

use serde::Serialize;

use crate::domain::ports::IdentityGatewayError;

/// Why a sign-in or sign-up attempt failed, as shown to the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("email address not confirmed")]
    EmailNotConfirmed,
    #[error("email address already registered")]
    AlreadyRegistered,
    #[error("password rejected as too weak")]
    WeakPassword,
    #[error("authentication failed")]
    Unknown,
}

const CODE_TABLE: &[(&str, AuthError)] = &[
    ("invalid_credentials", AuthError::InvalidCredentials),
    ("invalid_grant", AuthError::InvalidCredentials),
    ("email_not_confirmed", AuthError::EmailNotConfirmed),
    ("user_already_exists", AuthError::AlreadyRegistered),
    ("email_exists", AuthError::AlreadyRegistered),
    ("weak_password", AuthError::WeakPassword),
];

// Matched against the lowercased provider message.
const MESSAGE_TABLE: &[(&str, AuthError)] = &[
    ("invalid login credentials", AuthError::InvalidCredentials),
    ("email not confirmed", AuthError::EmailNotConfirmed),
    ("already registered", AuthError::AlreadyRegistered),
    ("password should be", AuthError::WeakPassword),
    ("weak password", AuthError::WeakPassword),
];

impl AuthError {
    /// Classify a gateway failure.
    ///
    /// Structured provider codes win; the message is only inspected when no
    /// recognised code is present. Transport and decode failures are
    /// `Unknown`.
    ///
    /// # Examples
    /// ```
    /// use ecoba_client::domain::AuthError;
    /// use ecoba_client::domain::ports::IdentityGatewayError;
    ///
    /// let err = IdentityGatewayError::rejected(None::<String>, "User already registered");
    /// assert_eq!(AuthError::classify(&err), AuthError::AlreadyRegistered);
    /// ```
    #[must_use]
    pub fn classify(error: &IdentityGatewayError) -> Self {
        let IdentityGatewayError::Rejected { code, message } = error else {
            return Self::Unknown;
        };
        if let Some(kind) = code.as_deref().and_then(Self::from_code) {
            return kind;
        }
        let message = message.to_lowercase();
        MESSAGE_TABLE
            .iter()
            .find(|(needle, _)| message.contains(needle))
            .map_or(Self::Unknown, |(_, kind)| *kind)
    }

    fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        CODE_TABLE
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, kind)| *kind)
    }

    /// Message shown next to the form.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Invalid email or password. Please try again.",
            Self::EmailNotConfirmed => "Please check your email and confirm your account first.",
            Self::AlreadyRegistered => "This email is already registered. Please sign in instead.",
            Self::WeakPassword => "Password is too weak. Please choose a stronger password.",
            Self::Unknown => "An unexpected error occurred. Please try again.",
        }
    }
}
