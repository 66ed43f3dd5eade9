//! Dismissible notifications shown for action outcomes.

use std::borrow::Cow;

use serde::Serialize;

/// Visual weight of a notice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeVariant {
    #[default]
    Default,
    Destructive,
}

/// Title and description rendered by the presentation layer's toaster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: Cow<'static, str>,
    pub description: Cow<'static, str>,
    pub variant: NoticeVariant,
}

impl Notice {
    /// Informational notice.
    pub fn info(
        title: impl Into<Cow<'static, str>>,
        description: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Default,
        }
    }

    /// Error notice.
    pub fn destructive(
        title: impl Into<Cow<'static, str>>,
        description: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Destructive,
        }
    }

    pub fn signed_in() -> Self {
        Self::info("Login Successful", "Welcome back to ECOBA CONNECT!")
    }

    pub fn signed_up() -> Self {
        Self::info(
            "Registration Successful!",
            "Welcome to ECOBA CONNECT! Please check your email to verify your account.",
        )
    }

    pub fn signed_out() -> Self {
        Self::info("Signed out", "You have been signed out.")
    }

    pub fn profile_updated() -> Self {
        Self::info("Profile updated", "Your profile has been successfully updated.")
    }

    /// Whether the notice reports a failure.
    pub fn is_destructive(&self) -> bool {
        self.variant == NoticeVariant::Destructive
    }
}
