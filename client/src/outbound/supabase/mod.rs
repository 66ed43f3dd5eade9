//! Supabase outbound adapters.
//!
//! [`SupabaseIdentityGateway`] speaks the GoTrue auth API and
//! [`SupabaseProfileRepository`] the PostgREST `profiles` table. Both share one
//! [`SupabaseConnection`]: a reqwest client, the project URL, the anonymous
//! key and the in-memory session tokens.

mod auth_client;
mod dto;
mod profiles_client;

pub use auth_client::SupabaseIdentityGateway;
pub use profiles_client::SupabaseProfileRepository;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::{Client, Method, RequestBuilder, Url};
use zeroize::Zeroizing;

use crate::config::{IdentityServiceSettings, SettingsError};
use crate::domain::Identity;

const USER_AGENT: &str = "ecoba-client/0.1";

/// Failures while building a connection from settings.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Tokens for the session the provider issued to this client.
pub(crate) struct SessionTokens {
    pub(crate) access_token: Zeroizing<String>,
    pub(crate) refresh_token: Zeroizing<String>,
    pub(crate) identity: Identity,
}

/// HTTP plumbing shared by the auth and profile adapters.
pub struct SupabaseConnection {
    client: Client,
    base_url: Url,
    anon_key: Zeroizing<String>,
    tokens: Mutex<Option<SessionTokens>>,
}

impl SupabaseConnection {
    /// Build a connection from validated settings.
    ///
    /// # Errors
    /// Fails when settings are incomplete or the HTTP client cannot be built.
    pub fn from_settings(settings: &IdentityServiceSettings) -> Result<Arc<Self>, ConnectionError> {
        let base_url = settings.base_url()?;
        let anon_key = settings.anon_key()?.to_owned();
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Arc::new(Self::new(client, base_url, anon_key)))
    }

    fn new(client: Client, base_url: Url, anon_key: String) -> Self {
        Self {
            client,
            base_url,
            anon_key: Zeroizing::new(anon_key),
            tokens: Mutex::new(None),
        }
    }

    /// Identity gateway bound to this connection.
    pub fn identity_gateway(self: &Arc<Self>) -> SupabaseIdentityGateway {
        SupabaseIdentityGateway::new(Arc::clone(self))
    }

    /// Profile repository bound to this connection.
    pub fn profile_repository(self: &Arc<Self>) -> SupabaseProfileRepository {
        SupabaseProfileRepository::new(Arc::clone(self))
    }

    fn tokens(&self) -> MutexGuard<'_, Option<SessionTokens>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn store_tokens(&self, tokens: SessionTokens) {
        *self.tokens() = Some(tokens);
    }

    pub(crate) fn clear_tokens(&self) -> Option<SessionTokens> {
        self.tokens().take()
    }

    pub(crate) fn access_token(&self) -> Option<Zeroizing<String>> {
        self.tokens()
            .as_ref()
            .map(|tokens| tokens.access_token.clone())
    }

    pub(crate) fn refresh_token(&self) -> Option<Zeroizing<String>> {
        self.tokens()
            .as_ref()
            .map(|tokens| tokens.refresh_token.clone())
    }

    pub(crate) fn set_identity(&self, identity: Identity) {
        if let Some(tokens) = self.tokens().as_mut() {
            tokens.identity = identity;
        }
    }

    /// Absolute URL for `path` beneath the project URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }

    /// Request carrying the API key and the session bearer, falling back to
    /// the anonymous key when signed out.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());
        self.client
            .request(method, url)
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(bearer.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
    }
}

impl std::fmt::Debug for SupabaseConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConnection")
            .field("base_url", &self.base_url.as_str())
            .field("signed_in", &self.tokens().is_some())
            .finish_non_exhaustive()
    }
}

/// Whitespace-collapsed prefix of a response body for error messages.
pub(crate) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

fn status_message(status: reqwest::StatusCode, body: &[u8]) -> String {
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {preview}", status.as_u16())
    }
}

#[cfg(test)]
pub(crate) fn test_connection() -> SupabaseConnection {
    let base_url = Url::parse("https://project.supabase.co/").expect("fixture url");
    SupabaseConnection::new(Client::new(), base_url, "anon-key".to_owned())
}
