//! Identity service configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

/// Problems found when turning settings into adapter parameters.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("ECOBA_SUPABASE_URL is not set")]
    MissingUrl,
    #[error("ECOBA_SUPABASE_URL is not a valid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("ECOBA_SUPABASE_URL must use http or https, got {0}")]
    UnsupportedScheme(String),
    #[error("ECOBA_SUPABASE_ANON_KEY is not set")]
    MissingAnonKey,
}

/// Connection settings for the hosted identity provider and profile store.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ECOBA")]
pub struct IdentityServiceSettings {
    /// Project URL, for example `https://abc.supabase.co`.
    pub supabase_url: Option<String>,
    /// Public anonymous API key.
    pub supabase_anon_key: Option<String>,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 30)]
    pub request_timeout_secs: u64,
}

impl IdentityServiceSettings {
    /// Project base URL, normalised to end with `/` so paths join beneath it.
    ///
    /// # Errors
    /// Fails when the URL is missing, malformed or not HTTP(S).
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let raw = self
            .supabase_url
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or(SettingsError::MissingUrl)?;
        let mut url = Url::parse(raw)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SettingsError::UnsupportedScheme(url.scheme().to_owned()));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Anonymous API key sent with every request.
    ///
    /// # Errors
    /// Fails when the key is missing or blank.
    pub fn anon_key(&self) -> Result<&str, SettingsError> {
        self.supabase_anon_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(SettingsError::MissingAnonKey)
    }

    /// Request timeout; zero is raised to one second.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
