//! GoTrue-backed identity gateway.
//!
//! Tokens live only in the shared [`SupabaseConnection`]; change
//! notifications are raised locally after each successful call because
//! GoTrue has no push channel.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::dto::{
    AuthErrorDto, PasswordGrantDto, RefreshGrantDto, SessionDto, SignUpBodyDto, SignUpResponseDto,
    UserDto,
};
use super::{SessionTokens, SupabaseConnection, body_preview, status_message};
use crate::domain::ports::{IdentityGateway, IdentityGatewayError, SessionChangeListener};
use crate::domain::{
    Identity, ListenerRegistry, LoginCredentials, SessionChange, SessionEvent, SignUpRequest,
    Subscription,
};

/// Identity gateway speaking the Supabase auth API.
pub struct SupabaseIdentityGateway {
    connection: Arc<SupabaseConnection>,
    changes: ListenerRegistry<SessionChange>,
}

impl SupabaseIdentityGateway {
    pub(super) fn new(connection: Arc<SupabaseConnection>) -> Self {
        Self {
            connection,
            changes: ListenerRegistry::new(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityGatewayError> {
        self.connection
            .endpoint(path)
            .map_err(|error| IdentityGatewayError::transport(format!("invalid endpoint: {error}")))
    }

    fn token_endpoint(&self, grant_type: &str) -> Result<Url, IdentityGatewayError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        Ok(url)
    }

    /// Exchange the refresh token for a new session.
    ///
    /// Emits `TokenRefreshed` on success. When the provider rejects the
    /// refresh token the local session is dropped and `SignedOut` is emitted.
    ///
    /// # Errors
    /// Returns transport and decode failures, and rejections other than an
    /// invalid refresh token.
    pub async fn refresh_session(&self) -> Result<Option<Identity>, IdentityGatewayError> {
        let Some(refresh_token) = self.connection.refresh_token() else {
            return Ok(None);
        };
        let url = self.token_endpoint("refresh_token")?;
        let request = self
            .connection
            .request(Method::POST, url)
            .json(&RefreshGrantDto {
                refresh_token: refresh_token.as_str(),
            });
        match send_json::<SessionDto>(request).await {
            Ok(session) => {
                let identity = self.start_session(session)?;
                debug!(identity = %identity.id(), "session refreshed");
                self.changes.notify(&SessionChange {
                    event: SessionEvent::TokenRefreshed,
                    identity: Some(identity.clone()),
                });
                Ok(Some(identity))
            }
            Err(IdentityGatewayError::Rejected { message, .. }) => {
                info!(reason = %message, "refresh token rejected; session ended");
                self.end_session();
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    fn start_session(&self, session: SessionDto) -> Result<Identity, IdentityGatewayError> {
        let identity = session
            .user
            .into_identity()
            .map_err(IdentityGatewayError::decode)?;
        self.connection.store_tokens(SessionTokens {
            access_token: Zeroizing::new(session.access_token),
            refresh_token: Zeroizing::new(session.refresh_token),
            identity: identity.clone(),
        });
        Ok(identity)
    }

    fn end_session(&self) {
        if self.connection.clear_tokens().is_some() {
            self.changes.notify(&SessionChange::signed_out());
        }
    }

    async fn fetch_user(&self) -> Result<Identity, IdentityGatewayError> {
        let url = self.endpoint("auth/v1/user")?;
        let user = send_json::<UserDto>(self.connection.request(Method::GET, url)).await?;
        user.into_identity().map_err(IdentityGatewayError::decode)
    }
}

impl std::fmt::Debug for SupabaseIdentityGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseIdentityGateway")
            .field("connection", &self.connection)
            .field("subscribers", &self.changes.len())
            .finish()
    }
}

#[async_trait]
impl IdentityGateway for SupabaseIdentityGateway {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<(), IdentityGatewayError> {
        let url = self.endpoint("auth/v1/signup")?;
        let builder = self
            .connection
            .request(Method::POST, url)
            .json(&SignUpBodyDto::from(request));
        match send_json::<SignUpResponseDto>(builder).await? {
            SignUpResponseDto::Session(session) => {
                let identity = self.start_session(session)?;
                self.changes.notify(&SessionChange::signed_in(identity));
            }
            SignUpResponseDto::PendingConfirmation(_) => {
                info!("sign-up awaiting email confirmation");
            }
        }
        Ok(())
    }

    async fn sign_in(&self, credentials: &LoginCredentials) -> Result<(), IdentityGatewayError> {
        let url = self.token_endpoint("password")?;
        let builder = self
            .connection
            .request(Method::POST, url)
            .json(&PasswordGrantDto {
                email: credentials.email().as_ref(),
                password: credentials.password(),
            });
        let session = send_json::<SessionDto>(builder).await?;
        let identity = self.start_session(session)?;
        self.changes.notify(&SessionChange::signed_in(identity));
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), IdentityGatewayError> {
        if self.connection.access_token().is_none() {
            return Ok(());
        }
        let url = self.endpoint("auth/v1/logout")?;
        let outcome = send(self.connection.request(Method::POST, url)).await;
        // The local session ends even when revocation fails.
        self.end_session();
        match outcome {
            Ok(_) => Ok(()),
            Err(IdentityGatewayError::Rejected { message, .. }) => {
                debug!(reason = %message, "session already revoked");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    async fn current_session(&self) -> Result<Option<Identity>, IdentityGatewayError> {
        if self.connection.access_token().is_none() {
            return Ok(None);
        }
        match self.fetch_user().await {
            Ok(identity) => {
                self.connection.set_identity(identity.clone());
                Ok(Some(identity))
            }
            Err(IdentityGatewayError::Rejected { message, .. }) => {
                warn!(reason = %message, "access token rejected; refreshing");
                self.refresh_session().await
            }
            Err(error) => Err(error),
        }
    }

    fn on_session_change(&self, listener: SessionChangeListener) -> Subscription {
        self.changes.register(listener)
    }
}

async fn send(builder: reqwest::RequestBuilder) -> Result<Vec<u8>, IdentityGatewayError> {
    let response = builder.send().await.map_err(map_transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

async fn send_json<T: DeserializeOwned>(
    builder: reqwest::RequestBuilder,
) -> Result<T, IdentityGatewayError> {
    let body = send(builder).await?;
    serde_json::from_slice(&body).map_err(|error| {
        IdentityGatewayError::decode(format!(
            "invalid auth payload: {error}; body: {}",
            body_preview(&body)
        ))
    })
}

fn map_transport_error(error: reqwest::Error) -> IdentityGatewayError {
    IdentityGatewayError::transport(error.to_string())
}

/// Client errors are provider rejections; everything else is transport.
fn map_status_error(status: StatusCode, body: &[u8]) -> IdentityGatewayError {
    if !status.is_client_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return IdentityGatewayError::transport(status_message(status, body));
    }
    let (code, message) = serde_json::from_slice::<AuthErrorDto>(body)
        .unwrap_or_default()
        .into_parts();
    let message = message.unwrap_or_else(|| status_message(status, body));
    IdentityGatewayError::rejected(code, message)
}
