use crate::error::{AppError, Result};
use crate::models::{AuthSession, AuthUser, Claims, CredentialsRequest};
use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider answered and refused, e.g. wrong password or taken email.
    #[error("{0}")]
    Rejected(String),

    #[error("identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected identity provider response: {0}")]
    Malformed(String),
}

impl From<IdentityError> for AppError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::Rejected(message) => AppError::Identity(message),
            other => AppError::Remote(anyhow::Error::new(other)),
        }
    }
}

/// Hosted sign-up / sign-in / sign-out.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

/// Token grant, or a bare user when sign-up still awaits email confirmation.
#[derive(Debug, Deserialize)]
struct RemoteSession {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    user: Option<RemoteUser>,
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    email: Option<String>,
}

impl TryFrom<RemoteSession> for AuthSession {
    type Error = IdentityError;

    fn try_from(remote: RemoteSession) -> Result<Self, Self::Error> {
        let (user_id, email) = match remote.user {
            Some(user) => (user.id, user.email),
            None => match remote.id {
                Some(id) => (id, remote.email),
                None => return Err(IdentityError::Malformed("response carries no user".to_string())),
            },
        };

        Ok(AuthSession {
            access_token: remote.access_token,
            refresh_token: remote.refresh_token,
            expires_in: remote.expires_in,
            user_id,
            email,
        })
    }
}

/// `url` with a trailing slash, so relative joins stay below its last path
/// segment instead of replacing it.
pub fn as_directory(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Client for a GoTrue-style auth API (`/auth/v1/...`).
pub struct HostedAuthClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl HostedAuthClient {
    pub fn new(base_url: Url, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: as_directory(base_url),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.base_url
            .join(path)
            .map_err(|e| IdentityError::Malformed(format!("bad auth url: {}", e)))
    }

    async fn post_credentials(&self, url: Url, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejection(status, response.json::<Value>().await.ok()));
        }

        let remote: RemoteSession = response
            .json()
            .await
            .map_err(|e| IdentityError::Malformed(e.to_string()))?;
        remote.try_into()
    }
}

/// Best human-readable message of an error body.
fn rejection(status: StatusCode, body: Option<Value>) -> IdentityError {
    let message = body
        .as_ref()
        .and_then(|body| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| body.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("request failed with status {}", status));

    if status.is_server_error() {
        IdentityError::Malformed(message)
    } else {
        IdentityError::Rejected(message)
    }
}

#[async_trait]
impl IdentityProvider for HostedAuthClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let url = self.endpoint("auth/v1/signup")?;
        self.post_credentials(url, email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        self.post_credentials(url, email, password).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let url = self.endpoint("auth/v1/logout")?;
        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejection(status, response.json::<Value>().await.ok()));
        }
        Ok(())
    }
}

/// Token verification for the route gate plus the credential flows.
pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>, jwt_secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);

        Self {
            provider,
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Checks signature, expiry and audience of an access token.
    pub fn verify_token(&self, token: &str) -> Result<AuthUser> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;
        Ok(data.claims.into())
    }

    pub async fn sign_up(&self, request: CredentialsRequest) -> Result<AuthSession> {
        request.validate()?;
        let session = self.provider.sign_up(request.email.trim(), &request.password).await?;
        info!(user_id = %session.user_id, "User signed up");
        Ok(session)
    }

    pub async fn sign_in(&self, request: CredentialsRequest) -> Result<AuthSession> {
        request.validate()?;
        let session = self
            .provider
            .sign_in(request.email.trim(), &request.password)
            .await
            .map_err(|e| {
                warn!(error = %e, "Sign-in failed");
                e
            })?;
        info!(user_id = %session.user_id, "User signed in");
        Ok(session)
    }

    pub async fn sign_out(&self, user: &AuthUser, access_token: &str) -> Result<()> {
        self.provider.sign_out(access_token).await?;
        info!(user_id = %user.id, "User signed out");
        Ok(())
    }
}
