use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Claims of an access token issued by the hosted auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub aud: Option<String>,
}

/// The authenticated caller, placed in request extensions by the auth gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Session handed back by the identity provider after sign-in or sign-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Answer to "who is signed in", `user_id` is `None` when nobody is.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
}
