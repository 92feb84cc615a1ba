use super::success;
use crate::error::Result;
use crate::middleware::auth::AccessToken;
use crate::models::{AuthUser, CredentialsRequest, SessionStatus};
use crate::services::AuthService;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
    Json as JsonExtractor,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub async fn sign_up(
    State(auth_service): State<Arc<AuthService>>,
    JsonExtractor(request): JsonExtractor<CredentialsRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let session = auth_service.sign_up(request).await?;
    Ok((StatusCode::CREATED, success(session)))
}

pub async fn sign_in(
    State(auth_service): State<Arc<AuthService>>,
    JsonExtractor(request): JsonExtractor<CredentialsRequest>,
) -> Result<Json<Value>> {
    let session = auth_service.sign_in(request).await?;
    Ok(success(session))
}

pub async fn sign_out(
    State(auth_service): State<Arc<AuthService>>,
    Extension(user): Extension<AuthUser>,
    Extension(AccessToken(token)): Extension<AccessToken>,
) -> Result<Json<Value>> {
    auth_service.sign_out(&user, &token).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Successfully signed out"
    })))
}

/// Who is signed in, if anyone. Never fails on a bad or missing token.
pub async fn get_session(user: Option<Extension<AuthUser>>) -> Json<Value> {
    let status = match user {
        Some(Extension(user)) => SessionStatus {
            user_id: Some(user.id),
            email: user.email,
        },
        None => SessionStatus {
            user_id: None,
            email: None,
        },
    };
    success(status)
}
