use crate::error::AppError;
use crate::services::AuthService;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

/// The raw bearer token of an authenticated request, kept for sign-out.
#[derive(Debug, Clone)]
pub struct AccessToken(pub String);

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Gate for protected routes. Requests without a valid access token never
/// reach the handler.
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&req) {
        Some(token) => token.to_string(),
        None => {
            return AppError::Unauthorized("Authorization header missing or invalid".to_string()).into_response();
        }
    };

    let user = match auth_service.verify_token(&token) {
        Ok(user) => user,
        Err(e) => {
            debug!(error = %e, uri = %req.uri(), "Rejected request token");
            return e.into_response();
        }
    };

    req.extensions_mut().insert(user);
    req.extensions_mut().insert(AccessToken(token));

    next.run(req).await
}

/// Attaches the caller when a valid token is present and lets everything
/// else through unauthenticated.
pub async fn optional_auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(user) = bearer_token(&req).and_then(|token| auth_service.verify_token(token).ok()) {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
