use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;
use validator::ValidationErrors;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Failures surfaced by services and handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{entity} not found")]
    NotFound {
        entity: &'static str,
        /// Where a client navigating directly to the entity should go instead.
        redirect: Option<String>,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Folder {folder} cannot be moved into itself or one of its descendants")]
    InvalidMove { folder: Uuid },

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Identity(String),

    #[error("Remote operation failed: {0}")]
    Remote(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound {
            entity,
            redirect: None,
        }
    }

    pub fn not_found_redirect(entity: &'static str, redirect: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            redirect: Some(redirect.into()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::InvalidMove { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Identity(_) => StatusCode::BAD_REQUEST,
            Self::Remote(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |err| match (&err.message, field) {
                    (Some(message), "__all__") => message.to_string(),
                    (Some(message), _) => format!("{}: {}", field, message),
                    (None, _) => format!("{}: invalid", field),
                })
            })
            .collect();

        messages.sort();
        Self::Validation(messages.join("; "))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = match &self {
            Self::NotFound {
                redirect: Some(redirect),
                ..
            } => json!({
                "success": false,
                "error": self.to_string(),
                "redirect": redirect,
            }),
            _ => json!({
                "success": false,
                "error": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
