use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// The model call failed or returned content we could not use.
    #[error("{message}: {details}")]
    Upstream { message: String, details: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn upstream(message: &str, err: impl std::fmt::Display) -> Self {
        AppError::Upstream {
            message: message.to_string(),
            details: err.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Upstream { .. } | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> Value {
        match self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => json!({ "message": msg }),
            AppError::Unauthorized => json!({ "message": "Not authorized" }),
            AppError::Upstream { message, details } => json!({
                "message": message,
                "details": details
            }),
            AppError::Database(_) => json!({ "message": "A database error occurred" }),
            AppError::Internal(_) => json!({ "message": "An internal server error occurred" }),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{self:?}");
        } else {
            tracing::warn!("{status}: {self}");
        }

        (status, Json(self.body())).into_response()
    }
}
