use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Malformed stored document: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("No token, authorization denied")]
    MissingToken,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Forbidden")]
    Forbidden,
    #[error("Not found")]
    NotFound,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            Self::Serialization(e) => {
                tracing::error!(error = %e, "Stored document failed to deserialize");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            Self::InvalidCredentials => {
                tracing::debug!("Invalid credentials");
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            Self::MissingToken => {
                tracing::debug!("Missing token");
                (StatusCode::UNAUTHORIZED, "No token, authorization denied".to_string())
            }
            Self::InvalidToken => {
                tracing::debug!("Invalid token");
                (StatusCode::UNAUTHORIZED, "Token is not valid".to_string())
            }
            Self::Forbidden => {
                tracing::debug!("Insufficient role");
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }
            Self::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, msg)
            }
            Self::Conflict(msg) => {
                tracing::debug!(message = %msg, "Conflict");
                (StatusCode::CONFLICT, msg)
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message
        }));

        (status, body).into_response()
    }
}
