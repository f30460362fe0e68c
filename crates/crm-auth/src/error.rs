//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crm_db::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access token is required")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Token lifetime of {0} hours is out of range")]
    InvalidTokenLifetime(i64),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl AuthError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::InvalidTokenLifetime(_)
            | AuthError::PasswordHash(_)
            | AuthError::Jwt(_)
            | AuthError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Authentication failed internally: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = axum::Json(json!({
            "success": false,
            "message": message
        }));

        (status, body).into_response()
    }
}
