//! API error types

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crm_auth::AuthError;
use crm_core::CoreError;
use crm_db::DbError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn database_parts(e: &DbError) -> (StatusCode, String) {
    match e {
        DbError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        DbError::InvalidReference(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        DbError::Duplicate(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        DbError::Connection(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string()),
    }
}

fn auth_parts(e: &AuthError) -> (StatusCode, String) {
    let status = e.status_code();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        (status, INTERNAL_MESSAGE.to_string())
    } else {
        (status, e.to_string())
    }
}

impl ApiError {
    /// Status code and client-facing message
    pub fn parts(&self) -> (StatusCode, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Core(e) => match e {
                CoreError::Validation(msg) | CoreError::Conflict(msg) => {
                    (StatusCode::BAD_REQUEST, msg.clone())
                }
                CoreError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
                CoreError::Database(db) => database_parts(db),
                CoreError::Auth(auth) => auth_parts(auth),
            },
            ApiError::Database(e) => database_parts(e),
            ApiError::Auth(e) => auth_parts(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.parts();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self);
        }

        let body = axum::Json(json!({
            "success": false,
            "message": message
        }));

        (status, body).into_response()
    }
}
