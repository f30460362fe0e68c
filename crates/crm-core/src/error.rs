//! Core error types

use crm_auth::AuthError;
use crm_db::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl CoreError {
    pub(crate) fn validation(message: &str) -> Self {
        CoreError::Validation(message.to_string())
    }
}
