//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("{0}")]
    InvalidReference(String),
}

impl DbError {
    /// Classify a write failure, keeping constraint violations distinct
    /// from connection-level errors.
    pub(crate) fn from_write(err: sqlx::Error, reference_message: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_foreign_key_violation() {
                return DbError::InvalidReference(reference_message.to_string());
            }
            if db_err.is_unique_violation() {
                return DbError::Duplicate(db_err.message().to_string());
            }
        }
        DbError::Connection(err)
    }
}
