//! CRM Core Business Logic
//!
//! This crate provides the account operations (registration, login,
//! profile and password management) and the input validation rules
//! shared by the HTTP layer.

pub mod accounts;
pub mod error;
pub mod validation;

pub use accounts::{
    AccountService, AuthSession, LoginInput, PasswordChange, ProfileUpdate, RegisterInput,
};
pub use error::CoreError;
pub use validation::{MIN_PASSWORD_LENGTH, is_valid_email, non_blank};
