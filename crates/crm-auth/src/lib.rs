//! CRM Authentication and Authorization
//!
//! This crate provides bearer-token issuance and verification, password
//! hashing, and the axum middleware that resolves a token to a live user
//! and gates routes by role.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use error::AuthError;
pub use jwt::{Claims, JwtManager};
pub use middleware::{
    AuthContext, CurrentUser, MaybeUser, authenticate, authorize_role, check_role, optional_auth,
};
pub use password::{hash_password, verify_password};
