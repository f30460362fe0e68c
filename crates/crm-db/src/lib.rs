//! CRM Database Layer
//!
//! This crate provides the credential store and the resource repositories
//! for the CRM backend, using SQLite via sqlx for persistence.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::{CustomerStats, Database, InteractionStats};

