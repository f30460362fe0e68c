//! CRM REST API
//!
//! This crate provides the Axum-based HTTP API for the CRM backend:
//! account endpoints, the resource endpoints and the JSON envelope every
//! response is wrapped in.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
