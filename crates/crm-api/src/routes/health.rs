//! Health check and welcome endpoints

use axum::{Json, Router, routing::get};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};

use super::types::ApiResponse;
use crate::state::AppState;

/// Probe response for `/health`
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check handler
async fn health() -> Json<HealthResponse> {
    metrics::counter!("crm_health_checks_total").increment(1);

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/health
async fn api_health() -> Json<ApiResponse<Value>> {
    metrics::counter!("crm_health_checks_total").increment(1);

    Json(ApiResponse::ok(
        json!({ "timestamp": Utc::now().to_rfc3339() }),
        "CRM API is running",
    ))
}

/// GET /
async fn welcome() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::ok(
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "auth": "/api/auth",
                "users": "/api/users",
                "customers": "/api/customers",
                "interactions": "/api/interactions",
                "products": "/api/products",
                "customerProducts": "/api/customerProducts",
                "activities": "/api/activities",
                "health": "/api/health"
            }
        }),
        "Welcome to CRM API",
    ))
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .route("/api/health", get(api_health))
}
