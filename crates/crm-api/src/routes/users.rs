//! User directory (admin only)

use axum::{Json, Router, extract::State, middleware::from_fn_with_state, routing::get};
use crm_auth::{authenticate, authorize_role};
use crm_db::{User, UserRole};

use super::types::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

/// GET /api/users
async fn list_users(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.db.list_users().await?;
    Ok(Json(ApiResponse::ok(users, "Users retrieved successfully")))
}

/// Create user routes
pub fn routes(state: &AppState) -> Router<AppState> {
    // Last added layer runs first: authenticate, then the role gate
    Router::new()
        .route("/api/users", get(list_users))
        .route_layer(from_fn_with_state(ADMIN_ONLY, authorize_role))
        .route_layer(from_fn_with_state(state.auth.clone(), authenticate))
}
