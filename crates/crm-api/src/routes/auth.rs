//! Account routes under /api/auth

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use crm_auth::{CurrentUser, MaybeUser, authenticate, optional_auth};
use crm_core::{AuthSession, LoginInput, PasswordChange, ProfileUpdate, RegisterInput};
use crm_db::User;
use serde::Serialize;

use super::types::ApiResponse;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// `data` of the profile endpoints
#[derive(Serialize)]
pub struct UserData {
    pub user: User,
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<ApiResponse<AuthSession>>), ApiError> {
    let session = state.accounts.register(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(session, "User registered successfully")),
    ))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Json<ApiResponse<AuthSession>>, ApiError> {
    let session = state.accounts.login(input).await?;
    Ok(Json(ApiResponse::ok(session, "Login successful")))
}

/// POST /api/auth/logout
async fn logout(State(state): State<AppState>, MaybeUser(user): MaybeUser) -> Json<ApiResponse<()>> {
    state.accounts.logout(user.as_ref());
    Json(ApiResponse::message("Logged out successfully"))
}

/// GET /api/auth/profile
async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let user = state.accounts.get_profile(&user.id).await?;
    Ok(Json(ApiResponse::ok(
        UserData { user },
        "Profile retrieved successfully",
    )))
}

/// PUT /api/auth/profile
async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(input): ApiJson<ProfileUpdate>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let user = state.accounts.update_profile(&user.id, input).await?;
    Ok(Json(ApiResponse::ok(
        UserData { user },
        "Profile updated successfully",
    )))
}

/// PUT /api/auth/change-password
async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(input): ApiJson<PasswordChange>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.accounts.change_password(&user.id, input).await?;
    Ok(Json(ApiResponse::message("Password changed successfully")))
}

/// Create auth routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login));

    let optional = Router::new()
        .route("/api/auth/logout", post(logout))
        .route_layer(from_fn_with_state(state.auth.clone(), optional_auth));

    let private = Router::new()
        .route("/api/auth/profile", get(get_profile).put(update_profile))
        .route("/api/auth/change-password", put(change_password))
        .route_layer(from_fn_with_state(state.auth.clone(), authenticate));

    public.merge(optional).merge(private)
}
