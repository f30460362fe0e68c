//! Activity routes

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use crm_auth::MaybeUser;
use crm_db::{Activity, NewActivity};

use super::types::{ActivityRequest, ApiResponse};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

/// GET /api/activities
async fn list_activities(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Activity>>>, ApiError> {
    let activities = state.db.list_activities().await?;
    Ok(Json(ApiResponse::ok(activities, "Activities retrieved successfully")))
}

/// GET /api/activities/{id}
async fn get_activity(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ApiResponse<Activity>>, ApiError> {
    let activity = state
        .db
        .get_activity(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Activity not found".to_string()))?;
    Ok(Json(ApiResponse::ok(activity, "Activity retrieved successfully")))
}

/// POST /api/activities
async fn create_activity(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ActivityRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Activity>>), ApiError> {
    let activity = state.db.insert_activity(NewActivity::try_from(request)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(activity, "Activity created successfully")),
    ))
}

/// PUT /api/activities/{id}
async fn update_activity(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<ActivityRequest>,
) -> Result<Json<ApiResponse<Activity>>, ApiError> {
    let activity = state
        .db
        .update_activity(&id, NewActivity::try_from(request)?)
        .await?;
    Ok(Json(ApiResponse::ok(activity, "Activity updated successfully")))
}

/// DELETE /api/activities/{id}
async fn delete_activity(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.authorize_delete(user.as_ref())?;
    state.db.delete_activity(&id).await?;
    Ok(Json(ApiResponse::message("Activity deleted successfully")))
}

/// Create activity routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/activities", get(list_activities).post(create_activity))
        .route(
            "/api/activities/{id}",
            get(get_activity).put(update_activity).delete(delete_activity),
        )
}
