//! Interaction routes

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use crm_auth::MaybeUser;
use crm_db::{Interaction, InteractionStats, InteractionStatus, InteractionType, NewInteraction};
use tracing::info;

use super::types::{ApiResponse, InteractionRequest};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

type InteractionList = Json<ApiResponse<Vec<Interaction>>>;

fn bad_request(e: crm_db::ParseError) -> ApiError {
    ApiError::BadRequest(e.to_string())
}

/// GET /api/interactions
async fn list_interactions(State(state): State<AppState>) -> Result<InteractionList, ApiError> {
    let interactions = state.db.list_interactions().await?;
    Ok(Json(ApiResponse::ok(
        interactions,
        "Interactions retrieved successfully",
    )))
}

/// GET /api/interactions/stats
async fn interaction_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<InteractionStats>>, ApiError> {
    let stats = state.db.get_interaction_stats().await?;
    Ok(Json(ApiResponse::ok(
        stats,
        "Interaction statistics retrieved successfully",
    )))
}

/// GET /api/interactions/upcoming
async fn upcoming_interactions(State(state): State<AppState>) -> Result<InteractionList, ApiError> {
    let interactions = state.db.list_upcoming_interactions().await?;
    Ok(Json(ApiResponse::ok(
        interactions,
        "Upcoming interactions retrieved successfully",
    )))
}

/// GET /api/interactions/type/{type}
async fn interactions_by_type(
    State(state): State<AppState>,
    ApiPath(kind): ApiPath<String>,
) -> Result<InteractionList, ApiError> {
    let parsed: InteractionType = kind.parse().map_err(bad_request)?;
    let interactions = state.db.list_interactions_by_type(parsed).await?;
    Ok(Json(ApiResponse::ok(
        interactions,
        format!("Interactions of type '{kind}' retrieved successfully"),
    )))
}

/// GET /api/interactions/status/{status}
async fn interactions_by_status(
    State(state): State<AppState>,
    ApiPath(status): ApiPath<String>,
) -> Result<InteractionList, ApiError> {
    let parsed: InteractionStatus = status.parse().map_err(bad_request)?;
    let interactions = state.db.list_interactions_by_status(parsed).await?;
    Ok(Json(ApiResponse::ok(
        interactions,
        format!("Interactions with status '{status}' retrieved successfully"),
    )))
}

/// GET /api/interactions/customer/{customer_id}
async fn interactions_by_customer(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<String>,
) -> Result<InteractionList, ApiError> {
    let interactions = state.db.list_interactions_by_customer(&customer_id).await?;
    Ok(Json(ApiResponse::ok(
        interactions,
        "Customer interactions retrieved successfully",
    )))
}

/// GET /api/interactions/{id}
async fn get_interaction(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ApiResponse<Interaction>>, ApiError> {
    let interaction = state
        .db
        .get_interaction(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Interaction not found".to_string()))?;
    Ok(Json(ApiResponse::ok(
        interaction,
        "Interaction retrieved successfully",
    )))
}

/// POST /api/interactions
async fn create_interaction(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<InteractionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Interaction>>), ApiError> {
    let interaction = state
        .db
        .insert_interaction(NewInteraction::try_from(request)?)
        .await?;
    info!("Created interaction: {}", interaction.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(interaction, "Interaction created successfully")),
    ))
}

/// PUT /api/interactions/{id}
async fn update_interaction(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<InteractionRequest>,
) -> Result<Json<ApiResponse<Interaction>>, ApiError> {
    let interaction = state
        .db
        .update_interaction(&id, NewInteraction::try_from(request)?)
        .await?;
    Ok(Json(ApiResponse::ok(
        interaction,
        "Interaction updated successfully",
    )))
}

/// DELETE /api/interactions/{id}
async fn delete_interaction(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.authorize_delete(user.as_ref())?;
    state.db.delete_interaction(&id).await?;
    info!("Deleted interaction: {}", id);

    Ok(Json(ApiResponse::message("Interaction deleted successfully")))
}

/// Create interaction routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/interactions", get(list_interactions).post(create_interaction))
        .route("/api/interactions/stats", get(interaction_stats))
        .route("/api/interactions/upcoming", get(upcoming_interactions))
        .route("/api/interactions/type/{type}", get(interactions_by_type))
        .route("/api/interactions/status/{status}", get(interactions_by_status))
        .route(
            "/api/interactions/customer/{customer_id}",
            get(interactions_by_customer),
        )
        .route(
            "/api/interactions/{id}",
            get(get_interaction)
                .put(update_interaction)
                .delete(delete_interaction),
        )
}
