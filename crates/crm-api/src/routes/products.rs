//! Product routes

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use crm_auth::MaybeUser;
use crm_db::{NewProduct, Product};

use super::types::{ApiResponse, ProductRequest};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

/// GET /api/products
async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Product>>>, ApiError> {
    let products = state.db.list_products().await?;
    Ok(Json(ApiResponse::ok(products, "Products retrieved successfully")))
}

/// GET /api/products/{id}
async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let product = state
        .db
        .get_product(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;
    Ok(Json(ApiResponse::ok(product, "Product retrieved successfully")))
}

/// POST /api/products
async fn create_product(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let product = state.db.insert_product(NewProduct::try_from(request)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(product, "Product created successfully")),
    ))
}

/// PUT /api/products/{id}
async fn update_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<ProductRequest>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let product = state
        .db
        .update_product(&id, NewProduct::try_from(request)?)
        .await?;
    Ok(Json(ApiResponse::ok(product, "Product updated successfully")))
}

/// DELETE /api/products/{id}
async fn delete_product(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.authorize_delete(user.as_ref())?;
    state.db.delete_product(&id).await?;
    Ok(Json(ApiResponse::message("Product deleted successfully")))
}

/// Create product routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}
