//! Customer-product routes

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use crm_auth::MaybeUser;
use crm_db::{CustomerProduct, NewCustomerProduct};

use super::types::{ApiResponse, CustomerProductRequest};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

type CustomerProductList = Json<ApiResponse<Vec<CustomerProduct>>>;

/// GET /api/customerProducts
async fn list_customer_products(
    State(state): State<AppState>,
) -> Result<CustomerProductList, ApiError> {
    let links = state.db.list_customer_products().await?;
    Ok(Json(ApiResponse::ok(
        links,
        "Customer products retrieved successfully",
    )))
}

/// GET /api/customerProducts/customer/{customer_id}
async fn customer_products_by_customer(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<String>,
) -> Result<CustomerProductList, ApiError> {
    let links = state
        .db
        .list_customer_products_by_customer(&customer_id)
        .await?;
    Ok(Json(ApiResponse::ok(
        links,
        "Customer products retrieved successfully",
    )))
}

/// GET /api/customerProducts/{id}
async fn get_customer_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ApiResponse<CustomerProduct>>, ApiError> {
    let link = state
        .db
        .get_customer_product(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer product not found".to_string()))?;
    Ok(Json(ApiResponse::ok(
        link,
        "Customer product retrieved successfully",
    )))
}

/// POST /api/customerProducts
async fn create_customer_product(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CustomerProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerProduct>>), ApiError> {
    let link = state
        .db
        .insert_customer_product(NewCustomerProduct::try_from(request)?)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(link, "Customer product created successfully")),
    ))
}

/// PUT /api/customerProducts/{id}
async fn update_customer_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<CustomerProductRequest>,
) -> Result<Json<ApiResponse<CustomerProduct>>, ApiError> {
    let link = state
        .db
        .update_customer_product(&id, NewCustomerProduct::try_from(request)?)
        .await?;
    Ok(Json(ApiResponse::ok(
        link,
        "Customer product updated successfully",
    )))
}

/// DELETE /api/customerProducts/{id}
async fn delete_customer_product(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.authorize_delete(user.as_ref())?;
    state.db.delete_customer_product(&id).await?;
    Ok(Json(ApiResponse::message(
        "Customer product deleted successfully",
    )))
}

/// Create customer-product routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/customerProducts",
            get(list_customer_products).post(create_customer_product),
        )
        .route(
            "/api/customerProducts/customer/{customer_id}",
            get(customer_products_by_customer),
        )
        .route(
            "/api/customerProducts/{id}",
            get(get_customer_product)
                .put(update_customer_product)
                .delete(delete_customer_product),
        )
}
