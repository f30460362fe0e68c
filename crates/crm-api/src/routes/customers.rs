//! Customer routes

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use crm_auth::MaybeUser;
use crm_core::non_blank;
use crm_db::{Customer, CustomerStats, CustomerStatus, NewCustomer};
use tracing::info;

use super::types::{ApiResponse, CustomerRequest, NameQuery, SearchQuery};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

type CustomerList = Json<ApiResponse<Vec<Customer>>>;

/// GET /api/customers
async fn list_customers(State(state): State<AppState>) -> Result<CustomerList, ApiError> {
    let customers = state.db.list_customers().await?;
    Ok(Json(ApiResponse::ok(customers, "Customers retrieved successfully")))
}

/// GET /api/customers/stats
async fn customer_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CustomerStats>>, ApiError> {
    let stats = state.db.get_customer_stats().await?;
    Ok(Json(ApiResponse::ok(
        stats,
        "Customer statistics retrieved successfully",
    )))
}

/// GET /api/customers/search?q=
async fn search_customers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<CustomerList, ApiError> {
    let q = non_blank(query.q.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Search query is required".to_string()))?;
    let customers = state.db.search_customers(q).await?;
    Ok(Json(ApiResponse::ok(customers, "Search results retrieved successfully")))
}

/// GET /api/customers/search/name?name=
async fn search_customers_by_name(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NameQuery>,
) -> Result<CustomerList, ApiError> {
    let name = non_blank(query.name.as_deref())
        .ok_or_else(|| ApiError::BadRequest("Name parameter is required".to_string()))?;
    let customers = state.db.search_customers_by_name(name).await?;
    Ok(Json(ApiResponse::ok(customers, "Search results retrieved successfully")))
}

/// GET /api/customers/status/{status}
async fn customers_by_status(
    State(state): State<AppState>,
    ApiPath(status): ApiPath<String>,
) -> Result<CustomerList, ApiError> {
    let parsed: CustomerStatus = status
        .parse()
        .map_err(|e: crm_db::ParseError| ApiError::BadRequest(e.to_string()))?;
    let customers = state.db.list_customers_by_status(parsed).await?;
    Ok(Json(ApiResponse::ok(
        customers,
        format!("Customers with status '{status}' retrieved successfully"),
    )))
}

/// GET /api/customers/{id}
async fn get_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ApiResponse<Customer>>, ApiError> {
    let customer = state
        .db
        .get_customer(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Customer not found".to_string()))?;
    Ok(Json(ApiResponse::ok(customer, "Customer retrieved successfully")))
}

/// POST /api/customers
async fn create_customer(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Customer>>), ApiError> {
    let customer = state.db.insert_customer(NewCustomer::try_from(request)?).await?;
    info!("Created customer: {}", customer.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(customer, "Customer created successfully")),
    ))
}

/// PUT /api/customers/{id}
async fn update_customer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
    ApiJson(request): ApiJson<CustomerRequest>,
) -> Result<Json<ApiResponse<Customer>>, ApiError> {
    let customer = state
        .db
        .update_customer(&id, NewCustomer::try_from(request)?)
        .await?;
    Ok(Json(ApiResponse::ok(customer, "Customer updated successfully")))
}

/// DELETE /api/customers/{id}
async fn delete_customer(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.authorize_delete(user.as_ref())?;
    state.db.delete_customer(&id).await?;
    info!("Deleted customer: {}", id);

    Ok(Json(ApiResponse::message("Customer deleted successfully")))
}

/// Create customer routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route("/api/customers/stats", get(customer_stats))
        .route("/api/customers/search", get(search_customers))
        .route("/api/customers/search/name", get(search_customers_by_name))
        .route("/api/customers/status/{status}", get(customers_by_status))
        .route(
            "/api/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}
