//! API routes

mod activities;
mod auth;
mod customer_products;
mod customers;
mod health;
mod interactions;
pub mod metrics;
mod products;
pub mod types;
mod users;

use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    middleware::from_fn_with_state,
    response::IntoResponse,
};
use crm_auth::authenticate;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::state::{AppState, MetricsHandle};

/// Resource endpoints, gated by `authenticate` when protection is on
fn resource_routes(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .merge(customers::routes())
        .merge(interactions::routes())
        .merge(products::routes())
        .merge(customer_products::routes())
        .merge(activities::routes());

    if state.protect_resources {
        router.route_layer(from_fn_with_state(state.auth.clone(), authenticate))
    } else {
        router
    }
}

/// Fallback for unmatched routes
async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": format!("Route {} not found", uri.path())
        })),
    )
}

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let mut router = Router::new()
        .merge(health::routes())
        .merge(auth::routes(&state))
        .merge(users::routes(&state))
        .merge(resource_routes(&state))
        .with_state(state);

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router.fallback(not_found).layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, header},
    };
    use crm_auth::{JwtManager, hash_password};
    use crm_db::{Database, NewUser, UserRole};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn test_state(protect_resources: bool) -> AppState {
        let db = Database::in_memory().await.unwrap();
        let jwt = Arc::new(JwtManager::new("test-secret", 24));
        AppState::new(db, jwt, protect_resources)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn register(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
        send(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Jane Doe", "email": email, "password": password })),
        )
        .await
    }

    async fn register_token(app: &Router, email: &str) -> String {
        let (status, body) = register(app, email, "secret1").await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn staff_token(state: &AppState, email: &str, role: UserRole) -> String {
        let user = state
            .db
            .insert_user(NewUser {
                name: "Staff".to_string(),
                email: email.to_string(),
                password_hash: hash_password("staffpass").unwrap(),
                company: None,
                role,
            })
            .await
            .unwrap();
        state
            .auth
            .jwt
            .generate_token(&user.id, &user.email, user.role.as_str())
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_scenario() {
        let app = create_router(test_state(true).await, None);

        let (status, body) = register(&app, "JANE@EXAMPLE.COM", "secret1").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "User registered successfully");
        assert_eq!(body["data"]["user"]["email"], "jane@example.com");
        assert_eq!(body["data"]["user"]["role"], "sales");
        assert!(body["data"]["user"].get("password").is_none());
        assert!(body["data"]["user"].get("password_hash").is_none());
        assert!(!body["data"]["token"].as_str().unwrap().is_empty());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": " Jane@Example.com ", "password": "secret1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login successful");
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let app = create_router(test_state(true).await, None);
        register(&app, "jane@example.com", "secret1").await;

        let (status, body) = register(&app, "Jane@Example.com", "secret1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("already exists"));
    }

    #[tokio::test]
    async fn test_login_failure_is_unauthorized() {
        let app = create_router(test_state(true).await, None);
        register(&app, "jane@example.com", "secret1").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "jane@example.com", "password": "wrong!" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_profile_requires_token() {
        let app = create_router(test_state(true).await, None);

        let (status, body) = send(&app, Method::GET, "/api/auth/profile", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access token is required");

        let token = register_token(&app, "jane@example.com").await;
        let (status, body) = send(&app, Method::GET, "/api/auth/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["email"], "jane@example.com");

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/auth/profile",
            Some(&token),
            Some(json!({ "company": "Acme" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["user"]["company"], "Acme");
        assert_eq!(body["data"]["user"]["name"], "Jane Doe");
    }

    #[tokio::test]
    async fn test_logout_always_succeeds() {
        let app = create_router(test_state(true).await, None);

        let (status, body) = send(&app, Method::POST, "/api/auth/logout", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _) =
            send(&app, Method::POST, "/api/auth/logout", Some("not-a-token"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_password_change_scenario() {
        let app = create_router(test_state(true).await, None);
        let token = register_token(&app, "jane@example.com").await;

        let change = |current: &str, new: &str| {
            json!({ "currentPassword": current, "newPassword": new })
        };

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/auth/change-password",
            Some(&token),
            Some(change("wrong-password", "secret2")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Current password is incorrect");

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/auth/change-password",
            Some(&token),
            Some(change("secret1", "12345")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("at least 6"));

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/auth/change-password",
            Some(&token),
            Some(change("secret1", "secret2")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let login = |password: &str| json!({ "email": "jane@example.com", "password": password });
        let (status, _) =
            send(&app, Method::POST, "/api/auth/login", None, Some(login("secret2"))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) =
            send(&app, Method::POST, "/api/auth/login", None, Some(login("secret1"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_role_gates() {
        let state = test_state(true).await;
        let app = create_router(state.clone(), None);
        let sales = register_token(&app, "sam@example.com").await;
        let admin = staff_token(&state, "admin@example.com", UserRole::Admin).await;
        let support = staff_token(&state, "sue@example.com", UserRole::Support).await;

        let (status, body) = send(&app, Method::GET, "/api/users", Some(&sales), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Insufficient permissions");

        let (status, body) = send(&app, Method::GET, "/api/users", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
        assert!(body["data"][0].get("password_hash").is_none());

        // Deletion is open to admin and sales only
        let customer = json!({ "name": "Ada", "email": "ada@example.com" });
        let (_, created) =
            send(&app, Method::POST, "/api/customers", Some(&sales), Some(customer)).await;
        let uri = format!("/api/customers/{}", created["data"]["id"].as_str().unwrap());

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&support), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = send(&app, Method::DELETE, &uri, Some(&sales), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Customer deleted successfully");
        let (status, body) = send(&app, Method::DELETE, &uri, Some(&sales), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Customer not found");
    }

    #[tokio::test]
    async fn test_resource_protection_toggle() {
        let app = create_router(test_state(true).await, None);
        let (status, body) = send(&app, Method::GET, "/api/customers", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access token is required");

        let open = create_router(test_state(false).await, None);
        let (status, body) = send(&open, Method::GET, "/api/customers", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));

        // The user directory stays gated regardless
        let (status, _) = send(&open, Method::GET, "/api/users", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_interaction_requires_fields() {
        let app = create_router(test_state(true).await, None);
        let token = register_token(&app, "jane@example.com").await;

        let (_, customer) = send(
            &app,
            Method::POST,
            "/api/customers",
            Some(&token),
            Some(json!({ "name": "Ada", "email": "ada@example.com" })),
        )
        .await;
        let customer_id = customer["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/interactions",
            Some(&token),
            Some(json!({ "customer_id": customer_id, "type": "call", "description": "Intro" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("required"));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/interactions",
            Some(&token),
            Some(json!({
                "customer_id": "no-such-customer",
                "type": "call",
                "description": "Intro",
                "date": "2030-01-01T10:00:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Customer does not exist");

        let (_, list) = send(&app, Method::GET, "/api/interactions", Some(&token), None).await;
        assert_eq!(list["data"], json!([]));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/interactions",
            Some(&token),
            Some(json!({
                "customer_id": customer_id,
                "type": "meeting",
                "description": "Demo",
                "date": "2030-01-01T10:00:00Z"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["type"], "meeting");
        assert_eq!(body["data"]["status"], "scheduled");

        let (_, upcoming) =
            send(&app, Method::GET, "/api/interactions/upcoming", Some(&token), None).await;
        assert_eq!(upcoming["data"][0]["customer_name"], "Ada");
    }

    #[tokio::test]
    async fn test_customer_search_and_stats() {
        let app = create_router(test_state(false).await, None);
        for (name, email) in [("Ada Lovelace", "ada@example.com"), ("Grace", "grace@navy.mil")] {
            let (status, _) = send(
                &app,
                Method::POST,
                "/api/customers",
                None,
                Some(json!({ "name": name, "email": email })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(&app, Method::GET, "/api/customers/search", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Search query is required");

        let (_, body) = send(&app, Method::GET, "/api/customers/search?q=NAVY", None, None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) =
            send(&app, Method::GET, "/api/customers/search/name", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Name parameter is required");

        let (_, body) = send(&app, Method::GET, "/api/customers/stats", None, None).await;
        assert_eq!(body["data"]["total"], 2);
        assert_eq!(body["data"]["leads"], 2);

        let (status, _) = send(&app, Method::GET, "/api/customers/status/vip", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_and_unknown_route() {
        let app = create_router(test_state(false).await, None);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/customers",
            None,
            Some(json!({ "name": "Ada", "email": "ada@example.com", "status": "vip" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send(&app, Method::GET, "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route /api/nope not found");
    }

    #[tokio::test]
    async fn test_extractor_rejections_use_envelope() {
        let app = create_router(test_state(false).await, None);

        let (status, body) =
            send(&app, Method::GET, "/api/customers/search?q=a&q=b", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("duplicate field"));

        let (status, body) = send(&app, Method::GET, "/api/products/%FF", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_product_routes() {
        let state = test_state(true).await;
        let app = create_router(state.clone(), None);
        let sales = register_token(&app, "sam@example.com").await;
        let support = staff_token(&state, "sue@example.com", UserRole::Support).await;

        let (status, _) = send(&app, Method::GET, "/api/products", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/products",
            Some(&sales),
            Some(json!({ "description": "No name", "price": 10.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Product name is required");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/products",
            Some(&sales),
            Some(json!({ "name": "CRM Pro", "price": 49.5, "category": "software" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Product created successfully");
        assert_eq!(body["data"]["status"], "active");
        assert_eq!(body["data"]["price"], 49.5);
        let uri = format!("/api/products/{}", body["data"]["id"].as_str().unwrap());

        let (status, body) = send(&app, Method::GET, &uri, Some(&support), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "CRM Pro");

        let (status, body) = send(&app, Method::DELETE, &uri, Some(&support), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Insufficient permissions");

        let (status, body) = send(&app, Method::DELETE, &uri, Some(&sales), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Product deleted successfully");

        let (status, body) = send(&app, Method::GET, &uri, Some(&sales), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Product not found");
    }

    #[tokio::test]
    async fn test_customer_product_routes() {
        let state = test_state(true).await;
        let app = create_router(state.clone(), None);
        let sales = register_token(&app, "sam@example.com").await;
        let support = staff_token(&state, "sue@example.com", UserRole::Support).await;
        let admin = staff_token(&state, "admin@example.com", UserRole::Admin).await;

        let (_, customer) = send(
            &app,
            Method::POST,
            "/api/customers",
            Some(&sales),
            Some(json!({ "name": "Ada", "email": "ada@example.com" })),
        )
        .await;
        let customer_id = customer["data"]["id"].as_str().unwrap().to_string();
        let (_, product) = send(
            &app,
            Method::POST,
            "/api/products",
            Some(&sales),
            Some(json!({ "name": "CRM Pro" })),
        )
        .await;
        let product_id = product["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = send(&app, Method::GET, "/api/customerProducts", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/customerProducts",
            Some(&sales),
            Some(json!({ "customer_id": customer_id })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Customer ID and product ID are required");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/customerProducts",
            Some(&sales),
            Some(json!({ "customer_id": "no-such-customer", "product_id": product_id })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Customer or product does not exist");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/customerProducts",
            Some(&sales),
            Some(json!({ "customer_id": customer_id, "product_id": product_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "interested");
        let uri = format!("/api/customerProducts/{}", body["data"]["id"].as_str().unwrap());

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/customerProducts/customer/{customer_id}"),
            Some(&support),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let links = body["data"].as_array().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0]["product_name"], "CRM Pro");
        assert_eq!(links[0]["product_status"], "active");

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&support), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = send(&app, Method::DELETE, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Customer product deleted successfully");
    }

    #[tokio::test]
    async fn test_activity_routes() {
        let state = test_state(true).await;
        let app = create_router(state.clone(), None);
        let sales = register_token(&app, "sam@example.com").await;
        let support = staff_token(&state, "sue@example.com", UserRole::Support).await;

        let (_, customer) = send(
            &app,
            Method::POST,
            "/api/customers",
            Some(&sales),
            Some(json!({ "name": "Ada", "email": "ada@example.com" })),
        )
        .await;
        let (_, interaction) = send(
            &app,
            Method::POST,
            "/api/interactions",
            Some(&sales),
            Some(json!({
                "customer_id": customer["data"]["id"],
                "type": "call",
                "description": "Intro",
                "date": "2030-01-01T10:00:00Z"
            })),
        )
        .await;
        let interaction_id = interaction["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/activities",
            Some(&sales),
            Some(json!({ "interaction_id": interaction_id, "type": "follow-up" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Interaction ID and title are required");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/activities",
            Some(&sales),
            Some(json!({ "interaction_id": "no-such-interaction", "title": "Send deck" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Interaction does not exist");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/activities",
            Some(&sales),
            Some(json!({
                "interaction_id": interaction_id,
                "type": "follow-up",
                "title": "Send deck"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Activity created successfully");
        assert_eq!(body["data"]["type"], "follow-up");
        let uri = format!("/api/activities/{}", body["data"]["id"].as_str().unwrap());

        let (status, body) = send(&app, Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Access token is required");
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&support), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&sales), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, list) = send(&app, Method::GET, "/api/activities", Some(&sales), None).await;
        assert_eq!(list["data"], json!([]));
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(test_state(true).await, None);

        let (status, body) = send(&app, Method::GET, "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "CRM API is running");
        assert!(body["data"]["timestamp"].is_string());

        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
