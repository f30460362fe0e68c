//! Authentication middleware for Axum

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use crm_db::{Database, User, UserRole};
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::jwt::JwtManager;

/// Everything needed to resolve a bearer token to a live user
#[derive(Clone)]
pub struct AuthContext {
    pub jwt: Arc<JwtManager>,
    pub db: Database,
}

impl AuthContext {
    pub fn new(jwt: Arc<JwtManager>, db: Database) -> Self {
        Self { jwt, db }
    }

    /// Verify the request's bearer token and load its user
    ///
    /// The user is re-read on every call so role changes apply to the next
    /// request rather than at token expiry.
    pub async fn resolve_user(&self, headers: &HeaderMap) -> Result<User, AuthError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let claims = self.jwt.validate_token(token)?;
        let user = self
            .db
            .get_user_by_id(&claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        debug!("Authenticated user: {} ({})", user.email, user.role.as_str());
        Ok(user)
    }
}

/// Extract bearer token from authorization header
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware
///
/// Rejects the request unless it carries a valid bearer token for an
/// existing user; on success the `User` is added to request extensions.
pub async fn authenticate(
    State(ctx): State<AuthContext>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = ctx.resolve_user(request.headers()).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Like [`authenticate`], but a missing or bad token just leaves the
/// request anonymous.
pub async fn optional_auth(
    State(ctx): State<AuthContext>,
    mut request: Request,
    next: Next,
) -> Response {
    match ctx.resolve_user(request.headers()).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
        }
        Err(e) => debug!("Proceeding without user: {}", e),
    }

    next.run(request).await
}

/// Check a possibly attached user against the allowed roles
pub fn check_role(user: Option<&User>, allowed: &[UserRole]) -> Result<(), AuthError> {
    let user = user.ok_or(AuthError::NotAuthenticated)?;
    if !allowed.contains(&user.role) {
        return Err(AuthError::InsufficientPermissions);
    }
    Ok(())
}

/// Role gate; must be layered inside [`authenticate`]
///
/// ```ignore
/// router
///     .route_layer(from_fn_with_state(&[UserRole::Admin][..], authorize_role))
///     .route_layer(from_fn_with_state(auth_ctx, authenticate))
/// ```
pub async fn authorize_role(
    State(allowed): State<&'static [UserRole]>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    check_role(request.extensions().get::<User>(), allowed)?;
    Ok(next.run(request).await)
}

/// Extractor for the user attached by [`authenticate`]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::NotAuthenticated)
    }
}

/// Extractor for the user attached by [`optional_auth`], if any
pub struct MaybeUser(pub Option<User>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<User>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::StatusCode,
        middleware::from_fn_with_state,
        routing::get,
    };
    use chrono::{Duration, Utc};
    use crm_db::NewUser;
    use serde_json::Value;
    use tower::ServiceExt;

    const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];
    const ADMIN_OR_SALES: &[UserRole] = &[UserRole::Admin, UserRole::Sales];

    async fn setup() -> (AuthContext, User) {
        let db = Database::in_memory().await.unwrap();
        let user = db
            .insert_user(NewUser {
                name: "Sam Sales".to_string(),
                email: "sam@example.com".to_string(),
                password_hash: "unused".to_string(),
                company: None,
                role: UserRole::Sales,
            })
            .await
            .unwrap();
        let ctx = AuthContext::new(Arc::new(JwtManager::new("test-secret", 24)), db);
        (ctx, user)
    }

    async fn whoami(CurrentUser(user): CurrentUser) -> String {
        user.email
    }

    async fn maybe(MaybeUser(user): MaybeUser) -> String {
        user.map(|u| u.email).unwrap_or_else(|| "anonymous".to_string())
    }

    fn app(ctx: AuthContext) -> Router {
        let open = Router::new()
            .route("/maybe", get(maybe))
            .layer(from_fn_with_state(ctx.clone(), optional_auth));
        let admin = Router::new()
            .route("/admin", get(whoami))
            .route_layer(from_fn_with_state(ADMIN_ONLY, authorize_role))
            .route_layer(from_fn_with_state(ctx.clone(), authenticate));
        let staff = Router::new()
            .route("/staff", get(whoami))
            .route_layer(from_fn_with_state(ADMIN_OR_SALES, authorize_role))
            .route_layer(from_fn_with_state(ctx.clone(), authenticate));
        let ungated = Router::new()
            .route("/ungated", get(whoami))
            .route_layer(from_fn_with_state(ADMIN_ONLY, authorize_role));

        Router::new().merge(open).merge(admin).merge(staff).merge(ungated)
    }

    async fn call(app: Router, uri: &str, token: Option<&str>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn message(body: &str) -> String {
        let json: Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["success"], false);
        json["message"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[tokio::test]
    async fn test_missing_and_bad_tokens() {
        let (ctx, _) = setup().await;

        let (status, body) = call(app(ctx.clone()), "/staff", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "Access token is required");

        let (status, body) = call(app(ctx), "/staff", Some("garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "Invalid token");
    }

    #[tokio::test]
    async fn test_expired_token() {
        let (ctx, user) = setup().await;
        let token = ctx
            .jwt
            .generate_token_at(&user.id, &user.email, "sales", Utc::now() - Duration::hours(25))
            .unwrap();

        let (status, body) = call(app(ctx), "/staff", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "Token has expired");
    }

    #[tokio::test]
    async fn test_role_gate() {
        let (ctx, user) = setup().await;
        let token = ctx
            .jwt
            .generate_token(&user.id, &user.email, user.role.as_str())
            .unwrap();

        let (status, body) = call(app(ctx.clone()), "/admin", Some(&token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(message(&body), "Insufficient permissions");

        let (status, body) = call(app(ctx), "/staff", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "sam@example.com");
    }

    #[tokio::test]
    async fn test_role_gate_without_user() {
        let (ctx, _) = setup().await;

        let (status, body) = call(app(ctx), "/ungated", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "User not authenticated");
    }

    #[tokio::test]
    async fn test_deleted_user_rejected() {
        let (ctx, user) = setup().await;
        let token = ctx
            .jwt
            .generate_token(&user.id, &user.email, user.role.as_str())
            .unwrap();
        ctx.db.delete_user(&user.id).await.unwrap();

        let (status, body) = call(app(ctx), "/staff", Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "User not found");
    }

    #[tokio::test]
    async fn test_optional_auth_never_fails() {
        let (ctx, user) = setup().await;
        let token = ctx
            .jwt
            .generate_token(&user.id, &user.email, user.role.as_str())
            .unwrap();

        let (status, body) = call(app(ctx.clone()), "/maybe", Some("garbage")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");

        let (status, body) = call(app(ctx), "/maybe", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "sam@example.com");
    }

    #[test]
    fn test_check_role() {
        assert!(matches!(
            check_role(None, ADMIN_ONLY),
            Err(AuthError::NotAuthenticated)
        ));
    }
}
