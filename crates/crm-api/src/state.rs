//! Application state

use crm_auth::{AuthContext, AuthError, JwtManager, check_role};
use crm_core::AccountService;
use crm_db::{Database, User, UserRole};
use std::sync::Arc;

/// Prometheus handle used by the `/metrics` endpoint
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Roles allowed to delete resources
pub const DELETE_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Sales];

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub accounts: AccountService,
    pub auth: AuthContext,
    /// Require a bearer token on the resource endpoints
    pub protect_resources: bool,
}

impl AppState {
    pub fn new(db: Database, jwt: Arc<JwtManager>, protect_resources: bool) -> Self {
        Self {
            accounts: AccountService::new(db.clone(), jwt.clone()),
            auth: AuthContext::new(jwt, db.clone()),
            db,
            protect_resources,
        }
    }

    /// Gate resource deletion by role when resources are protected
    pub fn authorize_delete(&self, user: Option<&User>) -> Result<(), AuthError> {
        if self.protect_resources {
            check_role(user, DELETE_ROLES)?;
        }
        Ok(())
    }
}
