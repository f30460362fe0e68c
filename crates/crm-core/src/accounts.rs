//! Account operations
//!
//! Registration, login, logout and self-service profile management. All
//! input is validated here before any persistence call is made.

use crm_auth::{AuthError, JwtManager, hash_password, verify_password};
use crm_db::{Database, DbError, NewUser, UpdateUser, User, UserRole};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

use crate::error::CoreError;
use crate::validation::{is_valid_email, non_blank, normalize_email, password_long_enough};

const DUPLICATE_EMAIL: &str = "User already exists with this email";

// Verified against when the email is unknown so both login failures do
// comparable work.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("timing-equalization-only").ok());

/// Registration request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub company: Option<String>,
}

/// Login request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    /// `Some(None)` clears the company
    #[serde(default, deserialize_with = "deserialize_some")]
    pub company: Option<Option<String>>,
}

/// Password change request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// A user together with a freshly issued token
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Distinguish an explicit `null` from an absent field
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Account operations over the credential store and token service
#[derive(Clone)]
pub struct AccountService {
    db: Database,
    jwt: Arc<JwtManager>,
}

impl AccountService {
    pub fn new(db: Database, jwt: Arc<JwtManager>) -> Self {
        Self { db, jwt }
    }

    fn issue_token(&self, user: &User) -> Result<String, CoreError> {
        Ok(self
            .jwt
            .generate_token(&user.id, &user.email, user.role.as_str())?)
    }

    /// Register a new `sales` user and sign them in
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, CoreError> {
        let name = non_blank(input.name.as_deref());
        let email = non_blank(input.email.as_deref());
        let password = input.password.as_deref().filter(|p| !p.is_empty());

        let (Some(name), Some(email), Some(password)) = (name, email, password) else {
            return Err(CoreError::validation("Name, email, and password are required"));
        };
        if !is_valid_email(email) {
            return Err(CoreError::validation("Invalid email format"));
        }
        if !password_long_enough(password) {
            return Err(CoreError::validation(
                "Password must be at least 6 characters long",
            ));
        }

        let email = normalize_email(email);
        if self.db.email_exists(&email, None).await? {
            return Err(CoreError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let password_hash = hash_password(password)?;
        let user = self
            .db
            .insert_user(NewUser {
                name: name.to_string(),
                email,
                password_hash,
                company: non_blank(input.company.as_deref()).map(str::to_string),
                role: UserRole::Sales,
            })
            .await
            .map_err(|e| match e {
                DbError::Duplicate(_) => CoreError::Conflict(DUPLICATE_EMAIL.to_string()),
                other => other.into(),
            })?;

        let token = self.issue_token(&user)?;
        metrics::counter!("crm_registrations_total").increment(1);
        info!("Registered user: {}", user.email);

        Ok(AuthSession { user, token })
    }

    /// Exchange credentials for a token
    ///
    /// Unknown email and wrong password fail with the same message.
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, CoreError> {
        let email = non_blank(input.email.as_deref());
        let password = input.password.as_deref().filter(|p| !p.is_empty());
        let (Some(email), Some(password)) = (email, password) else {
            return Err(CoreError::validation("Email and password are required"));
        };

        let email = normalize_email(email);
        debug!("Login attempt for user: {}", email);

        let user = self.db.get_user_by_email(&email).await?;
        let user = match user {
            Some(user) if verify_password(password, &user.password_hash)? => Some(user),
            Some(_) => None,
            None => {
                if let Some(hash) = DUMMY_HASH.as_deref() {
                    let _ = verify_password(password, hash);
                }
                None
            }
        };

        let Some(user) = user else {
            metrics::counter!("crm_logins_total", "outcome" => "failure").increment(1);
            return Err(AuthError::InvalidCredentials.into());
        };

        let token = self.issue_token(&user)?;
        metrics::counter!("crm_logins_total", "outcome" => "success").increment(1);
        info!("User {} logged in successfully", user.email);

        Ok(AuthSession { user, token })
    }

    /// Advisory logout; tokens are stateless so nothing is revoked
    pub fn logout(&self, user: Option<&User>) {
        match user {
            Some(user) => info!("User {} logged out", user.email),
            None => debug!("Logout without an authenticated user"),
        }
    }

    /// Re-read the caller's record from the store
    pub async fn get_profile(&self, user_id: &str) -> Result<User, CoreError> {
        self.db
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("User not found".to_string()))
    }

    /// Apply a partial profile update
    pub async fn update_profile(&self, user_id: &str, input: ProfileUpdate) -> Result<User, CoreError> {
        let mut update = UpdateUser {
            name: non_blank(input.name.as_deref()).map(str::to_string),
            email: None,
            company: input
                .company
                .map(|company| non_blank(company.as_deref()).map(str::to_string)),
        };

        if let Some(email) = non_blank(input.email.as_deref()) {
            if !is_valid_email(email) {
                return Err(CoreError::validation("Invalid email format"));
            }
            let email = normalize_email(email);
            if self.db.email_exists(&email, Some(user_id)).await? {
                return Err(CoreError::Conflict("Email is already taken".to_string()));
            }
            update.email = Some(email);
        }

        if update.is_empty() {
            return Err(CoreError::validation("No valid fields to update"));
        }

        let user = self.db.update_user_profile(user_id, update).await.map_err(|e| match e {
            DbError::Duplicate(_) => CoreError::Conflict("Email is already taken".to_string()),
            DbError::NotFound(msg) => CoreError::NotFound(msg),
            other => other.into(),
        })?;
        info!("Updated profile for user: {}", user.email);

        Ok(user)
    }

    /// Change the caller's password after checking the current one
    pub async fn change_password(&self, user_id: &str, input: PasswordChange) -> Result<(), CoreError> {
        let current = input.current_password.as_deref().filter(|p| !p.is_empty());
        let new = input.new_password.as_deref().filter(|p| !p.is_empty());
        let (Some(current), Some(new)) = (current, new) else {
            return Err(CoreError::validation(
                "Current password and new password are required",
            ));
        };
        if !password_long_enough(new) {
            return Err(CoreError::validation(
                "New password must be at least 6 characters long",
            ));
        }

        let user = self.get_profile(user_id).await?;
        if !verify_password(current, &user.password_hash)? {
            return Err(CoreError::validation("Current password is incorrect"));
        }

        let password_hash = hash_password(new)?;
        if !self.db.update_user_password(user_id, &password_hash).await? {
            return Err(CoreError::NotFound("User not found".to_string()));
        }
        info!("Password changed for user: {}", user.email);

        Ok(())
    }
}
