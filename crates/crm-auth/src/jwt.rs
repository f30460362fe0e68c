//! JWT token management

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User email
    pub email: String,
    /// User role
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT manager for token generation and validation
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_hours: i64,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(secret: &str, token_expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_expiry_hours,
        }
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user_id: &str, email: &str, role: &str) -> Result<String, AuthError> {
        self.generate_token_at(user_id, email, role, Utc::now())
    }

    /// Generate a token as if issued at `now`
    pub fn generate_token_at(
        &self,
        user_id: &str,
        email: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let exp = Duration::try_hours(self.token_expiry_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(AuthError::InvalidTokenLifetime(self.token_expiry_hours))?;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        debug!("Generating token for user: {}", email);

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Validate a JWT token and return claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_token_at(token, Utc::now())
    }

    /// Validate a token against the clock value `now`
    ///
    /// The signature is checked first; a bad signature or malformed token is
    /// `InvalidToken`, a well-formed token past its expiry is `TokenExpired`.
    pub fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidToken)?;

        // Check expiration
        if token_data.claims.exp <= now.timestamp() {
            return Err(AuthError::TokenExpired);
        }

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generation_and_validation() {
        let manager = JwtManager::new("test-secret-key", 24);

        let token = manager
            .generate_token("user-1", "jane@example.com", "sales")
            .unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.role, "sales");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_token_validity_window() {
        let manager = JwtManager::new("test-secret-key", 24);
        let issued = Utc::now();
        let token = manager
            .generate_token_at("user-1", "jane@example.com", "sales", issued)
            .unwrap();

        let almost = issued + Duration::hours(23) + Duration::minutes(59);
        assert!(manager.validate_token_at(&token, almost).is_ok());

        let past = issued + Duration::hours(24) + Duration::minutes(1);
        assert!(matches!(
            manager.validate_token_at(&token, past),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_invalid_token() {
        let manager = JwtManager::new("test-secret-key", 24);

        let result = manager.validate_token("invalid-token");
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let manager = JwtManager::new("test-secret-key", i64::MAX);

        let result = manager.generate_token("user-1", "jane@example.com", "sales");
        assert!(matches!(result, Err(AuthError::InvalidTokenLifetime(i64::MAX))));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let ours = JwtManager::new("test-secret-key", 24);
        let theirs = JwtManager::new("another-secret", 24);

        let token = theirs
            .generate_token("user-1", "jane@example.com", "admin")
            .unwrap();
        assert!(matches!(
            ours.validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }
}
