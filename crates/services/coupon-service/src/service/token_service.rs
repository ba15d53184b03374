//! Bearer token verification.
//!
//! Tokens are issued by the shop's auth system; this service only checks
//! them. `issue_token` exists for local development and tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use common::{AppResult, JwtConfig};
use domain::{UserRole, SECONDS_PER_HOUR};

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Internal user id
    pub sub: i64,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token service trait for dependency injection.
pub trait TokenService: Send + Sync {
    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;

    /// Mint a token for the given user
    fn issue_token(&self, user_id: i64, email: &str, role: UserRole) -> AppResult<String>;
}

/// HS256 implementation of TokenService.
pub struct JwtVerifier {
    secret: String,
    expiration_hours: i64,
}

impl JwtVerifier {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            expiration_hours: config.expiration_hours,
        }
    }
}

impl TokenService for JwtVerifier {
    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    fn issue_token(&self, user_id: i64, email: &str, role: UserRole) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role: role.to_string(),
            exp: (now + Duration::seconds(self.expiration_hours * SECONDS_PER_HOUR)).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }
}
