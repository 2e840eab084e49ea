// Session identity, password hashing and role checks.

pub mod authenticator;
pub mod authorizer;
pub mod password;
pub mod store;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::models::Role;

pub use authenticator::authenticate;
pub use authorizer::{authorize, Action};
pub use store::{CredentialStore, PgCredentialStore};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unknown user '{0}'")]
    NotFound(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("role {role} may not {action}")]
    Forbidden { role: Role, action: Action },

    #[error("credential store unavailable: {0}")]
    Store(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("invalid session: {0}")]
    InvalidSession(String),

    #[error("session signing key not configured")]
    MissingSecret,
}

/// Who is making the request. Passed explicitly to every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub username: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(identity: &SessionIdentity, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: identity.user_id,
            username: identity.username.clone(),
            role: identity.role,
            exp,
            iat: now.timestamp(),
        }
    }
}

impl From<Claims> for SessionIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::InvalidSession(e.to_string()))
}

/// Decode a session token; expiry is checked by `Validation::default()`.
pub fn validate_jwt(token: &str, secret: &str) -> Result<SessionIdentity, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AuthError::InvalidSession(e.to_string()))?;

    Ok(token_data.claims.into())
}
