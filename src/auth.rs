use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

/// Token lifetime matches the mobile client's stored-session expectations.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// bcrypt cost used for stored credentials.
const HASH_COST: u32 = 10;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i32,
    pub email: String,
    pub exp: usize,
}

pub fn create_token(
    user_id: i32,
    email: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize;
    let claims = Claims {
        user_id,
        email: email.to_string(),
        exp: expiration,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    Ok(bcrypt::hash(password, HASH_COST)?)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, ApiError> {
    Ok(bcrypt::verify(password, password_hash)?)
}

/// Authenticated caller, extracted from the bearer token. Handlers that take
/// this parameter are the protected ones.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;
        let claims = validate_token(token, &state.config.jwt_secret)
            .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;
        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trip() {
        let token = create_token(42, "driver@example.com", SECRET).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.email, "driver@example.com");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_token(42, "driver@example.com", "other-secret").unwrap();
        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let mut token = create_token(42, "driver@example.com", SECRET).unwrap();
        token.push('x');
        assert!(validate_token(&token, SECRET).is_err());
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }
}
