use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::User;
use crate::state::AppState;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs a session token for a user, valid for 7 days.
pub fn create_token(user: &User, secret: &str) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::days(7)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => ApiError::unauthorized("Token expired"),
        _ => ApiError::unauthorized("Invalid token"),
    })
}

/// Extractor for protected routes: validates the bearer token and loads the
/// owning user. Rejections are all 401s with distinct messages.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("No authorization header provided"))?;

        // Expected: "Bearer <token>"
        let parts: Vec<&str> = header.split(' ').collect();
        if parts.len() != 2 || parts[0] != "Bearer" {
            return Err(ApiError::unauthorized("Invalid authorization format"));
        }

        let token = parts[1].trim();
        if token.is_empty() {
            return Err(ApiError::unauthorized("Token missing"));
        }

        let claims = verify_token(token, &state.config.jwt_secret)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::unauthorized("Invalid token"))?;

        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, dob, reset_password_token, \
             reset_password_expires, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_user() -> User {
        User {
            id: Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap(),
            name: Some("Asha".into()),
            email: "asha@example.com".into(),
            password_hash: "x".into(),
            dob: NaiveDate::from_ymd_opt(2000, 1, 1),
            reset_password_token: None,
            reset_password_expires: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_roundtrip_carries_id_and_email() {
        let user = sample_user();
        let token = create_token(&user, "secret").unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected_as_invalid() {
        let token = create_token(&sample_user(), "secret").unwrap();
        let err = verify_token(&token, "other").unwrap_err();
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_token("not-a-jwt", "secret").is_err());
    }
}
