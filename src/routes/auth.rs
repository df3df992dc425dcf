use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, NaiveDate, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::{create_token, AuthUser};
use crate::error::ApiError;
use crate::mailer::SendOutcome;
use crate::models::{PublicUser, User};
use crate::state::AppState;

const USER_COLUMNS: &str = "id, name, email, password_hash, dob, reset_password_token, \
                            reset_password_expires, created_at, updated_at";

const BCRYPT_COST: u32 = 10;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub dob: Option<NaiveDate>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Deserialize)]
pub struct GoogleLoginRequest {
    pub credential: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
        .route("/api/auth/google", post(google_login))
        .route("/api/auth/me", get(me))
        .with_state(state)
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (Some(email), Some(password)) = (body.email, body.password) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let email = email.trim().to_lowercase();

    let existing: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?;
    if existing.is_some() {
        return Err(ApiError::bad_request("Email already in use"));
    }

    let password_hash =
        bcrypt::hash(&password, BCRYPT_COST).map_err(|e| ApiError::Internal(e.into()))?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, password_hash, dob) VALUES ($1, $2, $3, $4) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&body.name)
    .bind(&email)
    .bind(&password_hash)
    .bind(body.dob)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| match e {
        // the unique index closes the check-then-insert window
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::bad_request("Email already in use")
        }
        other => ApiError::from(other),
    })?;

    let token = create_token(&user, &state.config.jwt_secret)?;
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (Some(email), Some(password)) = (body.email, body.password) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let email = email.trim().to_lowercase();

    // same error for unknown email and wrong password
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(&email)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::bad_request("Invalid credentials"))?;

    let ok = bcrypt::verify(&password, &user.password_hash)
        .map_err(|e| ApiError::Internal(e.into()))?;
    if !ok {
        return Err(ApiError::bad_request("Invalid credentials"));
    }

    let token = create_token(&user, &state.config.jwt_secret)?;
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let Some(email) = body.email.filter(|e| !e.trim().is_empty()) else {
        return Err(ApiError::bad_request("Email is required"));
    };

    let email = email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(&email)
    .fetch_optional(&state.pool)
    .await?;

    // Respond the same whether or not the account exists.
    let Some(user) = user else {
        return Ok(Json(
            json!({ "message": "If this email exists, a reset link was sent." }),
        ));
    };

    let token = random_hex_token();
    let expires = Utc::now() + Duration::hours(1);

    sqlx::query(
        "UPDATE users SET reset_password_token = $1, reset_password_expires = $2, \
         updated_at = now() WHERE id = $3",
    )
    .bind(&token)
    .bind(expires)
    .bind(user.id)
    .execute(&state.pool)
    .await?;

    let reset_url = format!("{}/reset-password/{}", state.config.frontend_url, token);
    tracing::info!("🔗 Password reset URL: {reset_url}");

    let message = match state.mailer.send_reset(&user.email, &reset_url).await {
        SendOutcome::Sent => "If this email exists, a reset link was sent.",
        SendOutcome::NotConfigured => {
            "Reset link generated (email not configured). Check server logs for the link."
        }
        SendOutcome::Failed => {
            "Reset link generated, but email could not be sent. Check server logs for the reset link."
        }
    };

    Ok(Json(json!({ "message": message })))
}

async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(token), Some(new_password)) = (body.token, body.new_password) else {
        return Err(ApiError::bad_request("Token and new password are required"));
    };
    if token.is_empty() || new_password.is_empty() {
        return Err(ApiError::bad_request("Token and new password are required"));
    }

    let password_hash =
        bcrypt::hash(&new_password, BCRYPT_COST).map_err(|e| ApiError::Internal(e.into()))?;

    // Clearing the token in the same conditional update makes it single-use.
    let updated = sqlx::query(
        "UPDATE users SET password_hash = $1, reset_password_token = NULL, \
         reset_password_expires = NULL, updated_at = now() \
         WHERE reset_password_token = $2 AND reset_password_expires > now()",
    )
    .bind(&password_hash)
    .bind(&token)
    .execute(&state.pool)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ApiError::bad_request("Invalid or expired reset token"));
    }

    Ok(Json(json!({
        "message": "Password updated successfully. Please log in with your new password."
    })))
}

#[derive(Deserialize)]
struct GoogleTokenInfo {
    aud: Option<String>,
    email: Option<String>,
    name: Option<String>,
    sub: Option<String>,
}

async fn google_login(
    State(state): State<AppState>,
    Json(body): Json<GoogleLoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Some(credential) = body.credential.filter(|c| !c.is_empty()) else {
        return Err(ApiError::bad_request("Google credential is required"));
    };

    let response = reqwest::Client::new()
        .get("https://oauth2.googleapis.com/tokeninfo")
        .query(&[("id_token", credential.as_str())])
        .send()
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    if !response.status().is_success() {
        return Err(ApiError::bad_request("Invalid Google credential"));
    }

    let info: GoogleTokenInfo = response
        .json()
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    if let Some(expected) = &state.config.google_client_id {
        if info.aud.as_deref() != Some(expected.as_str()) {
            return Err(ApiError::bad_request("Invalid Google credential"));
        }
    }

    let email = info
        .email
        .map(|e| e.to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::bad_request("No email in Google account"))?;
    let name = info.name.unwrap_or_else(|| "Google User".to_string());

    let existing = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(&email)
    .fetch_optional(&state.pool)
    .await?;

    let user = match existing {
        Some(user) => user,
        None => {
            // throwaway hash, never used for password login
            let filler = format!("google-{}", info.sub.unwrap_or_default());
            let password_hash =
                bcrypt::hash(&filler, BCRYPT_COST).map_err(|e| ApiError::Internal(e.into()))?;

            sqlx::query_as::<_, User>(&format!(
                "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) \
                 RETURNING {USER_COLUMNS}"
            ))
            .bind(&name)
            .bind(&email)
            .bind(&password_hash)
            .fetch_one(&state.pool)
            .await?
        }
    };

    let token = create_token(&user, &state.config.jwt_secret)?;
    Ok(Json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

async fn me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(PublicUser::from(&user))
}

fn random_hex_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_tokens_are_64_hex_chars() {
        let token = random_hex_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, random_hex_token());
    }
}
