use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::SymptomEntry;
use crate::state::AppState;

const SYMPTOM_COLUMNS: &str =
    "id, user_id, date_time, symptom, severity, cycle_phase, notes, created_at";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSymptomRequest {
    pub symptom: Option<String>,
    pub severity: Option<i32>,
    pub notes: Option<String>,
    pub cycle_phase: Option<String>,
    pub date_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct EntriesQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
struct EntryMessage {
    message: &'static str,
    entry: SymptomEntry,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/symptoms/entry", post(log_symptom))
        .route("/api/symptoms/entries", get(get_entries))
        .with_state(state)
}

async fn log_symptom(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<NewSymptomRequest>,
) -> Result<Json<EntryMessage>, ApiError> {
    let Some(symptom) = body.symptom.as_deref().map(str::trim).filter(|s| !s.is_empty())
    else {
        return Err(ApiError::bad_request("Symptom description required"));
    };

    let severity = body.severity.unwrap_or(3);
    if !(1..=5).contains(&severity) {
        return Err(ApiError::bad_request("Severity must be between 1 and 5"));
    }

    let entry = sqlx::query_as::<_, SymptomEntry>(&format!(
        "INSERT INTO symptom_entries (user_id, date_time, symptom, severity, cycle_phase, notes) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {SYMPTOM_COLUMNS}"
    ))
    .bind(user.id)
    .bind(body.date_time.unwrap_or_else(Utc::now))
    .bind(symptom)
    .bind(severity)
    .bind(&body.cycle_phase)
    .bind(&body.notes)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(EntryMessage {
        message: "Symptom logged",
        entry,
    }))
}

async fn get_entries(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<Vec<SymptomEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(20).max(0);

    let items = sqlx::query_as::<_, SymptomEntry>(&format!(
        "SELECT {SYMPTOM_COLUMNS} FROM symptom_entries WHERE user_id = $1 \
         ORDER BY date_time DESC LIMIT $2"
    ))
    .bind(user.id)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(items))
}
