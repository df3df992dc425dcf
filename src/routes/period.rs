use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::cycle;
use crate::error::ApiError;
use crate::models::PeriodEntry;
use crate::state::AppState;

const PERIOD_COLUMNS: &str =
    "id, user_id, start_date, end_date, flow, notes, created_at";

#[derive(Deserialize)]
pub struct StartPeriodRequest {
    pub flow: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntryRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub flow: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Serialize)]
struct EntryMessage {
    message: &'static str,
    entry: PeriodEntry,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/period/start", post(start_period))
        .route("/api/period/end", post(end_period))
        .route("/api/period/entry", post(manual_entry))
        .route("/api/period/history", get(history))
        .route("/api/period/current-phase", get(current_phase))
        .with_state(state)
}

async fn latest_entry(
    state: &AppState,
    user_id: uuid::Uuid,
) -> Result<Option<PeriodEntry>, ApiError> {
    let entry = sqlx::query_as::<_, PeriodEntry>(&format!(
        "SELECT {PERIOD_COLUMNS} FROM period_entries WHERE user_id = $1 \
         ORDER BY start_date DESC LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await?;
    Ok(entry)
}

async fn start_period(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    body: Option<Json<StartPeriodRequest>>,
) -> Result<Json<EntryMessage>, ApiError> {
    // an open entry means the previous period was never ended
    if let Some(last) = latest_entry(&state, user.id).await? {
        if last.end_date.is_none() {
            return Ok(Json(EntryMessage {
                message: "Your previous period entry is still active.",
                entry: last,
            }));
        }
    }

    let body = body.map(|Json(b)| b);
    let flow = body
        .as_ref()
        .and_then(|b| b.flow.clone())
        .unwrap_or_else(|| "moderate".to_string());
    let notes = body.and_then(|b| b.notes);

    let entry = sqlx::query_as::<_, PeriodEntry>(&format!(
        "INSERT INTO period_entries (user_id, start_date, flow, notes) \
         VALUES ($1, $2, $3, $4) RETURNING {PERIOD_COLUMNS}"
    ))
    .bind(user.id)
    .bind(Utc::now().date_naive())
    .bind(&flow)
    .bind(&notes)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(EntryMessage {
        message: "Period start logged successfully.",
        entry,
    }))
}

async fn end_period(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<EntryMessage>, ApiError> {
    let Some(last) = latest_entry(&state, user.id).await? else {
        return Err(ApiError::not_found("No active period to end."));
    };

    if last.end_date.is_some() {
        return Ok(Json(EntryMessage {
            message: "Your last period was already ended.",
            entry: last,
        }));
    }

    // conditional update so two racing requests cannot both close it
    let closed = sqlx::query_as::<_, PeriodEntry>(&format!(
        "UPDATE period_entries SET end_date = $1 WHERE id = $2 AND end_date IS NULL \
         RETURNING {PERIOD_COLUMNS}"
    ))
    .bind(Utc::now().date_naive())
    .bind(last.id)
    .fetch_optional(&state.pool)
    .await?;

    match closed {
        Some(entry) => Ok(Json(EntryMessage {
            message: "Period ended successfully.",
            entry,
        })),
        None => Ok(Json(EntryMessage {
            message: "Your last period was already ended.",
            entry: last,
        })),
    }
}

async fn manual_entry(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<ManualEntryRequest>,
) -> Result<Json<EntryMessage>, ApiError> {
    let start = body.start_date.unwrap_or_else(|| Utc::now().date_naive());
    let flow = body.flow.unwrap_or_else(|| "moderate".to_string());

    let entry = sqlx::query_as::<_, PeriodEntry>(&format!(
        "INSERT INTO period_entries (user_id, start_date, end_date, flow, notes) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {PERIOD_COLUMNS}"
    ))
    .bind(user.id)
    .bind(start)
    .bind(body.end_date)
    .bind(&flow)
    .bind(&body.notes)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(EntryMessage {
        message: "Entry saved.",
        entry,
    }))
}

async fn history(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(range): Query<HistoryQuery>,
) -> Result<Json<Vec<PeriodEntry>>, ApiError> {
    let items = sqlx::query_as::<_, PeriodEntry>(&format!(
        "SELECT {PERIOD_COLUMNS} FROM period_entries WHERE user_id = $1 \
         AND ($2::date IS NULL OR start_date >= $2) \
         AND ($3::date IS NULL OR start_date <= $3) \
         ORDER BY start_date DESC"
    ))
    .bind(user.id)
    .bind(range.from)
    .bind(range.to)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(items))
}

async fn current_phase(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let Some(last) = latest_entry(&state, user.id).await? else {
        return Ok(Json(json!({ "phase": "unknown", "daysSinceStart": null })));
    };

    let days_since_start = (Utc::now().date_naive() - last.start_date).num_days() + 1;
    let phase = cycle::simple_phase(days_since_start);

    Ok(Json(
        json!({ "phase": phase, "daysSinceStart": days_since_start }),
    ))
}
