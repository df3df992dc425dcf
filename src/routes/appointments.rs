use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Datelike, DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::assistant::dates;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::Appointment;
use crate::state::AppState;

const APPOINTMENT_COLUMNS: &str =
    "id, user_id, doctor_name, specialty, location, date_time, notes, status, created_at";

#[derive(Deserialize)]
pub struct VoiceRequest {
    pub text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointmentRequest {
    pub doctor_name: Option<String>,
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub date_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Serialize)]
struct AppointmentMessage {
    message: &'static str,
    appointment: Appointment,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/appointments/voice", post(voice_create))
        .route("/api/appointments", post(create).get(list))
        .route("/api/appointments/next", get(next_upcoming))
        .with_state(state)
}

async fn voice_create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<VoiceRequest>,
) -> Result<Json<AppointmentMessage>, ApiError> {
    let Some(text) = body.text.filter(|t| !t.trim().is_empty()) else {
        return Err(ApiError::bad_request("Message required"));
    };

    // "Book appointment on 5 December", "Schedule appointment on January 10"
    let date_time = dates::extract_datetime(&text, Utc::now().year())
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|| Utc::now() + Duration::days(1));

    let appointment = sqlx::query_as::<_, Appointment>(&format!(
        "INSERT INTO appointments (user_id, doctor_name, specialty, location, date_time, notes, status) \
         VALUES ($1, $2, $3, $4, $5, $6, 'upcoming') RETURNING {APPOINTMENT_COLUMNS}"
    ))
    .bind(user.id)
    .bind("Doctor")
    .bind("General Consultation")
    .bind("Not provided")
    .bind(date_time)
    .bind(format!("Voice-created: {text}"))
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(AppointmentMessage {
        message: "Appointment created via voice",
        appointment,
    }))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<NewAppointmentRequest>,
) -> Result<Json<AppointmentMessage>, ApiError> {
    let (Some(doctor_name), Some(date_time)) = (body.doctor_name, body.date_time) else {
        return Err(ApiError::bad_request("Doctor name and date/time required"));
    };
    if doctor_name.trim().is_empty() {
        return Err(ApiError::bad_request("Doctor name and date/time required"));
    }

    let appointment = sqlx::query_as::<_, Appointment>(&format!(
        "INSERT INTO appointments (user_id, doctor_name, specialty, location, date_time, notes, status) \
         VALUES ($1, $2, $3, $4, $5, $6, 'upcoming') RETURNING {APPOINTMENT_COLUMNS}"
    ))
    .bind(user.id)
    .bind(doctor_name.trim())
    .bind(&body.specialty)
    .bind(&body.location)
    .bind(date_time)
    .bind(&body.notes)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(AppointmentMessage {
        message: "Appointment created",
        appointment,
    }))
}

async fn next_upcoming(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Option<Appointment>>, ApiError> {
    let next = sqlx::query_as::<_, Appointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
         WHERE user_id = $1 AND date_time >= $2 AND status = 'upcoming' \
         ORDER BY date_time ASC LIMIT 1"
    ))
    .bind(user.id)
    .bind(Utc::now())
    .fetch_optional(&state.pool)
    .await?;

    Ok(Json(next))
}

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let items = sqlx::query_as::<_, Appointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE user_id = $1 \
         ORDER BY date_time ASC"
    ))
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(items))
}
