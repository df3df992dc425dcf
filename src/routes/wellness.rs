use axum::extract::{Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::cycle;
use crate::error::ApiError;
use crate::models::{WellnessProfile, WellnessReport};
use crate::state::AppState;
use crate::uploads::{self, UploadedFile};

const PROFILE_COLUMNS: &str = "user_id, current_cycle_phase, in_period_now, cycle_day, dos, donts, \
     medical_conditions, extra_notes, next_appointment_date, next_appointment_doctor, \
     next_appointment_location, next_appointment_notes, appointment_reminder_count, \
     appointment_reminder_last_shown, created_at, updated_at";

const WELLNESS_REPORT_COLUMNS: &str = "id, user_id, filename, original_name, url, uploaded_at";

/// Reminders fire when the saved appointment is this close.
const REMINDER_WINDOW_DAYS: i64 = 7;
const MAX_REMINDERS: i32 = 2;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProfileRequest {
    pub dos: Option<String>,
    pub donts: Option<String>,
    pub medical_conditions: Option<String>,
    pub extra_notes: Option<String>,
    pub next_appointment_date: Option<NaiveDate>,
    pub next_appointment_doctor: Option<String>,
    pub next_appointment_location: Option<String>,
    pub next_appointment_notes: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Reminder {
    days_left: i64,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    #[serde(flatten)]
    profile: WellnessProfile,
    medical_reports: Vec<WellnessReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appointment_reminder: Option<Reminder>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/wellness/me", get(me))
        .route("/api/wellness", post(save_profile))
        .route("/api/wellness/report", post(upload_report))
        .with_state(state)
}

async fn fetch_or_create_profile(
    state: &AppState,
    user_id: Uuid,
) -> Result<WellnessProfile, ApiError> {
    if let Some(profile) = sqlx::query_as::<_, WellnessProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM wellness_profiles WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await?
    {
        return Ok(profile);
    }

    let profile = sqlx::query_as::<_, WellnessProfile>(&format!(
        "INSERT INTO wellness_profiles (user_id) VALUES ($1) \
         ON CONFLICT (user_id) DO UPDATE SET updated_at = now() \
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(user_id)
    .fetch_one(&state.pool)
    .await?;
    Ok(profile)
}

async fn list_reports(state: &AppState, user_id: Uuid) -> Result<Vec<WellnessReport>, ApiError> {
    let reports = sqlx::query_as::<_, WellnessReport>(&format!(
        "SELECT {WELLNESS_REPORT_COLUMNS} FROM wellness_reports WHERE user_id = $1 \
         ORDER BY uploaded_at ASC"
    ))
    .bind(user_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(reports)
}

/// Re-derives the cycle fields from period history; the stored copy is an
/// opportunistic cache refreshed on every fetch.
async fn recompute_cycle(
    state: &AppState,
    profile: &mut WellnessProfile,
) -> Result<(), ApiError> {
    let rows: Vec<(NaiveDate, Option<NaiveDate>)> = sqlx::query_as(
        "SELECT start_date, end_date FROM period_entries WHERE user_id = $1 \
         ORDER BY start_date DESC LIMIT 5",
    )
    .bind(profile.user_id)
    .fetch_all(&state.pool)
    .await?;

    let starts: Vec<NaiveDate> = rows.iter().map(|(s, _)| *s).collect();
    let latest_end = rows.first().and_then(|(_, e)| *e);
    let est = cycle::estimate(&starts, latest_end, Utc::now().date_naive());

    profile.current_cycle_phase = est.phase.as_str().to_string();
    profile.in_period_now = est.in_period_now;
    profile.cycle_day = est.cycle_day;

    if let Err(e) = sqlx::query(
        "UPDATE wellness_profiles SET current_cycle_phase = $1, in_period_now = $2, \
         cycle_day = $3, updated_at = now() WHERE user_id = $4",
    )
    .bind(&profile.current_cycle_phase)
    .bind(profile.in_period_now)
    .bind(profile.cycle_day)
    .bind(profile.user_id)
    .execute(&state.pool)
    .await
    {
        // stale cache is fine, the fetch already has fresh values
        tracing::warn!("⚠️ failed to persist recomputed cycle fields: {e}");
    }
    Ok(())
}

async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let mut profile = fetch_or_create_profile(&state, user.id).await?;
    recompute_cycle(&state, &mut profile).await?;

    // remind at most twice, only inside the final week
    let mut appointment_reminder = None;
    if let Some(appt) = profile.next_appointment_date {
        let days_left = (appt - Utc::now().date_naive()).num_days();
        if (0..=REMINDER_WINDOW_DAYS).contains(&days_left)
            && profile.appointment_reminder_count < MAX_REMINDERS
        {
            appointment_reminder = Some(Reminder {
                days_left,
                message: format!("You have an appointment in {days_left} day(s)."),
            });
            profile.appointment_reminder_count += 1;
            profile.appointment_reminder_last_shown = Some(Utc::now());

            sqlx::query(
                "UPDATE wellness_profiles SET appointment_reminder_count = $1, \
                 appointment_reminder_last_shown = $2 WHERE user_id = $3",
            )
            .bind(profile.appointment_reminder_count)
            .bind(profile.appointment_reminder_last_shown)
            .bind(profile.user_id)
            .execute(&state.pool)
            .await?;
        }
    }

    let medical_reports = list_reports(&state, user.id).await?;

    Ok(Json(ProfileResponse {
        profile,
        medical_reports,
        appointment_reminder,
    }))
}

async fn save_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<SaveProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    // Changing the appointment date resets the reminder bookkeeping.
    let profile = sqlx::query_as::<_, WellnessProfile>(&format!(
        "INSERT INTO wellness_profiles \
         (user_id, dos, donts, medical_conditions, extra_notes, next_appointment_date, \
          next_appointment_doctor, next_appointment_location, next_appointment_notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (user_id) DO UPDATE SET \
         dos = COALESCE($2, wellness_profiles.dos), \
         donts = COALESCE($3, wellness_profiles.donts), \
         medical_conditions = COALESCE($4, wellness_profiles.medical_conditions), \
         extra_notes = COALESCE($5, wellness_profiles.extra_notes), \
         next_appointment_date = COALESCE($6, wellness_profiles.next_appointment_date), \
         next_appointment_doctor = COALESCE($7, wellness_profiles.next_appointment_doctor), \
         next_appointment_location = COALESCE($8, wellness_profiles.next_appointment_location), \
         next_appointment_notes = COALESCE($9, wellness_profiles.next_appointment_notes), \
         appointment_reminder_count = CASE WHEN $6::date IS NOT NULL THEN 0 \
             ELSE wellness_profiles.appointment_reminder_count END, \
         appointment_reminder_last_shown = CASE WHEN $6::date IS NOT NULL THEN NULL \
             ELSE wellness_profiles.appointment_reminder_last_shown END, \
         updated_at = now() \
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(user.id)
    .bind(&body.dos)
    .bind(&body.donts)
    .bind(&body.medical_conditions)
    .bind(&body.extra_notes)
    .bind(body.next_appointment_date)
    .bind(&body.next_appointment_doctor)
    .bind(&body.next_appointment_location)
    .bind(&body.next_appointment_notes)
    .fetch_one(&state.pool)
    .await?;

    let medical_reports = list_reports(&state, user.id).await?;

    Ok(Json(ProfileResponse {
        profile,
        medical_reports,
        appointment_reminder: None,
    }))
}

async fn upload_report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProfileResponse>, ApiError> {
    let mut file: Option<UploadedFile> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            file = Some(uploads::read_file_field(field).await?);
        }
    }

    let Some(file) = file else {
        return Err(ApiError::bad_request("No file uploaded"));
    };

    let (base, ext) = uploads::sanitize_original(&file.original_name);
    let filename = format!(
        "{base}-{}-{}{ext}",
        uploads::epoch_millis(),
        uploads::random_suffix()
    );
    let url = uploads::save_file(
        &state.config.upload_dir,
        uploads::REPORTS_CATEGORY,
        &filename,
        &file.bytes,
    )
    .await?;

    let profile = fetch_or_create_profile(&state, user.id).await?;

    sqlx::query(
        "INSERT INTO wellness_reports (user_id, filename, original_name, url) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(user.id)
    .bind(&filename)
    .bind(&file.original_name)
    .bind(&url)
    .execute(&state.pool)
    .await?;

    let medical_reports = list_reports(&state, user.id).await?;

    Ok(Json(ProfileResponse {
        profile,
        medical_reports,
        appointment_reminder: None,
    }))
}
