use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::assistant::infer_mood;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::DiaryEntry;
use crate::state::AppState;
use crate::uploads::{self, UploadedFile};

const DIARY_COLUMNS: &str =
    "id, user_id, date, title, body, mood, category, cycle_phase, photos, private, created_at";

const MAX_PHOTOS: usize = 5;
const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

#[derive(Deserialize)]
pub struct VoiceDiaryRequest {
    pub text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    pub date: Option<NaiveDate>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub mood: Option<String>,
    pub category: Option<String>,
    pub cycle_phase: Option<String>,
    pub private: Option<bool>,
}

#[derive(Deserialize)]
pub struct EntriesQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Serialize)]
struct EntryMessage {
    message: &'static str,
    entry: DiaryEntry,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/diary/voice", post(voice_entry))
        .route("/api/diary/entry", post(create_entry))
        .route("/api/diary/entries", get(list_entries))
        .route(
            "/api/diary/entry/:id",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .with_state(state)
}

async fn voice_entry(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<VoiceDiaryRequest>,
) -> Result<Json<EntryMessage>, ApiError> {
    let Some(text) = body.text.filter(|t| !t.trim().is_empty()) else {
        return Err(ApiError::bad_request("Diary text required"));
    };

    let mood = infer_mood(&text);

    let entry = sqlx::query_as::<_, DiaryEntry>(&format!(
        "INSERT INTO diary_entries (user_id, date, body, mood, private) \
         VALUES ($1, $2, $3, $4, FALSE) RETURNING {DIARY_COLUMNS}"
    ))
    .bind(user.id)
    .bind(Utc::now().date_naive())
    .bind(&text)
    .bind(mood)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(EntryMessage {
        message: "Diary entry saved",
        entry,
    }))
}

/// Multipart create: text fields plus up to 5 photos, 5 MB each. Everything
/// is buffered and validated before any file or row is persisted.
async fn create_entry(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<EntryMessage>, ApiError> {
    let mut date = None;
    let mut title = None;
    let mut text = None;
    let mut mood = None;
    let mut category = None;
    let mut cycle_phase = None;
    let mut private = false;
    let mut photos: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photos" => {
                if photos.len() == MAX_PHOTOS {
                    return Err(ApiError::bad_request("Too many photos (max 5)"));
                }
                let photo = uploads::read_file_field(field).await?;
                if photo.bytes.len() > MAX_PHOTO_BYTES {
                    return Err(ApiError::bad_request("Photo too large (max 5 MB each)"));
                }
                photos.push(photo);
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?;
                match name.as_str() {
                    "date" => date = value.parse::<NaiveDate>().ok(),
                    "title" => title = Some(value),
                    "text" => text = Some(value),
                    "mood" => mood = Some(value),
                    "category" => category = Some(value),
                    "cyclePhase" => cycle_phase = Some(value),
                    "private" => private = value == "true" || value == "1",
                    _ => {}
                }
            }
        }
    }

    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return Err(ApiError::bad_request("Diary text required"));
    };

    let mut photo_paths = Vec::with_capacity(photos.len());
    for photo in &photos {
        let (base, ext) = uploads::sanitize_original(&photo.original_name);
        let filename = format!(
            "{base}-{}-{}{ext}",
            uploads::epoch_millis(),
            uploads::random_suffix()
        );
        let url = uploads::save_file(
            &state.config.upload_dir,
            uploads::DIARY_CATEGORY,
            &filename,
            &photo.bytes,
        )
        .await?;
        photo_paths.push(url);
    }

    let entry = sqlx::query_as::<_, DiaryEntry>(&format!(
        "INSERT INTO diary_entries (user_id, date, title, body, mood, category, cycle_phase, photos, private) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {DIARY_COLUMNS}"
    ))
    .bind(user.id)
    .bind(date.unwrap_or_else(|| Utc::now().date_naive()))
    .bind(&title)
    .bind(&text)
    .bind(mood.unwrap_or_else(|| "neutral".to_string()))
    .bind(&category)
    .bind(&cycle_phase)
    .bind(&photo_paths)
    .bind(private)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(EntryMessage {
        message: "Diary saved successfully",
        entry,
    }))
}

async fn list_entries(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(range): Query<EntriesQuery>,
) -> Result<Json<Vec<DiaryEntry>>, ApiError> {
    let items = sqlx::query_as::<_, DiaryEntry>(&format!(
        "SELECT {DIARY_COLUMNS} FROM diary_entries WHERE user_id = $1 \
         AND ($2::date IS NULL OR date >= $2) \
         AND ($3::date IS NULL OR date <= $3) \
         ORDER BY date DESC"
    ))
    .bind(user.id)
    .bind(range.from)
    .bind(range.to)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(items))
}

async fn get_entry(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DiaryEntry>, ApiError> {
    let entry = sqlx::query_as::<_, DiaryEntry>(&format!(
        "SELECT {DIARY_COLUMNS} FROM diary_entries WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user.id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Entry not found"))?;

    Ok(Json(entry))
}

async fn update_entry(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateEntryRequest>,
) -> Result<Json<DiaryEntry>, ApiError> {
    let entry = sqlx::query_as::<_, DiaryEntry>(&format!(
        "UPDATE diary_entries SET \
         date = COALESCE($3, date), \
         title = COALESCE($4, title), \
         body = COALESCE($5, body), \
         mood = COALESCE($6, mood), \
         category = COALESCE($7, category), \
         cycle_phase = COALESCE($8, cycle_phase), \
         private = COALESCE($9, private) \
         WHERE id = $1 AND user_id = $2 RETURNING {DIARY_COLUMNS}"
    ))
    .bind(id)
    .bind(user.id)
    .bind(body.date)
    .bind(&body.title)
    .bind(&body.text)
    .bind(&body.mood)
    .bind(&body.category)
    .bind(&body.cycle_phase)
    .bind(body.private)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Entry not found"))?;

    Ok(Json(entry))
}

async fn delete_entry(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let result = sqlx::query("DELETE FROM diary_entries WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Entry not found"));
    }

    Ok(Json(json!({ "message": "Entry deleted" })))
}
