use axum::extract::{Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::MedicalReport;
use crate::state::AppState;
use crate::uploads::{self, UploadedFile};

const REPORT_COLUMNS: &str = "id, user_id, title, date, doctor_name, hospital, notes, \
                              file_path, original_name, mime_type, size, created_at";

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/medical/report", post(create_report))
        .route("/api/medical/reports", get(list_reports))
        .with_state(state)
}

/// Multipart create: title + date + file required, the rest optional. The
/// report row is immutable once written.
async fn create_report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MedicalReport>, ApiError> {
    let mut title = None;
    let mut date = None;
    let mut doctor_name = None;
    let mut hospital = None;
    let mut notes = None;
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => file = Some(uploads::read_file_field(field).await?),
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?;
                match name.as_str() {
                    "title" => title = Some(value),
                    "date" => date = value.parse::<NaiveDate>().ok(),
                    "doctorName" => doctor_name = Some(value),
                    "hospital" => hospital = Some(value),
                    "notes" => notes = Some(value),
                    _ => {}
                }
            }
        }
    }

    let (Some(title), Some(date)) = (title.filter(|t| !t.trim().is_empty()), date) else {
        return Err(ApiError::bad_request("Title and date are required"));
    };
    let Some(file) = file else {
        return Err(ApiError::bad_request("Report file is required"));
    };

    let (base, ext) = uploads::sanitize_original(&file.original_name);
    let filename = format!("{}-{base}{ext}", uploads::epoch_millis());
    let file_path = uploads::save_file(
        &state.config.upload_dir,
        uploads::REPORTS_CATEGORY,
        &filename,
        &file.bytes,
    )
    .await?;

    let report = sqlx::query_as::<_, MedicalReport>(&format!(
        "INSERT INTO medical_reports \
         (user_id, title, date, doctor_name, hospital, notes, file_path, original_name, mime_type, size) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {REPORT_COLUMNS}"
    ))
    .bind(user.id)
    .bind(&title)
    .bind(date)
    .bind(&doctor_name)
    .bind(&hospital)
    .bind(&notes)
    .bind(&file_path)
    .bind(&file.original_name)
    .bind(&file.mime_type)
    .bind(file.bytes.len() as i64)
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(report))
}

async fn list_reports(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<MedicalReport>>, ApiError> {
    let reports = sqlx::query_as::<_, MedicalReport>(&format!(
        "SELECT {REPORT_COLUMNS} FROM medical_reports WHERE user_id = $1 ORDER BY date DESC"
    ))
    .bind(user.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(reports))
}
