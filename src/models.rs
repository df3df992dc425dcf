use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Full user row. Never serialized to the client directly; use
/// [`PublicUser`] for responses.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub dob: Option<NaiveDate>,
    pub reset_password_token: Option<String>,
    pub reset_password_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub dob: Option<NaiveDate>,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        PublicUser {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            dob: u.dob,
        }
    }
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PeriodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub title: Option<String>,
    #[serde(rename = "text")]
    pub body: String,
    pub mood: Option<String>,
    pub category: Option<String>,
    pub cycle_phase: Option<String>,
    pub photos: Vec<String>,
    pub private: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SymptomEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date_time: DateTime<Utc>,
    pub symptom: String,
    pub severity: i32,
    pub cycle_phase: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub doctor_name: String,
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub date_time: DateTime<Utc>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MedicalReport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub doctor_name: Option<String>,
    pub hospital: Option<String>,
    pub notes: Option<String>,
    pub file_path: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

/// One row per user, upserted. Cycle fields are recomputed from period
/// history on every profile fetch.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WellnessProfile {
    pub user_id: Uuid,
    pub current_cycle_phase: String,
    pub in_period_now: bool,
    pub cycle_day: Option<i32>,
    pub dos: Option<String>,
    pub donts: Option<String>,
    pub medical_conditions: Option<String>,
    pub extra_notes: Option<String>,
    pub next_appointment_date: Option<NaiveDate>,
    pub next_appointment_doctor: Option<String>,
    pub next_appointment_location: Option<String>,
    pub next_appointment_notes: Option<String>,
    pub appointment_reminder_count: i32,
    pub appointment_reminder_last_shown: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WellnessReport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}
