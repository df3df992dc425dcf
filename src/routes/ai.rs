use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;

use crate::assistant::{self, ChatReply};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::uploads::{self, UploadedFile};

#[derive(Deserialize)]
pub struct ChatRequest {
    pub content: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodSuggestionsRequest {
    pub mood: Option<String>,
    pub cycle_phase: Option<String>,
    pub restrictions: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportExplainRequest {
    pub report_text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSuggestRequest {
    pub main_issue: Option<String>,
    pub city: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemedySuggestRequest {
    pub symptom: Option<String>,
    pub cycle_phase: Option<String>,
}

#[derive(Serialize)]
struct MoodSuggestionsResponse {
    actions: Vec<String>,
    foods: Vec<String>,
    checkin: &'static str,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/ai/chat", post(chat))
        .route("/api/ai/mood-suggestions", post(mood_suggestions))
        .route("/api/ai/report-explain", post(report_explain))
        .route("/api/ai/report-explain-file", post(report_explain_file))
        .route("/api/ai/doctor-suggest", post(doctor_suggest))
        .route("/api/ai/remedy-suggest", post(remedy_suggest))
        .with_state(state)
}

async fn chat(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let Some(content) = body.content.filter(|c| !c.trim().is_empty()) else {
        return Err(ApiError::bad_request("Message content is required"));
    };

    let reply = assistant::respond(&state, &user, &content).await?;
    Ok(Json(reply))
}

const CHECKIN: &str = "If you ever feel severe pain, extremely heavy bleeding, or suicidal thoughts, please seek immediate medical help.";

fn actions_for_mood(mood: &str) -> &'static [&'static str] {
    match mood {
        "anxious" => &[
            "Try 5-minute box breathing: inhale 4s, hold 4s, exhale 4s.",
            "Grounding method: name 5 things you see, 4 things you can touch, 3 things you hear.",
            "Take a short walk or stretch gently.",
        ],
        "sad" => &[
            "Write down 3 things you are grateful for today.",
            "Listen to calming music you like.",
            "Talk to someone you trust or take a peaceful walk.",
        ],
        "angry" => &[
            "Try progressive muscle relaxation.",
            "Step away for 5 minutes, take 3 slow deep breaths.",
            "Write your feelings on paper then close it.",
        ],
        "calm" => &[
            "Continue your calming routine and hydrate.",
            "A short mindfulness check-in can help refresh your mind.",
            "Light stretching or yoga for balance.",
        ],
        _ => &[
            "Drink water and take a small break.",
            "Do one tiny activity you enjoy.",
            "Stretch for 2 minutes.",
        ],
    }
}

fn foods_for_phase(phase: &str) -> &'static [&'static str] {
    match phase {
        "follicular" => &[
            "High-protein meals with veggies.",
            "Berries and leafy greens.",
            "Nuts and seeds for energy.",
        ],
        "ovulation" => &[
            "Pumpkin seeds, eggs, or nuts for zinc.",
            "Healthy fats like avocado.",
            "High-fiber fruits.",
        ],
        "luteal" => &[
            "Magnesium foods: bananas, nuts, dark chocolate.",
            "Warm herbal teas.",
            "Sweet potato for steady energy.",
        ],
        _ => &[
            "Iron-rich foods: spinach, lentils, tofu.",
            "Ginger tea to ease cramps.",
            "Oats or sweet potatoes for energy.",
        ],
    }
}

fn animal_product_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)eggs|fish|dairy").unwrap())
}

async fn mood_suggestions(
    AuthUser(_user): AuthUser,
    Json(body): Json<MoodSuggestionsRequest>,
) -> Json<MoodSuggestionsResponse> {
    let mood = body.mood.unwrap_or_default().to_lowercase();
    let phase = body.cycle_phase.unwrap_or_default().to_lowercase();

    let actions: Vec<String> = actions_for_mood(&mood)
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut foods: Vec<String> = foods_for_phase(&phase)
        .iter()
        .map(|s| s.to_string())
        .collect();

    // basic dietary restriction filtering
    if let Some(restrictions) = &body.restrictions {
        if restrictions.to_lowercase().contains("vegan") {
            foods = foods
                .iter()
                .map(|f| {
                    animal_product_re()
                        .replace_all(f, "plant-based alternatives")
                        .into_owned()
                })
                .collect();
        }
    }

    Json(MoodSuggestionsResponse {
        actions,
        foods,
        checkin: CHECKIN,
    })
}

async fn report_explain(
    AuthUser(_user): AuthUser,
    Json(body): Json<ReportExplainRequest>,
) -> Result<Json<Value>, ApiError> {
    let Some(_text) = body.report_text.filter(|t| !t.trim().is_empty()) else {
        return Err(ApiError::bad_request("Report text is required"));
    };

    let explanation = "I can't diagnose from this report, but here are some general pointers:\n\n\
        - Lab reports usually show a value and a normal range for each marker.\n\
        - Terms like Hb, RBC, WBC, TSH, etc. are different tests about blood or hormones.\n\
        - Anything marked as 'high' or 'low' should be discussed with your doctor.\n\n\
        Please use this to understand terms in simple language, but always follow your doctor's advice. \
        If you paste specific words (like 'TSH', 'HbA1c'), I can help explain what they usually mean.";

    Ok(Json(json!({ "explanation": explanation })))
}

async fn report_explain_file(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
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
        return Err(ApiError::bad_request("Report file is required"));
    };

    let (base, ext) = uploads::sanitize_original(&file.original_name);
    let filename = format!("{}-ai-{base}{ext}", uploads::epoch_millis());
    uploads::save_file(
        &state.config.upload_dir,
        uploads::AI_REPORTS_CATEGORY,
        &filename,
        &file.bytes,
    )
    .await?;

    let explanation = format!(
        "I received your report file: \"{}\".\n\n\
         In the future, I will:\n\
         - Read the contents of this report,\n\
         - Highlight important values,\n\
         - And explain them in simple language.\n\n\
         Right now, please confirm all interpretations with your doctor.",
        file.original_name
    );

    Ok(Json(json!({
        "explanation": explanation,
        "safeNotice": "This is general AI guidance, not a medical diagnosis. Always consult your doctor for report interpretation.",
    })))
}

async fn doctor_suggest(
    AuthUser(_user): AuthUser,
    Json(body): Json<DoctorSuggestRequest>,
) -> Json<Value> {
    let issue = body.main_issue.unwrap_or_default();
    let specialty = assistant::suggest_specialty(&issue);

    let location_tip = match body.city.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(city) => format!(
            "You can search online for \u{201c}{specialty} near {city}\u{201d} on Google or a trusted hospital website."
        ),
        None => format!(
            "You can search online for \u{201c}{specialty} near me\u{201d} on Google or a trusted hospital website."
        ),
    };

    Json(json!({
        "specialty": specialty,
        "message": format!(
            "Based on what you wrote, a {specialty} might be appropriate. This is not a diagnosis. Please visit a licensed doctor for proper evaluation.\n\n{location_tip}"
        ),
    }))
}

async fn remedy_suggest(
    AuthUser(_user): AuthUser,
    Json(body): Json<RemedySuggestRequest>,
) -> Json<Value> {
    let symptom = body.symptom.unwrap_or_default().to_lowercase();
    let phase = body
        .cycle_phase
        .map(|p| p.to_lowercase())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "period".to_string());

    let tips: &[&str] = if symptom.contains("cramp") || symptom.contains("pain") {
        &[
            "Use a warm water bag on your lower abdomen if it is safe for you.",
            "Gentle stretching or slow walking can sometimes ease cramps.",
            "Try to eat light, balanced meals instead of skipping food.",
        ]
    } else if symptom.contains("bloat") {
        &[
            "Limit very salty or processed foods and fizzy drinks.",
            "Sip warm water or light herbal tea.",
            "Wear loose, comfortable clothing around your stomach.",
        ]
    } else if symptom.contains("mood") || symptom.contains("anxiety") || symptom.contains("low") {
        &[
            "Try 5-10 minutes of deep breathing or grounding exercises.",
            "Write your feelings in a journal without judging yourself.",
            "Reach out to a trusted person or helpline if you feel overwhelmed.",
        ]
    } else {
        &[
            "Rest when you feel tired.",
            "Drink water regularly.",
            "Track your symptoms to share with your doctor.",
        ]
    };

    Json(json!({
        "tips": tips,
        "phase": phase,
        "warning": "These are general comfort tips, not medical treatment. If pain is severe, bleeding is heavy, or you feel very unwell, please see a doctor urgently.",
    }))
}
