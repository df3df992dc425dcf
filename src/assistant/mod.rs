//! Rule-based assistant: maps free-text input to intents by ordered keyword
//! matching. Intents are not mutually exclusive; every one that fires
//! contributes its reply (and side effect) in detection order, and the
//! emotional-support fallback only runs when none fired.

pub mod dates;
pub mod support;

use chrono::{Datelike, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::error::ApiError;
use crate::models::User;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Appointment {
        doctor: String,
        when: Option<NaiveDateTime>,
    },
    Diary {
        body: String,
        mood: &'static str,
    },
    DoctorSuggest {
        specialty: &'static str,
        city: Option<String>,
    },
    PeriodMention,
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Appointment { .. } => "appointment",
            Intent::Diary { .. } => "diary",
            Intent::DoctorSuggest { .. } => "doctor_suggest",
            Intent::PeriodMention => "period",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intents: Vec<&'static str>,
}

fn appointment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)appointment\s+with\s+(.+)").unwrap())
}

fn connector_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:also|then)\b").unwrap())
}

fn on_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bon\b").unwrap())
}

fn diary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:write\s+in\s+my\s+diary\s+that|dear\s+diary[,:]?)\s*(.+)").unwrap()
    })
}

fn city_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bin\s+([A-Za-z][A-Za-z ]*?)\s*[?.!]*\s*$").unwrap())
}

/// Ordered, non-exclusive intent detection. `default_year` anchors dates
/// spoken without a year.
pub fn detect_intents(text: &str, default_year: i32) -> Vec<Intent> {
    let lower = text.to_lowercase();
    let mut intents = Vec::new();

    if let Some(cap) = appointment_re().captures(text) {
        let clause = cap.get(1).map_or("", |m| m.as_str());
        // keep only the clause before a trailing connector ("... then ...")
        let clause = connector_re()
            .splitn(clause, 2)
            .next()
            .unwrap_or(clause)
            .trim();

        let mut parts = on_word_re().splitn(clause, 2);
        let doctor = parts
            .next()
            .unwrap_or("")
            .trim()
            .trim_end_matches([',', '.'])
            .trim()
            .to_string();
        let when = parts
            .next()
            .and_then(|suffix| dates::extract_datetime(suffix, default_year));

        if !doctor.is_empty() {
            intents.push(Intent::Appointment { doctor, when });
        }
    }

    if let Some(cap) = diary_re().captures(text) {
        let body = cap.get(1).map_or("", |m| m.as_str()).trim().to_string();
        if !body.is_empty() {
            let mood = infer_mood(&body);
            intents.push(Intent::Diary { body, mood });
        }
    }

    if lower.contains("which doctor") || lower.contains("what doctor") {
        let specialty = suggest_specialty(&lower);
        let city = city_re()
            .captures(text.trim())
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string());
        intents.push(Intent::DoctorSuggest { specialty, city });
    }

    if lower.contains("period started") || lower.contains("period ended") {
        intents.push(Intent::PeriodMention);
    }

    intents
}

/// Mood tag for diary text. Later groups override earlier ones, neutral by
/// default.
pub fn infer_mood(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    let mut mood = "neutral";
    if lower.contains("happy") || lower.contains("good") {
        mood = "happy";
    }
    if lower.contains("sad") || lower.contains("upset") {
        mood = "sad";
    }
    if lower.contains("angry") || lower.contains("frustrated") {
        mood = "angry";
    }
    if lower.contains("anxious") || lower.contains("stress") || lower.contains("worried") {
        mood = "anxious";
    }
    mood
}

/// Fixed issue-keyword -> specialty taxonomy, shared with the doctor-suggest
/// route.
pub fn suggest_specialty(issue: &str) -> &'static str {
    let issue = issue.to_lowercase();
    if issue.contains("period") || issue.contains("pcos") || issue.contains("pelvic") {
        "Gynecologist"
    } else if issue.contains("thyroid") || issue.contains("hormone") {
        "Endocrinologist"
    } else if issue.contains("skin") || issue.contains("acne") {
        "Dermatologist"
    } else if issue.contains("anxiety")
        || issue.contains("depression")
        || issue.contains("panic")
        || issue.contains("mental")
    {
        "Psychiatrist / Psychologist"
    } else {
        // fever/cold/cough and anything unrecognized
        "General physician"
    }
}

pub fn search_tip(specialty: &str, city: Option<&str>) -> String {
    let query = match city {
        Some(city) => format!("{specialty} near {city}"),
        None => format!("{specialty} near me"),
    };
    let url = format!(
        "https://www.google.com/search?q={}",
        query.replace(' ', "+")
    );
    format!("You can search online for \u{201c}{query}\u{201d}: {url}")
}

/// Runs the router for one message: detects intents, performs their side
/// effects, assembles the concatenated reply.
pub async fn respond(state: &AppState, user: &User, content: &str) -> Result<ChatReply, ApiError> {
    let intents = detect_intents(content, Utc::now().year());
    let mut replies = Vec::new();
    let mut labels = Vec::new();

    for intent in &intents {
        labels.push(intent.label());
        match intent {
            Intent::Appointment {
                doctor,
                when: Some(when),
            } => {
                sqlx::query(
                    "INSERT INTO appointments (user_id, doctor_name, specialty, date_time, status) \
                     VALUES ($1, $2, $3, $4, 'upcoming')",
                )
                .bind(user.id)
                .bind(doctor)
                .bind("General Consultation")
                .bind(when.and_utc())
                .execute(&state.pool)
                .await?;

                tracing::info!("📅 voice appointment created for {}", user.id);
                replies.push(format!(
                    "Done 💜 I've scheduled your appointment with {doctor} on {}.",
                    when.format("%A, %B %-d, %Y at %-I:%M %p")
                ));
            }
            Intent::Appointment { when: None, .. } => {
                replies.push(
                    "I understood you want to book an appointment, but I couldn't catch the date. \
                     Could you say it like \u{201c}appointment with Dr Rao on 11 December at 4 pm\u{201d}?"
                        .to_string(),
                );
            }
            Intent::Diary { body, mood } => {
                sqlx::query(
                    "INSERT INTO diary_entries (user_id, date, body, mood, private) \
                     VALUES ($1, $2, $3, $4, FALSE)",
                )
                .bind(user.id)
                .bind(Utc::now().date_naive())
                .bind(body)
                .bind(mood)
                .execute(&state.pool)
                .await?;

                replies.push(format!(
                    "Okay, I've written that in your diary and noted your mood as {mood}. It's safe with me. 💜"
                ));
            }
            Intent::DoctorSuggest { specialty, city } => {
                replies.push(format!(
                    "Based on what you wrote, a {specialty} might be appropriate. This is not a \
                     diagnosis. Please visit a licensed doctor for proper evaluation.\n\n{}",
                    search_tip(specialty, city.as_deref())
                ));
            }
            Intent::PeriodMention => {
                replies.push(
                    "It sounds like you're talking about your period. To keep your cycle history \
                     accurate, please log starts and ends on the Period screen \u{2014} I'll do the \
                     tracking from there. 💜"
                        .to_string(),
                );
            }
        }
    }

    if replies.is_empty() {
        replies.push(support::reply(content));
    }

    Ok(ChatReply {
        text: replies.join("\n\n"),
        intents: labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn dt(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, 0, 0).unwrap())
    }

    #[test]
    fn appointment_with_doctor_and_full_date() {
        let intents =
            detect_intents("Fix an appointment with Dr X on 11 December 2025 at 12 pm", 2026);
        assert_eq!(intents.len(), 1);
        match &intents[0] {
            Intent::Appointment { doctor, when } => {
                assert_eq!(doctor, "Dr X");
                assert_eq!(*when, Some(dt(2025, 12, 11, 12)));
            }
            other => panic!("unexpected intent: {other:?}"),
        }
    }

    #[test]
    fn unparseable_date_keeps_the_intent_without_a_time() {
        let intents = detect_intents("appointment with Dr X on someday soon", 2026);
        assert!(matches!(
            &intents[0],
            Intent::Appointment { when: None, .. }
        ));
    }

    #[test]
    fn connector_words_cut_the_appointment_clause() {
        let intents = detect_intents(
            "Book an appointment with Dr Rao on 5 January then write in my diary that I am happy today",
            2026,
        );
        assert_eq!(intents.len(), 2);
        match &intents[0] {
            Intent::Appointment { doctor, when } => {
                assert_eq!(doctor, "Dr Rao");
                assert_eq!(*when, Some(dt(2026, 1, 5, 0)));
            }
            other => panic!("unexpected intent: {other:?}"),
        }
        match &intents[1] {
            Intent::Diary { body, mood } => {
                assert_eq!(body, "I am happy today");
                assert_eq!(*mood, "happy");
            }
            other => panic!("unexpected intent: {other:?}"),
        }
    }

    #[test]
    fn doctor_suggestion_with_trailing_city() {
        let intents =
            detect_intents("Which doctor should I see for heavy periods in Hyderabad?", 2026);
        assert_eq!(intents.len(), 1);
        match &intents[0] {
            Intent::DoctorSuggest { specialty, city } => {
                assert_eq!(*specialty, "Gynecologist");
                assert_eq!(city.as_deref(), Some("Hyderabad"));
            }
            other => panic!("unexpected intent: {other:?}"),
        }
    }

    #[test]
    fn period_mention_is_informational() {
        let intents = detect_intents("My period started today", 2026);
        assert_eq!(intents, vec![Intent::PeriodMention]);
    }

    #[test]
    fn plain_emotional_text_has_no_structured_intent() {
        assert!(detect_intents("I feel very low and lonely today", 2026).is_empty());
    }

    #[test]
    fn mood_inference_defaults_to_neutral() {
        assert_eq!(infer_mood("went to class"), "neutral");
        assert_eq!(infer_mood("felt very anxious in class"), "anxious");
        assert_eq!(infer_mood("so frustrated with everything"), "angry");
        // later groups override: stressed beats happy
        assert_eq!(infer_mood("good day but stressful evening"), "anxious");
    }

    #[test]
    fn specialty_taxonomy() {
        assert_eq!(suggest_specialty("painful periods"), "Gynecologist");
        assert_eq!(suggest_specialty("thyroid check"), "Endocrinologist");
        assert_eq!(suggest_specialty("acne breakout"), "Dermatologist");
        assert_eq!(suggest_specialty("panic attacks"), "Psychiatrist / Psychologist");
        assert_eq!(suggest_specialty("fever and cough"), "General physician");
        assert_eq!(suggest_specialty("something else"), "General physician");
    }

    #[test]
    fn search_tip_builds_a_query_url() {
        let tip = search_tip("Gynecologist", Some("Hyderabad"));
        assert!(tip.contains("Gynecologist near Hyderabad"));
        assert!(tip.contains("https://www.google.com/search?q=Gynecologist+near+Hyderabad"));
    }
}
