//! Curated book/game suggestion tables, filtered by mood and shuffled.

use axum::extract::Query;
use axum::routing::get;
use axum::{Json, Router};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MoodQuery {
    pub mood: Option<String>,
}

#[derive(Serialize)]
pub struct Book {
    pub id: u32,
    pub title: &'static str,
    pub author: &'static str,
    pub moods: &'static [&'static str],
    pub description: &'static str,
    pub url: &'static str,
}

#[derive(Serialize)]
pub struct Game {
    pub id: u32,
    pub title: &'static str,
    pub moods: &'static [&'static str],
    pub vibe: &'static str,
    pub description: &'static str,
    pub platforms: &'static str,
    pub url: &'static str,
}

const BOOKS: &[Book] = &[
    Book {
        id: 1,
        title: "The Comfort Book",
        author: "Matt Haig",
        moods: &["sad", "lonely", "tired"],
        description: "Gentle, short reflections for days when everything feels heavy.",
        url: "https://www.google.com/search?q=the+comfort+book+matt+haig",
    },
    Book {
        id: 2,
        title: "Milk and Honey",
        author: "Rupi Kaur",
        moods: &["sad", "lonely", "angry"],
        description: "Poetry about pain, heartbreak, womanhood, and healing in small pieces.",
        url: "https://www.google.com/search?q=milk+and+honey+rupi+kaur+ebook",
    },
    Book {
        id: 3,
        title: "Atomic Habits",
        author: "James Clear",
        moods: &["neutral", "tired"],
        description: "Tiny, realistic habit changes for when you want to slowly rebuild.",
        url: "https://www.google.com/search?q=atomic+habits+ebook",
    },
    Book {
        id: 4,
        title: "Ikigai",
        author: "Héctor García & Francesc Miralles",
        moods: &["anxious", "neutral", "calm"],
        description: "Soft reflections on purpose, longevity, and a calmer way of living.",
        url: "https://www.google.com/search?q=ikigai+book+online",
    },
    Book {
        id: 5,
        title: "Big Magic",
        author: "Elizabeth Gilbert",
        moods: &["tired", "sad", "neutral"],
        description: "For reconnecting with creativity when you feel stuck or afraid.",
        url: "https://www.google.com/search?q=big+magic+ebook",
    },
    Book {
        id: 6,
        title: "The Subtle Art of Not Giving a F*ck",
        author: "Mark Manson",
        moods: &["angry", "frustrated", "neutral"],
        description: "A blunt, honest perspective for when you're fed up with everything.",
        url: "https://www.google.com/search?q=subtle+art+of+not+giving+a+f+book",
    },
    Book {
        id: 7,
        title: "The Mountain Is You",
        author: "Brianna Wiest",
        moods: &["sad", "anxious", "lonely"],
        description: "On self-sabotage, healing, and turning emotional pain into growth.",
        url: "https://www.google.com/search?q=the+mountain+is+you+ebook",
    },
];

const GAMES: &[Game] = &[
    Game {
        id: 1,
        title: "Soft Self-Care Evening 🌙",
        moods: &["sad", "tired", "lonely"],
        vibe: "Cozy, very low energy, offline",
        description: "A simple routine: warm drink, soft music, journaling a few lines, and gentle lights.",
        platforms: "Offline, at home",
        url: "https://www.youtube.com/results?search_query=lofi+relaxing+playlist",
    },
    Game {
        id: 2,
        title: "5-4-3-2-1 Grounding Game 🧠",
        moods: &["anxious", "sad"],
        vibe: "Grounding, for racing thoughts",
        description: "Name 5 things you see, 4 you can touch, 3 you hear, 2 you smell, 1 you're grateful for.",
        platforms: "Offline, anywhere",
        url: "https://www.google.com/search?q=5+4+3+2+1+grounding+technique",
    },
    Game {
        id: 3,
        title: "Calm Coloring / Mandala Apps 🎨",
        moods: &["anxious", "tired", "neutral"],
        vibe: "Relaxing, visual, quiet",
        description: "Digital coloring apps where you fill patterns or mandalas with color.",
        platforms: "Android, iOS (Colorfy, Happy Color, etc.)",
        url: "https://play.google.com/store/search?q=coloring%20book%20for%20adults&c=apps",
    },
    Game {
        id: 4,
        title: "Stardew Valley (Farming Sim) 🌾",
        moods: &["sad", "tired", "lonely"],
        vibe: "Wholesome, slow, comforting",
        description: "Chill farming game where you plant crops, talk to villagers, and go at your own pace.",
        platforms: "PC, Switch, PS, Xbox, Mobile",
        url: "https://www.stardewvalley.net/",
    },
    Game {
        id: 5,
        title: "Meditation & Breathing Apps 🌬️",
        moods: &["anxious", "angry"],
        vibe: "Calming, short guided sessions",
        description: "Use free meditations or breathing timers to slow down your nervous system.",
        platforms: "Android, iOS (Insight Timer, Medito, etc.)",
        url: "https://play.google.com/store/search?q=meditation&c=apps",
    },
    Game {
        id: 6,
        title: "Tiny Joy Hunt 🌈",
        moods: &["neutral", "calm"],
        vibe: "Soft, perspective-shifting activity",
        description: "Look for 3 small things around you that make your life easier or happier and say thank you.",
        platforms: "Offline, anywhere",
        url: "https://www.google.com/search?q=gratitude+practice+ideas",
    },
    Game {
        id: 7,
        title: "Casual Mobile Puzzles 🧩",
        moods: &["neutral", "tired"],
        vibe: "Light brain engagement without pressure",
        description: "Simple puzzles like 2048, match-3, nonogram, or sudoku at your own pace.",
        platforms: "Android, iOS",
        url: "https://play.google.com/store/search?q=puzzle%20games&c=apps",
    },
];

const SUGGESTION_COUNT: usize = 4;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/resources/books", get(books))
        .route("/api/resources/games", get(games))
        .with_state(state)
}

fn filter_by_mood<'a, T>(
    all: &'a [T],
    mood: Option<&str>,
    moods_of: impl Fn(&T) -> &'static [&'static str],
) -> Vec<&'a T> {
    match mood {
        Some(m) if !m.is_empty() => {
            let m = m.to_lowercase();
            all.iter().filter(|item| moods_of(item).contains(&m.as_str())).collect()
        }
        _ => all.iter().collect(),
    }
}

async fn books(
    AuthUser(_user): AuthUser,
    Query(query): Query<MoodQuery>,
) -> Json<Vec<&'static Book>> {
    let filtered = filter_by_mood(BOOKS, query.mood.as_deref(), |b| b.moods);
    let picked: Vec<&Book> = filtered
        .choose_multiple(&mut rand::thread_rng(), SUGGESTION_COUNT)
        .copied()
        .collect();
    Json(picked)
}

async fn games(
    AuthUser(_user): AuthUser,
    Query(query): Query<MoodQuery>,
) -> Json<Vec<&'static Game>> {
    let filtered = filter_by_mood(GAMES, query.mood.as_deref(), |g| g.moods);
    let picked: Vec<&Game> = filtered
        .choose_multiple(&mut rand::thread_rng(), SUGGESTION_COUNT)
        .copied()
        .collect();
    Json(picked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_filter_matches_tags_case_insensitively() {
        let sad = filter_by_mood(BOOKS, Some("SAD"), |b| b.moods);
        assert!(!sad.is_empty());
        assert!(sad.iter().all(|b| b.moods.contains(&"sad")));
    }

    #[test]
    fn unknown_mood_filters_to_nothing() {
        assert!(filter_by_mood(BOOKS, Some("exuberant"), |b| b.moods).is_empty());
    }

    #[test]
    fn missing_mood_keeps_the_whole_table() {
        assert_eq!(filter_by_mood(GAMES, None, |g| g.moods).len(), GAMES.len());
    }
}
