//! Emotional-support fallback for the assistant. Fires only when no
//! structured intent matched: disjoint keyword sets are checked in a fixed
//! priority order and the first hit picks one of that category's canned
//! templates; with no hit the reply just reflects the user's words back.

use rand::seq::SliceRandom;

struct SupportCategory {
    name: &'static str,
    keywords: &'static [&'static str],
    templates: &'static [&'static str],
}

// Priority order matters: earlier categories win. Keyword sets are kept
// disjoint so the order alone decides ties.
const CATEGORIES: &[SupportCategory] = &[
    SupportCategory {
        name: "breakup",
        keywords: &["breakup", "broke up", "break up", "dumped", "my ex", "heartbroken"],
        templates: &[
            "I'm so sorry. The end of a relationship can hurt in a way that's hard to put into words, and whatever you're feeling right now is okay. You don't have to be strong about it today. Be gentle with yourself: drink some water, wrap yourself in something warm, and let the feelings come without judging them. You won't feel like this forever, even if it seems that way right now.",
            "That kind of heartache is real pain, and I'm glad you told me instead of carrying it alone. You're allowed to grieve someone who is still alive. Maybe write down everything you wish you could say, without sending it. And when you're ready, reach out to one person who makes you feel safe. You deserve softness right now.",
        ],
    },
    SupportCategory {
        name: "sadness",
        keywords: &["sad", "unhappy", "crying", "cried", "depressed", "miserable", "hopeless"],
        templates: &[
            "I hear how heavy things feel right now, and I want you to know your feelings make complete sense. Sadness doesn't need a justification to be valid. If you can, try one tiny kind thing for yourself today: a warm drink, a few minutes of fresh air, or a song you love. And if this heaviness stays for many days, please consider talking to someone you trust or a counsellor. You matter.",
            "Thank you for trusting me with this. It's okay to cry, and it's okay to not be okay today. You don't have to fix everything at once. Maybe start by naming one thing that feels hardest right now. I'm here, and I'm listening.",
        ],
    },
    SupportCategory {
        name: "anxiety",
        keywords: &[
            "anxious", "anxiety", "panic", "worried", "nervous", "overwhelmed", "stressed",
            "stress", "scared",
        ],
        templates: &[
            "That racing, restless feeling is exhausting, and I'm sorry you're carrying it. Let's slow things down together: breathe in for 4 seconds, hold for 4, out for 4, a few times. Then try naming 5 things you can see and 4 you can touch. Anxiety lies to us about how urgent everything is. You're safe in this moment, and you're not alone.",
            "Feeling anxious doesn't mean something is wrong with you; it means your mind is trying very hard to protect you. Put a hand on your chest, take three slow breaths, and remind yourself: you only have to handle this one moment, not the whole future. If the worry keeps circling, writing it down can take some of its power away.",
        ],
    },
    SupportCategory {
        name: "anger",
        keywords: &["angry", "anger", "furious", "frustrated", "irritated", "rage", "annoyed"],
        templates: &[
            "It sounds like something really crossed a line for you, and anger is a completely valid response to that. Before it eats at you, try letting some of it out safely: write it all down uncensored, go for a brisk walk, or squeeze a pillow as hard as you can. Once the heat settles a little, you'll see the situation more clearly. Your feelings deserve space, not shame.",
            "That frustration sounds intense, and you don't have to pretend it isn't there. Step away for five minutes if you can, take three slow deep breaths, and let your shoulders drop. You're allowed to protect your peace. When you're calmer, we can think about what, if anything, needs to be said or done.",
        ],
    },
    SupportCategory {
        name: "loneliness",
        keywords: &["lonely", "alone", "low", "isolated", "left out", "no one", "nobody"],
        templates: &[
            "Feeling low and lonely is one of the hardest feelings there is, and I'm really glad you said it out loud instead of holding it in. Right now, in this moment, you're not alone — I'm here with you. If you can, send one small message to someone, even just a 'hey'. Connection often starts smaller than we think. And be kind to yourself tonight; you're doing better than you feel.",
            "Loneliness can make the world feel very quiet and very far away. But reaching out here was already a step toward connection, and that took courage. Maybe think of one person, group, or place where you've felt even slightly seen before — that's a thread worth pulling. Until then, I'm listening, and you matter to me.",
        ],
    },
    SupportCategory {
        name: "period",
        keywords: &[
            "period pain", "cramps", "cramping", "pms", "heavy bleeding", "period is late",
            "bloated",
        ],
        templates: &[
            "Period days can be genuinely rough, and you're not being dramatic — the pain and the mood swings are real. A warm water bag on your lower belly, something gentle to eat, and permission to rest can all help. Please remember: if the pain is severe or the bleeding feels unusually heavy, it's important to see a doctor rather than push through.",
            "I'm sorry your body is giving you such a hard time right now. Be extra soft with yourself today: warmth, water, rest, and no guilt about slowing down. Tracking how you feel in the app can also help you and your doctor spot patterns. And if anything ever feels extreme or frightening, please reach out to a doctor promptly.",
        ],
    },
];

fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    if keyword.contains(' ') {
        return haystack.contains(keyword);
    }
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(keyword) {
        let start = from + pos;
        let end = start + keyword.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        from = end;
    }
    false
}

fn categorize(text: &str) -> Option<&'static SupportCategory> {
    let lower = text.to_lowercase();
    CATEGORIES
        .iter()
        .find(|cat| cat.keywords.iter().any(|k| contains_keyword(&lower, k)))
}

/// Builds the fallback reply for a message with no structured intent.
pub fn reply(text: &str) -> String {
    match categorize(text) {
        Some(cat) => cat
            .templates
            .choose(&mut rand::thread_rng())
            .unwrap_or(&cat.templates[0])
            .to_string(),
        None => format!(
            "I hear you. \"{text}\". I'm here to listen and support you. You're not alone. Tell me more about how you're feeling."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_and_lonely_hits_the_loneliness_branch() {
        let cat = categorize("I feel very low and lonely today").unwrap();
        assert_eq!(cat.name, "loneliness");
    }

    #[test]
    fn priority_order_decides_between_categories() {
        // both breakup and sadness words present; breakup is checked first
        let cat = categorize("I broke up and I've been crying all day").unwrap();
        assert_eq!(cat.name, "breakup");
    }

    #[test]
    fn single_words_match_whole_words_only() {
        assert!(categorize("everything is slow today").is_none());
        assert!(categorize("I walked below the bridge").is_none());
        assert!(categorize("I feel low").is_some());
    }

    #[test]
    fn period_distress_is_recognized() {
        assert_eq!(categorize("these cramps are unbearable").unwrap().name, "period");
    }

    #[test]
    fn no_match_echoes_the_message() {
        let out = reply("today was a normal day");
        assert!(out.contains("\"today was a normal day\""));
        assert!(out.contains("I'm here to listen"));
    }
}
