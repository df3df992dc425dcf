//! Light normalization + parsing for spoken date/time clauses like
//! "11th December 2025 at 12 pm" or "January 10". Only the two shapes the
//! voice flows produce (day-month and month-day) are recognized.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

fn ordinal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap())
}

fn is_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bis\s+(\d)").unwrap())
}

fn meridiem_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([ap])\.?\s*m\.?\b").unwrap())
}

fn day_month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?P<day>\d{1,2})\s+(?P<month>jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?(?:,?\s+(?P<year>\d{4}))?",
        )
        .unwrap()
    })
}

fn month_day_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?P<month>jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(?P<day>\d{1,2})\b(?:,?\s+(?P<year>\d{4}))?",
        )
        .unwrap()
    })
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:at\s+)?(?P<h>\d{1,2})(?::(?P<min>\d{2}))?\s*(?P<mer>am|pm)\b|\bat\s+(?P<h2>\d{1,2})(?::(?P<min2>\d{2}))?\b")
            .unwrap()
    })
}

/// Normalizes a spoken date clause: lowercase, ordinal suffixes stripped
/// ("11th" -> "11"), "is 4pm" -> "at 4pm", "p.m." -> "pm".
pub fn normalize(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let no_ordinals = ordinal_re().replace_all(&lower, "$1");
    let at_time = is_time_re().replace_all(&no_ordinals, "at $1");
    meridiem_re().replace_all(&at_time, "${1}m").into_owned()
}

/// Parses a normalized clause into a date-time. A missing year resolves to
/// `default_year`, a missing time to midnight. Returns None when no
/// recognizable date is present or the day is out of range for the month.
pub fn parse_normalized(text: &str, default_year: i32) -> Option<NaiveDateTime> {
    let cap = day_month_re()
        .captures(text)
        .or_else(|| month_day_re().captures(text))?;
    let day: u32 = cap.name("day")?.as_str().parse().ok()?;
    let month = month_number(cap.name("month")?.as_str())?;
    let year: Option<i32> = cap.name("year").and_then(|y| y.as_str().parse().ok());
    let date_end = cap.get(0)?.end();

    let date = NaiveDate::from_ymd_opt(year.unwrap_or(default_year), month, day)?;
    let time = parse_time(&text[date_end..]).unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time))
}

/// Normalize + parse in one step, for raw utterances.
pub fn extract_datetime(raw: &str, default_year: i32) -> Option<NaiveDateTime> {
    parse_normalized(&normalize(raw), default_year)
}

fn parse_time(rest: &str) -> Option<NaiveTime> {
    let cap = time_re().captures(rest)?;
    let (h, min, mer) = if let Some(h) = cap.name("h") {
        (
            h.as_str().parse::<u32>().ok()?,
            cap.name("min").map_or(0, |m| m.as_str().parse().unwrap_or(0)),
            cap.name("mer").map(|m| m.as_str()),
        )
    } else {
        (
            cap.name("h2")?.as_str().parse::<u32>().ok()?,
            cap.name("min2").map_or(0, |m| m.as_str().parse().unwrap_or(0)),
            None,
        )
    };

    let hour = match mer {
        Some("pm") if h != 12 => h + 12,
        Some("am") if h == 12 => 0,
        _ => h,
    };
    NaiveTime::from_hms_opt(hour, min, 0)
}

fn month_number(prefix: &str) -> Option<u32> {
    Some(match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, mi, 0).unwrap())
    }

    #[test]
    fn day_month_year_with_noon() {
        assert_eq!(
            extract_datetime("11 December 2025 at 12 pm", 2026),
            Some(dt(2025, 12, 11, 12, 0))
        );
    }

    #[test]
    fn ordinals_and_is_are_normalized() {
        assert_eq!(
            normalize("11th December 2025 is 4 P.M."),
            "11 december 2025 at 4 pm"
        );
        assert_eq!(
            extract_datetime("11th December 2025 is 4 P.M.", 2026),
            Some(dt(2025, 12, 11, 16, 0))
        );
    }

    #[test]
    fn month_day_without_year_uses_default() {
        assert_eq!(
            extract_datetime("December 5", 2026),
            Some(dt(2026, 12, 5, 0, 0))
        );
        assert_eq!(
            extract_datetime("on 5th January", 2026),
            Some(dt(2026, 1, 5, 0, 0))
        );
    }

    #[test]
    fn am_pm_arithmetic() {
        assert_eq!(
            extract_datetime("3 March at 12 am", 2026),
            Some(dt(2026, 3, 3, 0, 0))
        );
        assert_eq!(
            extract_datetime("3 March at 9:30 pm", 2026),
            Some(dt(2026, 3, 3, 21, 30))
        );
        assert_eq!(
            extract_datetime("3 March at 14:00", 2026),
            Some(dt(2026, 3, 3, 14, 0))
        );
    }

    #[test]
    fn unparseable_clauses_yield_none() {
        assert_eq!(extract_datetime("sometime next week maybe", 2026), None);
        assert_eq!(extract_datetime("", 2026), None);
        // day out of range for the month
        assert_eq!(extract_datetime("35 December 2025", 2026), None);
    }
}
