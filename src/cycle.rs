use chrono::NaiveDate;

/// Estimated menstrual-cycle stage, derived from date arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulatory,
    Luteal,
    Unknown,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Menstrual => "menstrual",
            Phase::Follicular => "follicular",
            Phase::Ovulatory => "ovulatory",
            Phase::Luteal => "luteal",
            Phase::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleEstimate {
    pub cycle_day: Option<i32>,
    pub in_period_now: bool,
    pub phase: Phase,
}

const UNKNOWN: CycleEstimate = CycleEstimate {
    cycle_day: None,
    in_period_now: false,
    phase: Phase::Unknown,
};

/// Estimates the current cycle state from the most recent period-start dates
/// (newest first, at most 5 are considered). Cycle length is 28 unless the
/// observed gaps between starts (those strictly between 10 and 60 days) say
/// otherwise; day 1 is the latest start date; once past the assumed length
/// the day wraps via modulo. `latest_end`, when recorded, decides
/// `in_period_now`; otherwise the first 5 cycle days count as the period.
pub fn estimate(
    starts: &[NaiveDate],
    latest_end: Option<NaiveDate>,
    today: NaiveDate,
) -> CycleEstimate {
    let Some(&latest_start) = starts.first() else {
        return UNKNOWN;
    };

    let day_diff = (today - latest_start).num_days() + 1;
    if day_diff <= 0 {
        return UNKNOWN;
    }

    let cycle_len = average_cycle_length(starts);
    let cycle_day = if day_diff > cycle_len {
        (day_diff - 1) % cycle_len + 1
    } else {
        day_diff
    };

    let phase = match cycle_day {
        1..=5 => Phase::Menstrual,
        6..=13 => Phase::Follicular,
        14..=16 => Phase::Ovulatory,
        _ => Phase::Luteal,
    };

    let in_period_now = match latest_end {
        Some(end) => today >= latest_start && today <= end,
        None => (1..=5).contains(&cycle_day),
    };

    CycleEstimate {
        cycle_day: Some(cycle_day as i32),
        in_period_now,
        phase,
    }
}

fn average_cycle_length(starts: &[NaiveDate]) -> i64 {
    let gaps: Vec<i64> = starts
        .windows(2)
        .map(|w| (w[0] - w[1]).num_days())
        .filter(|&d| d > 10 && d < 60)
        .collect();

    if gaps.is_empty() {
        28
    } else {
        let mean = gaps.iter().sum::<i64>() as f64 / gaps.len() as f64;
        mean.round() as i64
    }
}

/// Coarse phase for the period screen, counted from the latest start alone
/// on a flat 28-day assumption.
pub fn simple_phase(days_since_start: i64) -> &'static str {
    if days_since_start <= 5 {
        "period"
    } else if days_since_start <= 12 {
        "follicular"
    } else if days_since_start <= 16 {
        "ovulation"
    } else if days_since_start <= 28 {
        "luteal"
    } else {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn no_history_is_unknown() {
        let est = estimate(&[], None, d(2026, 8, 6));
        assert_eq!(est.phase, Phase::Unknown);
        assert_eq!(est.cycle_day, None);
        assert!(!est.in_period_now);
    }

    #[test]
    fn future_start_is_unknown() {
        let est = estimate(&[d(2026, 9, 1)], None, d(2026, 8, 6));
        assert_eq!(est.phase, Phase::Unknown);
        assert_eq!(est.cycle_day, None);
    }

    #[test]
    fn phase_windows_have_fixed_boundaries() {
        let start = d(2026, 8, 1);
        // day 1 = start date
        for (today, phase) in [
            (d(2026, 8, 1), Phase::Menstrual),
            (d(2026, 8, 5), Phase::Menstrual),
            (d(2026, 8, 6), Phase::Follicular),
            (d(2026, 8, 13), Phase::Follicular),
            (d(2026, 8, 14), Phase::Ovulatory),
            (d(2026, 8, 16), Phase::Ovulatory),
            (d(2026, 8, 17), Phase::Luteal),
            (d(2026, 8, 28), Phase::Luteal),
        ] {
            assert_eq!(estimate(&[start], None, today).phase, phase, "{today}");
        }
    }

    #[test]
    fn day_wraps_past_assumed_length() {
        // single start, default 28-day length: day 29 wraps to day 1
        let est = estimate(&[d(2026, 7, 1)], None, d(2026, 7, 29));
        assert_eq!(est.cycle_day, Some(1));
        assert_eq!(est.phase, Phase::Menstrual);
    }

    #[test]
    fn cycle_length_is_the_rounded_mean_of_plausible_gaps() {
        // gaps: 30 and 31 -> mean 30.5 -> 31
        let starts = [d(2026, 8, 1), d(2026, 7, 2), d(2026, 6, 2)];
        // day 32 with length 31 wraps to day 1
        let est = estimate(&starts, None, d(2026, 9, 1));
        assert_eq!(est.cycle_day, Some(1));
    }

    #[test]
    fn implausible_gaps_fall_back_to_28() {
        // gap of 5 days (< 10) is ignored
        let starts = [d(2026, 8, 10), d(2026, 8, 5)];
        let est = estimate(&starts, None, d(2026, 8, 12));
        assert_eq!(est.cycle_day, Some(3));
        assert_eq!(est.phase, Phase::Menstrual);
    }

    #[test]
    fn recorded_end_date_bounds_the_period() {
        let starts = [d(2026, 8, 1)];
        let end = Some(d(2026, 8, 4));
        assert!(estimate(&starts, end, d(2026, 8, 3)).in_period_now);
        assert!(!estimate(&starts, end, d(2026, 8, 5)).in_period_now);
    }

    #[test]
    fn open_entry_assumes_first_five_days() {
        let starts = [d(2026, 8, 1)];
        assert!(estimate(&starts, None, d(2026, 8, 5)).in_period_now);
        assert!(!estimate(&starts, None, d(2026, 8, 6)).in_period_now);
    }

    #[test]
    fn simple_phase_buckets() {
        assert_eq!(simple_phase(1), "period");
        assert_eq!(simple_phase(5), "period");
        assert_eq!(simple_phase(6), "follicular");
        assert_eq!(simple_phase(12), "follicular");
        assert_eq!(simple_phase(16), "ovulation");
        assert_eq!(simple_phase(28), "luteal");
        assert_eq!(simple_phase(29), "unknown");
    }
}
