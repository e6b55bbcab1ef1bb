//! Aggregate progress derived from completed-session history.
//!
//! Progress is always recomputed from the full history rather than patched
//! incrementally, so the stored snapshot can never drift from the sessions
//! that produced it. All calendar math runs on the session's own local
//! calendar date.

use crate::types::{Session, UserProgress};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeSet;

/// Recompute a full progress snapshot from session history
///
/// Only completed sessions count. `previous` supplies the fields this
/// function does not derive: the weekly goal, the achievement set, and the
/// longest-streak floor (longest streak never decreases). Idempotent for a
/// fixed history and `today`.
pub fn recompute(history: &[Session], today: NaiveDate, previous: &UserProgress) -> UserProgress {
    let completed: Vec<&Session> = history.iter().filter(|s| s.completed).collect();

    let total_sessions = completed.len() as u32;
    let total_seconds: u64 = completed
        .iter()
        .map(|s| u64::from(s.total_duration_seconds))
        .sum();
    let total_minutes = ((total_seconds as f64) / 60.0).round() as u32;

    let dates: BTreeSet<NaiveDate> = completed.iter().map(|s| s.local_date()).collect();

    let current_streak = current_streak(&dates, today);
    let longest_streak = previous.longest_streak.max(current_streak);

    let weekly_session_count = completed
        .iter()
        .filter(|s| in_current_week(s.local_date(), today))
        .count() as u32;

    let last_session_date = dates.iter().next_back().copied();

    UserProgress {
        total_sessions,
        total_minutes,
        current_streak,
        longest_streak,
        weekly_goal: previous.weekly_goal,
        weekly_session_count,
        last_session_date,
        achievements: previous.achievements.clone(),
    }
}

/// Count consecutive calendar days with at least one session, anchored at
/// today or yesterday
///
/// A day counts once no matter how many sessions fell on it. A date set
/// with nothing today or yesterday yields 0: the streak is broken, no
/// matter how long a run existed earlier.
pub fn current_streak(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let yesterday = today - Duration::days(1);

    let mut cursor = if dates.contains(&today) {
        today
    } else if dates.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0;
    while dates.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}

/// Monday of the ISO week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Whether `date` falls in the Monday-Sunday window containing `today`
pub fn in_current_week(date: NaiveDate, today: NaiveDate) -> bool {
    week_start(date) == week_start(today)
}
