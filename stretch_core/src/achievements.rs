//! Achievement unlock rules.
//!
//! Rules are evaluated against the freshly recomputed progress snapshot
//! after each completed session. Evaluation only proposes unlocks; the
//! tracker's `unlock_achievement` hook enforces the unique-by-id set, so
//! re-proposing an already-held achievement is harmless.

use crate::types::{Achievement, AchievementKind, Category, Session, UserProgress};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

fn achievement(
    id: &str,
    title: &str,
    description: &str,
    kind: AchievementKind,
    now: DateTime<Utc>,
) -> Achievement {
    Achievement {
        id: id.into(),
        title: title.into(),
        description: description.into(),
        kind,
        unlocked_at: now,
    }
}

/// Evaluate which achievements the current progress has earned
///
/// Returns every earned achievement, including ones already held; callers
/// pass each through the tracker's idempotent unlock hook.
pub fn evaluate(
    progress: &UserProgress,
    history: &[Session],
    now: DateTime<Utc>,
) -> Vec<Achievement> {
    let mut earned = Vec::new();

    if progress.total_sessions >= 1 {
        earned.push(achievement(
            "first-session",
            "First Stretch",
            "Complete your first stretching session",
            AchievementKind::Consistency,
            now,
        ));
    }

    if progress.current_streak >= 3 {
        earned.push(achievement(
            "streak-3",
            "On a Roll",
            "Stretch three days in a row",
            AchievementKind::Streak,
            now,
        ));
    }
    if progress.current_streak >= 7 {
        earned.push(achievement(
            "streak-7",
            "Week Warrior",
            "Stretch seven days in a row",
            AchievementKind::Streak,
            now,
        ));
    }
    if progress.current_streak >= 30 {
        earned.push(achievement(
            "streak-30",
            "Habit Formed",
            "Stretch thirty days in a row",
            AchievementKind::Streak,
            now,
        ));
    }

    if progress.total_minutes >= 60 {
        earned.push(achievement(
            "minutes-60",
            "Hour of Calm",
            "Accumulate an hour of stretching",
            AchievementKind::Duration,
            now,
        ));
    }
    if progress.total_minutes >= 600 {
        earned.push(achievement(
            "minutes-600",
            "Ten Hours Limber",
            "Accumulate ten hours of stretching",
            AchievementKind::Duration,
            now,
        ));
    }

    if progress.weekly_goal > 0 && progress.weekly_session_count >= progress.weekly_goal {
        earned.push(achievement(
            "weekly-goal",
            "Goal Getter",
            "Hit your weekly session goal",
            AchievementKind::Consistency,
            now,
        ));
    }

    let categories: HashSet<Category> = history
        .iter()
        .filter(|s| s.completed)
        .flat_map(|s| s.exercises.iter().map(|e| e.category))
        .collect();
    if categories.len() >= 5 {
        earned.push(achievement(
            "variety-5",
            "Explorer",
            "Stretch five different body regions",
            AchievementKind::Variety,
            now,
        ));
    }

    earned
}
