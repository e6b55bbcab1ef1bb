//! Core domain types for the StretchFlow system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Stretch exercises and their properties
//! - Sessions (an ordered run of exercises tracked as one history entry)
//! - User progress, achievements and habit anchors
//! - Persisted settings

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// Exercise Types
// ============================================================================

/// Body region targeted by a stretch
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Neck,
    Shoulders,
    Back,
    Chest,
    Arms,
    Wrists,
    Hips,
    Legs,
    FullBody,
}

impl Category {
    /// Parse a category from its kebab-case name (e.g. "full-body")
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "neck" => Some(Category::Neck),
            "shoulders" => Some(Category::Shoulders),
            "back" => Some(Category::Back),
            "chest" => Some(Category::Chest),
            "arms" => Some(Category::Arms),
            "wrists" => Some(Category::Wrists),
            "hips" => Some(Category::Hips),
            "legs" => Some(Category::Legs),
            "full-body" | "fullbody" => Some(Category::FullBody),
            _ => None,
        }
    }
}

/// Difficulty tier of an exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// A single named stretch with a fixed duration and ordered instructions.
///
/// Catalog entries are defined at build time and never mutated at runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Duration in whole seconds, always > 0 for valid catalog entries
    pub duration_seconds: u32,
    /// Ordered instruction steps, non-empty for valid catalog entries
    pub instructions: Vec<String>,
    pub category: Category,
    pub target_muscles: Vec<String>,
    pub difficulty: Difficulty,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

// ============================================================================
// Session Types
// ============================================================================

/// An ordered run of one or more exercises started together and tracked
/// as one history entry upon completion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub exercises: Vec<Exercise>,
    /// Sum of exercise durations, computed once at creation
    pub total_duration_seconds: u32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// Free-form tag describing how the session was started
    /// (e.g. "desk", "morning"), used only for display grouping
    pub context: Option<String>,
}

impl Session {
    /// Create a new (not yet completed) session from an ordered exercise list
    ///
    /// Rejects an empty exercise list; everything else is caller-supplied
    /// catalog data and assumed valid.
    pub fn new(
        exercises: Vec<Exercise>,
        context: Option<String>,
        started_at: DateTime<Utc>,
    ) -> crate::Result<Self> {
        if exercises.is_empty() {
            return Err(crate::Error::Session(
                "a session requires at least one exercise".into(),
            ));
        }

        let total_duration_seconds = exercises.iter().map(|e| e.duration_seconds).sum();

        Ok(Session {
            id: Uuid::new_v4(),
            started_at,
            exercises,
            total_duration_seconds,
            completed: false,
            completed_at: None,
            context,
        })
    }

    /// The session's local calendar date, used for streak and weekly math
    ///
    /// Completed sessions are dated by their completion time.
    pub fn local_date(&self) -> NaiveDate {
        self.completed_at
            .unwrap_or(self.started_at)
            .with_timezone(&Local)
            .date_naive()
    }
}

// ============================================================================
// Progress and Achievement Types
// ============================================================================

/// Category of achievement
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    Streak,
    Duration,
    Consistency,
    Variety,
}

/// An unlocked achievement, unique by id
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: AchievementKind,
    pub unlocked_at: DateTime<Utc>,
}

/// Aggregate user progress, recomputed from the full completed-session
/// history every time a session completes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProgress {
    pub total_sessions: u32,
    pub total_minutes: u32,
    /// Consecutive calendar days with >= 1 completed session,
    /// anchored at today or yesterday
    pub current_streak: u32,
    /// Never decreases
    pub longest_streak: u32,
    /// Target session count per Monday-Sunday week
    pub weekly_goal: u32,
    /// Completed sessions dated within the current Monday-Sunday window
    pub weekly_session_count: u32,
    pub last_session_date: Option<NaiveDate>,
    pub achievements: Vec<Achievement>,
}

impl Default for UserProgress {
    fn default() -> Self {
        UserProgress {
            total_sessions: 0,
            total_minutes: 0,
            current_streak: 0,
            longest_streak: 0,
            weekly_goal: 5,
            weekly_session_count: 0,
            last_session_date: None,
            achievements: Vec::new(),
        }
    }
}

// ============================================================================
// Habit Anchor Types
// ============================================================================

/// A habit anchor ties a short stretch routine to an existing daily trigger
/// (e.g. "after lunch"). Uniquely identified; updates and deletes on
/// unknown ids are no-ops.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HabitAnchor {
    pub id: String,
    pub name: String,
    pub description: String,
    /// e.g. "Before every meeting", "After lunch"
    pub trigger: String,
    pub exercise_ids: Vec<String>,
    pub active: bool,
    pub reminder_enabled: bool,
}

// ============================================================================
// Settings Types
// ============================================================================

/// Theme preference
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    System,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub daily_reminder: bool,
    /// HH:MM format
    pub reminder_time: String,
    pub habit_anchors: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            enabled: true,
            daily_reminder: true,
            reminder_time: "09:00".into(),
            habit_anchors: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreferenceSettings {
    pub theme: Theme,
    pub default_duration_seconds: u32,
    pub show_animations: bool,
    pub sound_enabled: bool,
}

impl Default for PreferenceSettings {
    fn default() -> Self {
        PreferenceSettings {
            theme: Theme::System,
            default_duration_seconds: 60,
            show_animations: true,
            sound_enabled: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrivacySettings {
    pub share_progress: bool,
    pub analytics: bool,
}

/// Persisted user-facing settings with documented first-run defaults
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub preferences: PreferenceSettings,

    #[serde(default)]
    pub privacy: PrivacySettings,
}

// ============================================================================
// Persisted User State
// ============================================================================

/// User's persistent state across restarts: progress, settings and anchors
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UserState {
    #[serde(default)]
    pub progress: UserProgress,

    #[serde(default)]
    pub settings: Settings,

    #[serde(default)]
    pub habit_anchors: Vec<HabitAnchor>,
}

// ============================================================================
// Catalog Type
// ============================================================================

/// A named preset grouping of exercises, keyed by a context string
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionPreset {
    pub name: String,
    pub exercise_ids: Vec<String>,
}

/// The complete catalog of exercises and session presets
#[derive(Clone, Debug)]
pub struct Catalog {
    pub exercises: HashMap<String, Exercise>,
    pub presets: HashMap<String, SessionPreset>,
}
