//! Active-session lifecycle and persisted user state.
//!
//! The tracker owns the single active-session slot, the completed-session
//! history and the persisted user state. Exactly one session can be active
//! at a time; starting a new one silently replaces (abandons) the previous
//! one, and abandoned sessions are never persisted.
//!
//! Failure policy: only invalid input (an empty exercise list) is an error.
//! Inconsistent-state calls - completing with no active session, touching an
//! unknown habit anchor - degrade to no-ops, and persistence failures set a
//! recoverable flag instead of interrupting the session in flight.

use crate::progress;
use crate::store::ProgressStore;
use crate::types::*;
use chrono::{DateTime, Local, Utc};

/// Session lifecycle and progress tracker
///
/// Constructed by the composition root with an injected store; there is no
/// ambient global instance.
pub struct SessionTracker<S: ProgressStore> {
    store: S,
    user: UserState,
    history: Vec<Session>,
    active: Option<Session>,
    last_store_error: Option<String>,
}

impl<S: ProgressStore> SessionTracker<S> {
    /// Load persisted state through the store, degrading to defaults if the
    /// snapshot is unavailable
    ///
    /// A failed load leaves the tracker fully usable in memory; the only
    /// consequence is that progress may not survive a restart, which the
    /// caller can observe via `store_error()`.
    pub fn open(store: S) -> Self {
        let mut last_store_error = None;
        let (user, history) = match store.load() {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!("Failed to load persisted state: {}. Starting fresh.", e);
                last_store_error = Some(e.to_string());
                (UserState::default(), Vec::new())
            }
        };

        Self {
            store,
            user,
            history,
            active: None,
            last_store_error,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn active_session(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    /// Completed sessions, newest first
    pub fn history(&self) -> &[Session] {
        &self.history
    }

    pub fn progress(&self) -> &UserProgress {
        &self.user.progress
    }

    pub fn settings(&self) -> &Settings {
        &self.user.settings
    }

    pub fn habit_anchors(&self) -> &[HabitAnchor] {
        &self.user.habit_anchors
    }

    /// Most recent persistence failure, if any
    ///
    /// Set when a save or load fails; cleared by the next successful save.
    pub fn store_error(&self) -> Option<&str> {
        self.last_store_error.as_deref()
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Start a new session, replacing any existing active session
    ///
    /// The replaced session is abandoned silently and never persisted.
    /// Rejects an empty exercise list.
    pub fn start_session(
        &mut self,
        exercises: Vec<Exercise>,
        context: Option<&str>,
    ) -> crate::Result<&Session> {
        let session = Session::new(exercises, context.map(String::from), Utc::now())?;

        if let Some(old) = self.active.replace(session) {
            tracing::info!("Abandoning unfinished session {}", old.id);
        }

        let session = self.active.as_ref().unwrap_or_else(|| unreachable!());
        tracing::info!(
            "Started session {} ({} exercises, {}s total)",
            session.id,
            session.exercises.len(),
            session.total_duration_seconds
        );
        Ok(session)
    }

    /// Discard the active session without persisting it
    pub fn abandon_session(&mut self) {
        if let Some(old) = self.active.take() {
            tracing::info!("Abandoned session {}", old.id);
        }
    }

    /// Complete the active session at the current time
    ///
    /// See [`complete_session_at`](Self::complete_session_at).
    pub fn complete_session(&mut self) -> Option<&Session> {
        self.complete_session_at(Utc::now())
    }

    /// Complete the active session, fold it into history and recompute
    /// progress
    ///
    /// A safe no-op returning `None` when no session is active, so a
    /// double invocation cannot double-count. Returns the completed
    /// session otherwise.
    pub fn complete_session_at(&mut self, now: DateTime<Utc>) -> Option<&Session> {
        let mut session = self.active.take()?;
        session.completed = true;
        session.completed_at = Some(now);

        if let Err(e) = self.store.append_session(&session) {
            tracing::warn!("Failed to journal session {}: {}", session.id, e);
            self.last_store_error = Some(e.to_string());
        }

        self.history.insert(0, session);

        let today = now.with_timezone(&Local).date_naive();
        self.user.progress = progress::recompute(&self.history, today, &self.user.progress);
        self.persist_state();

        tracing::info!(
            "Completed session; {} total, streak {}",
            self.user.progress.total_sessions,
            self.user.progress.current_streak
        );

        self.history.first()
    }

    // ── Settings and configuration ───────────────────────────────────

    /// Apply a settings change and persist the snapshot
    pub fn update_settings(&mut self, f: impl FnOnce(&mut Settings)) {
        f(&mut self.user.settings);
        self.persist_state();
    }

    /// Change the weekly session goal and persist the snapshot
    pub fn set_weekly_goal(&mut self, goal: u32) {
        self.user.progress.weekly_goal = goal;
        self.persist_state();
    }

    // ── Habit anchors ────────────────────────────────────────────────

    pub fn add_habit_anchor(&mut self, anchor: HabitAnchor) {
        self.user.habit_anchors.push(anchor);
        self.persist_state();
    }

    /// Update an anchor in place; a no-op on an unknown id
    pub fn update_habit_anchor(&mut self, id: &str, f: impl FnOnce(&mut HabitAnchor)) {
        match self.user.habit_anchors.iter_mut().find(|a| a.id == id) {
            Some(anchor) => {
                f(anchor);
                self.persist_state();
            }
            None => tracing::debug!("update for unknown habit anchor '{}' ignored", id),
        }
    }

    /// Remove an anchor; a no-op on an unknown id
    pub fn delete_habit_anchor(&mut self, id: &str) {
        let before = self.user.habit_anchors.len();
        self.user.habit_anchors.retain(|a| a.id != id);
        if self.user.habit_anchors.len() != before {
            self.persist_state();
        } else {
            tracing::debug!("delete for unknown habit anchor '{}' ignored", id);
        }
    }

    // ── Achievements ─────────────────────────────────────────────────

    /// Add an achievement to the unique-by-id set
    ///
    /// Returns true if the achievement was newly unlocked; a repeat unlock
    /// is a no-op returning false.
    pub fn unlock_achievement(&mut self, achievement: Achievement) -> bool {
        let already = self
            .user
            .progress
            .achievements
            .iter()
            .any(|a| a.id == achievement.id);
        if already {
            return false;
        }

        tracing::info!("Unlocked achievement '{}'", achievement.id);
        self.user.progress.achievements.push(achievement);
        self.persist_state();
        true
    }

    // ── Persistence pipeline ─────────────────────────────────────────

    /// Save the user snapshot, recording rather than propagating failure
    fn persist_state(&mut self) {
        match self.store.save_state(&self.user) {
            Ok(()) => self.last_store_error = None,
            Err(e) => {
                tracing::warn!("Failed to persist user state: {}", e);
                self.last_store_error = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ProgressStore;
    use crate::{Error, Result};
    use chrono::Duration;

    /// In-memory store for tracker tests
    #[derive(Default)]
    struct MemoryStore {
        state: std::cell::RefCell<Option<UserState>>,
        journal: std::cell::RefCell<Vec<Session>>,
    }

    impl ProgressStore for MemoryStore {
        fn load(&self) -> Result<(UserState, Vec<Session>)> {
            Ok((
                self.state.borrow().clone().unwrap_or_default(),
                self.journal.borrow().clone(),
            ))
        }

        fn append_session(&mut self, session: &Session) -> Result<()> {
            self.journal.borrow_mut().push(session.clone());
            Ok(())
        }

        fn save_state(&self, state: &UserState) -> Result<()> {
            *self.state.borrow_mut() = Some(state.clone());
            Ok(())
        }
    }

    /// Store whose writes always fail
    struct BrokenStore;

    impl ProgressStore for BrokenStore {
        fn load(&self) -> Result<(UserState, Vec<Session>)> {
            Err(Error::State("store offline".into()))
        }

        fn append_session(&mut self, _session: &Session) -> Result<()> {
            Err(Error::State("store offline".into()))
        }

        fn save_state(&self, _state: &UserState) -> Result<()> {
            Err(Error::State("store offline".into()))
        }
    }

    fn exercise(id: &str, duration_seconds: u32) -> Exercise {
        Exercise {
            id: id.into(),
            name: id.into(),
            description: "test".into(),
            duration_seconds,
            instructions: vec!["Hold".into(), "Breathe".into()],
            category: Category::Neck,
            target_muscles: vec![],
            difficulty: Difficulty::Beginner,
            image_url: None,
            video_url: None,
        }
    }

    fn tracker() -> SessionTracker<MemoryStore> {
        SessionTracker::open(MemoryStore::default())
    }

    #[test]
    fn test_start_session_round_trip() {
        let mut tracker = tracker();
        tracker
            .start_session(
                vec![exercise("a", 30), exercise("b", 45)],
                Some("desk"),
            )
            .unwrap();

        let active = tracker.active_session().unwrap();
        assert_eq!(active.total_duration_seconds, 75);
        assert!(!active.completed);
        assert_eq!(active.context.as_deref(), Some("desk"));
    }

    #[test]
    fn test_start_session_rejects_empty_list() {
        let mut tracker = tracker();
        let result = tracker.start_session(vec![], None);
        assert!(matches!(result, Err(Error::Session(_))));
        assert!(tracker.active_session().is_none());
    }

    #[test]
    fn test_start_replaces_active_session_silently() {
        let mut tracker = tracker();
        tracker
            .start_session(vec![exercise("a", 30)], Some("first"))
            .unwrap();
        tracker
            .start_session(vec![exercise("b", 60)], Some("second"))
            .unwrap();

        let active = tracker.active_session().unwrap();
        assert_eq!(active.context.as_deref(), Some("second"));

        // The replaced session never reached history or the journal
        tracker.complete_session();
        assert_eq!(tracker.history().len(), 1);
        assert_eq!(tracker.history()[0].context.as_deref(), Some("second"));
    }

    #[test]
    fn test_complete_session_updates_progress() {
        let mut tracker = tracker();
        tracker
            .start_session(vec![exercise("a", 30), exercise("b", 30)], None)
            .unwrap();

        let completed = tracker.complete_session().unwrap();
        assert!(completed.completed);
        assert!(completed.completed_at.is_some());

        assert!(tracker.active_session().is_none());
        assert_eq!(tracker.history().len(), 1);
        assert_eq!(tracker.progress().total_sessions, 1);
        assert_eq!(tracker.progress().total_minutes, 1);
        assert_eq!(tracker.progress().current_streak, 1);
        assert_eq!(tracker.progress().weekly_session_count, 1);
    }

    #[test]
    fn test_complete_without_active_is_noop() {
        let mut tracker = tracker();
        assert!(tracker.complete_session().is_none());
        assert_eq!(tracker.progress().total_sessions, 0);

        // Double-complete: the second call finds no active session
        tracker.start_session(vec![exercise("a", 30)], None).unwrap();
        assert!(tracker.complete_session().is_some());
        assert!(tracker.complete_session().is_none());
        assert_eq!(tracker.progress().total_sessions, 1);
    }

    #[test]
    fn test_abandoned_session_not_persisted() {
        let mut tracker = tracker();
        tracker.start_session(vec![exercise("a", 30)], None).unwrap();
        tracker.abandon_session();

        assert!(tracker.active_session().is_none());
        assert!(tracker.history().is_empty());
        assert_eq!(tracker.progress().total_sessions, 0);
    }

    #[test]
    fn test_streak_across_days() {
        let mut tracker = tracker();
        let now = Utc::now();

        for days_ago in [2, 1, 0] {
            tracker.start_session(vec![exercise("a", 60)], None).unwrap();
            tracker.complete_session_at(now - Duration::days(days_ago));
        }

        assert_eq!(tracker.progress().total_sessions, 3);
        assert_eq!(tracker.progress().current_streak, 3);
        assert_eq!(tracker.progress().longest_streak, 3);
    }

    #[test]
    fn test_completed_sessions_survive_reopen() {
        let store = MemoryStore::default();
        let mut tracker = SessionTracker::open(store);
        tracker.start_session(vec![exercise("a", 90)], None).unwrap();
        tracker.complete_session();

        // Move the backing store into a fresh tracker
        let store = MemoryStore {
            state: tracker.store.state.clone(),
            journal: tracker.store.journal.clone(),
        };
        let reopened = SessionTracker::open(store);

        assert_eq!(reopened.history().len(), 1);
        assert_eq!(reopened.progress().total_sessions, 1);
    }

    #[test]
    fn test_update_settings() {
        let mut tracker = tracker();
        tracker.update_settings(|s| {
            s.preferences.theme = Theme::Dark;
            s.notifications.reminder_time = "08:30".into();
        });

        assert_eq!(tracker.settings().preferences.theme, Theme::Dark);
        assert_eq!(tracker.settings().notifications.reminder_time, "08:30");

        tracker.set_weekly_goal(7);
        assert_eq!(tracker.progress().weekly_goal, 7);
    }

    #[test]
    fn test_habit_anchor_crud() {
        let mut tracker = tracker();
        tracker.add_habit_anchor(HabitAnchor {
            id: "after-lunch".into(),
            name: "After lunch".into(),
            description: String::new(),
            trigger: "After lunch".into(),
            exercise_ids: vec!["cat-cow-stretch".into()],
            active: true,
            reminder_enabled: false,
        });
        assert_eq!(tracker.habit_anchors().len(), 1);

        tracker.update_habit_anchor("after-lunch", |a| a.reminder_enabled = true);
        assert!(tracker.habit_anchors()[0].reminder_enabled);

        // Unknown ids degrade to no-ops
        tracker.update_habit_anchor("missing", |a| a.active = false);
        tracker.delete_habit_anchor("missing");
        assert_eq!(tracker.habit_anchors().len(), 1);

        tracker.delete_habit_anchor("after-lunch");
        assert!(tracker.habit_anchors().is_empty());
    }

    #[test]
    fn test_unlock_achievement_is_idempotent() {
        let mut tracker = tracker();
        let achievement = Achievement {
            id: "first-session".into(),
            title: "First Stretch".into(),
            description: "Complete your first session".into(),
            kind: AchievementKind::Consistency,
            unlocked_at: Utc::now(),
        };

        assert!(tracker.unlock_achievement(achievement.clone()));
        assert!(!tracker.unlock_achievement(achievement));
        assert_eq!(tracker.progress().achievements.len(), 1);
    }

    #[test]
    fn test_store_failure_is_recoverable() {
        let mut tracker = SessionTracker::open(BrokenStore);
        assert!(tracker.store_error().is_some());

        // The session still completes in memory
        tracker.start_session(vec![exercise("a", 30)], None).unwrap();
        assert!(tracker.complete_session().is_some());
        assert_eq!(tracker.progress().total_sessions, 1);
        assert!(tracker.store_error().is_some());
    }
}
