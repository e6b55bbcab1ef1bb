//! Durable storage collaborator for the session tracker.
//!
//! The tracker never touches paths directly; it talks to a `ProgressStore`
//! injected by the composition root. The file-backed implementation wires
//! together the JSONL journal, the JSON state snapshot and the CSV archive:
//! load once on startup, save after each mutating operation.

use crate::journal::{JsonlSink, SessionSink};
use crate::{Result, Session, UserState};
use std::path::{Path, PathBuf};

/// Durable key-value storage surviving restarts
///
/// `load` must tolerate absence (first run) by returning defaults.
pub trait ProgressStore {
    /// Load the persisted snapshot: user state plus completed-session history
    fn load(&self) -> Result<(UserState, Vec<Session>)>;

    /// Append one completed session to the durable history
    fn append_session(&mut self, session: &Session) -> Result<()>;

    /// Persist the user state snapshot
    fn save_state(&self, state: &UserState) -> Result<()>;
}

/// File-backed store rooted at a data directory
///
/// Layout under the data dir:
/// - `journal/sessions.jsonl` - live completed-session journal
/// - `journal/state.json`     - user state snapshot
/// - `sessions.csv`           - archived sessions (rollup target)
pub struct FileStore {
    journal_path: PathBuf,
    state_path: PathBuf,
    csv_path: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: &Path) -> Self {
        let journal_dir = data_dir.join("journal");
        Self {
            journal_path: journal_dir.join("sessions.jsonl"),
            state_path: journal_dir.join("state.json"),
            csv_path: data_dir.join("sessions.csv"),
        }
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl ProgressStore for FileStore {
    fn load(&self) -> Result<(UserState, Vec<Session>)> {
        let state = UserState::load(&self.state_path)?;
        let history = crate::history::load_history(&self.journal_path, &self.csv_path)?;
        Ok((state, history))
    }

    fn append_session(&mut self, session: &Session) -> Result<()> {
        JsonlSink::new(&self.journal_path).append(session)
    }

    fn save_state(&self, state: &UserState) -> Result<()> {
        state.save(&self.state_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Difficulty, Exercise};
    use chrono::Utc;

    fn test_exercise() -> Exercise {
        Exercise {
            id: "prayer-stretch".into(),
            name: "Prayer Stretch".into(),
            description: "test".into(),
            duration_seconds: 45,
            instructions: vec!["Press palms".into()],
            category: Category::Wrists,
            target_muscles: vec![],
            difficulty: Difficulty::Beginner,
            image_url: None,
            video_url: None,
        }
    }

    #[test]
    fn test_first_run_loads_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());

        let (state, history) = store.load().unwrap();
        assert_eq!(state.progress.weekly_goal, 5);
        assert!(history.is_empty());
    }

    #[test]
    fn test_snapshot_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();

        {
            let mut store = FileStore::new(temp_dir.path());
            let mut session =
                Session::new(vec![test_exercise()], Some("desk".into()), Utc::now()).unwrap();
            session.completed = true;
            session.completed_at = Some(Utc::now());
            store.append_session(&session).unwrap();

            let mut state = UserState::default();
            state.progress.total_sessions = 1;
            store.save_state(&state).unwrap();
        }

        let store = FileStore::new(temp_dir.path());
        let (state, history) = store.load().unwrap();
        assert_eq!(state.progress.total_sessions, 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].context.as_deref(), Some("desk"));
    }
}
