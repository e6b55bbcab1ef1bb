//! User state persistence with file locking.
//!
//! This module handles saving and loading the persisted user snapshot
//! (progress, settings, habit anchors) with proper file locking to prevent
//! concurrent access issues. A missing or corrupt snapshot degrades to
//! documented defaults so a first run or a damaged file never blocks the
//! application.

use crate::{Error, Result, UserState};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl UserState {
    /// Load user state from a file with shared locking
    ///
    /// Returns default state if file doesn't exist.
    /// If file is corrupted, logs a warning and returns default state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file found, using default state");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        // Acquire shared lock for reading
        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read state file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<UserState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded user state from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse state file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save user state to a file with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "state path missing parent")
        })?)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace old state file
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved user state to {:?}", path);
        Ok(())
    }

    /// Load state, modify it, and save it back atomically
    ///
    /// This is a convenience method that handles the load-modify-save pattern
    /// with proper error handling.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut UserState) -> Result<()>,
    {
        let mut state = Self::load(path)?;
        f(&mut state)?;
        state.save(path)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HabitAnchor, Theme};

    fn anchor(id: &str) -> HabitAnchor {
        HabitAnchor {
            id: id.into(),
            name: "After lunch".into(),
            description: "Reset posture after eating".into(),
            trigger: "After lunch".into(),
            exercise_ids: vec!["cat-cow-stretch".into()],
            active: true,
            reminder_enabled: false,
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        let mut state = UserState::default();
        state.progress.weekly_goal = 7;
        state.settings.preferences.theme = Theme::Dark;
        state.habit_anchors.push(anchor("after-lunch"));

        state.save(&state_path).unwrap();

        let loaded = UserState::load(&state_path).unwrap();
        assert_eq!(loaded.progress.weekly_goal, 7);
        assert_eq!(loaded.settings.preferences.theme, Theme::Dark);
        assert_eq!(loaded.habit_anchors.len(), 1);
        assert_eq!(loaded.habit_anchors[0].id, "after-lunch");
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("nonexistent.json");

        let state = UserState::load(&state_path).unwrap();
        assert_eq!(state.progress.weekly_goal, 5);
        assert_eq!(state.settings.notifications.reminder_time, "09:00");
        assert_eq!(state.settings.preferences.default_duration_seconds, 60);
        assert!(!state.settings.privacy.share_progress);
        assert!(state.habit_anchors.is_empty());
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        UserState::default().save(&state_path).unwrap();

        UserState::update(&state_path, |state| {
            state.progress.weekly_goal = 3;
            Ok(())
        })
        .unwrap();

        let loaded = UserState::load(&state_path).unwrap();
        assert_eq!(loaded.progress.weekly_goal, 3);
    }

    #[test]
    fn test_corrupted_state_returns_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("corrupted.json");

        std::fs::write(&state_path, "{ invalid json }").unwrap();

        let result = UserState::load(&state_path);
        assert!(result.is_ok());
        let state = result.unwrap();
        assert_eq!(state.progress.total_sessions, 0);
        assert!(state.habit_anchors.is_empty());
    }

    #[test]
    fn test_atomic_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let state_path = temp_dir.path().join("state.json");

        let state = UserState::default();
        state.save(&state_path).unwrap();

        // Verify state file exists and no stray temp files remain
        assert!(state_path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "state.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only state.json, found extras: {:?}",
            extras
        );
    }
}
