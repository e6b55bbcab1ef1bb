//! Completed-session history loading.
//!
//! Progress is recomputed from the full history, so this module merges the
//! live journal with the CSV archive, deduplicates sessions that appear in
//! both, and returns them newest first.

use crate::{Result, Session};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;

/// Load the full completed-session history from journal and CSV archive
///
/// Returns sessions sorted by date (newest first). Automatically
/// deduplicates sessions that appear in both the journal and the archive.
pub fn load_history(journal_path: &Path, csv_path: &Path) -> Result<Vec<Session>> {
    let mut sessions = Vec::new();
    let mut seen_ids = HashSet::new();

    // Load from journal first (most recent)
    if journal_path.exists() {
        let journal_sessions = crate::journal::read_sessions(journal_path)?;
        for session in journal_sessions {
            seen_ids.insert(session.id);
            sessions.push(session);
        }
        tracing::debug!("Loaded {} sessions from journal", sessions.len());
    }

    // Load from CSV (archived)
    if csv_path.exists() {
        let csv_sessions = load_sessions_from_csv(csv_path)?;
        let mut csv_count = 0;
        for session in csv_sessions {
            if !seen_ids.contains(&session.id) {
                seen_ids.insert(session.id);
                sessions.push(session);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} sessions from CSV", csv_count);
    }

    // Sort by date, newest first
    sessions.sort_by(|a, b| {
        b.completed_at
            .unwrap_or(b.started_at)
            .cmp(&a.completed_at.unwrap_or(a.started_at))
    });

    tracing::info!("Loaded {} total sessions", sessions.len());

    Ok(sessions)
}

/// Load all sessions from a CSV archive file
fn load_sessions_from_csv(path: &Path) -> Result<Vec<Session>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut sessions = Vec::new();
    for result in reader.deserialize::<crate::archive::CsvRow>() {
        match result {
            Ok(row) => match Session::try_from(row) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                    // Continue processing other rows
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(sessions)
}
