//! CSV archive for completed sessions.
//!
//! This module implements atomic journal-to-CSV conversion with proper
//! error handling to prevent data loss. The CSV keeps the fields the
//! progress computation needs (dates and totals); per-exercise detail stays
//! in the journal until it is archived.

use crate::{Result, Session};
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::path::Path;
use uuid::Uuid;

/// A row in the CSV output
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct CsvRow {
    pub id: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub total_duration_seconds: u32,
    /// Exercise ids joined with ';'
    pub exercise_ids: String,
    pub context: Option<String>,
}

impl From<&Session> for CsvRow {
    fn from(session: &Session) -> Self {
        CsvRow {
            id: session.id.to_string(),
            started_at: session.started_at.to_rfc3339(),
            completed_at: session.completed_at.map(|t| t.to_rfc3339()),
            total_duration_seconds: session.total_duration_seconds,
            exercise_ids: session
                .exercises
                .iter()
                .map(|e| e.id.as_str())
                .collect::<Vec<_>>()
                .join(";"),
            context: session.context.clone(),
        }
    }
}

impl TryFrom<CsvRow> for Session {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let started_at = DateTime::parse_from_rfc3339(&row.started_at)
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        let completed_at = row
            .completed_at
            .as_ref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Session {
            id,
            started_at,
            exercises: vec![], // Per-exercise detail is not stored in CSV
            total_duration_seconds: row.total_duration_seconds,
            completed: true, // Only completed sessions are ever archived
            completed_at,
            context: row.context,
        })
    }
}

/// Roll up journaled sessions into CSV and archive the journal atomically
///
/// This function:
/// 1. Reads all sessions from the journal
/// 2. Appends them to the CSV file (creates with headers if needed)
/// 3. Syncs the CSV to disk
/// 4. Renames the journal to .processed
/// 5. Returns the number of sessions processed
///
/// # Safety
/// - CSV is fsynced before the journal is renamed
/// - The journal is renamed (not deleted) to allow manual recovery if needed
/// - Processed journal files can be cleaned up with `cleanup_processed_journals`
pub fn journal_to_csv_and_archive(journal_path: &Path, csv_path: &Path) -> Result<usize> {
    // Read all sessions from the journal
    let sessions = crate::journal::read_sessions(journal_path)?;

    if sessions.is_empty() {
        tracing::info!("No sessions in journal to roll up");
        return Ok(0);
    }

    // Ensure parent directory exists
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Open CSV file for appending
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Determine if we need to write headers by checking file size after opening
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for session in &sessions {
        let row = CsvRow::from(session);
        writer.serialize(row)?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} sessions to CSV", sessions.len());

    // Atomically archive the journal by renaming it
    let processed_path = journal_path.with_extension("jsonl.processed");
    std::fs::rename(journal_path, &processed_path)?;

    tracing::info!("Archived journal to {:?}", processed_path);

    Ok(sessions.len())
}

/// Clean up old processed journal files
///
/// This removes all .jsonl.processed files in the given directory.
pub fn cleanup_processed_journals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "processed" {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed processed journal: {:?}", path);
                count += 1;
            }
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed journal files", count);
    }

    Ok(count)
}
