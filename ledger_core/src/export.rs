//! CSV export of ledger history.
//!
//! Export is a read-only view for spreadsheets and external analysis. It
//! never archives, truncates or rewrites the ledger itself.

use crate::{LogEntry, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    user_id: String,
    exercise_name: String,
    timestamp: String,
    set_number: u32,
    weight_used: f64,
    reps_completed: u32,
    duration: Option<u32>,
    distance: Option<f64>,
    rpe: Option<u8>,
}

impl From<&LogEntry> for CsvRow {
    fn from(entry: &LogEntry) -> Self {
        CsvRow {
            id: entry.id.to_string(),
            user_id: entry.user_id.clone(),
            exercise_name: entry.exercise_name.clone(),
            timestamp: entry.timestamp.to_rfc3339(),
            set_number: entry.set_number,
            weight_used: entry.weight_used,
            reps_completed: entry.reps_completed,
            duration: entry.duration,
            distance: entry.distance,
            rpe: entry.rpe,
        }
    }
}

/// Write entries to a CSV file, replacing any previous export at `path`.
///
/// Returns the number of rows written. An empty entry list writes nothing
/// and leaves `path` untouched.
pub fn history_to_csv(entries: &[LogEntry], path: &Path) -> Result<usize> {
    if entries.is_empty() {
        tracing::info!("No entries to export");
        return Ok(0);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    let mut writer = csv::Writer::from_writer(file);
    for entry in entries {
        writer.serialize(CsvRow::from(entry))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} entries to {:?}", entries.len(), path);
    Ok(entries.len())
}
