//! Append-only performance ledger.
//!
//! Entries are appended to per-key JSONL files with file locking to
//! ensure safe concurrent access. There is no update or delete path:
//! the ledger only grows, and every query is a point-in-time snapshot
//! of fully written entries.

use crate::{Error, LogDraft, LogEntry, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Transient I/O failures on append are retried this many times in total
/// before surfacing as a storage error.
const MAX_APPEND_ATTEMPTS: u32 = 3;

/// Durable, append-only storage for log entries.
pub trait LedgerStore {
    /// Validate and persist a draft, returning the stored entry with its
    /// assigned id and timestamp. The entry is durably written before this
    /// returns; a reported success is never lost.
    fn append(&mut self, draft: LogDraft) -> Result<LogEntry>;

    /// All entries for one `(user_id, exercise_name)` key, newest first
    /// (timestamp descending, set_number descending on equal timestamps).
    /// An empty result signals "no history", not an error.
    fn query(&self, user_id: &str, exercise_name: &str) -> Result<Vec<LogEntry>>;

    /// Entries for a user across exercises, newest first, truncated to
    /// `limit`. `exercise_name` narrows to one exercise.
    fn query_user(
        &self,
        user_id: &str,
        exercise_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<LogEntry>>;

    /// Same key as [`query`](Self::query) but in display order: ascending
    /// by set_number.
    fn query_display(&self, user_id: &str, exercise_name: &str) -> Result<Vec<LogEntry>> {
        let mut entries = self.query(user_id, exercise_name)?;
        entries.sort_by_key(|e| e.set_number);
        Ok(entries)
    }
}

/// JSONL-based ledger with file locking.
///
/// Layout: one file per `(user_id, exercise_name)` key under
/// `<root>/<user>/<exercise>.jsonl`, so a query never scans unrelated
/// users' or exercises' history. Key components are sanitized for the
/// filesystem; queries still filter on the exact stored fields, so a
/// sanitization collision cannot leak foreign entries into a result.
pub struct JsonlLedger {
    root: PathBuf,
}

impl JsonlLedger {
    /// Create a ledger rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Ledger file for one `(user_id, exercise_name)` key.
    fn entry_path(&self, user_id: &str, exercise_name: &str) -> PathBuf {
        self.root
            .join(sanitize_component(user_id))
            .join(format!("{}.jsonl", sanitize_component(exercise_name)))
    }

    fn user_dir(&self, user_id: &str) -> PathBuf {
        self.root.join(sanitize_component(user_id))
    }

    /// Entries are immutable once written. Always fails.
    pub fn update_entry(&mut self, id: Uuid) -> Result<()> {
        tracing::error!("Rejected attempt to update ledger entry {}", id);
        Err(Error::Immutability(format!(
            "entry {} cannot be updated, the ledger is append-only",
            id
        )))
    }

    /// Entries are permanent. Always fails.
    pub fn delete_entry(&mut self, id: Uuid) -> Result<()> {
        tracing::error!("Rejected attempt to delete ledger entry {}", id);
        Err(Error::Immutability(format!(
            "entry {} cannot be deleted, the ledger is append-only",
            id
        )))
    }

    fn write_line(&self, path: &Path, line: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        // Exclusive lock serializes concurrent appenders to this key
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        // Durable before the append is acknowledged
        file.sync_all()?;
        file.unlock()?;
        Ok(())
    }
}

impl LedgerStore for JsonlLedger {
    fn append(&mut self, draft: LogDraft) -> Result<LogEntry> {
        draft.validate()?;

        let entry = draft.into_entry();
        let path = self.entry_path(&entry.user_id, &entry.exercise_name);
        let line = serde_json::to_string(&entry)?;

        let mut last_err = None;
        for attempt in 1..=MAX_APPEND_ATTEMPTS {
            match self.write_line(&path, &line) {
                Ok(()) => {
                    tracing::debug!("Appended entry {} to {:?}", entry.id, path);
                    return Ok(entry);
                }
                Err(e) => {
                    tracing::warn!(
                        "Append attempt {}/{} failed for {:?}: {}",
                        attempt,
                        MAX_APPEND_ATTEMPTS,
                        path,
                        e
                    );
                    last_err = Some(e);
                }
            }
        }

        Err(Error::Storage(format!(
            "append failed after {} attempts: {}",
            MAX_APPEND_ATTEMPTS,
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    fn query(&self, user_id: &str, exercise_name: &str) -> Result<Vec<LogEntry>> {
        let path = self.entry_path(user_id, exercise_name);
        let mut entries: Vec<LogEntry> = read_entries(&path)?
            .into_iter()
            .filter(|e| e.user_id == user_id && e.exercise_name == exercise_name)
            .collect();

        // Newest first; set_number breaks ties deterministically
        entries.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then(b.set_number.cmp(&a.set_number))
        });

        tracing::debug!(
            "Query {}/{} returned {} entries",
            user_id,
            exercise_name,
            entries.len()
        );
        Ok(entries)
    }

    fn query_user(
        &self,
        user_id: &str,
        exercise_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<LogEntry>> {
        if let Some(exercise) = exercise_name {
            let mut entries = self.query(user_id, exercise)?;
            entries.truncate(limit);
            return Ok(entries);
        }

        let dir = self.user_dir(user_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(&dir)? {
            let path = dir_entry?.path();
            if path.extension().is_some_and(|ext| ext == "jsonl") {
                entries.extend(
                    read_entries(&path)?
                        .into_iter()
                        .filter(|e| e.user_id == user_id),
                );
            }
        }

        entries.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then(b.set_number.cmp(&a.set_number))
        });
        entries.truncate(limit);
        Ok(entries)
    }
}

/// Read all entries from a ledger file.
///
/// Unparseable lines are logged and skipped so one bad line never hides
/// the rest of the history.
fn read_entries(path: &Path) -> Result<Vec<LogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    // Shared lock gives a point-in-time snapshot of fully written lines
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<LogEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!(
                    "Skipping unparseable ledger line {} in {:?}: {}",
                    line_num + 1,
                    path,
                    e
                );
            }
        }
    }

    file.unlock()?;
    Ok(entries)
}

/// Map a key component onto a safe file name.
fn sanitize_component(raw: &str) -> String {
    let name: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() {
        "_".into()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn draft_at(
        user: &str,
        exercise: &str,
        set_number: u32,
        timestamp: DateTime<Utc>,
    ) -> LogDraft {
        LogDraft {
            user_id: user.into(),
            exercise_name: exercise.into(),
            set_number,
            weight_used: 100.0,
            reps_completed: 10,
            duration: None,
            distance: None,
            rpe: None,
            timestamp: Some(timestamp),
        }
    }

    fn test_ledger() -> (tempfile::TempDir, JsonlLedger) {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger = JsonlLedger::new(temp_dir.path().join("ledger"));
        (temp_dir, ledger)
    }

    #[test]
    fn test_append_and_query_roundtrip() {
        let (_tmp, mut ledger) = test_ledger();
        let now = Utc::now();

        let stored = ledger.append(draft_at("user_1", "Squat", 1, now)).unwrap();
        let entries = ledger.query("user_1", "Squat").unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], stored);
    }

    #[test]
    fn test_query_returns_newest_first() {
        let (_tmp, mut ledger) = test_ledger();
        let now = Utc::now();

        // Insert out of chronological order
        ledger
            .append(draft_at("user_1", "Squat", 2, now - Duration::minutes(5)))
            .unwrap();
        ledger.append(draft_at("user_1", "Squat", 3, now)).unwrap();
        ledger
            .append(draft_at("user_1", "Squat", 1, now - Duration::minutes(10)))
            .unwrap();

        let entries = ledger.query("user_1", "Squat").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].set_number, 3);
        assert_eq!(entries[1].set_number, 2);
        assert_eq!(entries[2].set_number, 1);
    }

    #[test]
    fn test_query_display_ascends_by_set_number() {
        let (_tmp, mut ledger) = test_ledger();
        let now = Utc::now();

        ledger.append(draft_at("user_1", "Squat", 3, now)).unwrap();
        ledger
            .append(draft_at("user_1", "Squat", 1, now - Duration::minutes(10)))
            .unwrap();
        ledger
            .append(draft_at("user_1", "Squat", 2, now - Duration::minutes(5)))
            .unwrap();

        let entries = ledger.query_display("user_1", "Squat").unwrap();
        let sets: Vec<u32> = entries.iter().map(|e| e.set_number).collect();
        assert_eq!(sets, vec![1, 2, 3]);
    }

    #[test]
    fn test_keys_are_isolated() {
        let (_tmp, mut ledger) = test_ledger();
        let now = Utc::now();

        ledger.append(draft_at("user_1", "Squat", 1, now)).unwrap();
        ledger.append(draft_at("user_1", "Bench", 1, now)).unwrap();
        ledger.append(draft_at("user_2", "Squat", 1, now)).unwrap();

        assert_eq!(ledger.query("user_1", "Squat").unwrap().len(), 1);
        assert_eq!(ledger.query("user_1", "Bench").unwrap().len(), 1);
        assert_eq!(ledger.query("user_2", "Squat").unwrap().len(), 1);
        assert!(ledger.query("user_2", "Bench").unwrap().is_empty());
    }

    #[test]
    fn test_sanitization_collision_does_not_leak() {
        let (_tmp, mut ledger) = test_ledger();
        let now = Utc::now();

        // Both sanitize to leg_press.jsonl
        ledger
            .append(draft_at("user_1", "Leg Press", 1, now))
            .unwrap();
        ledger
            .append(draft_at("user_1", "Leg_Press", 1, now))
            .unwrap();

        let entries = ledger.query("user_1", "Leg Press").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].exercise_name, "Leg Press");
    }

    #[test]
    fn test_invalid_draft_rejected_before_storage() {
        let (tmp, mut ledger) = test_ledger();
        let mut draft = draft_at("user_1", "Squat", 1, Utc::now());
        draft.weight_used = -1.0;

        let result = ledger.append(draft);
        assert!(matches!(result, Err(Error::Validation(_))));

        // Nothing was written
        assert!(!tmp.path().join("ledger").exists());
    }

    #[test]
    fn test_update_and_delete_forbidden() {
        let (_tmp, mut ledger) = test_ledger();
        let stored = ledger
            .append(draft_at("user_1", "Squat", 1, Utc::now()))
            .unwrap();

        assert!(matches!(
            ledger.update_entry(stored.id),
            Err(Error::Immutability(_))
        ));
        assert!(matches!(
            ledger.delete_entry(stored.id),
            Err(Error::Immutability(_))
        ));

        // Entry untouched
        let entries = ledger.query("user_1", "Squat").unwrap();
        assert_eq!(entries, vec![stored]);
    }

    #[test]
    fn test_unparseable_lines_are_skipped() {
        let (_tmp, mut ledger) = test_ledger();
        let now = Utc::now();

        let stored = ledger.append(draft_at("user_1", "Squat", 1, now)).unwrap();

        // Corrupt the file with a partial line, as after a crashed writer
        let path = ledger.entry_path("user_1", "Squat");
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        write!(file, "{{\"id\":\"partial").unwrap();
        drop(file);

        let entries = ledger.query("user_1", "Squat").unwrap();
        assert_eq!(entries, vec![stored]);
    }

    #[test]
    fn test_query_user_across_exercises() {
        let (_tmp, mut ledger) = test_ledger();
        let now = Utc::now();

        ledger
            .append(draft_at("user_1", "Squat", 1, now - Duration::hours(1)))
            .unwrap();
        ledger.append(draft_at("user_1", "Bench", 1, now)).unwrap();

        let entries = ledger.query_user("user_1", None, 100).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].exercise_name, "Bench"); // newest first

        let squat_only = ledger.query_user("user_1", Some("Squat"), 100).unwrap();
        assert_eq!(squat_only.len(), 1);
        assert_eq!(squat_only[0].exercise_name, "Squat");
    }

    #[test]
    fn test_query_user_respects_limit() {
        let (_tmp, mut ledger) = test_ledger();
        let now = Utc::now();

        for i in 0..5 {
            ledger
                .append(draft_at(
                    "user_1",
                    "Squat",
                    i + 1,
                    now - Duration::minutes(i as i64),
                ))
                .unwrap();
        }

        let entries = ledger.query_user("user_1", None, 2).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].set_number, 1); // most recent timestamp
    }

    #[test]
    fn test_ledger_only_grows() {
        let (_tmp, mut ledger) = test_ledger();
        let now = Utc::now();

        let first = ledger.append(draft_at("user_1", "Squat", 1, now)).unwrap();
        for i in 2..=4 {
            ledger
                .append(draft_at("user_1", "Squat", i, now + Duration::minutes(i as i64)))
                .unwrap();
            let entries = ledger.query("user_1", "Squat").unwrap();
            assert_eq!(entries.len(), i as usize);
            // The first entry is still there, byte for byte
            assert!(entries.contains(&first));
        }
    }

    #[test]
    fn test_query_missing_key_is_empty() {
        let (_tmp, ledger) = test_ledger();
        assert!(ledger.query("nobody", "Nothing").unwrap().is_empty());
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("Leg Press"), "leg_press");
        assert_eq!(sanitize_component("user-1"), "user-1");
        assert_eq!(sanitize_component("  "), "_");
        assert_eq!(sanitize_component("über/../etc"), "_ber____etc");
    }
}
