//! Orchestration boundary consumed by external callers.
//!
//! Each call is a stateless transformation of persisted history; the only
//! state is the monotonically growing ledger behind the store.

use crate::{
    config::Config, latest_session, progression, session, threshold_from_hours, JsonlLedger,
    LedgerStore, LogDraft, LogEntry, Progression, ProgressionRules, Result, SessionReference,
    SetData,
};

/// Service exposing the two core operations: record a set, retrieve the
/// latest-session reference. Generic over the store so tests can swap in
/// a ledger rooted anywhere.
pub struct ReferenceService<S: LedgerStore> {
    store: S,
    rules: ProgressionRules,
}

impl ReferenceService<JsonlLedger> {
    /// Open the ledger described by the configuration.
    pub fn open(config: &Config) -> Self {
        let ledger = JsonlLedger::new(config.data.data_dir.join("ledger"));
        Self::new(ledger, ProgressionRules::from(&config.progression))
    }
}

impl<S: LedgerStore> ReferenceService<S> {
    pub fn new(store: S, rules: ProgressionRules) -> Self {
        Self { store, rules }
    }

    /// Record one completed set. The only write path into the core.
    pub fn log_set(&mut self, draft: LogDraft) -> Result<LogEntry> {
        let entry = self.store.append(draft)?;
        tracing::info!(
            "Logged set {} of {} for {}: {} x {}",
            entry.set_number,
            entry.exercise_name,
            entry.user_id,
            entry.weight_used,
            entry.reps_completed
        );
        Ok(entry)
    }

    /// The most recent session for an exercise, or `None` when the user
    /// has never performed it. `threshold_hours` defaults to
    /// [`session::DEFAULT_THRESHOLD_HOURS`].
    pub fn latest_session_reference(
        &self,
        user_id: &str,
        exercise_name: &str,
        threshold_hours: Option<f64>,
    ) -> Result<Option<SessionReference>> {
        let threshold =
            threshold_from_hours(threshold_hours.unwrap_or(session::DEFAULT_THRESHOLD_HOURS))?;

        let entries = self.store.query(user_id, exercise_name)?;
        let session = match latest_session(&entries, threshold) {
            Some(s) if !s.is_empty() => s,
            _ => return Ok(None),
        };

        // The session starts at its earliest set, regardless of how set
        // numbers and timestamps line up
        let session_timestamp = session
            .iter()
            .map(|e| e.timestamp)
            .min()
            .unwrap_or(session[0].timestamp);

        let sets: Vec<SetData> = session.iter().map(SetData::from).collect();
        Ok(Some(SessionReference {
            user_id: user_id.into(),
            exercise_name: exercise_name.into(),
            session_timestamp,
            total_sets: sets.len(),
            sets,
        }))
    }

    /// Progression suggestion for a reference, when one exists.
    pub fn progression(&self, reference: &SessionReference) -> Option<Progression> {
        progression::suggest(reference, &self.rules)
    }

    /// Whether a performed set beats the reference session.
    pub fn beats(&self, weight: f64, reps: u32, reference: &SessionReference) -> bool {
        progression::beats_previous(weight, reps, reference)
    }

    /// Recent history for a user, newest first. Optional exercise filter.
    pub fn history(
        &self,
        user_id: &str,
        exercise_name: Option<&str>,
        limit: usize,
    ) -> Result<Vec<LogEntry>> {
        self.store.query_user(user_id, exercise_name, limit)
    }

    /// All sessions of one exercise, newest to oldest.
    pub fn sessions(
        &self,
        user_id: &str,
        exercise_name: &str,
        threshold_hours: Option<f64>,
    ) -> Result<Vec<Vec<LogEntry>>> {
        let threshold =
            threshold_from_hours(threshold_hours.unwrap_or(session::DEFAULT_THRESHOLD_HOURS))?;
        let entries = self.store.query(user_id, exercise_name)?;
        Ok(session::cluster_sessions(&entries, threshold))
    }
}
