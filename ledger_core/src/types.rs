//! Core domain types for the Overlog ledger.
//!
//! This module defines the fundamental types used throughout the system:
//! - Log entries (one completed set) and their pre-persistence drafts
//! - The derived session reference ("what to beat")
//! - Progression suggestions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ============================================================================
// Log Entry Types
// ============================================================================

/// One completed set, as stored in the ledger.
///
/// Entries are immutable once written: the ledger exposes no update or
/// delete path, and every derived view (sessions, progressions) is
/// recomputed from the entry stream on read.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub id: Uuid,
    pub user_id: String,
    pub exercise_name: String,
    /// Instant the set was performed, UTC. Server-assigned at append time
    /// unless the draft carried one for backfill.
    pub timestamp: DateTime<Utc>,
    /// 1-based position within a session; not globally unique.
    pub set_number: u32,
    pub weight_used: f64,
    pub reps_completed: u32,
    /// Seconds, for timed work.
    pub duration: Option<u32>,
    /// Meters, for distance work.
    pub distance: Option<f64>,
    /// Rate of Perceived Exertion, 1-10.
    pub rpe: Option<u8>,
}

/// A set as submitted by a caller, before `id` and `timestamp` assignment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogDraft {
    pub user_id: String,
    pub exercise_name: String,
    pub set_number: u32,
    pub weight_used: f64,
    pub reps_completed: u32,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub rpe: Option<u8>,
    /// Caller-supplied timestamp for testing/backfill. Normally absent.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl LogDraft {
    /// Check the draft against the ledger's validation rules.
    ///
    /// Rejected before any storage attempt; the error names the violated
    /// constraint.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::Validation("user_id must not be empty".into()));
        }
        if self.exercise_name.trim().is_empty() {
            return Err(Error::Validation("exercise_name must not be empty".into()));
        }
        if self.set_number == 0 {
            return Err(Error::Validation("set_number must be positive".into()));
        }
        if !self.weight_used.is_finite() || self.weight_used < 0.0 {
            return Err(Error::Validation(format!(
                "weight_used must be a non-negative number, got {}",
                self.weight_used
            )));
        }
        if self.reps_completed == 0 {
            return Err(Error::Validation("reps_completed must be positive".into()));
        }
        if let Some(rpe) = self.rpe {
            if !(1..=10).contains(&rpe) {
                return Err(Error::Validation(format!(
                    "rpe must be within 1-10, got {}",
                    rpe
                )));
            }
        }
        Ok(())
    }

    /// Promote the draft into a stored entry, assigning a fresh id and
    /// the server timestamp when the caller supplied none.
    pub fn into_entry(self) -> LogEntry {
        let timestamp = self.timestamp.unwrap_or_else(Utc::now);
        LogEntry {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            exercise_name: self.exercise_name,
            timestamp,
            set_number: self.set_number,
            weight_used: self.weight_used,
            reps_completed: self.reps_completed,
            duration: self.duration,
            distance: self.distance,
            rpe: self.rpe,
        }
    }
}

// ============================================================================
// Session Reference Types
// ============================================================================

/// Per-set data inside a session reference.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetData {
    pub set_number: u32,
    pub weight_used: f64,
    pub reps_completed: u32,
    pub duration: Option<u32>,
    pub distance: Option<f64>,
    pub rpe: Option<u8>,
    pub timestamp: DateTime<Utc>,
}

impl From<&LogEntry> for SetData {
    fn from(entry: &LogEntry) -> Self {
        SetData {
            set_number: entry.set_number,
            weight_used: entry.weight_used,
            reps_completed: entry.reps_completed,
            duration: entry.duration,
            distance: entry.distance,
            rpe: entry.rpe,
            timestamp: entry.timestamp,
        }
    }
}

/// The most recent session's full set-by-set data.
///
/// Sessions are never stored; this is derived from the entry stream on
/// every query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionReference {
    pub user_id: String,
    pub exercise_name: String,
    /// Earliest timestamp among the session's sets (the session's start).
    pub session_timestamp: DateTime<Utc>,
    /// All sets from the session, ascending by set_number.
    pub sets: Vec<SetData>,
    pub total_sets: usize,
}

// ============================================================================
// Progression Types
// ============================================================================

/// Which lever the suggestion pulls.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionStrategy {
    /// Same weight, one more rep.
    Reps,
    /// More weight, fewer reps.
    Weight,
}

/// A suggested next target intended to exceed the reference session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Progression {
    pub strategy: ProgressionStrategy,
    pub weight: f64,
    pub reps: u32,
    pub message: String,
}
