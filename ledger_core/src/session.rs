//! Session-boundary detection over the entry stream.
//!
//! A "session" is never stored. It is a derived view: the maximal run of
//! same-exercise entries whose consecutive timestamp gaps stay within a
//! threshold. Recomputing it on read keeps the immutable ledger the only
//! source of truth.

use crate::{Error, LogEntry, Result};
use chrono::Duration;

/// Default maximum gap between sets of the same session.
pub const DEFAULT_THRESHOLD_HOURS: f64 = 2.0;

/// Accepted threshold range, in hours.
pub const MIN_THRESHOLD_HOURS: f64 = 0.1;
pub const MAX_THRESHOLD_HOURS: f64 = 24.0;

/// Whether an hour value is an acceptable session threshold.
pub fn threshold_hours_in_bounds(hours: f64) -> bool {
    hours.is_finite() && (MIN_THRESHOLD_HOURS..=MAX_THRESHOLD_HOURS).contains(&hours)
}

/// Convert caller-supplied hours into a clustering threshold.
///
/// Zero, negative, NaN and out-of-range values are rejected rather than
/// clamped.
pub fn threshold_from_hours(hours: f64) -> Result<Duration> {
    if !threshold_hours_in_bounds(hours) {
        return Err(Error::Validation(format!(
            "session threshold must be within {}-{} hours, got {}",
            MIN_THRESHOLD_HOURS, MAX_THRESHOLD_HOURS, hours
        )));
    }
    Ok(Duration::milliseconds((hours * 3_600_000.0).round() as i64))
}

/// Extract the most recent session from an entry list.
///
/// `entries` must be sorted by timestamp descending (newest first), the
/// order [`LedgerStore::query`](crate::LedgerStore::query) returns.
///
/// Walks from newest to oldest and accumulates entries while the gap to
/// the next-older one stays within `threshold`; the first larger gap is
/// the session boundary and everything older is discarded. The result is
/// sorted ascending by set_number so display order is independent of
/// timestamp jitter or insertion order.
///
/// Returns `None` for empty input: the exercise has never been performed.
pub fn latest_session(entries: &[LogEntry], threshold: Duration) -> Option<Vec<LogEntry>> {
    let (first, rest) = entries.split_first()?;

    let mut session = vec![first.clone()];
    let mut newer = first;
    for entry in rest {
        // Descending input, so the gap is newer minus older. Identical
        // timestamps give a zero gap and stay in the session.
        let gap = newer.timestamp - entry.timestamp;
        if gap > threshold {
            break;
        }
        session.push(entry.clone());
        newer = entry;
    }

    session.sort_by_key(|e| e.set_number);
    Some(session)
}

/// Cluster all entries into distinct sessions, newest to oldest.
///
/// Each session is sorted ascending by set_number. Useful for history and
/// analytics views showing more than the latest session.
pub fn cluster_sessions(entries: &[LogEntry], threshold: Duration) -> Vec<Vec<LogEntry>> {
    let Some((first, rest)) = entries.split_first() else {
        return Vec::new();
    };

    let mut sessions = Vec::new();
    let mut current = vec![first.clone()];
    let mut newer = first;

    for entry in rest {
        let gap = newer.timestamp - entry.timestamp;
        if gap <= threshold {
            current.push(entry.clone());
        } else {
            current.sort_by_key(|e| e.set_number);
            sessions.push(current);
            current = vec![entry.clone()];
        }
        newer = entry;
    }

    current.sort_by_key(|e| e.set_number);
    sessions.push(current);
    sessions
}
