//! Progressive-overload suggestions.
//!
//! Pure functions over a session reference: no I/O, no side effects. The
//! rules follow double progression — add reps at a fixed weight until a
//! target, then add weight and drop reps back down.

use crate::{config::ProgressionConfig, Progression, ProgressionStrategy, SessionReference, SetData};

/// Tunable progression parameters.
#[derive(Clone, Copy, Debug)]
pub struct ProgressionRules {
    /// Weight added when switching to the weight strategy.
    pub weight_increment: f64,
    /// Rep count at which the suggestion switches from reps to weight.
    pub rep_target: u32,
    /// Reps never drop below this after a weight increase.
    pub rep_floor: u32,
}

impl Default for ProgressionRules {
    fn default() -> Self {
        Self {
            weight_increment: 2.5,
            rep_target: 12,
            rep_floor: 8,
        }
    }
}

impl From<&ProgressionConfig> for ProgressionRules {
    fn from(config: &ProgressionConfig) -> Self {
        Self {
            weight_increment: config.weight_increment,
            rep_target: config.rep_target,
            rep_floor: config.rep_floor,
        }
    }
}

/// The heaviest set of the session.
///
/// On ties the first set in set-number-ascending order wins. The tie-break
/// is intentional and pinned by tests, not an artifact of iteration order.
pub fn heaviest(reference: &SessionReference) -> Option<&SetData> {
    let mut best: Option<&SetData> = None;
    for set in &reference.sets {
        match best {
            Some(b) if set.weight_used <= b.weight_used => {}
            _ => best = Some(set),
        }
    }
    best
}

/// Compute a suggested next target from the session's heaviest set.
///
/// Below `rep_target` reps the suggestion is one more rep at the same
/// weight; at or above it, more weight at reduced reps (never below
/// `rep_floor`). Returns `None` for a session with no sets.
pub fn suggest(reference: &SessionReference, rules: &ProgressionRules) -> Option<Progression> {
    let top = heaviest(reference)?;
    let (weight, reps) = (top.weight_used, top.reps_completed);

    let progression = if reps < rules.rep_target {
        Progression {
            strategy: ProgressionStrategy::Reps,
            weight,
            reps: reps + 1,
            message: format!(
                "Add a rep: aim for {} x {} (last time {} x {})",
                weight,
                reps + 1,
                weight,
                reps
            ),
        }
    } else {
        let next_weight = weight + rules.weight_increment;
        let next_reps = reps.saturating_sub(2).max(rules.rep_floor);
        Progression {
            strategy: ProgressionStrategy::Weight,
            weight: next_weight,
            reps: next_reps,
            message: format!(
                "Add weight: aim for {} x {} (up {} from {})",
                next_weight, next_reps, rules.weight_increment, weight
            ),
        }
    };

    Some(progression)
}

/// Whether a performed set beats the session's heaviest set.
///
/// Strictly more weight wins; at equal weight, strictly more reps wins.
/// An empty session is always beaten.
pub fn beats_previous(weight: f64, reps: u32, reference: &SessionReference) -> bool {
    match heaviest(reference) {
        Some(top) => {
            weight > top.weight_used
                || (weight == top.weight_used && reps > top.reps_completed)
        }
        None => true,
    }
}

/// Total volume of the session: Σ weight × reps.
pub fn volume(reference: &SessionReference) -> f64 {
    reference
        .sets
        .iter()
        .map(|s| s.weight_used * s.reps_completed as f64)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reference(sets: &[(f64, u32)]) -> SessionReference {
        let now = Utc::now();
        let sets: Vec<SetData> = sets
            .iter()
            .enumerate()
            .map(|(i, &(weight, reps))| SetData {
                set_number: i as u32 + 1,
                weight_used: weight,
                reps_completed: reps,
                duration: None,
                distance: None,
                rpe: None,
                timestamp: now,
            })
            .collect();

        SessionReference {
            user_id: "user_1".into(),
            exercise_name: "Leg Press".into(),
            session_timestamp: now,
            total_sets: sets.len(),
            sets,
        }
    }

    #[test]
    fn test_heaviest_picks_max_weight() {
        let r = reference(&[(100.0, 10), (105.0, 8), (100.0, 10)]);
        let top = heaviest(&r).unwrap();
        assert_eq!(top.weight_used, 105.0);
        assert_eq!(top.set_number, 2);
    }

    #[test]
    fn test_heaviest_tie_break_is_first_set() {
        let r = reference(&[(100.0, 10), (100.0, 8), (100.0, 12)]);
        let top = heaviest(&r).unwrap();
        assert_eq!(top.set_number, 1);
        assert_eq!(top.reps_completed, 10);
    }

    #[test]
    fn test_heaviest_of_empty_session() {
        let r = reference(&[]);
        assert!(heaviest(&r).is_none());
    }

    #[test]
    fn test_suggest_reps_strategy() {
        let r = reference(&[(100.0, 10)]);
        let p = suggest(&r, &ProgressionRules::default()).unwrap();
        assert_eq!(p.strategy, ProgressionStrategy::Reps);
        assert_eq!(p.weight, 100.0);
        assert_eq!(p.reps, 11);
    }

    #[test]
    fn test_suggest_weight_strategy() {
        let r = reference(&[(100.0, 12)]);
        let p = suggest(&r, &ProgressionRules::default()).unwrap();
        assert_eq!(p.strategy, ProgressionStrategy::Weight);
        assert_eq!(p.weight, 102.5);
        assert_eq!(p.reps, 10);
    }

    #[test]
    fn test_suggest_uses_heaviest_set() {
        // Heaviest set has 8 reps, so the reps strategy applies even though
        // other sets hit higher rep counts
        let r = reference(&[(100.0, 10), (105.0, 8), (100.0, 10)]);
        let p = suggest(&r, &ProgressionRules::default()).unwrap();
        assert_eq!(p.strategy, ProgressionStrategy::Reps);
        assert_eq!(p.weight, 105.0);
        assert_eq!(p.reps, 9);
    }

    #[test]
    fn test_suggest_respects_rep_floor() {
        let rules = ProgressionRules {
            weight_increment: 2.5,
            rep_target: 9,
            rep_floor: 8,
        };
        let r = reference(&[(60.0, 9)]);
        let p = suggest(&r, &rules).unwrap();
        assert_eq!(p.strategy, ProgressionStrategy::Weight);
        assert_eq!(p.reps, 8); // 9 - 2 clamped up to the floor
    }

    #[test]
    fn test_suggest_empty_session() {
        let r = reference(&[]);
        assert!(suggest(&r, &ProgressionRules::default()).is_none());
    }

    #[test]
    fn test_beats_previous() {
        let r = reference(&[(105.0, 8)]);

        assert!(!beats_previous(105.0, 8, &r)); // equal is not a beat
        assert!(beats_previous(106.0, 5, &r)); // more weight wins outright
        assert!(beats_previous(105.0, 9, &r)); // same weight, more reps
        assert!(!beats_previous(104.0, 20, &r)); // less weight never wins
    }

    #[test]
    fn test_volume() {
        let r = reference(&[(100.0, 10), (105.0, 8), (100.0, 10)]);
        assert_eq!(volume(&r), 2840.0);
    }

    #[test]
    fn test_volume_empty_session() {
        assert_eq!(volume(&reference(&[])), 0.0);
    }

    #[test]
    fn test_rules_from_config() {
        let config = crate::config::ProgressionConfig::default();
        let rules = ProgressionRules::from(&config);
        assert_eq!(rules.weight_increment, 2.5);
        assert_eq!(rules.rep_target, 12);
        assert_eq!(rules.rep_floor, 8);
    }
}
