//! APRE auto-regulation engine.
//!
//! Three protocols (APRE10, APRE6, APRE3) each prescribe a three-set warm-up
//! ladder and then adjust loads from the repetitions achieved on the third
//! (calibration) set. Adjustments are table-driven: each protocol owns a
//! list of rep buckets with fixed kg deltas, scanned in order.
//!
//! All functions here are total. Out-of-range inputs are clamped and unknown
//! protocol ids degrade to a neutral adjustment instead of failing, so a typo
//! in stored data can never block a session.

use crate::types::{Profile, WorkoutEntry};
use tracing::{debug, warn};

// ============================================================================
// Protocols
// ============================================================================

/// A named APRE protocol and its calibration-set rep target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtocolSpec {
    pub id: &'static str,
    pub target_reps: u32,
    pub label: &'static str,
}

/// The supported protocols, in menu order
pub const PROTOCOLS: [ProtocolSpec; 3] = [
    ProtocolSpec {
        id: "APRE10",
        target_reps: 10,
        label: "APRE 10 (work capacity)",
    },
    ProtocolSpec {
        id: "APRE6",
        target_reps: 6,
        label: "APRE 6 (strength + hypertrophy)",
    },
    ProtocolSpec {
        id: "APRE3",
        target_reps: 3,
        label: "APRE 3 (max strength)",
    },
];

/// Look up a protocol by id
pub fn protocol(id: &str) -> Option<&'static ProtocolSpec> {
    PROTOCOLS.iter().find(|p| p.id == id)
}

/// The calibration-set rep target for a protocol, if known
pub fn protocol_target(id: &str) -> Option<u32> {
    protocol(id).map(|p| p.target_reps)
}

/// Human label for a protocol id; unknown ids fall back to the id itself
pub fn protocol_label<'a>(id: &'a str) -> &'a str {
    protocol(id).map(|p| p.label).unwrap_or(id)
}

// ============================================================================
// Warm-up Ladder
// ============================================================================

/// One set of the prescribed warm-up ladder
///
/// `weight_kg` is unrounded; callers round to the athlete's weight step
/// at display time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WarmupSet {
    pub set: u8,
    pub pct: f64,
    pub weight_kg: f64,
    pub reps_hint: u32,
    pub note: &'static str,
}

/// Build the three-set ladder leading into the calibration set.
///
/// The baseline is clamped to 0-999 kg. An unknown protocol id assumes a
/// rep target of 6.
pub fn warmup_plan(baseline_kg: f64, protocol_id: &str) -> [WarmupSet; 3] {
    let baseline = if baseline_kg.is_finite() {
        baseline_kg.clamp(0.0, 999.0)
    } else {
        0.0
    };
    let target = protocol_target(protocol_id).unwrap_or(6);

    [
        WarmupSet {
            set: 1,
            pct: 0.5,
            weight_kg: baseline * 0.5,
            reps_hint: target + 2,
            note: "Warm-up (easy, clean technique)",
        },
        WarmupSet {
            set: 2,
            pct: 0.75,
            weight_kg: baseline * 0.75,
            reps_hint: target.saturating_sub(2).max(3),
            note: "Warm-up (building tension)",
        },
        WarmupSet {
            set: 3,
            pct: 1.0,
            weight_kg: baseline,
            reps_hint: target,
            note: "Test set (max reps, stop if technique breaks down)",
        },
    ]
}

// ============================================================================
// Adjustment Tables
// ============================================================================

/// Load adjustment derived from the calibration set
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Adjustment {
    /// Delta applied to the baseline for set 4, in kg
    pub set4_delta_kg: f64,
    /// Delta applied to the baseline for the next session, in kg
    pub next_baseline_delta_kg: f64,
    pub message: &'static str,
}

/// One row of a protocol's adjustment table, matching any rep count up to
/// and including `max_reps`
struct RepBucket {
    max_reps: u32,
    set4_delta_kg: f64,
    next_baseline_delta_kg: f64,
    message: &'static str,
}

const APRE10_BUCKETS: [RepBucket; 4] = [
    RepBucket {
        max_reps: 6,
        set4_delta_kg: -5.0,
        next_baseline_delta_kg: -5.0,
        message: "Too heavy or high fatigue - deloading.",
    },
    RepBucket {
        max_reps: 9,
        set4_delta_kg: 0.0,
        next_baseline_delta_kg: 0.0,
        message: "Adaptation zone - holding steady.",
    },
    RepBucket {
        max_reps: 12,
        set4_delta_kg: 0.0,
        next_baseline_delta_kg: 2.5,
        message: "Solid - slight increase next time.",
    },
    RepBucket {
        max_reps: u32::MAX,
        set4_delta_kg: 2.5,
        next_baseline_delta_kg: 2.5,
        message: "Sub-maximal - adding stimulus back.",
    },
];

const APRE6_BUCKETS: [RepBucket; 5] = [
    RepBucket {
        max_reps: 3,
        set4_delta_kg: -5.0,
        next_baseline_delta_kg: -2.5,
        message: "Load too heavy - dropping it to finish clean.",
    },
    RepBucket {
        max_reps: 5,
        set4_delta_kg: -2.5,
        next_baseline_delta_kg: 0.0,
        message: "A little short - securing and consolidating.",
    },
    RepBucket {
        max_reps: 7,
        set4_delta_kg: 0.0,
        next_baseline_delta_kg: 2.5,
        message: "Target hit - progression planned for the next session.",
    },
    RepBucket {
        max_reps: 12,
        set4_delta_kg: 2.5,
        next_baseline_delta_kg: 2.5,
        message: "Going up too easily - increasing right now.",
    },
    RepBucket {
        max_reps: u32::MAX,
        set4_delta_kg: 5.0,
        next_baseline_delta_kg: 7.5,
        message: "Far too light - significant increase.",
    },
];

const APRE3_BUCKETS: [RepBucket; 5] = [
    RepBucket {
        max_reps: 1,
        set4_delta_kg: -5.0,
        next_baseline_delta_kg: -2.5,
        message: "Too heavy - protecting technique and the nervous system.",
    },
    RepBucket {
        max_reps: 2,
        set4_delta_kg: -2.5,
        next_baseline_delta_kg: 0.0,
        message: "Almost - consolidating before moving up.",
    },
    RepBucket {
        max_reps: 4,
        set4_delta_kg: 0.0,
        next_baseline_delta_kg: 2.5,
        message: "Target hit - cautious progression.",
    },
    RepBucket {
        max_reps: 6,
        set4_delta_kg: 2.5,
        next_baseline_delta_kg: 5.0,
        message: "Good margin - moving up.",
    },
    RepBucket {
        max_reps: u32::MAX,
        set4_delta_kg: 5.0,
        next_baseline_delta_kg: 7.5,
        message: "Very light - significant raise.",
    },
];

const NEUTRAL_ADJUSTMENT: Adjustment = Adjustment {
    set4_delta_kg: 0.0,
    next_baseline_delta_kg: 0.0,
    message: "Unknown protocol - nothing adjusted.",
};

/// Derive the set-4 and next-session deltas from the calibration-set reps.
///
/// Reps are clamped to 0-99. An unknown protocol id returns the neutral
/// adjustment.
pub fn adjust(protocol_id: &str, reps_set3: u32) -> Adjustment {
    let reps = reps_set3.min(99);

    let table: &[RepBucket] = match protocol_id {
        "APRE10" => &APRE10_BUCKETS,
        "APRE6" => &APRE6_BUCKETS,
        "APRE3" => &APRE3_BUCKETS,
        other => {
            warn!(protocol_id = %other, "unknown protocol, returning neutral adjustment");
            return NEUTRAL_ADJUSTMENT;
        }
    };

    for bucket in table {
        if reps <= bucket.max_reps {
            debug!(
                protocol_id,
                reps,
                set4_delta = bucket.set4_delta_kg,
                next_delta = bucket.next_baseline_delta_kg,
                "adjustment bucket matched"
            );
            return Adjustment {
                set4_delta_kg: bucket.set4_delta_kg,
                next_baseline_delta_kg: bucket.next_baseline_delta_kg,
                message: bucket.message,
            };
        }
    }

    // Unreachable while each table ends with a u32::MAX bucket
    NEUTRAL_ADJUSTMENT
}

// ============================================================================
// Load Rounding and Baselines
// ============================================================================

/// Round a load to the nearest multiple of `step`, halves away from zero.
///
/// A non-finite value rounds to 0; a degenerate step (zero, negative or
/// non-finite) leaves the value untouched.
pub fn round_to_step(value: f64, step: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    if !step.is_finite() || step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

impl Profile {
    /// Stored working baseline for an exercise and protocol, if any
    pub fn baseline(&self, exercise_id: &str, protocol_id: &str) -> Option<f64> {
        self.apre_baselines
            .get(exercise_id)
            .and_then(|by_protocol| by_protocol.get(protocol_id))
            .copied()
            .filter(|kg| kg.is_finite())
    }

    /// Record a baseline, re-rounded to the profile's weight step.
    ///
    /// Returns the value actually stored.
    pub fn set_baseline(&mut self, exercise_id: &str, protocol_id: &str, kg: f64) -> f64 {
        let rounded = round_to_step(kg, self.weight_step_kg);
        self.apre_baselines
            .entry(exercise_id.to_string())
            .or_default()
            .insert(protocol_id.to_string(), rounded);
        rounded
    }
}

// ============================================================================
// Stagnation Detection
// ============================================================================

/// Advisory produced when an exercise has stopped progressing
#[derive(Clone, Debug, PartialEq)]
pub struct StagnationAdvisory {
    pub exercise_id: String,
    pub exercise_name: String,
    pub protocol_id: String,
    pub advice: &'static str,
}

/// Check the workout history of one exercise-protocol pair for stagnation.
///
/// Stagnation means at least three logged sessions for the pair whose set-4
/// loads, most recent first, never increase. The result is advice only;
/// nothing is changed on the athlete's behalf.
pub fn detect_stagnation(
    history: &[WorkoutEntry],
    exercise_id: &str,
    protocol_id: &str,
) -> Option<StagnationAdvisory> {
    let mut same_pair: Vec<&WorkoutEntry> = history
        .iter()
        .filter(|w| w.exercise_id == exercise_id && w.protocol_id == protocol_id)
        .collect();
    same_pair.sort_by(|a, b| b.ts.cmp(&a.ts));

    if same_pair.len() < 3 {
        return None;
    }

    let current = same_pair[0].set4_kg;
    let last = same_pair[1].set4_kg;
    let before_last = same_pair[2].set4_kg;

    if current <= last && last <= before_last {
        let advice = match protocol_id {
            "APRE10" => "Switch to APRE 6 (strength)",
            "APRE6" => "Switch to APRE 3 or deload",
            _ => "Deload (light week)",
        };
        debug!(exercise_id, protocol_id, current, last, before_last, "stagnation detected");
        Some(StagnationAdvisory {
            exercise_id: exercise_id.to_string(),
            exercise_name: same_pair[0].exercise_name.clone(),
            protocol_id: protocol_id.to_string(),
            advice,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    #[test]
    fn test_protocol_lookup() {
        assert_eq!(protocol_target("APRE10"), Some(10));
        assert_eq!(protocol_target("APRE6"), Some(6));
        assert_eq!(protocol_target("APRE3"), Some(3));
        assert_eq!(protocol_target("APRE99"), None);
        assert_eq!(protocol_label("APRE3"), "APRE 3 (max strength)");
        assert_eq!(protocol_label("mystery"), "mystery");
    }

    #[test]
    fn test_warmup_plan_percentages() {
        let plan = warmup_plan(100.0, "APRE6");
        assert_eq!(plan[0].weight_kg, 50.0);
        assert_eq!(plan[1].weight_kg, 75.0);
        assert_eq!(plan[2].weight_kg, 100.0);
        assert_eq!(plan[0].reps_hint, 8);
        assert_eq!(plan[1].reps_hint, 4);
        assert_eq!(plan[2].reps_hint, 6);
    }

    #[test]
    fn test_warmup_plan_rep_hints_per_protocol() {
        let plan = warmup_plan(60.0, "APRE10");
        assert_eq!(plan[0].reps_hint, 12);
        assert_eq!(plan[1].reps_hint, 8);
        assert_eq!(plan[2].reps_hint, 10);

        // target - 2 floors at 3
        let plan = warmup_plan(60.0, "APRE3");
        assert_eq!(plan[0].reps_hint, 5);
        assert_eq!(plan[1].reps_hint, 3);
        assert_eq!(plan[2].reps_hint, 3);
    }

    #[test]
    fn test_warmup_plan_clamps_baseline() {
        let plan = warmup_plan(-20.0, "APRE6");
        assert_eq!(plan[2].weight_kg, 0.0);

        let plan = warmup_plan(5000.0, "APRE6");
        assert_eq!(plan[2].weight_kg, 999.0);

        let plan = warmup_plan(f64::NAN, "APRE6");
        assert_eq!(plan[2].weight_kg, 0.0);
    }

    #[test]
    fn test_warmup_plan_unknown_protocol_assumes_target_six() {
        let plan = warmup_plan(40.0, "APRE42");
        assert_eq!(plan[2].reps_hint, 6);
        assert_eq!(plan[0].weight_kg, 20.0);
    }

    #[test]
    fn test_adjust_apre6_buckets() {
        assert_eq!(adjust("APRE6", 3).set4_delta_kg, -5.0);
        assert_eq!(adjust("APRE6", 3).next_baseline_delta_kg, -2.5);
        assert_eq!(adjust("APRE6", 4).set4_delta_kg, -2.5);
        assert_eq!(adjust("APRE6", 5).next_baseline_delta_kg, 0.0);
        assert_eq!(adjust("APRE6", 6).set4_delta_kg, 0.0);
        assert_eq!(adjust("APRE6", 7).next_baseline_delta_kg, 2.5);
        assert_eq!(adjust("APRE6", 8).set4_delta_kg, 2.5);
        assert_eq!(adjust("APRE6", 12).next_baseline_delta_kg, 2.5);
        assert_eq!(adjust("APRE6", 13).set4_delta_kg, 5.0);
        assert_eq!(adjust("APRE6", 13).next_baseline_delta_kg, 7.5);
    }

    #[test]
    fn test_adjust_apre10_buckets() {
        assert_eq!(adjust("APRE10", 0).set4_delta_kg, -5.0);
        assert_eq!(adjust("APRE10", 6).next_baseline_delta_kg, -5.0);
        assert_eq!(adjust("APRE10", 7).set4_delta_kg, 0.0);
        assert_eq!(adjust("APRE10", 9).next_baseline_delta_kg, 0.0);
        assert_eq!(adjust("APRE10", 10).set4_delta_kg, 0.0);
        assert_eq!(adjust("APRE10", 12).next_baseline_delta_kg, 2.5);
        assert_eq!(adjust("APRE10", 13).set4_delta_kg, 2.5);
    }

    #[test]
    fn test_adjust_apre3_buckets() {
        assert_eq!(adjust("APRE3", 0).set4_delta_kg, -5.0);
        assert_eq!(adjust("APRE3", 1).next_baseline_delta_kg, -2.5);
        assert_eq!(adjust("APRE3", 2).set4_delta_kg, -2.5);
        assert_eq!(adjust("APRE3", 3).next_baseline_delta_kg, 2.5);
        assert_eq!(adjust("APRE3", 4).set4_delta_kg, 0.0);
        assert_eq!(adjust("APRE3", 5).set4_delta_kg, 2.5);
        assert_eq!(adjust("APRE3", 6).next_baseline_delta_kg, 5.0);
        assert_eq!(adjust("APRE3", 7).set4_delta_kg, 5.0);
    }

    #[test]
    fn test_adjust_unknown_protocol_is_neutral() {
        let adj = adjust("APRE42", 8);
        assert_eq!(adj.set4_delta_kg, 0.0);
        assert_eq!(adj.next_baseline_delta_kg, 0.0);
        assert!(adj.message.contains("Unknown protocol"));
    }

    #[test]
    fn test_adjust_clamps_absurd_reps() {
        // 500 clamps to 99, landing in the top bucket
        assert_eq!(adjust("APRE6", 500), adjust("APRE6", 99));
        assert_eq!(adjust("APRE6", 500).set4_delta_kg, 5.0);
    }

    #[test]
    fn test_round_to_step() {
        assert_eq!(round_to_step(41.0, 2.5), 40.0);
        assert_eq!(round_to_step(41.3, 2.5), 42.5);
        assert_eq!(round_to_step(43.74, 2.5), 42.5);
        assert_eq!(round_to_step(40.0, 2.5), 40.0);
        // Halves round up
        assert_eq!(round_to_step(41.25, 2.5), 42.5);
        assert_eq!(round_to_step(2.5, 5.0), 5.0);
    }

    #[test]
    fn test_round_to_step_degenerate_inputs() {
        assert_eq!(round_to_step(f64::NAN, 2.5), 0.0);
        assert_eq!(round_to_step(f64::INFINITY, 2.5), 0.0);
        assert_eq!(round_to_step(41.3, 0.0), 41.3);
        assert_eq!(round_to_step(41.3, -2.5), 41.3);
        assert_eq!(round_to_step(41.3, f64::NAN), 41.3);
    }

    #[test]
    fn test_round_to_step_is_idempotent() {
        for value in [0.0, 1.2, 41.3, 43.74, 100.01] {
            for step in [1.0, 2.5, 5.0] {
                let once = round_to_step(value, step);
                assert_eq!(round_to_step(once, step), once);
            }
        }
    }

    #[test]
    fn test_profile_baseline_roundtrip() {
        let mut profile = Profile::new("Ada");
        assert_eq!(profile.baseline("goblet_squat", "APRE6"), None);

        let stored = profile.set_baseline("goblet_squat", "APRE6", 41.3);
        assert_eq!(stored, 42.5);
        assert_eq!(profile.baseline("goblet_squat", "APRE6"), Some(42.5));

        // Same exercise, other protocol, stays independent
        profile.set_baseline("goblet_squat", "APRE3", 50.0);
        assert_eq!(profile.baseline("goblet_squat", "APRE6"), Some(42.5));
        assert_eq!(profile.baseline("goblet_squat", "APRE3"), Some(50.0));
    }

    #[test]
    fn test_profile_baseline_respects_weight_step() {
        let mut profile = Profile::new("Ada");
        profile.weight_step_kg = 5.0;
        assert_eq!(profile.set_baseline("squat_bw", "APRE6", 41.3), 40.0);
        assert_eq!(profile.set_baseline("squat_bw", "APRE6", 43.0), 45.0);
    }

    fn workout(days_ago: i64, exercise_id: &str, protocol_id: &str, set4_kg: f64) -> WorkoutEntry {
        WorkoutEntry {
            id: Uuid::new_v4(),
            ts: Utc::now() - Duration::days(days_ago),
            kind: "apre".to_string(),
            protocol_id: protocol_id.to_string(),
            exercise_id: exercise_id.to_string(),
            exercise_name: exercise_id.to_string(),
            baseline_start_kg: set4_kg,
            reps_set3: 6,
            set4_kg,
            baseline_next_kg: set4_kg,
        }
    }

    #[test]
    fn test_stagnation_detected_on_flat_loads() {
        let history = vec![
            workout(0, "squat_bw", "APRE6", 60.0),
            workout(7, "squat_bw", "APRE6", 60.0),
            workout(14, "squat_bw", "APRE6", 60.0),
        ];
        let advisory = detect_stagnation(&history, "squat_bw", "APRE6").unwrap();
        assert_eq!(advisory.advice, "Switch to APRE 3 or deload");
    }

    #[test]
    fn test_stagnation_detected_on_declining_loads() {
        let history = vec![
            workout(0, "squat_bw", "APRE10", 55.0),
            workout(7, "squat_bw", "APRE10", 57.5),
            workout(14, "squat_bw", "APRE10", 60.0),
        ];
        let advisory = detect_stagnation(&history, "squat_bw", "APRE10").unwrap();
        assert_eq!(advisory.advice, "Switch to APRE 6 (strength)");
    }

    #[test]
    fn test_stagnation_advice_for_apre3_is_deload() {
        let history = vec![
            workout(0, "squat_bw", "APRE3", 80.0),
            workout(7, "squat_bw", "APRE3", 80.0),
            workout(14, "squat_bw", "APRE3", 80.0),
        ];
        let advisory = detect_stagnation(&history, "squat_bw", "APRE3").unwrap();
        assert_eq!(advisory.advice, "Deload (light week)");
    }

    #[test]
    fn test_no_stagnation_when_any_load_increases() {
        let history = vec![
            workout(0, "squat_bw", "APRE6", 62.5),
            workout(7, "squat_bw", "APRE6", 60.0),
            workout(14, "squat_bw", "APRE6", 60.0),
        ];
        assert!(detect_stagnation(&history, "squat_bw", "APRE6").is_none());
    }

    #[test]
    fn test_no_stagnation_with_short_history() {
        let history = vec![
            workout(0, "squat_bw", "APRE6", 60.0),
            workout(7, "squat_bw", "APRE6", 60.0),
        ];
        assert!(detect_stagnation(&history, "squat_bw", "APRE6").is_none());
    }

    #[test]
    fn test_stagnation_window_ignores_other_protocols() {
        // Two old flat APRE6 entries plus one fresh one after an APRE3 block:
        // the APRE3 entries must not count toward the APRE6 window
        let history = vec![
            workout(0, "squat_bw", "APRE6", 60.0),
            workout(3, "squat_bw", "APRE3", 60.0),
            workout(5, "squat_bw", "APRE3", 60.0),
            workout(7, "squat_bw", "APRE6", 60.0),
            workout(14, "squat_bw", "APRE6", 60.0),
        ];
        let advisory = detect_stagnation(&history, "squat_bw", "APRE6");
        assert!(advisory.is_some());
        assert!(detect_stagnation(&history, "squat_bw", "APRE3").is_none());
    }

    #[test]
    fn test_stagnation_sorts_unordered_history() {
        // Oldest first on purpose; detection must sort by timestamp itself
        let history = vec![
            workout(14, "squat_bw", "APRE6", 70.0),
            workout(0, "squat_bw", "APRE6", 60.0),
            workout(7, "squat_bw", "APRE6", 65.0),
        ];
        assert!(detect_stagnation(&history, "squat_bw", "APRE6").is_some());
    }
}
