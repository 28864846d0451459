//! Minimalist-footwear transition planner.
//!
//! The plan is deliberately boring: one minute more per green week until ten
//! clean minutes, then roughly 10% per week, always capped at 10% of the
//! athlete's current run volume. Pain rewinds the plan before ego gets a vote.

use crate::types::{MinimalistEntry, Stage, TrafficLight};
use tracing::debug;

/// Minutes of clean minimalist running that end the micro-dose phase.
/// Also the hard ceiling for a single micro-dose exposure.
const MICRODOSE_CEILING_MIN: f64 = 10.0;

/// Fraction of total run volume a minimalist dose may occupy
const RUN_VOLUME_FRACTION: f64 = 0.10;

const MIN_TARGET_MIN: f64 = 1.0;
const MAX_TARGET_MIN: f64 = 240.0;

/// Infer the transition stage from past minimalist logs.
///
/// One session of at least ten minimalist minutes with a green pain state is
/// enough to move to consolidation. The stage is re-derived from the journal
/// every time rather than trusted from stored state.
pub fn infer_stage(logs: &[MinimalistEntry]) -> Stage {
    for log in logs {
        if log.minutes_minimalist >= MICRODOSE_CEILING_MIN
            && log.pain_state == TrafficLight::Green
        {
            return Stage::Consolidation;
        }
    }
    Stage::Microdose
}

/// The planner's next prescription
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DoseDecision {
    pub next_target_minutes: f64,
    pub message: &'static str,
}

fn clamp_target(minutes: f64) -> f64 {
    if !minutes.is_finite() {
        return MIN_TARGET_MIN;
    }
    minutes.clamp(MIN_TARGET_MIN, MAX_TARGET_MIN)
}

/// Compute the next minimalist dose from the last one and its outcome.
///
/// `total_run_minutes` is the full duration of the run the dose is embedded
/// in; when present it caps the dose at 10% of that volume (never below one
/// minute). Red pain halves the dose, orange holds it, green progresses it
/// according to the stage.
pub fn compute_next_target(
    last_target: f64,
    last_pain_state: TrafficLight,
    stage: Stage,
    total_run_minutes: Option<f64>,
) -> DoseDecision {
    let lt = clamp_target(last_target);
    let cap = total_run_minutes
        .filter(|t| t.is_finite())
        .map(|t| (t * RUN_VOLUME_FRACTION).clamp(MIN_TARGET_MIN, MAX_TARGET_MIN))
        .unwrap_or(f64::INFINITY);

    let decision = match last_pain_state {
        TrafficLight::Red => {
            let next = (lt * 0.5).floor().max(MIN_TARGET_MIN);
            DoseDecision {
                next_target_minutes: next.min(cap),
                message: "Red pain - cut back hard (or rest 48h). \
                          The tissues did not sign up to suffer.",
            }
        }
        TrafficLight::Orange => DoseDecision {
            next_target_minutes: lt.min(cap),
            message: "Orange pain - repeat the same dose. No rush, consistency wins.",
        },
        TrafficLight::Green => match stage {
            Stage::Consolidation => {
                let bumped = (lt + 1.0).max((lt * 1.10).ceil());
                DoseDecision {
                    next_target_minutes: bumped.min(cap),
                    message: "Green - cautious weekly progression (~ +10%).",
                }
            }
            Stage::Microdose => DoseDecision {
                next_target_minutes: (lt + 1.0).min(MICRODOSE_CEILING_MIN).min(cap),
                message: "Green - micro-dose (+1 minute) until 10 clean minutes.",
            },
        },
    };

    debug!(
        last_target = lt,
        state = %last_pain_state,
        stage = %stage,
        cap,
        next = decision.next_target_minutes,
        "minimalist dose computed"
    );
    decision
}
