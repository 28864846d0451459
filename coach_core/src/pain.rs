//! Traffic-light pain classifier.
//!
//! Every go/no-go training decision in the system flows through these rules.
//! Inputs are 0-10 pain scores; out-of-range and non-finite values are
//! clamped rather than rejected so a bad log line can never block a workout.

use crate::types::TrafficLight;
use tracing::debug;

/// Recommended action attached to a traffic-light state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Action {
    pub title: &'static str,
    pub detail: &'static str,
}

/// Result of classifying a pain check-in
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PainAssessment {
    pub state: TrafficLight,
    /// The score that drove the call: max of after-session and next-morning
    pub worst: f64,
    pub action: Action,
}

/// Clamp a raw score onto the 0-10 scale; non-finite input counts as 0
pub(crate) fn clamp_score(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 10.0)
}

/// Map a single pain score onto the traffic light
///
/// Up to 3 is green, 4-5 is orange, 6 and above is red.
pub fn state_from_score(score: f64) -> TrafficLight {
    let score = clamp_score(score);
    if score <= 3.0 {
        TrafficLight::Green
    } else if score <= 5.0 {
        TrafficLight::Orange
    } else {
        TrafficLight::Red
    }
}

/// The coaching action for a given state
pub fn action_for(state: TrafficLight) -> Action {
    match state {
        TrafficLight::Green => Action {
            title: "Progression allowed",
            detail: "Cautious green light. Progress load or volume by at most ~10% per week.",
        },
        TrafficLight::Orange => Action {
            title: "Progression frozen",
            detail: "Hold the current load and volume. Re-test tomorrow morning.",
        },
        TrafficLight::Red => Action {
            title: "Regression required",
            detail: "Reduce load 20-50% or rest 48h.",
        },
    }
}

/// Classify a pain check-in.
///
/// The base state comes from the worst of the after-session score and the
/// next-morning score. When the morning score is worse than the previous
/// morning's (`baseline_morning`), the state escalates one level: a pain
/// that is still climbing the day after is the strongest warning this
/// system knows about.
pub fn classify(
    pain_after: f64,
    pain_morning: Option<f64>,
    baseline_morning: Option<f64>,
) -> PainAssessment {
    let after = clamp_score(pain_after);
    let morning = pain_morning.map(clamp_score);
    let baseline = baseline_morning.map(clamp_score);

    let worst = after.max(morning.unwrap_or(0.0));
    let mut state = state_from_score(worst);

    if let (Some(morning), Some(baseline)) = (morning, baseline) {
        if morning > baseline {
            let escalated = state.escalate();
            debug!(%state, %escalated, morning, baseline, "morning pain worse than yesterday");
            state = escalated;
        }
    }

    PainAssessment {
        state,
        worst,
        action: action_for(state),
    }
}
