//! Core domain types for the Runcoach system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Traffic-light pain states and minimalist transition stages
//! - Exercises, regression/progression links and workout templates
//! - The singleton athlete profile
//! - Append-only journal entries (workouts, pain check-ins, minimalist runs)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Decision States
// ============================================================================

/// Three-state pain classification that gates every training decision
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrafficLight {
    Green,
    Orange,
    Red,
}

impl TrafficLight {
    /// One level worse. Red has nowhere further to go.
    pub fn escalate(self) -> Self {
        match self {
            TrafficLight::Green => TrafficLight::Orange,
            TrafficLight::Orange => TrafficLight::Red,
            TrafficLight::Red => TrafficLight::Red,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrafficLight::Green => "GREEN",
            TrafficLight::Orange => "ORANGE",
            TrafficLight::Red => "RED",
        }
    }
}

impl fmt::Display for TrafficLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Phase of the minimalist-footwear transition
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Microdose,
    Consolidation,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Microdose => "MICRODOSE",
            Stage::Consolidation => "CONSOLIDATION",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Exercise and Template Types
// ============================================================================

/// An exercise definition with optional links to easier/harder variants
///
/// Links are ids, never references; a link that does not resolve is treated
/// as the end of the chain.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub category: String,
    pub cues: Vec<String>,
    pub tags: Vec<String>,
    pub equipment: Vec<String>,
    pub regression_id: Option<String>,
    pub progression_id: Option<String>,
}

impl Exercise {
    /// True when any of the exercise's tags appears in `tags`
    pub fn has_any_tag(&self, tags: &[&str]) -> bool {
        self.tags.iter().any(|t| tags.contains(&t.as_str()))
    }
}

/// Direction to follow when walking an exercise chain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainDirection {
    Regression,
    Progression,
}

/// A named workout: an ordered list of exercise ids
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub exercises: Vec<String>,
    pub tags: Vec<String>,
}

/// The complete catalog of exercises and workout templates
#[derive(Clone, Debug)]
pub struct Catalog {
    pub exercises: HashMap<String, Exercise>,
    pub templates: HashMap<String, WorkoutTemplate>,
}

// ============================================================================
// Athlete Profile
// ============================================================================

/// Self-reported training experience
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrainingAge {
    Novice,
    Intermediate,
    Advanced,
}

impl TrainingAge {
    pub fn label(self) -> &'static str {
        match self {
            TrainingAge::Novice => "novice",
            TrainingAge::Intermediate => "intermediate",
            TrainingAge::Advanced => "advanced",
        }
    }
}

impl fmt::Display for TrainingAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Equipment the athlete has access to. All false means bodyweight only.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Equipment {
    #[serde(default)]
    pub dumbbells: bool,
    #[serde(default)]
    pub barbell: bool,
    #[serde(default)]
    pub bands: bool,
}

/// Minimalist transition plan carried on the profile
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MinimalistPlan {
    pub stage: Stage,
    pub target_minutes: f64,
}

impl Default for MinimalistPlan {
    fn default() -> Self {
        Self {
            stage: Stage::Microdose,
            target_minutes: 1.0,
        }
    }
}

/// The singleton athlete profile, one per installation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub name: String,
    pub training_age: TrainingAge,
    pub body_weight_kg: Option<f64>,
    pub running_weekly_minutes: Option<f64>,
    /// Load rounding step in kg (typically 1, 2.5 or 5)
    pub weight_step_kg: f64,
    pub wants_minimalist: bool,
    #[serde(default)]
    pub injury_history: String,
    #[serde(default)]
    pub equipment: Equipment,
    /// exercise id -> protocol id -> working baseline in kg
    #[serde(default)]
    pub apre_baselines: HashMap<String, HashMap<String, f64>>,
    #[serde(default)]
    pub minimalist: MinimalistPlan,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Fresh profile with conservative defaults
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            training_age: TrainingAge::Novice,
            body_weight_kg: None,
            running_weekly_minutes: None,
            weight_step_kg: 2.5,
            wants_minimalist: false,
            injury_history: String::new(),
            equipment: Equipment::default(),
            apre_baselines: HashMap::new(),
            minimalist: MinimalistPlan::default(),
            updated_at: Utc::now(),
        }
    }
}

// ============================================================================
// Journal Entries (append-only)
// ============================================================================

/// A completed strength exercise, one entry per exercise per session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutEntry {
    pub id: Uuid,
    pub ts: DateTime<Utc>,
    pub kind: String,
    pub protocol_id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub baseline_start_kg: f64,
    pub reps_set3: u32,
    pub set4_kg: f64,
    pub baseline_next_kg: f64,
}

/// Workout fields supplied by the caller; the store stamps id and timestamp
#[derive(Clone, Debug)]
pub struct WorkoutDraft {
    pub kind: String,
    pub protocol_id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub baseline_start_kg: f64,
    pub reps_set3: u32,
    pub set4_kg: f64,
    pub baseline_next_kg: f64,
}

impl WorkoutDraft {
    pub fn stamp(self, id: Uuid, ts: DateTime<Utc>) -> WorkoutEntry {
        WorkoutEntry {
            id,
            ts,
            kind: self.kind,
            protocol_id: self.protocol_id,
            exercise_id: self.exercise_id,
            exercise_name: self.exercise_name,
            baseline_start_kg: self.baseline_start_kg,
            reps_set3: self.reps_set3,
            set4_kg: self.set4_kg,
            baseline_next_kg: self.baseline_next_kg,
        }
    }
}

/// A pain check-in with the traffic-light call made at the time
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PainEntry {
    pub id: Uuid,
    pub ts: DateTime<Utc>,
    pub kind: String,
    pub body_part: String,
    pub pain_after: Option<f64>,
    pub pain_morning: Option<f64>,
    pub state: TrafficLight,
    #[serde(default)]
    pub note: String,
}

/// Pain check-in fields supplied by the caller
#[derive(Clone, Debug)]
pub struct PainDraft {
    pub kind: String,
    pub body_part: String,
    pub pain_after: Option<f64>,
    pub pain_morning: Option<f64>,
    pub state: TrafficLight,
    pub note: String,
}

impl PainDraft {
    pub fn stamp(self, id: Uuid, ts: DateTime<Utc>) -> PainEntry {
        PainEntry {
            id,
            ts,
            kind: self.kind,
            body_part: self.body_part,
            pain_after: self.pain_after,
            pain_morning: self.pain_morning,
            state: self.state,
            note: self.note,
        }
    }
}

/// One minimalist running exposure
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MinimalistEntry {
    pub id: Uuid,
    pub ts: DateTime<Utc>,
    pub kind: String,
    pub stage: Stage,
    pub target_minutes: f64,
    pub minutes_minimalist: f64,
    pub total_run_minutes: Option<f64>,
    pub pain_morning: Option<f64>,
    pub pain_state: TrafficLight,
}

/// Minimalist log fields supplied by the caller
#[derive(Clone, Debug)]
pub struct MinimalistDraft {
    pub kind: String,
    pub stage: Stage,
    pub target_minutes: f64,
    pub minutes_minimalist: f64,
    pub total_run_minutes: Option<f64>,
    pub pain_morning: Option<f64>,
    pub pain_state: TrafficLight,
}

impl MinimalistDraft {
    pub fn stamp(self, id: Uuid, ts: DateTime<Utc>) -> MinimalistEntry {
        MinimalistEntry {
            id,
            ts,
            kind: self.kind,
            stage: self.stage,
            target_minutes: self.target_minutes,
            minutes_minimalist: self.minutes_minimalist,
            total_run_minutes: self.total_run_minutes,
            pain_morning: self.pain_morning,
            pain_state: self.pain_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traffic_light_escalation() {
        assert_eq!(TrafficLight::Green.escalate(), TrafficLight::Orange);
        assert_eq!(TrafficLight::Orange.escalate(), TrafficLight::Red);
        assert_eq!(TrafficLight::Red.escalate(), TrafficLight::Red);
    }

    #[test]
    fn test_traffic_light_serialization() {
        let json = serde_json::to_string(&TrafficLight::Green).unwrap();
        assert_eq!(json, "\"GREEN\"");
        let back: TrafficLight = serde_json::from_str("\"RED\"").unwrap();
        assert_eq!(back, TrafficLight::Red);
    }

    #[test]
    fn test_stage_serialization() {
        let json = serde_json::to_string(&Stage::Consolidation).unwrap();
        assert_eq!(json, "\"CONSOLIDATION\"");
    }

    #[test]
    fn test_profile_defaults() {
        let profile = Profile::new("Ada");
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.training_age, TrainingAge::Novice);
        assert_eq!(profile.weight_step_kg, 2.5);
        assert!(!profile.wants_minimalist);
        assert_eq!(profile.minimalist.stage, Stage::Microdose);
        assert_eq!(profile.minimalist.target_minutes, 1.0);
        assert!(profile.apre_baselines.is_empty());
    }

    #[test]
    fn test_profile_deserializes_with_missing_optional_fields() {
        // Older profiles may not carry every section
        let json = r#"{
            "name": "Ada",
            "training_age": "intermediate",
            "body_weight_kg": 70.0,
            "running_weekly_minutes": 120.0,
            "weight_step_kg": 2.5,
            "wants_minimalist": true,
            "updated_at": "2026-01-01T00:00:00Z"
        }"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.training_age, TrainingAge::Intermediate);
        assert!(profile.apre_baselines.is_empty());
        assert_eq!(profile.minimalist.target_minutes, 1.0);
        assert!(!profile.equipment.dumbbells);
    }

    #[test]
    fn test_exercise_tag_matching() {
        let exercise = Exercise {
            id: "pogo_hops".to_string(),
            name: "Pogo Hops".to_string(),
            category: "plyometrics".to_string(),
            cues: vec![],
            tags: vec!["impact".to_string(), "risk".to_string()],
            equipment: vec!["bodyweight".to_string()],
            regression_id: None,
            progression_id: None,
        };
        assert!(exercise.has_any_tag(&["impact"]));
        assert!(exercise.has_any_tag(&["risk", "load"]));
        assert!(!exercise.has_any_tag(&["rehab", "low_impact"]));
    }

    #[test]
    fn test_draft_stamping() {
        let draft = WorkoutDraft {
            kind: "apre".to_string(),
            protocol_id: "APRE6".to_string(),
            exercise_id: "goblet_squat".to_string(),
            exercise_name: "Goblet Squat".to_string(),
            baseline_start_kg: 40.0,
            reps_set3: 7,
            set4_kg: 40.0,
            baseline_next_kg: 42.5,
        };
        let id = Uuid::new_v4();
        let ts = Utc::now();
        let entry = draft.stamp(id, ts);
        assert_eq!(entry.id, id);
        assert_eq!(entry.ts, ts);
        assert_eq!(entry.exercise_id, "goblet_squat");
        assert_eq!(entry.baseline_next_kg, 42.5);
    }
}
