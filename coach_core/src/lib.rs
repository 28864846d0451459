#![forbid(unsafe_code)]

//! Core domain model and decision rules for the Runcoach system.
//!
//! This crate provides:
//! - Domain types (exercises, templates, profile, journal entries)
//! - The exercise catalog with regression/progression chains
//! - Decision rules: traffic-light pain classifier, APRE auto-regulation,
//!   minimalist dose planner, stagnation detection
//! - Session flow (exercise queue with in-place regression)
//! - Persistence (profile document, settings, append-only journals)
//! - Data export (JSON bundle, workout CSV)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod pain;
pub mod apre;
pub mod minimalist;
pub mod session;
pub mod journal;
pub mod store;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, default_catalog};
pub use config::Config;
pub use pain::{classify, state_from_score, PainAssessment};
pub use apre::{adjust, detect_stagnation, round_to_step, warmup_plan, Adjustment};
pub use minimalist::{compute_next_target, infer_stage, DoseDecision};
pub use session::{ExerciseResult, RegressionOutcome, SessionQueue};
pub use store::Store;
pub use export::ExportBundle;
