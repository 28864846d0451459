//! Data export: a single JSON bundle, or a CSV table of the workout journal.
//!
//! Exports never mutate anything; deleting data is the reset path's job.

use crate::types::{MinimalistEntry, PainEntry, Profile, WorkoutEntry};
use crate::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Everything the system knows, in one serializable bundle
#[derive(Debug, serde::Serialize)]
pub struct ExportBundle<'a> {
    pub exported_at: DateTime<Utc>,
    pub profile: Option<&'a Profile>,
    pub workouts: &'a [WorkoutEntry],
    pub pain_logs: &'a [PainEntry],
    pub minimalist_logs: &'a [MinimalistEntry],
}

impl<'a> ExportBundle<'a> {
    pub fn new(
        profile: Option<&'a Profile>,
        workouts: &'a [WorkoutEntry],
        pain_logs: &'a [PainEntry],
        minimalist_logs: &'a [MinimalistEntry],
    ) -> Self {
        Self {
            exported_at: Utc::now(),
            profile,
            workouts,
            pain_logs,
            minimalist_logs,
        }
    }

    /// Pretty-printed JSON, ready for a file or stdout
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A row in the workout CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    ts: String,
    kind: String,
    protocol_id: String,
    exercise_id: String,
    exercise_name: String,
    baseline_start_kg: f64,
    reps_set3: u32,
    set4_kg: f64,
    baseline_next_kg: f64,
}

impl From<&WorkoutEntry> for CsvRow {
    fn from(entry: &WorkoutEntry) -> Self {
        CsvRow {
            id: entry.id.to_string(),
            ts: entry.ts.to_rfc3339(),
            kind: entry.kind.clone(),
            protocol_id: entry.protocol_id.clone(),
            exercise_id: entry.exercise_id.clone(),
            exercise_name: entry.exercise_name.clone(),
            baseline_start_kg: entry.baseline_start_kg,
            reps_set3: entry.reps_set3,
            set4_kg: entry.set4_kg,
            baseline_next_kg: entry.baseline_next_kg,
        }
    }
}

/// Write the workout journal as a CSV table, replacing any existing file.
///
/// Returns the number of rows written.
pub fn write_workouts_csv(path: &Path, entries: &[WorkoutEntry]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for entry in entries {
        writer.serialize(CsvRow::from(entry))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} workout rows to {:?}", entries.len(), path);
    Ok(entries.len())
}
