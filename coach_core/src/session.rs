//! In-memory flow for a multi-exercise strength session.
//!
//! A session is an ordered queue of exercise ids with a cursor. Exercises are
//! worked one at a time; asking for an easier variant swaps the current slot
//! in place so the rest of the session is untouched.

use crate::types::{Catalog, Exercise, WorkoutTemplate};
use tracing::info;

/// One finished exercise inside a session
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseResult {
    pub exercise_id: String,
    pub exercise_name: String,
    pub protocol_id: String,
    pub set4_kg: f64,
    pub next_baseline_kg: f64,
}

/// Outcome of asking for an easier variant mid-session
#[derive(Clone, Debug, PartialEq)]
pub enum RegressionOutcome {
    /// The current slot now points at the easier variant
    Switched(Exercise),
    /// The current exercise has no regression link
    AlreadyEasiest,
    /// The current id or its regression target does not resolve
    NotInCatalog,
}

/// Ordered exercise queue with a cursor and the results gathered so far
#[derive(Clone, Debug, Default)]
pub struct SessionQueue {
    queue: Vec<String>,
    cursor: usize,
    results: Vec<ExerciseResult>,
}

impl SessionQueue {
    /// Queue holding every exercise of a template, in template order
    pub fn from_template(template: &WorkoutTemplate) -> Self {
        Self {
            queue: template.exercises.clone(),
            cursor: 0,
            results: Vec::new(),
        }
    }

    /// Queue holding a single exercise
    pub fn single(exercise_id: impl Into<String>) -> Self {
        Self {
            queue: vec![exercise_id.into()],
            cursor: 0,
            results: Vec::new(),
        }
    }

    /// Id of the exercise under the cursor, if the session is still running
    pub fn current(&self) -> Option<&str> {
        self.queue.get(self.cursor).map(String::as_str)
    }

    /// 1-based position of the cursor, for display
    pub fn position(&self) -> usize {
        self.cursor + 1
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.queue.len()
    }

    /// Replace the current exercise with its regression, keeping its slot.
    ///
    /// The queue is only modified on `Switched`; the other outcomes leave the
    /// session exactly as it was.
    pub fn substitute_regression(&mut self, catalog: &Catalog) -> RegressionOutcome {
        let current_id = match self.current() {
            Some(id) => id,
            None => return RegressionOutcome::NotInCatalog,
        };
        let current = match catalog.exercise(current_id) {
            Some(exercise) => exercise,
            None => return RegressionOutcome::NotInCatalog,
        };
        let regression_id = match &current.regression_id {
            Some(id) => id,
            None => return RegressionOutcome::AlreadyEasiest,
        };
        match catalog.exercise(regression_id) {
            Some(easier) => {
                info!(from = %current.id, to = %easier.id, "regression substitution");
                self.queue[self.cursor] = easier.id.clone();
                RegressionOutcome::Switched(easier.clone())
            }
            None => RegressionOutcome::NotInCatalog,
        }
    }

    /// Record the result for the current exercise and advance the cursor
    pub fn record(&mut self, result: ExerciseResult) {
        self.results.push(result);
        self.cursor += 1;
    }

    /// Results gathered so far, in completion order
    pub fn results(&self) -> &[ExerciseResult] {
        &self.results
    }
}
