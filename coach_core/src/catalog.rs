//! Default catalog of exercises and workout templates.
//!
//! Exercises are linked into difficulty chains through `regression_id` and
//! `progression_id`. Links are plain ids; a dangling link simply ends the
//! chain instead of failing the caller.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog with built-in exercises and templates
///
/// **Note**: For production use, prefer `default_catalog()` which returns a
/// cached reference. This function is retained for testing and custom catalog
/// creation.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

/// Internal function that actually builds the catalog
fn build_default_catalog_internal() -> Catalog {
    let mut exercises = HashMap::new();
    let mut templates = HashMap::new();

    // ========================================================================
    // Warm-up
    // ========================================================================

    exercises.insert(
        "lunge_matrix".into(),
        Exercise {
            id: "lunge_matrix".into(),
            name: "Lunge Matrix".into(),
            category: "warmup".into(),
            cues: vec![
                "Big step forward, torso tall, then drive back up.".into(),
                "Same pattern to the side: hips back, knee tracking over the foot.".into(),
                "Finish with the rotational step, opening the hip at 45 degrees.".into(),
            ],
            tags: vec!["rehab".into(), "low_impact".into(), "mobility".into()],
            equipment: vec!["bodyweight".into()],
            regression_id: None,
            progression_id: None,
        },
    );

    // ========================================================================
    // Foot core
    // ========================================================================

    exercises.insert(
        "foot_doming".into(),
        Exercise {
            id: "foot_doming".into(),
            name: "Short Foot (Doming)".into(),
            category: "foot_core".into(),
            cues: vec![
                "Seated, foot flat on the floor.".into(),
                "Shorten the foot by lifting the arch without curling the toes.".into(),
                "Hold the contraction 5-8 seconds, then relax.".into(),
            ],
            tags: vec!["rehab".into(), "low_impact".into()],
            equipment: vec!["bodyweight".into()],
            regression_id: None,
            progression_id: Some("towel_curls".into()),
        },
    );

    exercises.insert(
        "towel_curls".into(),
        Exercise {
            id: "towel_curls".into(),
            name: "Towel Curls".into(),
            category: "foot_core".into(),
            cues: vec![
                "Seated, foot flat on a towel.".into(),
                "Drag the towel toward you using only the toes.".into(),
                "Keep the heel planted the whole time.".into(),
            ],
            tags: vec!["rehab".into(), "low_impact".into()],
            equipment: vec!["bodyweight".into(), "towel".into()],
            regression_id: Some("foot_doming".into()),
            progression_id: None,
        },
    );

    // ========================================================================
    // Glute activation
    // ========================================================================

    exercises.insert(
        "glute_bridge".into(),
        Exercise {
            id: "glute_bridge".into(),
            name: "Glute Bridge".into(),
            category: "glute_activation".into(),
            cues: vec![
                "On your back, knees bent, feet close to the hips.".into(),
                "Squeeze the glutes to lift the pelvis until knees, hips and shoulders line up.".into(),
                "Hold two seconds at the top, lower slowly.".into(),
            ],
            tags: vec!["rehab".into(), "low_impact".into()],
            equipment: vec!["bodyweight".into()],
            regression_id: None,
            progression_id: Some("glute_bridge_single_leg".into()),
        },
    );

    exercises.insert(
        "glute_bridge_single_leg".into(),
        Exercise {
            id: "glute_bridge_single_leg".into(),
            name: "Single-Leg Glute Bridge".into(),
            category: "glute_activation".into(),
            cues: vec![
                "Same setup, one foot on the floor, the other knee pulled to the chest.".into(),
                "Drive through the heel and keep the pelvis level.".into(),
                "No twisting: both hip bones stay square to the ceiling.".into(),
            ],
            tags: vec!["rehab".into(), "load".into()],
            equipment: vec!["bodyweight".into()],
            regression_id: Some("glute_bridge".into()),
            progression_id: None,
        },
    );

    exercises.insert(
        "clamshell_iso".into(),
        Exercise {
            id: "clamshell_iso".into(),
            name: "Clamshell (Isometric)".into(),
            category: "glute_activation".into(),
            cues: vec![
                "Side-lying, knees bent, heels together.".into(),
                "Open the top knee and hold against the band.".into(),
                "Do not let the pelvis roll backwards.".into(),
            ],
            tags: vec!["rehab".into(), "low_impact".into()],
            equipment: vec!["bodyweight".into(), "band".into()],
            regression_id: None,
            progression_id: None,
        },
    );

    // ========================================================================
    // Strength
    // ========================================================================

    exercises.insert(
        "squat_assisted".into(),
        Exercise {
            id: "squat_assisted".into(),
            name: "Assisted Squat".into(),
            category: "strength".into(),
            cues: vec![
                "Hold a door frame or suspension strap for balance.".into(),
                "Sit back and down under control, back straight.".into(),
                "Use the assistance as little as possible on the way up.".into(),
            ],
            tags: vec!["rehab".into(), "low_impact".into()],
            equipment: vec!["bodyweight".into()],
            regression_id: None,
            progression_id: Some("squat_bw".into()),
        },
    );

    exercises.insert(
        "squat_bw".into(),
        Exercise {
            id: "squat_bw".into(),
            name: "Bodyweight Squat".into(),
            category: "strength".into(),
            cues: vec![
                "Feet shoulder-width, toes slightly out.".into(),
                "Descend with the chest open until the thighs are parallel.".into(),
                "Push through the heels to stand.".into(),
            ],
            tags: vec!["load".into()],
            equipment: vec!["bodyweight".into()],
            regression_id: Some("squat_assisted".into()),
            progression_id: Some("goblet_squat".into()),
        },
    );

    exercises.insert(
        "goblet_squat".into(),
        Exercise {
            id: "goblet_squat".into(),
            name: "Goblet Squat".into(),
            category: "strength".into(),
            cues: vec![
                "Hold the weight at the chest, elbows tucked.".into(),
                "Squat between the knees, torso tall.".into(),
                "Stand up hard, exhale at the top.".into(),
            ],
            tags: vec!["load".into()],
            equipment: vec!["dumbbell".into(), "kettlebell".into()],
            regression_id: Some("squat_bw".into()),
            progression_id: None,
        },
    );

    // ========================================================================
    // Calf and Achilles
    // ========================================================================

    exercises.insert(
        "calf_raise_straight".into(),
        Exercise {
            id: "calf_raise_straight".into(),
            name: "Calf Raise (Straight Knee)".into(),
            category: "calf_achilles".into(),
            cues: vec![
                "Standing on one foot, rise as high as possible onto the ball of the foot.".into(),
                "Lower on a slow 3-5 second count.".into(),
                "Keep the working knee locked straight.".into(),
            ],
            tags: vec!["rehab".into(), "load".into()],
            equipment: vec!["bodyweight".into()],
            regression_id: None,
            progression_id: Some("calf_raise_bent".into()),
        },
    );

    exercises.insert(
        "calf_raise_bent".into(),
        Exercise {
            id: "calf_raise_bent".into(),
            name: "Calf Raise (Bent Knee)".into(),
            category: "calf_achilles".into(),
            cues: vec![
                "Knee bent about 20-30 degrees to bias the soleus.".into(),
                "Rise onto the ball of the foot, pause, lower slowly.".into(),
                "Add load once twenty clean reps feel easy.".into(),
            ],
            tags: vec!["rehab".into(), "load".into()],
            equipment: vec!["bodyweight".into()],
            regression_id: Some("calf_raise_straight".into()),
            progression_id: None,
        },
    );

    // ========================================================================
    // Plyometrics
    // ========================================================================

    exercises.insert(
        "pogo_hops".into(),
        Exercise {
            id: "pogo_hops".into(),
            name: "Pogo Hops".into(),
            category: "plyometrics".into(),
            cues: vec![
                "Stiff ankles, quick ground contacts, land on the midfoot.".into(),
                "Think of the legs as springs; the knees barely bend.".into(),
                "Stop at the first sign of calf or Achilles pain.".into(),
            ],
            tags: vec!["impact".into(), "risk".into(), "performance".into()],
            equipment: vec!["bodyweight".into()],
            regression_id: None,
            progression_id: Some("single_leg_hops".into()),
        },
    );

    exercises.insert(
        "single_leg_hops".into(),
        Exercise {
            id: "single_leg_hops".into(),
            name: "Single-Leg Hops".into(),
            category: "plyometrics".into(),
            cues: vec![
                "Same spring quality on one leg.".into(),
                "Small height, crisp rhythm, level pelvis.".into(),
                "Stop on technique breakdown, not exhaustion.".into(),
            ],
            tags: vec!["impact".into(), "risk".into(), "performance".into()],
            equipment: vec!["bodyweight".into()],
            regression_id: Some("pogo_hops".into()),
            progression_id: None,
        },
    );

    // ========================================================================
    // Workout Templates
    // ========================================================================

    templates.insert(
        "foundations".into(),
        WorkoutTemplate {
            id: "foundations".into(),
            name: "Foundations (Prevention & Stability)".into(),
            description: "A short circuit for foot strength and posterior-chain activation. \
                          Ideal early in a cycle or on a recovery day."
                .into(),
            exercises: vec![
                "lunge_matrix".into(),
                "foot_doming".into(),
                "glute_bridge".into(),
                "calf_raise_straight".into(),
            ],
            tags: vec!["rehab".into(), "safe".into(), "low_impact".into()],
        },
    );

    templates.insert(
        "runner_strength".into(),
        WorkoutTemplate {
            id: "runner_strength".into(),
            name: "Runner Strength (HSR)".into(),
            description: "Heavy slow resistance work for running economy and tissue resilience."
                .into(),
            exercises: vec![
                "lunge_matrix".into(),
                "squat_bw".into(),
                "calf_raise_bent".into(),
            ],
            tags: vec!["performance".into()],
        },
    );

    templates.insert(
        "spring_stiffness".into(),
        WorkoutTemplate {
            id: "spring_stiffness".into(),
            name: "Spring & Stiffness".into(),
            description: "Reactive ankle work for late-stage return to bouncy running. \
                          Only on a green day."
                .into(),
            exercises: vec![
                "pogo_hops".into(),
                "single_leg_hops".into(),
                "calf_raise_bent".into(),
            ],
            tags: vec!["performance".into(), "impact".into()],
        },
    );

    Catalog {
        exercises,
        templates,
    }
}

impl Catalog {
    /// Look up one exercise by id
    pub fn exercise(&self, id: &str) -> Option<&Exercise> {
        self.exercises.get(id)
    }

    /// Snapshot of all exercises, sorted by id
    ///
    /// Returns owned copies so callers can mutate freely without touching
    /// the catalog.
    pub fn list_exercises(&self) -> Vec<Exercise> {
        let mut all: Vec<Exercise> = self.exercises.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Look up one workout template by id
    pub fn template(&self, id: &str) -> Option<&WorkoutTemplate> {
        self.templates.get(id)
    }

    /// Snapshot of all templates, sorted by id
    pub fn list_templates(&self) -> Vec<WorkoutTemplate> {
        let mut all: Vec<WorkoutTemplate> = self.templates.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Sorted list of the distinct exercise categories
    pub fn categories(&self) -> Vec<String> {
        let mut cats: Vec<String> = self
            .exercises
            .values()
            .map(|e| e.category.clone())
            .collect();
        cats.sort();
        cats.dedup();
        cats
    }

    /// Walk a difficulty chain from `start_id`, following at most `max_steps`
    /// links in the given direction.
    ///
    /// The starting exercise is included, so a full walk over a chain of N
    /// links yields N+1 exercises. An unknown `start_id` yields an empty list;
    /// a dangling link mid-chain ends the walk without error.
    pub fn walk_chain(
        &self,
        start_id: &str,
        direction: ChainDirection,
        max_steps: usize,
    ) -> Vec<Exercise> {
        let mut chain = Vec::new();
        let mut current = match self.exercises.get(start_id) {
            Some(exercise) => exercise,
            None => return chain,
        };
        chain.push(current.clone());

        for _ in 0..max_steps {
            let link = match direction {
                ChainDirection::Regression => current.regression_id.as_deref(),
                ChainDirection::Progression => current.progression_id.as_deref(),
            };
            let next_id = match link {
                Some(id) => id,
                None => break,
            };
            match self.exercises.get(next_id) {
                Some(next) => {
                    chain.push(next.clone());
                    current = next;
                }
                None => {
                    debug!(from = %current.id, to = %next_id, "chain link does not resolve, stopping walk");
                    break;
                }
            }
        }

        chain
    }

    /// Templates safe to offer while a recent pain state is orange or red
    pub fn rehab_templates(&self) -> Vec<WorkoutTemplate> {
        let mut safe: Vec<WorkoutTemplate> = self
            .templates
            .values()
            .filter(|t| {
                t.tags
                    .iter()
                    .any(|tag| matches!(tag.as_str(), "rehab" | "safe" | "low_impact"))
            })
            .cloned()
            .collect();
        safe.sort_by(|a, b| a.id.cmp(&b.id));
        safe
    }

    /// Exercises without impact or risk tags, sorted by id
    pub fn low_risk_exercises(&self) -> Vec<Exercise> {
        let mut safe: Vec<Exercise> = self
            .exercises
            .values()
            .filter(|e| !e.has_any_tag(&["impact", "risk"]))
            .cloned()
            .collect();
        safe.sort_by(|a, b| a.id.cmp(&b.id));
        safe
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, exercise) in &self.exercises {
            if id.is_empty() || exercise.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if id != &exercise.id {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise.id '{}'",
                    id, exercise.id
                ));
            }
            if exercise.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", id));
            }

            // Chain links must resolve and must not point back at themselves
            for (link_name, link) in [
                ("regression", &exercise.regression_id),
                ("progression", &exercise.progression_id),
            ] {
                if let Some(target) = link {
                    if target == id {
                        errors.push(format!("Exercise '{}' is its own {}", id, link_name));
                    } else if !self.exercises.contains_key(target) {
                        errors.push(format!(
                            "Exercise '{}' references non-existent {} '{}'",
                            id, link_name, target
                        ));
                    }
                }
            }
        }

        for (id, template) in &self.templates {
            if id.is_empty() || template.id.is_empty() {
                errors.push("Template has empty ID".to_string());
            }
            if id != &template.id {
                errors.push(format!(
                    "Template key '{}' doesn't match template.id '{}'",
                    id, template.id
                ));
            }
            if template.name.is_empty() {
                errors.push(format!("Template '{}' has empty name", id));
            }
            if template.exercises.is_empty() {
                errors.push(format!("Template '{}' has no exercises", id));
            }
            for exercise_id in &template.exercises {
                if !self.exercises.contains_key(exercise_id) {
                    errors.push(format!(
                        "Template '{}' references non-existent exercise '{}'",
                        id, exercise_id
                    ));
                }
            }
        }

        // Protection mode needs somewhere safe to send an injured athlete
        if self.rehab_templates().is_empty() {
            errors.push("Catalog has no rehab-safe templates".to_string());
        }
        if self.low_risk_exercises().is_empty() {
            errors.push("Catalog has no low-risk exercises".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.exercises.len(), 13);
        assert_eq!(catalog.templates.len(), 3);
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_all_template_exercises_exist() {
        let catalog = build_default_catalog();
        for template in catalog.templates.values() {
            for exercise_id in &template.exercises {
                assert!(
                    catalog.exercises.contains_key(exercise_id),
                    "Exercise {} referenced but not found",
                    exercise_id
                );
            }
        }
    }

    #[test]
    fn test_all_chain_links_resolve() {
        let catalog = build_default_catalog();
        for exercise in catalog.exercises.values() {
            for link in [&exercise.regression_id, &exercise.progression_id] {
                if let Some(target) = link {
                    assert!(
                        catalog.exercises.contains_key(target),
                        "Exercise {} links to unknown {}",
                        exercise.id,
                        target
                    );
                }
            }
        }
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let catalog = build_default_catalog();
        assert!(catalog.exercise("squat_bw").is_some());
        assert!(catalog.exercise("does_not_exist").is_none());
        assert!(catalog.template("foundations").is_some());
        assert!(catalog.template("does_not_exist").is_none());
    }

    #[test]
    fn test_list_exercises_is_a_defensive_copy() {
        let catalog = build_default_catalog();
        let mut listing = catalog.list_exercises();
        let count = listing.len();
        listing[0].name = "Mutated".to_string();
        listing.clear();
        assert_eq!(catalog.list_exercises().len(), count);
        assert_ne!(catalog.list_exercises()[0].name, "Mutated");
    }

    #[test]
    fn test_walk_full_squat_chain() {
        let catalog = build_default_catalog();
        let chain = catalog.walk_chain("goblet_squat", ChainDirection::Regression, 10);
        let ids: Vec<&str> = chain.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["goblet_squat", "squat_bw", "squat_assisted"]);
    }

    #[test]
    fn test_walk_chain_budget_includes_start() {
        // A chain of 2 links walked with a generous budget yields 3 exercises
        let catalog = build_default_catalog();
        let chain = catalog.walk_chain("squat_assisted", ChainDirection::Progression, 7);
        assert_eq!(chain.len(), 3);
        // A budget of 1 yields the start plus one link
        let short = catalog.walk_chain("squat_assisted", ChainDirection::Progression, 1);
        assert_eq!(short.len(), 2);
        // A budget of 0 yields just the start
        let none = catalog.walk_chain("squat_assisted", ChainDirection::Progression, 0);
        assert_eq!(none.len(), 1);
    }

    #[test]
    fn test_walk_chain_unknown_start_is_empty() {
        let catalog = build_default_catalog();
        let chain = catalog.walk_chain("nope", ChainDirection::Regression, 5);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_walk_chain_stops_at_dangling_link() {
        let mut catalog = build_default_catalog();
        if let Some(exercise) = catalog.exercises.get_mut("squat_bw") {
            exercise.progression_id = Some("missing_exercise".to_string());
        }
        let chain = catalog.walk_chain("squat_assisted", ChainDirection::Progression, 10);
        let ids: Vec<&str> = chain.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["squat_assisted", "squat_bw"]);
    }

    #[test]
    fn test_walk_chain_stops_at_chain_end() {
        let catalog = build_default_catalog();
        let chain = catalog.walk_chain("clamshell_iso", ChainDirection::Progression, 5);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_rehab_templates_exclude_impact_work() {
        let catalog = build_default_catalog();
        let safe = catalog.rehab_templates();
        assert!(safe.iter().any(|t| t.id == "foundations"));
        assert!(!safe.iter().any(|t| t.id == "spring_stiffness"));
        assert!(!safe.iter().any(|t| t.id == "runner_strength"));
    }

    #[test]
    fn test_low_risk_exercises_exclude_plyometrics() {
        let catalog = build_default_catalog();
        let safe = catalog.low_risk_exercises();
        assert!(safe.iter().any(|e| e.id == "squat_bw"));
        assert!(!safe.iter().any(|e| e.id == "pogo_hops"));
        assert!(!safe.iter().any(|e| e.id == "single_leg_hops"));
    }

    #[test]
    fn test_validate_flags_dangling_links() {
        let mut catalog = build_default_catalog();
        if let Some(exercise) = catalog.exercises.get_mut("pogo_hops") {
            exercise.progression_id = Some("missing".to_string());
        }
        let errors = catalog.validate();
        assert!(errors.iter().any(|e| e.contains("pogo_hops")));
    }

    #[test]
    fn test_categories_are_distinct_and_sorted() {
        let catalog = build_default_catalog();
        let cats = catalog.categories();
        let mut sorted = cats.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(cats, sorted);
        assert!(cats.contains(&"strength".to_string()));
        assert!(cats.contains(&"plyometrics".to_string()));
    }
}
