use chrono::{DateTime, Local, Utc};
use clap::{Args, Parser, Subcommand};
use coach_core::*;
use std::io::{self, Write};
use std::path::PathBuf;

// These two are coached for reps and position, never loaded.
const BODYWEIGHT_ONLY: [&str; 2] = ["lunge_matrix", "clamshell_iso"];

#[derive(Parser)]
#[command(name = "runcoach")]
#[command(about = "Offline coaching engine for runners: APRE strength, pain triage, minimalist dosing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override the data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the athlete profile
    Onboard(OnboardArgs),

    /// Today's coaching overview (the default)
    Status,

    /// Run an APRE strength session
    Session(SessionArgs),

    /// Log a pain check-in and get the traffic-light call
    Pain {
        /// Pain during or right after effort, 0-10
        #[arg(long)]
        after: Option<f64>,

        /// Pain the next morning, 0-10
        #[arg(long)]
        morning: Option<f64>,

        /// Body part concerned
        #[arg(long)]
        body_part: Option<String>,

        /// Free-text note stored with the check-in
        #[arg(long)]
        note: Option<String>,

        /// How many recent check-ins to list
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Log a minimalist running exposure
    Minimalist {
        /// Minutes actually run in minimal footwear
        #[arg(long)]
        minutes: f64,

        /// Total duration of the run in minutes, enables the 10% cap
        #[arg(long)]
        total_run: Option<f64>,

        /// Morning-after pain score, 0-10
        #[arg(long)]
        pain_morning: Option<f64>,
    },

    /// Browse the exercise catalog
    Library {
        /// Only list exercises in this category
        #[arg(long)]
        category: Option<String>,

        /// Show one exercise in detail, with its difficulty chain
        #[arg(long)]
        exercise: Option<String>,

        /// List workout templates instead of exercises
        #[arg(long)]
        templates: bool,
    },

    /// Recent journal entries, newest first
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Export everything as JSON, or the workout journal as CSV
    Export {
        /// Output format: json or csv
        #[arg(long, default_value = "json")]
        format: String,

        /// Write to this file instead of stdout (required for csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Delete the profile and all journals
    Reset {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct OnboardArgs {
    /// Athlete name
    #[arg(long)]
    name: String,

    /// Training experience: novice, intermediate or advanced
    #[arg(long)]
    training_age: Option<String>,

    /// Body weight in kg
    #[arg(long)]
    body_weight_kg: Option<f64>,

    /// Weekly running volume in minutes
    #[arg(long)]
    weekly_run_minutes: Option<f64>,

    /// Load rounding step in kg (1, 2.5, 5...)
    #[arg(long)]
    weight_step_kg: Option<f64>,

    /// Opt in or out of the minimalist transition plan
    #[arg(long)]
    minimalist: Option<bool>,

    /// Injury history, free text
    #[arg(long)]
    injury_history: Option<String>,

    /// Comma-separated equipment: dumbbells, barbell, bands
    #[arg(long)]
    equipment: Option<String>,
}

#[derive(Args)]
struct SessionArgs {
    /// Workout template to run
    #[arg(long, conflicts_with = "exercise")]
    template: Option<String>,

    /// Single exercise to run instead of a template
    #[arg(long)]
    exercise: Option<String>,

    /// APRE protocol: APRE10, APRE6 or APRE3
    #[arg(long, default_value = "APRE6")]
    protocol: String,

    /// Baseline override in kg
    #[arg(long, requires = "exercise")]
    baseline: Option<f64>,

    /// Calibration-set reps, applied to every exercise; skips all prompts
    #[arg(long)]
    reps: Option<u32>,

    /// Start on the easier variant right away
    #[arg(long, requires = "exercise")]
    regress: bool,

    /// Show the prescription without logging anything
    #[arg(long)]
    dry_run: bool,

    /// End-of-session pain during effort, 0-10
    #[arg(long)]
    pain_after: Option<f64>,

    /// End-of-session pain this morning, 0-10
    #[arg(long)]
    pain_morning: Option<f64>,

    /// Body part for the end-of-session check-in
    #[arg(long)]
    body_part: Option<String>,
}

fn main() -> Result<()> {
    coach_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");

    match cli.command {
        Some(Commands::Onboard(args)) => cmd_onboard(data_dir, args, &config),
        Some(Commands::Session(args)) => cmd_session(data_dir, args, &config),
        Some(Commands::Pain {
            after,
            morning,
            body_part,
            note,
            limit,
        }) => cmd_pain(data_dir, after, morning, body_part, note, limit),
        Some(Commands::Minimalist {
            minutes,
            total_run,
            pain_morning,
        }) => cmd_minimalist(data_dir, minutes, total_run, pain_morning),
        Some(Commands::Library {
            category,
            exercise,
            templates,
        }) => cmd_library(category, exercise, templates),
        Some(Commands::History { limit }) => cmd_history(data_dir, limit),
        Some(Commands::Export { format, out }) => cmd_export(data_dir, format, out),
        Some(Commands::Reset { yes }) => cmd_reset(data_dir, yes),
        Some(Commands::Status) | None => cmd_status(data_dir, &config),
    }
}

fn cmd_onboard(data_dir: PathBuf, args: OnboardArgs, config: &Config) -> Result<()> {
    let store = Store::open(&data_dir)?;

    let mut profile = match store.get_profile()? {
        Some(existing) => existing,
        None => {
            let mut fresh = Profile::new(args.name.clone());
            fresh.weight_step_kg = config.training.default_weight_step_kg;
            fresh
        }
    };

    profile.name = args.name;
    if let Some(age) = args.training_age.as_deref() {
        profile.training_age = parse_training_age(age)?;
    }
    if let Some(bw) = args.body_weight_kg {
        if !(25.0..=250.0).contains(&bw) {
            return Err(Error::Other(format!(
                "Body weight {} kg looks implausible (expected 25-250 kg).",
                fmt_num(bw)
            )));
        }
        profile.body_weight_kg = Some(bw);
    }
    if let Some(minutes) = args.weekly_run_minutes {
        profile.running_weekly_minutes = Some(minutes);
    }
    if let Some(step) = args.weight_step_kg {
        if !step.is_finite() || step <= 0.0 {
            return Err(Error::Other(
                "The weight step must be a positive number of kg.".into(),
            ));
        }
        profile.weight_step_kg = step;
    }
    if let Some(wants) = args.minimalist {
        profile.wants_minimalist = wants;
    }
    if let Some(history) = args.injury_history {
        profile.injury_history = history;
    }
    if let Some(list) = args.equipment.as_deref() {
        profile.equipment = parse_equipment(list);
    }

    let stored = store.save_profile(&profile)?;

    println!("\n✓ Profile saved for {}", stored.name);
    println!("  Level: {}", stored.training_age);
    println!("  Load step: {} kg", fmt_num(stored.weight_step_kg));
    if let Some(bw) = stored.body_weight_kg {
        println!("  Body weight: {} kg", fmt_num(bw));
    }
    if let Some(minutes) = stored.running_weekly_minutes {
        println!("  Running: {} min/week", fmt_num(minutes));
    }
    println!(
        "  Minimalist transition: {}",
        if stored.wants_minimalist { "on" } else { "off" }
    );
    println!("  Equipment: {}", equipment_summary(&stored.equipment));
    Ok(())
}

fn cmd_status(data_dir: PathBuf, config: &Config) -> Result<()> {
    let store = Store::open(&data_dir)?;
    let profile = require_profile(&store)?;

    let workouts = store.workouts(20)?;
    let pains = store.pain_logs(20)?;
    let minis = store.minimalist_logs(20)?;

    let last_workout = workouts.first();
    let last_pain = pains.first();
    let last_mini = minis.first();

    // Recomputed from the raw scores, like the check-in preview. Stored
    // states can carry an old escalation this display should not inherit.
    let pain_state = last_pain.map(|p| {
        state_from_score(p.pain_after.unwrap_or(0.0).max(p.pain_morning.unwrap_or(0.0)))
    });

    let stage = infer_stage(&minis);
    let last_target = last_mini
        .map(|m| m.target_minutes)
        .unwrap_or(profile.minimalist.target_minutes);
    let last_state = last_mini.map(|m| m.pain_state).unwrap_or(TrafficLight::Green);
    let per_run_minutes = profile
        .running_weekly_minutes
        .map(|weekly| weekly / config.minimalist.assumed_runs_per_week.max(1) as f64);
    let next_dose = compute_next_target(last_target, last_state, stage, per_run_minutes);

    print_header("RUNCOACH");
    println!("  Hello {}", profile.name);
    println!();
    println!("  Coach's note: {}", coach_line(pain_state));
    println!();
    match last_workout {
        Some(w) => {
            let label = if w.kind == "apre" {
                apre::protocol_label(&w.protocol_id)
            } else {
                w.kind.as_str()
            };
            println!(
                "  Last session:  {} - {} ({})",
                fmt_ts(w.ts),
                w.exercise_name,
                label
            );
        }
        None => println!("  Last session:  none yet"),
    }
    match last_pain {
        Some(p) => println!(
            "  Pain state:    {}  (after {}, morning {}, area {})",
            pain_state.map(|s| s.label()).unwrap_or("-"),
            fmt_score(p.pain_after),
            fmt_score(p.pain_morning),
            if p.body_part.is_empty() { "-" } else { &p.body_part }
        ),
        None => println!("  Pain state:    no check-ins yet"),
    }
    println!(
        "  Minimalist:    {} - next dose {} min",
        stage,
        fmt_num(next_dose.next_target_minutes)
    );
    if let Some((exercise_id, kg)) = baseline_peek(&profile) {
        println!("  Baseline:      {} at {} kg", exercise_id, fmt_num(kg));
    }
    println!();
    println!(
        "  Level {} - load step {} kg",
        profile.training_age,
        fmt_num(profile.weight_step_kg)
    );
    Ok(())
}

fn cmd_session(data_dir: PathBuf, args: SessionArgs, config: &Config) -> Result<()> {
    let catalog = default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let store = Store::open(&data_dir)?;
    let mut profile = require_profile(&store)?;

    if apre::protocol(&args.protocol).is_none() {
        let known: Vec<&str> = apre::PROTOCOLS.iter().map(|p| p.id).collect();
        return Err(Error::Other(format!(
            "Unknown protocol '{}'. Known protocols: {}.",
            args.protocol,
            known.join(", ")
        )));
    }

    // Protection mode keys off the stored state of the latest check-in.
    let last_pain = store.pain_logs(1)?.into_iter().next();
    let guarded = last_pain
        .as_ref()
        .map(|p| matches!(p.state, TrafficLight::Orange | TrafficLight::Red))
        .unwrap_or(false);

    print_header("APRE SESSION");

    let mut queue = match (&args.template, &args.exercise) {
        (Some(template_id), _) => {
            let template = match catalog.template(template_id) {
                Some(t) => t.clone(),
                None => {
                    let ids: Vec<String> = catalog
                        .list_templates()
                        .iter()
                        .map(|t| t.id.clone())
                        .collect();
                    return Err(Error::Other(format!(
                        "No template '{}'. Available: {}.",
                        template_id,
                        ids.join(", ")
                    )));
                }
            };
            let safe = template
                .tags
                .iter()
                .any(|t| matches!(t.as_str(), "rehab" | "safe" | "low_impact"));
            if guarded && !safe {
                print_protection_banner(last_pain.as_ref());
                println!("  '{}' is on hold for now. Safe templates:", template.name);
                for t in catalog.rehab_templates() {
                    println!("    {:<16} {}", t.id, t.name);
                }
                return Ok(());
            }
            println!("  {} - {} exercises", template.name, template.exercises.len());
            SessionQueue::from_template(&template)
        }
        (None, Some(exercise_id)) => {
            let exercise = match catalog.exercise(exercise_id) {
                Some(e) => e,
                None => {
                    return Err(Error::Other(format!(
                        "No exercise '{}' in the catalog. Try `runcoach library`.",
                        exercise_id
                    )));
                }
            };
            if guarded && exercise.has_any_tag(&["impact", "risk"]) {
                print_protection_banner(last_pain.as_ref());
                println!(
                    "  '{}' is on hold for now. Pick something from the low-impact list:",
                    exercise.name
                );
                for e in catalog.low_risk_exercises() {
                    println!("    {:<22} {}", e.id, e.name);
                }
                return Ok(());
            }
            SessionQueue::single(exercise.id.clone())
        }
        (None, None) => {
            print_selection(catalog, guarded, last_pain.as_ref());
            return Ok(());
        }
    };

    if args.regress {
        match queue.substitute_regression(catalog) {
            RegressionOutcome::Switched(easier) => {
                println!("  Starting on the easier variant: {}", easier.name);
            }
            RegressionOutcome::AlreadyEasiest => {
                println!("  Already the easiest variant - keeping it.");
            }
            RegressionOutcome::NotInCatalog => {
                println!("  No easier variant available - keeping it.");
            }
        }
    }

    let step = profile.weight_step_kg;
    let target_reps = apre::protocol_target(&args.protocol).unwrap_or(6);
    let interactive = args.reps.is_none() && !args.dry_run;

    'exercises: while let Some(exercise_id) = queue.current().map(str::to_string) {
        let exercise = catalog.exercise(&exercise_id).cloned().ok_or_else(|| {
            Error::Other(format!("Exercise '{}' missing from the catalog.", exercise_id))
        })?;

        let baseline =
            resolve_baseline(&exercise, args.baseline, &profile, &args.protocol, interactive)?;

        println!(
            "\n  Exercise {}/{}: {}  [{}]",
            queue.position(),
            queue.len(),
            exercise.name,
            apre::protocol_label(&args.protocol)
        );
        if BODYWEIGHT_ONLY.contains(&exercise.id.as_str()) {
            println!("  Bodyweight only - no load to set.");
        } else {
            println!("  Baseline: {} kg", fmt_num(baseline));
        }
        if !exercise.cues.is_empty() {
            println!("  Cue: {}", exercise.cues[0]);
        }
        println!();
        for set in warmup_plan(baseline, &args.protocol) {
            println!(
                "  Set {}: {:>6} kg  x {:<2}  {}",
                set.set,
                fmt_num(round_to_step(set.weight_kg, step)),
                set.reps_hint,
                set.note
            );
        }
        println!("  Rest {} s between sets", config.training.rest_seconds);

        if args.dry_run {
            queue.record(ExerciseResult {
                exercise_id: exercise.id.clone(),
                exercise_name: exercise.name.clone(),
                protocol_id: args.protocol.clone(),
                set4_kg: baseline,
                next_baseline_kg: baseline,
            });
            continue;
        }

        let reps_set3 = match args.reps {
            Some(reps) => reps,
            None => loop {
                match prompt_set3(target_reps)? {
                    Set3Input::Reps(reps) => break reps,
                    Set3Input::Regress => match queue.substitute_regression(catalog) {
                        RegressionOutcome::Switched(easier) => {
                            println!("\n  Switching to the easier variant: {}", easier.name);
                            continue 'exercises;
                        }
                        RegressionOutcome::AlreadyEasiest => {
                            println!("  Already the easiest variant - hang in there.");
                        }
                        RegressionOutcome::NotInCatalog => {
                            println!("  No easier variant available.");
                        }
                    },
                }
            },
        };

        let adjustment = adjust(&args.protocol, reps_set3);
        let set4_kg = round_to_step(baseline + adjustment.set4_delta_kg, step);
        let next_kg = round_to_step(baseline + adjustment.next_baseline_delta_kg, step);

        println!();
        println!("  {}", adjustment.message);
        println!("  Set 4: {} kg", fmt_num(set4_kg));
        println!("  Next baseline: {} kg", fmt_num(next_kg));

        let stored_baseline = profile.set_baseline(&exercise.id, &args.protocol, next_kg);
        profile = store.save_profile(&profile)?;
        store.add_workout(WorkoutDraft {
            kind: "apre".to_string(),
            protocol_id: args.protocol.clone(),
            exercise_id: exercise.id.clone(),
            exercise_name: exercise.name.clone(),
            baseline_start_kg: baseline,
            reps_set3,
            set4_kg,
            baseline_next_kg: stored_baseline,
        })?;
        println!("  ✓ {} logged", exercise.name);

        queue.record(ExerciseResult {
            exercise_id: exercise.id,
            exercise_name: exercise.name,
            protocol_id: args.protocol.clone(),
            set4_kg,
            next_baseline_kg: stored_baseline,
        });
    }

    if args.dry_run {
        println!("\n[Dry run - nothing logged]");
        return Ok(());
    }

    println!("\n✓ Session complete!");
    for result in queue.results() {
        println!(
            "  {}  set 4 at {} kg, next baseline {} kg",
            result.exercise_name,
            fmt_num(result.set4_kg),
            fmt_num(result.next_baseline_kg)
        );
    }

    // Stagnation pass over the refreshed journal.
    let history = store.workouts(100)?;
    let mut seen: Vec<(String, String)> = Vec::new();
    for result in queue.results() {
        let pair = (result.exercise_id.clone(), result.protocol_id.clone());
        if seen.contains(&pair) {
            continue;
        }
        seen.push(pair);
        if let Some(advisory) = detect_stagnation(&history, &result.exercise_id, &result.protocol_id)
        {
            println!();
            println!(
                "  Stagnation: {} has not moved in three sessions.",
                advisory.exercise_name
            );
            println!("  {}", advisory.advice);
        }
    }

    if args.pain_after.is_some() || args.pain_morning.is_some() {
        let assessment = classify(args.pain_after.unwrap_or(0.0), args.pain_morning, None);
        store.add_pain_log(PainDraft {
            kind: "after_session".to_string(),
            body_part: args.body_part.clone().unwrap_or_default(),
            pain_after: args.pain_after,
            pain_morning: args.pain_morning,
            state: assessment.state,
            note: "Full session completed".to_string(),
        })?;
        println!();
        println!(
            "  Pain check-in: {} - {}",
            assessment.state, assessment.action.title
        );
        println!("  {}", assessment.action.detail);
    }

    Ok(())
}

fn cmd_pain(
    data_dir: PathBuf,
    after: Option<f64>,
    morning: Option<f64>,
    body_part: Option<String>,
    note: Option<String>,
    limit: usize,
) -> Result<()> {
    if after.is_none() && morning.is_none() {
        return Err(Error::Other(
            "Enter at least one score (--after or --morning).".into(),
        ));
    }

    let store = Store::open(&data_dir)?;
    require_profile(&store)?;

    // Yesterday's morning score is the reference for the worsening rule;
    // read it before this check-in lands in the journal.
    let baseline_morning = store
        .pain_logs(1)?
        .into_iter()
        .next()
        .and_then(|p| p.pain_morning);

    let assessment = classify(after.unwrap_or(0.0), morning, baseline_morning);
    let entry = store.add_pain_log(PainDraft {
        kind: "manual".to_string(),
        body_part: body_part.unwrap_or_default(),
        pain_after: after,
        pain_morning: morning,
        state: assessment.state,
        note: note.unwrap_or_else(|| assessment.action.title.to_string()),
    })?;

    print_header("PAIN CHECK-IN");
    println!("  State: {}", entry.state);
    println!("  {} - {}", assessment.action.title, assessment.action.detail);
    println!("  Worst score counted: {}/10", fmt_num(assessment.worst));

    let recent = store.pain_logs(limit)?;
    if recent.len() > 1 {
        println!("\n  Recent check-ins:");
        for log in &recent {
            println!(
                "    {}  {:<6}  after {:>4}  morning {:>4}  {}",
                fmt_ts(log.ts),
                log.state.label(),
                fmt_score(log.pain_after),
                fmt_score(log.pain_morning),
                if log.body_part.is_empty() { "-" } else { &log.body_part }
            );
        }
    }
    Ok(())
}

/// Log a minimalist exposure and refresh the stored plan.
///
/// The original coaching method pairs these runs with a 180 steps/min
/// cadence cue; count against a watch if you want the same beat.
fn cmd_minimalist(
    data_dir: PathBuf,
    minutes: f64,
    total_run: Option<f64>,
    pain_morning: Option<f64>,
) -> Result<()> {
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(Error::Other("Enter the minimalist minutes (> 0).".into()));
    }

    let store = Store::open(&data_dir)?;
    let mut profile = require_profile(&store)?;

    let logs = store.minimalist_logs(30)?;
    let stage = infer_stage(&logs);
    let pain_state = pain_morning.map(state_from_score).unwrap_or(TrafficLight::Green);

    let decision = compute_next_target(minutes, pain_state, stage, total_run);

    store.add_minimalist_log(MinimalistDraft {
        kind: "run_minimalist".to_string(),
        stage,
        target_minutes: minutes,
        minutes_minimalist: minutes,
        total_run_minutes: total_run,
        pain_morning,
        pain_state,
    })?;

    // The stage may have just flipped; re-derive it from the journal
    // before updating the stored plan.
    let refreshed = store.minimalist_logs(30)?;
    let new_stage = infer_stage(&refreshed);
    profile.minimalist = MinimalistPlan {
        stage: new_stage,
        target_minutes: decision.next_target_minutes,
    };
    store.save_profile(&profile)?;

    print_header("MINIMALIST RUN");
    println!("  Stage: {}", new_stage);
    println!("  Logged: {} min minimalist ({})", fmt_num(minutes), pain_state);
    println!("  Next dose: {} min", fmt_num(decision.next_target_minutes));
    println!("  {}", decision.message);

    if refreshed.len() > 1 {
        println!("\n  Recent runs:");
        for log in refreshed.iter().take(5) {
            println!(
                "    {}  {:>5} min  {:<13}  {}",
                fmt_ts(log.ts),
                fmt_num(log.minutes_minimalist),
                log.stage.label(),
                log.pain_state.label()
            );
        }
    }
    Ok(())
}

fn cmd_library(category: Option<String>, exercise: Option<String>, templates: bool) -> Result<()> {
    let catalog = default_catalog();

    if let Some(exercise_id) = exercise {
        let found = match catalog.exercise(&exercise_id) {
            Some(e) => e,
            None => {
                println!("No exercise '{}' in the catalog.", exercise_id);
                return Ok(());
            }
        };

        print_header("LIBRARY");
        println!("  {}  [{}]", found.name, found.category);
        if !found.tags.is_empty() {
            println!("  Tags: {}", found.tags.join(", "));
        }
        if !found.equipment.is_empty() {
            println!("  Equipment: {}", found.equipment.join(", "));
        }
        if !found.cues.is_empty() {
            println!("\n  Cues:");
            for cue in &found.cues {
                println!("    - {}", cue);
            }
        }

        let easier = catalog.walk_chain(&found.id, ChainDirection::Regression, 10);
        let harder = catalog.walk_chain(&found.id, ChainDirection::Progression, 10);
        if easier.len() > 1 || harder.len() > 1 {
            println!("\n  Chain (easiest first):");
            for e in easier.iter().skip(1).rev() {
                println!("      {}", e.name);
            }
            println!("    > {}", found.name);
            for e in harder.iter().skip(1) {
                println!("      {}", e.name);
            }
        }
        return Ok(());
    }

    if templates {
        print_header("TEMPLATES");
        for template in catalog.list_templates() {
            println!("  {:<16} {}", template.id, template.name);
            println!("    {}", template.description);
            let names: Vec<String> = template
                .exercises
                .iter()
                .map(|id| {
                    catalog
                        .exercise(id)
                        .map(|e| e.name.clone())
                        .unwrap_or_else(|| id.clone())
                })
                .collect();
            println!("    Exercises: {}", names.join(", "));
        }
        return Ok(());
    }

    print_header("LIBRARY");
    let wanted = category.map(|c| c.to_lowercase());
    let mut shown = 0;
    for entry in catalog.list_exercises() {
        if let Some(ref want) = wanted {
            if entry.category.to_lowercase() != *want {
                continue;
            }
        }
        shown += 1;
        println!("  {:<22} {:<28} [{}]", entry.id, entry.name, entry.category);
    }
    if shown == 0 {
        println!("  No exercises in category '{}'.", wanted.unwrap_or_default());
        println!("  Categories: {}", catalog.categories().join(", "));
    }
    Ok(())
}

fn cmd_history(data_dir: PathBuf, limit: usize) -> Result<()> {
    let store = Store::open(&data_dir)?;
    require_profile(&store)?;

    print_header("HISTORY");

    let workouts = store.workouts(limit)?;
    println!("  Workouts:");
    if workouts.is_empty() {
        println!("    (none yet)");
    }
    for w in &workouts {
        println!(
            "    {}  {:<28} {:<7} {:>2} reps  {} -> {} kg",
            fmt_ts(w.ts),
            w.exercise_name,
            w.protocol_id,
            w.reps_set3,
            fmt_num(w.baseline_start_kg),
            fmt_num(w.baseline_next_kg)
        );
    }

    let pains = store.pain_logs(limit)?;
    println!("\n  Pain check-ins:");
    if pains.is_empty() {
        println!("    (none yet)");
    }
    for p in &pains {
        println!(
            "    {}  {:<6}  after {:>4}  morning {:>4}  {}",
            fmt_ts(p.ts),
            p.state.label(),
            fmt_score(p.pain_after),
            fmt_score(p.pain_morning),
            if p.body_part.is_empty() { "-" } else { &p.body_part }
        );
    }

    let minis = store.minimalist_logs(limit)?;
    println!("\n  Minimalist runs:");
    if minis.is_empty() {
        println!("    (none yet)");
    }
    for m in &minis {
        println!(
            "    {}  {:>5} min  {:<13}  {}",
            fmt_ts(m.ts),
            fmt_num(m.minutes_minimalist),
            m.stage.label(),
            m.pain_state.label()
        );
    }
    Ok(())
}

fn cmd_export(data_dir: PathBuf, format: String, out: Option<PathBuf>) -> Result<()> {
    let store = Store::open(&data_dir)?;

    match format.as_str() {
        "json" => {
            let profile = store.get_profile()?;
            let workouts = store.workouts(usize::MAX)?;
            let pain_logs = store.pain_logs(usize::MAX)?;
            let minimalist_logs = store.minimalist_logs(usize::MAX)?;
            let bundle =
                ExportBundle::new(profile.as_ref(), &workouts, &pain_logs, &minimalist_logs);
            let json = bundle.to_json()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("✓ Exported everything to {}", path.display());
                }
                None => println!("{}", json),
            }
        }
        "csv" => {
            let path =
                out.ok_or_else(|| Error::Other("--out is required for csv export.".into()))?;
            let workouts = store.workouts(usize::MAX)?;
            let count = export::write_workouts_csv(&path, &workouts)?;
            println!("✓ Exported {} workout rows to {}", count, path.display());
        }
        other => {
            return Err(Error::Other(format!(
                "Unknown format '{}'. Use json or csv.",
                other
            )));
        }
    }
    Ok(())
}

fn cmd_reset(data_dir: PathBuf, yes: bool) -> Result<()> {
    if !yes {
        println!("This deletes the profile, the settings and every journal under");
        println!("  {}", data_dir.display());
        println!("Re-run with --yes to confirm.");
        return Ok(());
    }
    let store = Store::open(&data_dir)?;
    store.reset_all()?;
    println!("✓ All local data removed.");
    Ok(())
}

fn require_profile(store: &Store) -> Result<Profile> {
    store.get_profile()?.ok_or_else(|| {
        Error::Other("No profile yet - run `runcoach onboard --name <you>` first.".into())
    })
}

fn resolve_baseline(
    exercise: &Exercise,
    override_kg: Option<f64>,
    profile: &Profile,
    protocol_id: &str,
    interactive: bool,
) -> Result<f64> {
    if BODYWEIGHT_ONLY.contains(&exercise.id.as_str()) {
        return Ok(0.0);
    }
    if let Some(kg) = override_kg {
        return Ok(kg);
    }
    if let Some(kg) = profile.baseline(&exercise.id, protocol_id) {
        return Ok(kg);
    }
    if interactive {
        prompt_baseline(&exercise.name)
    } else {
        println!(
            "  No stored baseline for {} - using 0 kg (set one with --baseline).",
            exercise.name
        );
        Ok(0.0)
    }
}

enum Set3Input {
    Reps(u32),
    Regress,
}

fn prompt_set3(target_reps: u32) -> Result<Set3Input> {
    loop {
        println!("─────────────────────────────────────────");
        println!("Set 3 done - how many clean reps? (target {})", target_reps);
        println!("  'r' + Enter switches to an easier variant");
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err(Error::Other(
                "Input closed - use --reps for a non-interactive session.".into(),
            ));
        }
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("r") {
            return Ok(Set3Input::Regress);
        }
        match trimmed.parse::<u32>() {
            Ok(reps) => return Ok(Set3Input::Reps(reps)),
            Err(_) => println!("Enter a whole number of reps, or 'r'."),
        }
    }
}

fn prompt_baseline(exercise_name: &str) -> Result<f64> {
    loop {
        println!("Baseline for {} in kg (Enter for 0):", exercise_name);
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err(Error::Other(
                "Input closed - use --reps for a non-interactive session.".into(),
            ));
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(0.0);
        }
        match trimmed.parse::<f64>() {
            Ok(kg) if kg.is_finite() && kg >= 0.0 => return Ok(kg),
            _ => println!("Enter a number of kg."),
        }
    }
}

fn print_selection(catalog: &Catalog, guarded: bool, last_pain: Option<&PainEntry>) {
    let (templates, exercises) = if guarded {
        print_protection_banner(last_pain);
        (catalog.rehab_templates(), catalog.low_risk_exercises())
    } else {
        (catalog.list_templates(), catalog.list_exercises())
    };

    println!("  Templates (runcoach session --template <id>):");
    for template in &templates {
        let marker = if template.tags.iter().any(|t| t == "rehab") {
            "  [recommended]"
        } else {
            ""
        };
        println!("    {:<16} {}{}", template.id, template.name, marker);
        println!("      {}", template.description);
    }
    println!("\n  Single exercises (runcoach session --exercise <id>):");
    for entry in &exercises {
        println!("    {:<22} {}", entry.id, entry.name);
    }
}

fn print_protection_banner(last_pain: Option<&PainEntry>) {
    let state = last_pain.map(|p| p.state.label()).unwrap_or("ORANGE");
    let zone = last_pain
        .map(|p| p.body_part.as_str())
        .filter(|z| !z.is_empty())
        .unwrap_or("a sensitive area");
    println!("  Protection mode ({})", state);
    println!(
        "  Pain reported around {} - high-impact work is hidden for now.",
        zone
    );
    println!();
}

fn print_header(title: &str) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", title);
    println!("╰─────────────────────────────────────────╯");
    println!();
}

fn coach_line(state: Option<TrafficLight>) -> &'static str {
    match state {
        None => {
            "You're just getting started. Log a pain check after your sessions - your future self will thank you."
        }
        Some(TrafficLight::Red) => {
            "Red signal - today's goal is to last. Regress or rest, then come back clean."
        }
        Some(TrafficLight::Orange) => {
            "Orange signal - smart maintenance. Progressing is also knowing how to wait 24h."
        }
        Some(TrafficLight::Green) => {
            "Green signal - clear to train, but technique is still the law."
        }
    }
}

fn baseline_peek(profile: &Profile) -> Option<(String, f64)> {
    let mut exercise_ids: Vec<&String> = profile.apre_baselines.keys().collect();
    exercise_ids.sort();
    let exercise_id = exercise_ids.first()?;
    let by_protocol = profile.apre_baselines.get(*exercise_id)?;
    for protocol_id in ["APRE6", "APRE10", "APRE3"] {
        if let Some(kg) = by_protocol.get(protocol_id) {
            return Some(((*exercise_id).clone(), *kg));
        }
    }
    None
}

fn parse_training_age(value: &str) -> Result<TrainingAge> {
    match value.to_lowercase().as_str() {
        "novice" | "beginner" => Ok(TrainingAge::Novice),
        "intermediate" => Ok(TrainingAge::Intermediate),
        "advanced" => Ok(TrainingAge::Advanced),
        other => Err(Error::Other(format!(
            "Unknown training age '{}'. Use novice, intermediate or advanced.",
            other
        ))),
    }
}

fn parse_equipment(list: &str) -> Equipment {
    let mut equipment = Equipment::default();
    for item in list.split(',') {
        match item.trim().to_lowercase().as_str() {
            "" => {}
            "dumbbells" | "dumbbell" => equipment.dumbbells = true,
            "barbell" => equipment.barbell = true,
            "bands" | "band" => equipment.bands = true,
            other => eprintln!("Ignoring unknown equipment '{}'", other),
        }
    }
    equipment
}

fn equipment_summary(equipment: &Equipment) -> String {
    let mut items = Vec::new();
    if equipment.dumbbells {
        items.push("dumbbells");
    }
    if equipment.barbell {
        items.push("barbell");
    }
    if equipment.bands {
        items.push("bands");
    }
    if items.is_empty() {
        "bodyweight only".to_string()
    } else {
        items.join(", ")
    }
}

fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

fn fmt_score(score: Option<f64>) -> String {
    match score {
        Some(value) => format!("{}/10", fmt_num(value)),
        None => "-".to_string(),
    }
}

fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
