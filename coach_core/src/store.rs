//! Local persistence: the profile and settings documents plus the three
//! append-only journals.
//!
//! Documents are single JSON files replaced atomically (temp file in the
//! same directory, fsync, rename). Journals are JSONL files, one entry per
//! line. A corrupt document is reported as absent rather than as an error:
//! losing a profile to a bad byte must never take the journals with it.

use crate::journal::Journal;
use crate::types::{
    MinimalistDraft, MinimalistEntry, PainDraft, PainEntry, Profile, WorkoutDraft, WorkoutEntry,
};
use crate::{Error, Result};
use chrono::Utc;
use fs2::FileExt;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

const PROFILE_FILE: &str = "profile.json";
const SETTINGS_FILE: &str = "settings.json";
const JOURNAL_DIR: &str = "journal";
const WORKOUTS_FILE: &str = "workouts.jsonl";
const PAIN_FILE: &str = "pain.jsonl";
const MINIMALIST_FILE: &str = "minimalist.jsonl";

/// Handle to one data directory
pub struct Store {
    root: PathBuf,
    workouts: Journal<WorkoutEntry>,
    pain: Journal<PainEntry>,
    minimalist: Journal<MinimalistEntry>,
}

impl Store {
    /// Open (and create if needed) the data directory layout under `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let journal_dir = root.join(JOURNAL_DIR);
        std::fs::create_dir_all(&journal_dir)?;

        Ok(Self {
            workouts: Journal::new(journal_dir.join(WORKOUTS_FILE)),
            pain: Journal::new(journal_dir.join(PAIN_FILE)),
            minimalist: Journal::new(journal_dir.join(MINIMALIST_FILE)),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn profile_path(&self) -> PathBuf {
        self.root.join(PROFILE_FILE)
    }

    fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    // ========================================================================
    // Profile
    // ========================================================================

    /// Load the athlete profile.
    ///
    /// Returns `None` when no profile exists yet or when the document is
    /// unreadable (logged as a warning).
    pub fn get_profile(&self) -> Result<Option<Profile>> {
        read_document(&self.profile_path())
    }

    /// Persist the profile atomically, stamping `updated_at`.
    ///
    /// Returns the profile exactly as stored, so callers see the stamp.
    pub fn save_profile(&self, profile: &Profile) -> Result<Profile> {
        let mut stored = profile.clone();
        stored.updated_at = Utc::now();
        write_document(&self.profile_path(), &stored)?;
        tracing::debug!("Saved profile for '{}'", stored.name);
        Ok(stored)
    }

    // ========================================================================
    // Journals
    // ========================================================================

    /// Append a workout entry, stamping id and timestamp
    pub fn add_workout(&self, draft: WorkoutDraft) -> Result<WorkoutEntry> {
        let entry = draft.stamp(Uuid::new_v4(), Utc::now());
        self.workouts.append(&entry)?;
        Ok(entry)
    }

    /// The most recent workout entries, newest first
    pub fn workouts(&self, limit: usize) -> Result<Vec<WorkoutEntry>> {
        self.workouts.recent(limit)
    }

    /// Append a pain check-in, stamping id and timestamp
    pub fn add_pain_log(&self, draft: PainDraft) -> Result<PainEntry> {
        let entry = draft.stamp(Uuid::new_v4(), Utc::now());
        self.pain.append(&entry)?;
        Ok(entry)
    }

    /// The most recent pain check-ins, newest first
    pub fn pain_logs(&self, limit: usize) -> Result<Vec<PainEntry>> {
        self.pain.recent(limit)
    }

    /// Append a minimalist run log, stamping id and timestamp
    pub fn add_minimalist_log(&self, draft: MinimalistDraft) -> Result<MinimalistEntry> {
        let entry = draft.stamp(Uuid::new_v4(), Utc::now());
        self.minimalist.append(&entry)?;
        Ok(entry)
    }

    /// The most recent minimalist run logs, newest first
    pub fn minimalist_logs(&self, limit: usize) -> Result<Vec<MinimalistEntry>> {
        self.minimalist.recent(limit)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Read one opaque setting value
    pub fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let settings: Option<HashMap<String, serde_json::Value>> =
            read_document(&self.settings_path())?;
        Ok(settings.and_then(|mut map| map.remove(key)))
    }

    /// Write one opaque setting value, preserving the others
    pub fn set_setting(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut settings: HashMap<String, serde_json::Value> =
            read_document(&self.settings_path())?.unwrap_or_default();
        settings.insert(key.to_string(), value);
        write_document(&self.settings_path(), &settings)
    }

    // ========================================================================
    // Reset
    // ========================================================================

    /// Delete the profile, the settings and all three journals.
    ///
    /// Missing files are fine; everything else is an error.
    pub fn reset_all(&self) -> Result<()> {
        remove_if_exists(&self.profile_path())?;
        remove_if_exists(&self.settings_path())?;
        remove_if_exists(self.workouts.path())?;
        remove_if_exists(self.pain.path())?;
        remove_if_exists(self.minimalist.path())?;
        tracing::info!("All local data removed from {:?}", self.root);
        Ok(())
    }
}

/// Load a JSON document with shared locking.
///
/// Missing, unreadable and unparseable documents all read as `None`; the
/// two failure cases log a warning first.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open document {:?}: {}. Treating as absent.", path, e);
            return Ok(None);
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock document {:?}: {}. Treating as absent.", path, e);
        return Ok(None);
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read document {:?}: {}. Treating as absent.", path, e);
        return Ok(None);
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("Failed to parse document {:?}: {}. Treating as absent.", path, e);
            Ok(None)
        }
    }
}

/// Atomically replace a JSON document:
/// 1. Write to a temp file in the same directory
/// 2. Sync to disk
/// 3. Rename over the original
fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::Store(format!("document path {:?} has no parent directory", path))
    })?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;

    // Exclusive lock on the temp file serializes concurrent writers
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Stage, TrafficLight};
    use chrono::Duration;

    fn open_store() -> (tempfile::TempDir, Store) {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Store::open(temp_dir.path()).unwrap();
        (temp_dir, store)
    }

    fn workout_draft(exercise_id: &str) -> WorkoutDraft {
        WorkoutDraft {
            kind: "apre".to_string(),
            protocol_id: "APRE6".to_string(),
            exercise_id: exercise_id.to_string(),
            exercise_name: exercise_id.to_string(),
            baseline_start_kg: 40.0,
            reps_set3: 7,
            set4_kg: 40.0,
            baseline_next_kg: 42.5,
        }
    }

    #[test]
    fn test_open_creates_layout() {
        let (temp_dir, _store) = open_store();
        assert!(temp_dir.path().join("journal").is_dir());
    }

    #[test]
    fn test_profile_absent_until_saved() {
        let (_temp_dir, store) = open_store();
        assert!(store.get_profile().unwrap().is_none());
    }

    #[test]
    fn test_profile_roundtrip_restamps_updated_at() {
        let (_temp_dir, store) = open_store();

        let mut profile = Profile::new("Ada");
        profile.updated_at = Utc::now() - Duration::days(30);
        let old_stamp = profile.updated_at;

        let stored = store.save_profile(&profile).unwrap();
        assert!(stored.updated_at > old_stamp);

        let loaded = store.get_profile().unwrap().unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.name, "Ada");
    }

    #[test]
    fn test_corrupt_profile_reads_as_absent() {
        let (_temp_dir, store) = open_store();
        std::fs::write(store.profile_path(), "{ not json").unwrap();
        assert!(store.get_profile().unwrap().is_none());
    }

    #[test]
    fn test_save_profile_leaves_no_temp_files() {
        let (temp_dir, store) = open_store();
        store.save_profile(&Profile::new("Ada")).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .filter(|name| name != "profile.json" && name != "journal")
            .collect();
        assert!(extras.is_empty(), "unexpected files: {:?}", extras);
    }

    #[test]
    fn test_add_workout_stamps_and_persists() {
        let (_temp_dir, store) = open_store();

        let first = store.add_workout(workout_draft("squat_bw")).unwrap();
        let second = store.add_workout(workout_draft("goblet_squat")).unwrap();
        assert_ne!(first.id, second.id);
        assert!(second.ts >= first.ts);

        let recent = store.workouts(10).unwrap();
        assert_eq!(recent.len(), 2);
        // Newest first
        assert_eq!(recent[0].exercise_id, "goblet_squat");
        assert_eq!(recent[1].exercise_id, "squat_bw");
    }

    #[test]
    fn test_workouts_limit() {
        let (_temp_dir, store) = open_store();
        for _ in 0..5 {
            store.add_workout(workout_draft("squat_bw")).unwrap();
        }
        assert_eq!(store.workouts(3).unwrap().len(), 3);
    }

    #[test]
    fn test_pain_and_minimalist_journals() {
        let (_temp_dir, store) = open_store();

        store
            .add_pain_log(PainDraft {
                kind: "manual".to_string(),
                body_part: "knee".to_string(),
                pain_after: Some(2.0),
                pain_morning: None,
                state: TrafficLight::Green,
                note: String::new(),
            })
            .unwrap();
        store
            .add_minimalist_log(MinimalistDraft {
                kind: "run".to_string(),
                stage: Stage::Microdose,
                target_minutes: 3.0,
                minutes_minimalist: 3.0,
                total_run_minutes: Some(40.0),
                pain_morning: Some(0.0),
                pain_state: TrafficLight::Green,
            })
            .unwrap();

        assert_eq!(store.pain_logs(10).unwrap().len(), 1);
        assert_eq!(store.minimalist_logs(10).unwrap().len(), 1);
        assert_eq!(store.pain_logs(10).unwrap()[0].body_part, "knee");
    }

    #[test]
    fn test_settings_roundtrip() {
        let (_temp_dir, store) = open_store();
        assert!(store.get_setting("sound").unwrap().is_none());

        store
            .set_setting("sound", serde_json::json!(true))
            .unwrap();
        store
            .set_setting("theme", serde_json::json!("dark"))
            .unwrap();

        assert_eq!(
            store.get_setting("sound").unwrap(),
            Some(serde_json::json!(true))
        );
        assert_eq!(
            store.get_setting("theme").unwrap(),
            Some(serde_json::json!("dark"))
        );
    }

    #[test]
    fn test_reset_all_wipes_everything() {
        let (_temp_dir, store) = open_store();

        store.save_profile(&Profile::new("Ada")).unwrap();
        store.add_workout(workout_draft("squat_bw")).unwrap();
        store.set_setting("sound", serde_json::json!(true)).unwrap();

        store.reset_all().unwrap();

        assert!(store.get_profile().unwrap().is_none());
        assert!(store.workouts(10).unwrap().is_empty());
        assert!(store.get_setting("sound").unwrap().is_none());

        // Reset of an already-empty store is fine too
        store.reset_all().unwrap();
    }

    #[test]
    fn test_saved_profile_read_back_after_write() {
        // A read issued after save must observe the new value
        let (_temp_dir, store) = open_store();
        let mut profile = Profile::new("Ada");
        store.save_profile(&profile).unwrap();

        profile.set_baseline("goblet_squat", "APRE6", 41.3);
        store.save_profile(&profile).unwrap();

        let loaded = store.get_profile().unwrap().unwrap();
        assert_eq!(loaded.baseline("goblet_squat", "APRE6"), Some(42.5));
    }
}
