//! Append-only JSONL journals with file locking.
//!
//! Each journal is one JSON Lines file. Writers take an exclusive lock per
//! append, readers a shared lock, so concurrent invocations stay safe.
//! Unparseable lines are skipped with a warning instead of poisoning the
//! whole journal.

use crate::types::{MinimalistEntry, PainEntry, WorkoutEntry};
use crate::Result;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A record that can live in a journal: it must carry its own timestamp
/// so reads can be ordered most-recent-first.
pub trait Stamped {
    fn ts(&self) -> DateTime<Utc>;
}

impl Stamped for WorkoutEntry {
    fn ts(&self) -> DateTime<Utc> {
        self.ts
    }
}

impl Stamped for PainEntry {
    fn ts(&self) -> DateTime<Utc> {
        self.ts
    }
}

impl Stamped for MinimalistEntry {
    fn ts(&self) -> DateTime<Utc> {
        self.ts
    }
}

/// One append-only JSONL file holding entries of a single type
pub struct Journal<T> {
    path: PathBuf,
    _entry: PhantomData<T>,
}

impl<T> Journal<T>
where
    T: Serialize + DeserializeOwned + Stamped,
{
    /// Create a journal handle for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _entry: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append one entry as a JSON line, under an exclusive lock
    pub fn append(&self, entry: &T) -> Result<()> {
        self.ensure_parent_dir()?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        // A writer that died mid-line leaves no trailing newline; start a
        // fresh line so this entry stays parseable on its own.
        let len = file.metadata()?.len();
        let needs_newline = if len > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            last[0] != b'\n'
        } else {
            false
        };

        let mut writer = std::io::BufWriter::new(&file);
        if needs_newline {
            writer.write_all(b"\n")?;
        }
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended entry to {:?}", self.path);
        Ok(())
    }

    /// Read every parseable entry, in file order
    ///
    /// A missing journal reads as empty. Corrupt lines are logged and
    /// skipped.
    pub fn read_all(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let reader = BufReader::new(&file);
        let mut entries = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<T>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(
                        "Skipping unparseable entry at {:?} line {}: {}",
                        self.path,
                        line_num + 1,
                        e
                    );
                }
            }
        }

        file.unlock()?;
        tracing::debug!("Read {} entries from {:?}", entries.len(), self.path);
        Ok(entries)
    }

    /// The most recent `limit` entries, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<T>> {
        let mut entries = self.read_all()?;
        entries.sort_by(|a, b| b.ts().cmp(&a.ts()));
        entries.truncate(limit);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde::Deserialize;

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    struct TestEntry {
        ts: DateTime<Utc>,
        label: String,
    }

    impl Stamped for TestEntry {
        fn ts(&self) -> DateTime<Utc> {
            self.ts
        }
    }

    fn entry(days_ago: i64, label: &str) -> TestEntry {
        TestEntry {
            ts: Utc::now() - Duration::days(days_ago),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_append_and_read_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(temp_dir.path().join("test.jsonl"));

        journal.append(&entry(0, "first")).unwrap();
        journal.append(&entry(0, "second")).unwrap();

        let entries = journal.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "first");
        assert_eq!(entries[1].label, "second");
    }

    #[test]
    fn test_missing_journal_reads_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal: Journal<TestEntry> = Journal::new(temp_dir.path().join("absent.jsonl"));
        assert!(journal.read_all().unwrap().is_empty());
        assert!(journal.recent(10).unwrap().is_empty());
    }

    #[test]
    fn test_append_creates_parent_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(temp_dir.path().join("deep/nested/test.jsonl"));
        journal.append(&entry(0, "hello")).unwrap();
        assert_eq!(journal.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(temp_dir.path().join("test.jsonl"));

        // Append in shuffled chronological order
        journal.append(&entry(5, "old")).unwrap();
        journal.append(&entry(0, "newest")).unwrap();
        journal.append(&entry(2, "middle")).unwrap();
        journal.append(&entry(9, "oldest")).unwrap();

        let recent = journal.recent(3).unwrap();
        let labels: Vec<&str> = recent.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["newest", "middle", "old"]);
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("test.jsonl");
        let journal = Journal::new(&path);

        journal.append(&entry(1, "good")).unwrap();
        // Sneak garbage and a blank line into the file
        {
            use std::io::Write as _;
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{ not json at all").unwrap();
            writeln!(file).unwrap();
        }
        journal.append(&entry(0, "also good")).unwrap();

        let entries = journal.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "good");
        assert_eq!(entries[1].label, "also good");
    }

    #[test]
    fn test_append_after_truncated_line_still_works() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("test.jsonl");
        let journal = Journal::new(&path);

        // A write that died mid-line leaves no trailing newline
        std::fs::write(&path, "{\"ts\":\"2026-01-01T00:0").unwrap();
        journal.append(&entry(0, "after crash")).unwrap();

        let entries = journal.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "after crash");
    }
}
