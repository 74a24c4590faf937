//! File-based progress store: one human-readable JSON file.
//! Writes go to a sibling temp file that is fsynced and renamed over the
//! target, then the directory is fsynced, so a crash never leaves a
//! truncated state file behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use dailysend_core::error::{DailySendError, Result};

use crate::progress::Progress;

/// Durable home of the [`Progress`] record.
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Load progress. Missing, unreadable or corrupt state yields the zero value.
    pub fn load(&self) -> Progress {
        match self.try_load() {
            Ok(progress) => progress,
            Err(e) => {
                tracing::warn!("⚠️ Failed to load {}: {e}", self.path.display());
                Progress::default()
            }
        }
    }

    /// Load progress, refusing to treat a damaged existing file as a fresh start.
    pub fn try_load(&self) -> Result<Progress> {
        if !self.path.exists() {
            return Ok(Progress::default());
        }
        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            DailySendError::Persistence(format!("read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&json).map_err(|e| {
            DailySendError::Persistence(format!("parse {}: {e}", self.path.display()))
        })
    }

    /// Atomically replace the state file.
    pub fn save(&self, progress: &Progress) -> Result<()> {
        self.write_atomic(progress).map_err(|e| {
            DailySendError::Persistence(format!("write {}: {e}", self.path.display()))
        })?;
        tracing::debug!(
            "💾 Saved progress (index={}, sent={}, failed={}) to {}",
            progress.index,
            progress.total_sent,
            progress.total_failed,
            self.path.display()
        );
        Ok(())
    }

    fn write_atomic(&self, progress: &Progress) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(progress)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let tmp_name = format!(
            ".{}.tmp-{}",
            self.path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("progress"),
            std::process::id()
        );
        let tmp_path = dir.join(tmp_name);

        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = std::fs::rename(&tmp_path, &self.path) {
            std::fs::remove_file(&tmp_path).ok();
            return Err(e);
        }
        sync_dir(&dir);
        Ok(())
    }
}

/// Best-effort fsync of a directory so a completed rename survives power loss.
/// Platforms that cannot open directories report `false`.
fn sync_dir(dir: &Path) -> bool {
    match std::fs::File::open(dir).and_then(|d| d.sync_all()) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("Directory fsync skipped for {}: {e}", dir.display());
            false
        }
    }
}

/// Run-once-per-day guard: true iff `progress` was not stamped with `today`.
pub fn should_run_today(progress: &Progress, today: NaiveDate) -> bool {
    progress.should_run_today(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Progress {
        let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        Progress {
            index: 120,
            total_sent: 110,
            total_failed: 10,
            last_run_date: Some(day),
            last_updated: day.and_hms_opt(18, 30, 0),
        }
    }

    #[test]
    fn test_missing_file_is_zero_progress() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(&dir.path().join("progress.json"));
        assert_eq!(store.load(), Progress::default());
        assert_eq!(store.try_load().unwrap(), Progress::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(&dir.path().join("state").join("progress.json"));
        let progress = sample();
        store.save(&progress).unwrap();
        assert_eq!(store.load(), progress);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("state"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_parent_directory_is_synced() {
        let dir = tempfile::tempdir().unwrap();
        assert!(sync_dir(dir.path()));
        assert!(!sync_dir(&dir.path().join("missing")));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        std::fs::write(&path, "{\"index\": 4").unwrap();
        let store = ProgressStore::new(&path);

        assert_eq!(store.load(), Progress::default());
        assert!(matches!(store.try_load(), Err(DailySendError::Persistence(_))));
    }

    #[test]
    fn test_save_failure_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        // The target path is an existing directory, so the rename cannot succeed.
        let path = dir.path().join("progress.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();
        let store = ProgressStore::new(&path);

        assert!(matches!(
            store.save(&sample()),
            Err(DailySendError::Persistence(_))
        ));
    }

    #[test]
    fn test_guard_helper() {
        let progress = sample();
        let same_day = progress.last_run_date.unwrap();
        assert!(!should_run_today(&progress, same_day));
        assert!(should_run_today(&progress, same_day.succ_opt().unwrap()));
    }
}
