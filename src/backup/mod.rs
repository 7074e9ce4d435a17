//! Snapshots of the master and source workbooks before destructive steps.
//!
//! Backups are plain file copies: the master gets a timestamped sibling in
//! the backup directory, source files go into one per-run subdirectory.
//! Pruning removes old backup files by creation time but never removes
//! directories.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Local};

use crate::error::ConsolidateError;

pub struct BackupManager {
    backup_dir: PathBuf,
}

impl BackupManager {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self { backup_dir: backup_dir.into() }
    }

    /// Timestamp used to name this run's backup artifacts.
    pub fn run_stamp() -> String {
        Local::now().format("%Y%m%d_%H%M%S").to_string()
    }

    /// Copy the master workbook into the backup directory as
    /// `maestro_backup_<stamp>.xlsx` and return the new path.
    pub fn snapshot_master(&self, master: &Path, stamp: &str) -> Result<PathBuf, ConsolidateError> {
        let target = self.backup_dir.join(format!("maestro_backup_{stamp}.xlsx"));
        self.copy_into(master, &target)?;
        tracing::info!(backup = %target.display(), "master backup created");
        Ok(target)
    }

    /// Copy one source file into this run's `origenes_<stamp>` subdirectory.
    pub fn snapshot_source(&self, source: &Path, stamp: &str) -> Result<PathBuf, ConsolidateError> {
        let file_name = source.file_name().ok_or_else(|| ConsolidateError::BackupCopy {
            path: source.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        })?;
        let target = self.backup_dir.join(format!("origenes_{stamp}")).join(file_name);
        self.copy_into(source, &target)?;
        tracing::debug!(backup = %target.display(), "source backup created");
        Ok(target)
    }

    fn copy_into(&self, source: &Path, target: &Path) -> Result<(), ConsolidateError> {
        let copy = || -> std::io::Result<()> {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(source, target)?;
            Ok(())
        };
        copy().map_err(|source_err| ConsolidateError::BackupCopy {
            path: source.to_path_buf(),
            source: source_err,
        })
    }

    /// Delete backup files older than `days`. A missing backup directory is
    /// a silent no-op. Returns the number of files removed.
    pub fn prune_older_than(&self, days: i64) -> Result<usize, ConsolidateError> {
        if !self.backup_dir.is_dir() {
            return Ok(0);
        }

        let cutoff = Local::now() - Duration::days(days);
        let mut removed = 0usize;
        for entry in std::fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let metadata = entry.metadata()?;
            // Creation time is not available on every filesystem; fall back
            // to the modification time.
            let stamp = metadata.created().or_else(|_| metadata.modified());
            let Ok(stamp) = stamp else {
                continue;
            };
            let stamp: DateTime<Local> = stamp.into();
            if stamp < cutoff {
                std::fs::remove_file(entry.path())?;
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(count = removed, "old backups pruned");
        }
        Ok(removed)
    }
}
