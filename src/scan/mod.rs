//! Report file discovery.
//!
//! Walks the root directory in filesystem enumeration order and keeps the
//! files that look like weekly reports: correct name prefix, a recognized
//! spreadsheet extension, not an editor lock artifact, and readable right
//! now. Anything else is skipped, never an error.

use std::fs::File;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ConsolidateError;

/// Extensions accepted for source report files (lowercase, no dot).
const REPORT_EXTENSIONS: [&str; 3] = ["xlsx", "xlsm", "xls"];

/// Office writes `~$`-prefixed lock files next to open workbooks.
const TEMP_MARKER: &str = "~$";

/// Check a single path against the eligibility rules.
pub fn is_eligible_report(path: &Path, prefix: &str) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if name.starts_with(TEMP_MARKER) {
        tracing::debug!(file = name, "skipping temp/lock artifact");
        return false;
    }

    let has_prefix = name
        .get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false);
    if !has_prefix {
        tracing::debug!(file = name, prefix, "skipping file without report prefix");
        return false;
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !REPORT_EXTENSIONS.contains(&ext.as_str()) {
        tracing::debug!(file = name, extension = %ext, "skipping unrecognized extension");
        return false;
    }

    // The file must be openable for shared reading at check time; a locked
    // or vanished file is ineligible, not an error.
    match File::open(path) {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(file = name, error = %err, "cannot open file, skipping");
            false
        }
    }
}

/// Recursive scanner returning eligible report paths in enumeration order.
pub struct DirectoryScanner {
    root: PathBuf,
    prefix: String,
    include_subdirectories: bool,
}

impl DirectoryScanner {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self { root: root.into(), prefix: prefix.into(), include_subdirectories: true }
    }

    /// Set whether to descend into subdirectories (default true).
    pub fn include_subdirectories(mut self, include: bool) -> Self {
        self.include_subdirectories = include;
        self
    }

    /// Enumerate eligible files. No additional sorting is applied: the
    /// result keeps the filesystem enumeration order, which is also the
    /// order consolidation processes files in.
    pub fn scan(&self) -> Result<Vec<PathBuf>, ConsolidateError> {
        if !self.root.is_dir() {
            return Err(ConsolidateError::RootNotFound(self.root.clone()));
        }

        let mut walker = WalkDir::new(&self.root);
        if !self.include_subdirectories {
            walker = walker.max_depth(1);
        }

        let mut eligible = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if is_eligible_report(entry.path(), &self.prefix) {
                tracing::debug!(file = %entry.path().display(), "eligible report file");
                eligible.push(entry.into_path());
            }
        }

        tracing::info!(count = eligible.len(), root = %self.root.display(), "scan finished");
        Ok(eligible)
    }
}
