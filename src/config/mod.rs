//! Configuration loading and merging
//!
//! Handles loading from config files and CLI arguments with proper
//! precedence (CLI > File > Defaults).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::TableKind;

pub mod loader;
pub mod merge;

pub use loader::load_settings;
pub use merge::{merge_cli_with_settings, CliOverrides};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root directory scanned for report files.
    pub root_dir: Option<PathBuf>,
    /// Master workbook path; resolved against the root when relative.
    pub master_file: PathBuf,
    /// Backup directory; resolved against the root when relative.
    pub backup_dir: PathBuf,
    /// Case-insensitive file name prefix identifying weekly reports.
    pub report_prefix: String,
    pub tables: TableSettings,
    pub options: RunOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_dir: None,
            master_file: PathBuf::from("MAESTRO.xlsx"),
            backup_dir: PathBuf::from("backups"),
            report_prefix: "REPORTE SEMANAL".to_string(),
            tables: TableSettings::default(),
            options: RunOptions::default(),
        }
    }
}

impl Settings {
    pub fn sheet_name(&self, kind: TableKind) -> &str {
        match kind {
            TableKind::Prospects => &self.tables.prospects_sheet,
            TableKind::Planning => &self.tables.planning_sheet,
            TableKind::WeeklyActivity => &self.tables.activity_sheet,
        }
    }

    pub fn master_path(&self, root: &Path) -> PathBuf {
        resolve_against(root, &self.master_file)
    }

    pub fn backup_path(&self, root: &Path) -> PathBuf {
        resolve_against(root, &self.backup_dir)
    }
}

fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Sheet names and fixed row positions shared by every source file and the
/// master workbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub prospects_sheet: String,
    pub planning_sheet: String,
    pub activity_sheet: String,
    /// Row carrying the column headers.
    pub header_row: u32,
    /// Row holding template formulas that sanitizing must preserve. In
    /// source files this is also the first data row.
    pub formula_row: u32,
    /// First row the sanitizer may delete.
    pub first_deletable_row: u32,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            prospects_sheet: "BASE DE DATOS".to_string(),
            planning_sheet: "PLANEACION".to_string(),
            activity_sheet: "REPORTE".to_string(),
            header_row: 5,
            formula_row: 6,
            first_deletable_row: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Snapshot the master before writing and each source before cleaning.
    pub create_backups: bool,
    /// Clear data rows from successfully consolidated source files.
    pub clean_sources: bool,
    /// Accepted and reported, but drives no behavior yet; duplicate
    /// detection rules were never specified.
    pub validate_duplicates: bool,
    pub include_subdirectories: bool,
    /// Backups older than this many days are pruned after a run.
    pub retention_days: i64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            create_backups: true,
            clean_sources: false,
            validate_duplicates: false,
            include_subdirectories: true,
            retention_days: 30,
        }
    }
}
