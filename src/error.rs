//! Typed errors for the consolidation core.
//!
//! Callers branch on the kind: `RootNotFound` and `MasterWrite` abort a run,
//! `FileRead`, `FormulaLost` and `BackupCopy` are isolated per file.

use std::path::PathBuf;
use thiserror::Error;

use crate::sheet::SheetError;

#[derive(Debug, Error)]
pub enum ConsolidateError {
    /// The configured root directory does not exist. Fatal; nothing has been
    /// touched when this is raised.
    #[error("root directory does not exist: {0}")]
    RootNotFound(PathBuf),

    /// A single source file could not be read. Recorded per file; the run
    /// continues with the remaining files.
    #[error("failed reading {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: SheetError,
    },

    /// The master workbook could not be written. Fatal: the save is atomic,
    /// so the master on disk still reflects the pre-run state.
    #[error("failed writing master workbook {path}: {source}")]
    MasterWrite {
        path: PathBuf,
        #[source]
        source: SheetError,
    },

    /// A formula-bearing cell in the preserved row lost its formula during
    /// row deletion. Fatal for the affected file, which must not be treated
    /// as cleaned; the run continues with the remaining files.
    #[error("formulas lost in sheet '{sheet}' row {row}, columns {columns:?}")]
    FormulaLost {
        sheet: String,
        row: u32,
        columns: Vec<u32>,
    },

    /// A backup copy failed. Does not block consolidation, but blocks
    /// cleanup of the affected file when backups are enabled.
    #[error("backup copy failed for {path}: {source}")]
    BackupCopy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
