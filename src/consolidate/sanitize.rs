//! Formula-preserving destructive cleanup of source files.
//!
//! Deleting a bulk row range is the one operation here that is allowed to
//! be destructive, and the one we refuse to trust blindly: the formula row
//! is snapshotted before the deletion and re-checked afterwards, so the
//! deletion's correctness is proven against an independent copy instead of
//! assumed. A lost formula aborts the file before it can be reported clean.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::Settings;
use crate::domain::TABLE_KINDS;
use crate::error::ConsolidateError;
use crate::sheet::{SheetStore, Workbook};

/// Column position -> formula text, captured from the formula row before
/// any mutation.
pub type FormulaSnapshot = BTreeMap<u32, String>;

pub struct SourceSanitizer<'a> {
    store: &'a dyn SheetStore,
    settings: &'a Settings,
}

impl<'a> SourceSanitizer<'a> {
    pub fn new(store: &'a dyn SheetStore, settings: &'a Settings) -> Self {
        Self { store, settings }
    }

    /// Clear all data rows from the file's three tables, preserving each
    /// sheet's formula row. The file is only saved after every sheet
    /// verified clean; a `FormulaLost` error means the file must not be
    /// treated as cleaned and the pre-clean backup is the recovery path.
    pub fn sanitize_file(&self, path: &Path) -> Result<(), ConsolidateError> {
        tracing::info!(file = %path.display(), "sanitizing source file");

        let mut book = self
            .store
            .open(path)
            .map_err(|source| ConsolidateError::FileRead { path: path.to_path_buf(), source })?;

        for kind in TABLE_KINDS {
            let sheet_name = self.settings.sheet_name(kind);
            let Some(sheet) = book.find_sheet(sheet_name) else {
                tracing::warn!(sheet = sheet_name, "sheet not found, skipping cleanup");
                continue;
            };
            sanitize_sheet(
                &mut *book,
                &sheet,
                self.settings.tables.formula_row,
                self.settings.tables.first_deletable_row,
            )?;
        }

        book.save(path)?;
        tracing::info!(file = %path.display(), "source file cleaned");
        Ok(())
    }

    /// True when every table holds nothing beyond its formula row, i.e. a
    /// previous cleanup completed.
    pub fn verify_clean(&self, path: &Path) -> bool {
        let Ok(book) = self.store.open(path) else {
            return false;
        };
        TABLE_KINDS.iter().all(|&kind| {
            match book.find_sheet(self.settings.sheet_name(kind)) {
                Some(sheet) => match book.last_row(&sheet) {
                    Some(last) => last <= self.settings.tables.formula_row,
                    None => true,
                },
                None => true,
            }
        })
    }
}

/// Sanitize a single sheet: snapshot, delete, verify.
pub(crate) fn sanitize_sheet(
    book: &mut dyn Workbook,
    sheet: &str,
    formula_row: u32,
    first_deletable: u32,
) -> Result<(), ConsolidateError> {
    let Some(last_row) = book.last_row(sheet) else {
        return Ok(());
    };
    if last_row <= formula_row {
        tracing::info!(sheet, "nothing to delete beyond the formula row");
        return Ok(());
    }

    // Snapshot before any mutation. An empty snapshot just means the row
    // has no formulas to protect.
    let snapshot = capture_formulas(book, sheet, formula_row);
    if !snapshot.is_empty() {
        tracing::debug!(
            sheet,
            formulas = snapshot.len(),
            row = formula_row,
            "formula snapshot captured"
        );
    }

    book.delete_rows(sheet, first_deletable, last_row);
    tracing::info!(
        sheet,
        preserved_row = formula_row,
        deleted_first = first_deletable,
        deleted_last = last_row,
        "data rows deleted"
    );

    verify_formulas(book, sheet, formula_row, &snapshot)
}

fn capture_formulas(book: &dyn Workbook, sheet: &str, row: u32) -> FormulaSnapshot {
    let mut snapshot = FormulaSnapshot::new();
    let last_col = book.last_column(sheet).unwrap_or(0);
    for col in 1..=last_col {
        if book.has_formula(sheet, row, col) {
            snapshot.insert(col, book.formula_text(sheet, row, col).unwrap_or_default());
        }
    }
    snapshot
}

/// Compare the formula row against the snapshot. A column that is no longer
/// formula-bearing is fatal; changed formula text is only a warning.
fn verify_formulas(
    book: &dyn Workbook,
    sheet: &str,
    row: u32,
    snapshot: &FormulaSnapshot,
) -> Result<(), ConsolidateError> {
    let mut lost = Vec::new();
    for (&col, original) in snapshot {
        if !book.has_formula(sheet, row, col) {
            tracing::error!(sheet, col, original = %original, "formula lost during cleanup");
            lost.push(col);
            continue;
        }
        let current = book.formula_text(sheet, row, col).unwrap_or_default();
        if current != *original {
            tracing::warn!(sheet, col, from = %original, to = %current, "formula text changed");
        }
    }

    if lost.is_empty() {
        Ok(())
    } else {
        Err(ConsolidateError::FormulaLost { sheet: sheet.to_string(), row, columns: lost })
    }
}
