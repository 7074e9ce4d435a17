//! Identifier tracking against the master workbook.
//!
//! Before a run writes anything, the tracker derives the highest sequence
//! number already persisted per table. Anything that prevents reading the
//! master degrades to 0 with a log line; a genuinely corrupt master will
//! surface fatally at write time instead.

use std::path::{Path, PathBuf};

use crate::sheet::{SheetStore, Workbook};

pub struct MasterTracker<'a> {
    store: &'a dyn SheetStore,
    master: PathBuf,
    header_row: u32,
}

impl<'a> MasterTracker<'a> {
    pub fn new(store: &'a dyn SheetStore, master: &Path, header_row: u32) -> Self {
        Self { store, master: master.to_path_buf(), header_row }
    }

    /// Highest numeric value in the sequence column of `sheet_name`, or 0
    /// when the master, the sheet or any numeric values are absent.
    pub fn last_sequence(&self, sheet_name: &str) -> u64 {
        if !self.store.exists(&self.master) {
            tracing::info!(sheet = sheet_name, "master workbook does not exist, last NUM = 0");
            return 0;
        }

        let book = match self.store.open(&self.master) {
            Ok(book) => book,
            Err(err) => {
                tracing::warn!(
                    master = %self.master.display(),
                    error = %err,
                    "could not open master to read last NUM, assuming 0"
                );
                return 0;
            }
        };

        let last = max_sequence(&*book, sheet_name, self.header_row);
        tracing::info!(sheet = sheet_name, last_num = last, "last NUM in master");
        last
    }
}

/// Scan column 1 from the first data row to the last used row, skipping
/// non-numeric cells.
pub(crate) fn max_sequence(book: &dyn Workbook, sheet_name: &str, header_row: u32) -> u64 {
    let Some(sheet) = book.find_sheet(sheet_name) else {
        tracing::info!(sheet = sheet_name, "sheet not present in master, last NUM = 0");
        return 0;
    };
    let Some(last_row) = book.last_row(&sheet) else {
        return 0;
    };

    let mut max = 0u64;
    for row in (header_row + 1)..=last_row {
        if let Some(value) = book.cell_number(&sheet, row, 1) {
            if value >= 0.0 {
                max = max.max(value.trunc() as u64);
            }
        }
    }
    max
}
