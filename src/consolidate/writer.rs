//! Append-only writer for the master workbook.
//!
//! Existing rows are never rewritten or shifted; new rows land strictly
//! below the current last used row. The save itself is atomic (temporary
//! file plus rename inside the backend), so a failed write leaves the
//! master exactly as it was and the identifier tracker re-reads the
//! pre-run maxima.

use std::path::Path;

use crate::config::Settings;
use crate::domain::{FieldValue, TableBatch, TableKind, ConsolidationBatch, SEQUENCE_HEADER};
use crate::error::ConsolidateError;
use crate::sheet::{SheetStore, Workbook};

pub struct MasterWriter<'a> {
    store: &'a dyn SheetStore,
    settings: &'a Settings,
}

impl<'a> MasterWriter<'a> {
    pub fn new(store: &'a dyn SheetStore, settings: &'a Settings) -> Self {
        Self { store, settings }
    }

    /// Append the whole batch and save. Any failure here is a fatal
    /// `MasterWrite`.
    pub fn append_batch(
        &self,
        master: &Path,
        batch: &ConsolidationBatch,
    ) -> Result<(), ConsolidateError> {
        let master_err = |source| ConsolidateError::MasterWrite {
            path: master.to_path_buf(),
            source,
        };

        let mut book = if self.store.exists(master) {
            tracing::info!(master = %master.display(), "opening master workbook (append mode)");
            self.store.open(master).map_err(master_err)?
        } else {
            tracing::info!(master = %master.display(), "creating new master workbook");
            self.store.create()
        };

        for (kind, table) in batch.tables.iter() {
            self.append_table(&mut *book, kind, table);
        }

        book.save(master).map_err(master_err)?;
        tracing::info!(master = %master.display(), "master workbook saved");
        Ok(())
    }

    fn append_table(&self, book: &mut dyn Workbook, kind: TableKind, table: &TableBatch) {
        let sheet_name = self.settings.sheet_name(kind);
        let header_row = self.settings.tables.header_row;

        let sheet = match book.find_sheet(sheet_name) {
            Some(existing) => existing,
            None => {
                book.add_sheet(sheet_name);
                self.write_headers(book, sheet_name, kind);
                sheet_name.to_string()
            }
        };

        if table.rows.is_empty() {
            tracing::warn!(sheet = %sheet, "no rows to write");
            return;
        }

        let last_used = book.last_row(&sheet).unwrap_or(header_row).max(header_row);
        let first_target = last_used + 1;
        tracing::debug!(
            sheet = %sheet,
            rows = table.rows.len(),
            from_row = first_target,
            "appending rows"
        );

        for (offset, row) in table.rows.iter().enumerate() {
            let target = first_target + offset as u32;
            book.set_number(&sheet, target, 1, row.seq as f64);
            for (idx, field) in row.fields.iter().enumerate() {
                if field.is_empty() {
                    continue;
                }
                let col = idx as u32 + 2;
                match field {
                    FieldValue::Text(s) => book.set_text(&sheet, target, col, s),
                    FieldValue::Date(d) => book.set_date(&sheet, target, col, *d),
                    FieldValue::Empty => {}
                }
            }
        }

        tracing::info!(sheet = %sheet, rows = table.rows.len(), "rows written");
    }

    fn write_headers(&self, book: &mut dyn Workbook, sheet: &str, kind: TableKind) {
        let header_row = self.settings.tables.header_row;
        book.set_text(sheet, header_row, 1, SEQUENCE_HEADER);
        for (idx, column) in kind.schema().iter().enumerate() {
            book.set_text(sheet, header_row, idx as u32 + 2, column.header);
        }
    }
}
