//! Reading one source workbook into a `SourceDocument`.

use std::path::Path;

use crate::config::Settings;
use crate::domain::{ColumnKind, FieldValue, Row, SourceDocument, TableKind, TableMap};
use crate::error::ConsolidateError;
use crate::sheet::{SheetStore, Workbook};

pub struct SourceReader<'a> {
    store: &'a dyn SheetStore,
    settings: &'a Settings,
}

impl<'a> SourceReader<'a> {
    pub fn new(store: &'a dyn SheetStore, settings: &'a Settings) -> Self {
        Self { store, settings }
    }

    /// Read all three tables from one report file. A missing sheet
    /// contributes an empty table; a file that cannot be opened is a
    /// `FileRead` error for the caller to record.
    pub fn read(&self, path: &Path) -> Result<SourceDocument, ConsolidateError> {
        tracing::info!(file = %display_name(path), "reading source file");

        let book = self
            .store
            .open(path)
            .map_err(|source| ConsolidateError::FileRead { path: path.to_path_buf(), source })?;

        let tables = TableMap::from_fn(|kind| {
            let rows = self.read_table(&*book, kind);
            tracing::debug!(
                table = kind.label(),
                rows = rows.len(),
                "rows read"
            );
            rows
        });

        Ok(SourceDocument { path: path.to_path_buf(), tables })
    }

    fn read_table(&self, book: &dyn Workbook, kind: TableKind) -> Vec<Row> {
        let sheet_name = self.settings.sheet_name(kind);
        let Some(sheet) = book.find_sheet(sheet_name) else {
            tracing::warn!(sheet = sheet_name, "sheet not found, skipping table");
            return Vec::new();
        };

        // The formula row doubles as the first data row, so reading starts
        // right after the headers.
        let first_row = self.settings.tables.header_row + 1;
        let Some(last_row) = book.last_row(&sheet) else {
            return Vec::new();
        };

        let schema = kind.schema();
        let mut rows = Vec::new();
        for row in first_row..=last_row {
            if book.row_is_empty(&sheet, row) {
                continue;
            }

            let fields = schema
                .iter()
                .enumerate()
                .map(|(idx, column)| {
                    // NUM occupies column 1 and is ignored here; it will be
                    // renumbered during allocation.
                    let col = idx as u32 + 2;
                    match column.kind {
                        ColumnKind::Date => book
                            .cell_date(&sheet, row, col)
                            .map(FieldValue::Date)
                            .unwrap_or(FieldValue::Empty),
                        ColumnKind::Text => book
                            .cell_text(&sheet, row, col)
                            .filter(|s| !s.is_empty())
                            .map(FieldValue::Text)
                            .unwrap_or(FieldValue::Empty),
                    }
                })
                .collect();

            rows.push(Row::new(fields));
        }

        rows
    }
}

fn display_name(path: &Path) -> std::borrow::Cow<'_, str> {
    path.file_name().map(|n| n.to_string_lossy()).unwrap_or_else(|| path.to_string_lossy())
}
