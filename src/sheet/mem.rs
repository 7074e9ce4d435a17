//! In-memory spreadsheet store for tests.
//!
//! Workbooks "saved" here land in a shared map keyed by path, so multi-step
//! scenarios (write master, re-open master) run without touching disk. The
//! store can also be configured to drop a formula cell during row deletion,
//! which is how the sanitizer's verification failure path is exercised.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use super::model::WorkbookModel;
use super::{SheetError, SheetStore, Workbook};

type FileMap = Arc<Mutex<HashMap<PathBuf, WorkbookModel>>>;

#[derive(Default, Clone)]
pub struct MemStore {
    files: FileMap,
    /// When set, `delete_rows` also erases the formula at (row, col) of the
    /// affected sheet, simulating a backend that corrupts the preserved row.
    pub break_formula_on_delete: Option<(u32, u32)>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, model: WorkbookModel) {
        self.files.lock().unwrap().insert(path.into(), model);
    }

    pub fn get(&self, path: &Path) -> Option<WorkbookModel> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }
}

impl SheetStore for MemStore {
    fn exists(&self, path: &Path) -> bool {
        self.contains(path)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Workbook>, SheetError> {
        let model = self.files.lock().unwrap().get(path).cloned().ok_or_else(|| {
            SheetError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such workbook: {}", path.display()),
            ))
        })?;
        Ok(Box::new(MemWorkbook {
            model,
            files: self.files.clone(),
            break_formula_on_delete: self.break_formula_on_delete,
        }))
    }

    fn create(&self) -> Box<dyn Workbook> {
        Box::new(MemWorkbook {
            model: WorkbookModel::default(),
            files: self.files.clone(),
            break_formula_on_delete: self.break_formula_on_delete,
        })
    }
}

pub struct MemWorkbook {
    model: WorkbookModel,
    files: FileMap,
    break_formula_on_delete: Option<(u32, u32)>,
}

impl Workbook for MemWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.model.sheet_names()
    }

    fn find_sheet(&self, name: &str) -> Option<String> {
        self.model.find_sheet(name)
    }

    fn add_sheet(&mut self, name: &str) {
        self.model.add_sheet(name);
    }

    fn last_row(&self, sheet: &str) -> Option<u32> {
        self.model.last_row(sheet)
    }

    fn last_column(&self, sheet: &str) -> Option<u32> {
        self.model.last_column(sheet)
    }

    fn row_is_empty(&self, sheet: &str, row: u32) -> bool {
        self.model.row_is_empty(sheet, row)
    }

    fn cell_text(&self, sheet: &str, row: u32, col: u32) -> Option<String> {
        self.model.cell_text(sheet, row, col)
    }

    fn cell_number(&self, sheet: &str, row: u32, col: u32) -> Option<f64> {
        self.model.cell_number(sheet, row, col)
    }

    fn cell_date(&self, sheet: &str, row: u32, col: u32) -> Option<NaiveDate> {
        self.model.cell_date(sheet, row, col)
    }

    fn has_formula(&self, sheet: &str, row: u32, col: u32) -> bool {
        self.model.has_formula(sheet, row, col)
    }

    fn formula_text(&self, sheet: &str, row: u32, col: u32) -> Option<String> {
        self.model.formula_text(sheet, row, col)
    }

    fn set_text(&mut self, sheet: &str, row: u32, col: u32, value: &str) {
        self.model.set_text(sheet, row, col, value);
    }

    fn set_number(&mut self, sheet: &str, row: u32, col: u32, value: f64) {
        self.model.set_number(sheet, row, col, value);
    }

    fn set_date(&mut self, sheet: &str, row: u32, col: u32, value: NaiveDate) {
        self.model.set_date(sheet, row, col, value);
    }

    fn delete_rows(&mut self, sheet: &str, first: u32, last: u32) {
        self.model.delete_rows(sheet, first, last);
        if let Some((row, col)) = self.break_formula_on_delete {
            if let Some(sheet_name) = self.model.find_sheet(sheet) {
                if let Some(s) = self
                    .model
                    .sheets
                    .iter_mut()
                    .find(|s| s.name == sheet_name)
                {
                    if let Some(cell) = s.rows.get_mut(&row).and_then(|r| r.get_mut(&col)) {
                        cell.formula = None;
                    }
                }
            }
        }
    }

    fn save(&mut self, path: &Path) -> Result<(), SheetError> {
        self.files.lock().unwrap().insert(path.to_path_buf(), self.model.clone());
        Ok(())
    }
}
