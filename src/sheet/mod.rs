//! Spreadsheet access port.
//!
//! The consolidation core talks to workbooks through the [`Workbook`] and
//! [`SheetStore`] traits; the production backend is the native XLSX codec in
//! [`xlsx`]. Tests substitute in-memory implementations, including faulty
//! ones, to exercise the sanitizer's verification path.

use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;

pub mod model;
pub mod xlsx;

#[cfg(test)]
pub mod mem;

pub use model::{Cell, CellValue, WorkbookModel};
pub use xlsx::{XlsxStore, XlsxWorkbook};

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("xml attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing workbook part: {0}")]
    MissingPart(String),
    #[error("invalid cell reference: {0}")]
    InvalidCellRef(String),
    #[error("not a supported spreadsheet package: {0}")]
    UnsupportedFormat(String),
}

/// An open workbook. Row and column indices are 1-based, matching the A1
/// reference scheme. Mutating operations on a sheet that does not exist are
/// silent no-ops; callers create sheets explicitly first.
pub trait Workbook {
    fn sheet_names(&self) -> Vec<String>;
    /// Resolve a sheet name case-insensitively to its stored spelling.
    fn find_sheet(&self, name: &str) -> Option<String>;
    /// Add an empty sheet; no-op when one with the same name already exists.
    fn add_sheet(&mut self, name: &str);

    /// Highest row containing a value or formula, if any.
    fn last_row(&self, sheet: &str) -> Option<u32>;
    /// Highest column containing a value or formula anywhere in the sheet.
    fn last_column(&self, sheet: &str) -> Option<u32>;
    fn row_is_empty(&self, sheet: &str, row: u32) -> bool;

    fn cell_text(&self, sheet: &str, row: u32, col: u32) -> Option<String>;
    fn cell_number(&self, sheet: &str, row: u32, col: u32) -> Option<f64>;
    fn cell_date(&self, sheet: &str, row: u32, col: u32) -> Option<NaiveDate>;
    fn has_formula(&self, sheet: &str, row: u32, col: u32) -> bool;
    fn formula_text(&self, sheet: &str, row: u32, col: u32) -> Option<String>;

    fn set_text(&mut self, sheet: &str, row: u32, col: u32, value: &str);
    fn set_number(&mut self, sheet: &str, row: u32, col: u32, value: f64);
    fn set_date(&mut self, sheet: &str, row: u32, col: u32, value: NaiveDate);
    /// Remove every cell in rows `first..=last`. Rows outside the range are
    /// not shifted or otherwise touched.
    fn delete_rows(&mut self, sheet: &str, first: u32, last: u32);

    fn save(&mut self, path: &Path) -> Result<(), SheetError>;
}

/// Opens and creates workbooks. The orchestrator holds one store for the
/// whole run; file reads may run in parallel, so stores must be `Sync`.
pub trait SheetStore: Sync {
    fn exists(&self, path: &Path) -> bool;
    fn open(&self, path: &Path) -> Result<Box<dyn Workbook>, SheetError>;
    fn create(&self) -> Box<dyn Workbook>;
}

/// Excel's serial date epoch. Serial 1 renders as 1900-01-01; using the
/// 1899-12-30 base keeps the conversion correct past the phantom
/// 1900-02-29 that the format inherited from Lotus 1-2-3.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

pub(crate) fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(EXCEL_EPOCH.0, EXCEL_EPOCH.1, EXCEL_EPOCH.2)?;
    base.checked_add_days(chrono::Days::new(serial.trunc() as u64))
}

pub(crate) fn date_to_serial(date: NaiveDate) -> f64 {
    let base = NaiveDate::from_ymd_opt(EXCEL_EPOCH.0, EXCEL_EPOCH.1, EXCEL_EPOCH.2)
        .expect("valid epoch");
    date.signed_duration_since(base).num_days() as f64
}
