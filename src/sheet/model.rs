//! In-memory worksheet model shared by every workbook backend.
//!
//! Sheets hold sparse cell grids keyed by 1-based (row, column). A cell is
//! "used" when it carries a non-empty value or a formula; emptiness checks,
//! last-row/last-column queries and row deletion are all defined against
//! used cells only.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::{date_to_serial, serial_to_date};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub formula: Option<String>,
    /// Style index into the package's cellXfs table, carried through writes
    /// so preserved styles keep applying to rewritten sheets.
    pub style: u32,
}

impl Cell {
    fn is_used(&self) -> bool {
        self.formula.is_some() || !self.value.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    /// row -> column -> cell, both 1-based.
    pub rows: BTreeMap<u32, BTreeMap<u32, Cell>>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkbookModel {
    pub sheets: Vec<Sheet>,
}

impl WorkbookModel {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn find_sheet(&self, name: &str) -> Option<String> {
        self.sheets
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| s.name.clone())
    }

    pub fn add_sheet(&mut self, name: &str) {
        if self.find_sheet(name).is_none() {
            self.sheets.push(Sheet { name: name.to_string(), rows: BTreeMap::new() });
        }
    }

    pub fn last_row(&self, sheet: &str) -> Option<u32> {
        let sheet = self.sheet(sheet)?;
        sheet
            .rows
            .iter()
            .filter(|(_, cells)| cells.values().any(Cell::is_used))
            .map(|(&row, _)| row)
            .max()
    }

    pub fn last_column(&self, sheet: &str) -> Option<u32> {
        let sheet = self.sheet(sheet)?;
        sheet
            .rows
            .values()
            .flat_map(|cells| cells.iter())
            .filter(|(_, cell)| cell.is_used())
            .map(|(&col, _)| col)
            .max()
    }

    pub fn row_is_empty(&self, sheet: &str, row: u32) -> bool {
        self.sheet(sheet)
            .and_then(|s| s.rows.get(&row))
            .map(|cells| !cells.values().any(Cell::is_used))
            .unwrap_or(true)
    }

    pub fn cell(&self, sheet: &str, row: u32, col: u32) -> Option<&Cell> {
        self.sheet(sheet)?.rows.get(&row)?.get(&col)
    }

    pub fn cell_text(&self, sheet: &str, row: u32, col: u32) -> Option<String> {
        match &self.cell(sheet, row, col)?.value {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        }
    }

    pub fn cell_number(&self, sheet: &str, row: u32, col: u32) -> Option<f64> {
        match &self.cell(sheet, row, col)?.value {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn cell_date(&self, sheet: &str, row: u32, col: u32) -> Option<NaiveDate> {
        match &self.cell(sheet, row, col)?.value {
            CellValue::Number(n) => serial_to_date(*n),
            CellValue::Text(s) => parse_date_text(s),
            _ => None,
        }
    }

    pub fn has_formula(&self, sheet: &str, row: u32, col: u32) -> bool {
        self.cell(sheet, row, col).map(|c| c.formula.is_some()).unwrap_or(false)
    }

    pub fn formula_text(&self, sheet: &str, row: u32, col: u32) -> Option<String> {
        self.cell(sheet, row, col)?.formula.clone()
    }

    fn set_cell(&mut self, sheet: &str, row: u32, col: u32, value: CellValue, style: u32) {
        let Some(sheet) = self.sheet_mut(sheet) else {
            tracing::debug!("ignoring write to missing sheet");
            return;
        };
        let cell = sheet.rows.entry(row).or_default().entry(col).or_default();
        cell.value = value;
        cell.formula = None;
        if style != 0 {
            cell.style = style;
        }
    }

    pub fn set_text(&mut self, sheet: &str, row: u32, col: u32, value: &str) {
        self.set_cell(sheet, row, col, CellValue::Text(value.to_string()), 0);
    }

    pub fn set_number(&mut self, sheet: &str, row: u32, col: u32, value: f64) {
        self.set_cell(sheet, row, col, CellValue::Number(value), 0);
    }

    pub fn set_date(&mut self, sheet: &str, row: u32, col: u32, value: NaiveDate) {
        self.set_cell(
            sheet,
            row,
            col,
            CellValue::Number(date_to_serial(value)),
            super::xlsx::DATE_STYLE_XF,
        );
    }

    pub fn set_formula(&mut self, sheet: &str, row: u32, col: u32, formula: &str) {
        let Some(sheet) = self.sheet_mut(sheet) else {
            return;
        };
        let cell = sheet.rows.entry(row).or_default().entry(col).or_default();
        cell.formula = Some(formula.to_string());
    }

    pub fn delete_rows(&mut self, sheet: &str, first: u32, last: u32) {
        if first > last {
            return;
        }
        if let Some(sheet) = self.sheet_mut(sheet) {
            sheet.rows.retain(|&row, _| row < first || row > last);
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with_sheet() -> WorkbookModel {
        let mut model = WorkbookModel::default();
        model.add_sheet("DATA");
        model
    }

    #[test]
    fn test_last_row_ignores_empty_cells() {
        let mut model = model_with_sheet();
        model.set_text("DATA", 3, 1, "x");
        model.set_text("DATA", 9, 2, "");
        assert_eq!(model.last_row("DATA"), Some(3));
    }

    #[test]
    fn test_delete_rows_does_not_shift() {
        let mut model = model_with_sheet();
        model.set_text("DATA", 6, 1, "keep");
        model.set_text("DATA", 7, 1, "gone");
        model.set_text("DATA", 12, 1, "gone too");
        model.delete_rows("DATA", 7, 12);
        assert_eq!(model.cell_text("DATA", 6, 1).as_deref(), Some("keep"));
        assert_eq!(model.last_row("DATA"), Some(6));
        assert!(model.row_is_empty("DATA", 7));
    }

    #[test]
    fn test_formula_counts_as_used() {
        let mut model = model_with_sheet();
        model.set_formula("DATA", 6, 4, "SUM(A1:A5)");
        assert_eq!(model.last_row("DATA"), Some(6));
        assert_eq!(model.last_column("DATA"), Some(4));
        assert!(model.has_formula("DATA", 6, 4));
        assert!(!model.has_formula("DATA", 6, 5));
    }

    #[test]
    fn test_cell_date_from_serial_and_text() {
        let mut model = model_with_sheet();
        let date = NaiveDate::from_ymd_opt(2023, 7, 31).unwrap();
        model.set_date("DATA", 2, 5, date);
        assert_eq!(model.cell_date("DATA", 2, 5), Some(date));

        model.set_text("DATA", 3, 5, "31/07/2023");
        assert_eq!(model.cell_date("DATA", 3, 5), Some(date));
    }

    #[test]
    fn test_find_sheet_case_insensitive() {
        let model = model_with_sheet();
        assert_eq!(model.find_sheet("data").as_deref(), Some("DATA"));
        assert_eq!(model.find_sheet("missing"), None);
    }

    #[test]
    fn test_number_text_rendering() {
        let mut model = model_with_sheet();
        model.set_number("DATA", 1, 1, 42.0);
        model.set_number("DATA", 1, 2, 2.5);
        assert_eq!(model.cell_text("DATA", 1, 1).as_deref(), Some("42"));
        assert_eq!(model.cell_text("DATA", 1, 2).as_deref(), Some("2.5"));
        assert_eq!(model.cell_number("DATA", 1, 1), Some(42.0));
    }
}
