//! report-consolidator: merge weekly report workbooks into one master spreadsheet
//!
//! This tool discovers per-period report files under a directory tree,
//! consolidates their tables into a growing master workbook with incremental
//! renumbering, and optionally clears the source files afterwards while
//! preserving their formula rows.

use anyhow::Result;

fn main() -> Result<()> {
    report_consolidator::cli::run()
}
