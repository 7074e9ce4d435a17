//! Domain model: logical tables, their column schemas, rows and run statistics.
//!
//! The three logical tables have fixed schemas enumerated here as static
//! tables, so header order and field decoding are checked at construction
//! time instead of discovered through runtime introspection. Column 1 of
//! every table is the sequence number (`NUM`) and is handled separately from
//! the business columns.

use std::ops::{Index, IndexMut};
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;

/// The three logical tables carried by every report file and by the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Prospects,
    Planning,
    WeeklyActivity,
}

/// All table kinds in their fixed processing order.
pub const TABLE_KINDS: [TableKind; 3] =
    [TableKind::Prospects, TableKind::Planning, TableKind::WeeklyActivity];

/// How a business column's cells are decoded and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Date,
}

/// One business column of a logical table. The header strings are the fixed
/// header row written into the master; they match the source workbooks.
#[derive(Debug)]
pub struct ColumnSpec {
    pub header: &'static str,
    pub kind: ColumnKind,
}

const fn text(header: &'static str) -> ColumnSpec {
    ColumnSpec { header, kind: ColumnKind::Text }
}

const fn date(header: &'static str) -> ColumnSpec {
    ColumnSpec { header, kind: ColumnKind::Date }
}

/// Header of the sequence-number column shared by all three tables.
pub const SEQUENCE_HEADER: &str = "NUM";

static PROSPECTS_COLUMNS: [ColumnSpec; 20] = [
    text("RESPONSABLE"),
    text("REGION"),
    text("SEMANA"),
    date("FECHA"),
    text("CLASIFICACION"),
    text("NOMBRE_DE_LA_EMPRESA"),
    text("GIRO"),
    text("SECTOR"),
    text("ESTADO"),
    text("CIUDAD"),
    text("DOMICILIO"),
    text("CONTACTO"),
    text("PUESTO"),
    text("EMAIL"),
    text("TELEFONO"),
    text("WHATSAPP"),
    text("FUENTE_DE_INFORMACION"),
    text("B2B"),
    date("FECHA_DE_VISITA"),
    text("OPORTUNIDAD"),
];

static PLANNING_COLUMNS: [ColumnSpec; 7] = [
    text("RESPONSABLE"),
    text("REGION"),
    text("SEMANA"),
    date("FECHA"),
    text("NOMBRE_DE_LA_EMPRESA"),
    text("FUENTE_DE_INFORMACION"),
    text("COMENTARIOS"),
];

static WEEKLY_ACTIVITY_COLUMNS: [ColumnSpec; 9] = [
    text("RESPONSABLE"),
    text("REGION"),
    text("SEMANA"),
    date("FECHA"),
    text("NOMBRE_DE_LA_EMPRESA"),
    text("FUENTE_DE_INFORMACION"),
    text("ACTIVIDAD_PROGRAMADA"),
    text("COMENTARIOS"),
    text("NECESIDAD_DETECTADA"),
];

impl TableKind {
    /// The business columns of this table, excluding the sequence column.
    /// Schema index `i` maps to worksheet column `i + 2`.
    pub fn schema(self) -> &'static [ColumnSpec] {
        match self {
            TableKind::Prospects => &PROSPECTS_COLUMNS,
            TableKind::Planning => &PLANNING_COLUMNS,
            TableKind::WeeklyActivity => &WEEKLY_ACTIVITY_COLUMNS,
        }
    }

    /// Short identifier used in logs and the run report.
    pub fn label(self) -> &'static str {
        match self {
            TableKind::Prospects => "prospects",
            TableKind::Planning => "planning",
            TableKind::WeeklyActivity => "weekly_activity",
        }
    }

    fn index(self) -> usize {
        match self {
            TableKind::Prospects => 0,
            TableKind::Planning => 1,
            TableKind::WeeklyActivity => 2,
        }
    }
}

/// One decoded business field. Empty fields are never written back out.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Empty,
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Date(_) => false,
        }
    }
}

/// One row of a logical table. `fields[i]` corresponds to
/// `schema()[i]`; `seq` is 0 until the allocator assigns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub seq: u64,
    pub fields: Vec<FieldValue>,
}

impl Row {
    pub fn new(fields: Vec<FieldValue>) -> Self {
        Self { seq: 0, fields }
    }
}

/// Fixed-size map from `TableKind` to a value, indexable by kind.
#[derive(Debug, Clone)]
pub struct TableMap<T> {
    inner: [T; 3],
}

impl<T: Default> Default for TableMap<T> {
    fn default() -> Self {
        Self { inner: [T::default(), T::default(), T::default()] }
    }
}

impl<T> TableMap<T> {
    pub fn from_fn(mut f: impl FnMut(TableKind) -> T) -> Self {
        Self { inner: TABLE_KINDS.map(&mut f) }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TableKind, &T)> {
        TABLE_KINDS.iter().map(move |&kind| (kind, &self.inner[kind.index()]))
    }
}

impl<T> Index<TableKind> for TableMap<T> {
    type Output = T;

    fn index(&self, kind: TableKind) -> &T {
        &self.inner[kind.index()]
    }
}

impl<T> IndexMut<TableKind> for TableMap<T> {
    fn index_mut(&mut self, kind: TableKind) -> &mut T {
        &mut self.inner[kind.index()]
    }
}

/// One successfully read source file: its path and the three row sequences,
/// in file order. Immutable once produced by the reader; the aggregator
/// drains it.
#[derive(Debug)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub tables: TableMap<Vec<Row>>,
}

/// Inclusive range of sequence numbers assigned to one table in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceRange {
    pub first: u64,
    pub last: u64,
}

/// One table's aggregated, renumbered rows. `range` is `None` when no rows
/// were collected for the table.
#[derive(Debug, Default)]
pub struct TableBatch {
    pub rows: Vec<Row>,
    pub range: Option<SequenceRange>,
}

/// The full output of aggregation for one run; exists only between
/// aggregation and the master write.
#[derive(Debug, Default)]
pub struct ConsolidationBatch {
    pub tables: TableMap<TableBatch>,
}

/// Per-table write statistics.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TableStats {
    pub rows_written: usize,
    pub range: Option<SequenceRange>,
}

/// Statistics for one consolidation run, handed back to the caller.
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_found: usize,
    pub files_ok: usize,
    pub files_failed: usize,
    /// Per-file read errors, formatted `"<file name>: <message>"`.
    pub read_failures: Vec<String>,
    /// Backup and sanitize problems during the cleanup phase.
    pub cleanup_failures: Vec<String>,
    pub tables: TableMap<TableStats>,
    pub elapsed: Duration,
}

impl ProcessingStats {
    /// The process exit contract: a run counts as successful when at least
    /// one file succeeded or there were no failures at all.
    pub fn run_succeeded(&self) -> bool {
        self.files_failed == 0 || self.files_ok > 0
    }

    pub fn total_rows_written(&self) -> usize {
        self.tables.iter().map(|(_, t)| t.rows_written).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_column_counts() {
        // Worksheet widths including the NUM column: 21 / 8 / 10.
        assert_eq!(TableKind::Prospects.schema().len(), 20);
        assert_eq!(TableKind::Planning.schema().len(), 7);
        assert_eq!(TableKind::WeeklyActivity.schema().len(), 9);
    }

    #[test]
    fn test_schema_date_columns() {
        let dates: Vec<usize> = TableKind::Prospects
            .schema()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind == ColumnKind::Date)
            .map(|(i, _)| i + 2)
            .collect();
        // FECHA in column 5, FECHA_DE_VISITA in column 20.
        assert_eq!(dates, vec![5, 20]);
    }

    #[test]
    fn test_table_map_indexing() {
        let mut map: TableMap<usize> = TableMap::default();
        map[TableKind::Planning] = 7;
        assert_eq!(map[TableKind::Planning], 7);
        assert_eq!(map[TableKind::Prospects], 0);
        let collected: Vec<_> = map.iter().map(|(k, v)| (k, *v)).collect();
        assert_eq!(collected[1], (TableKind::Planning, 7));
    }

    #[test]
    fn test_run_succeeded_contract() {
        let mut stats = ProcessingStats::default();
        assert!(stats.run_succeeded(), "no failures at all is a success");

        stats.files_failed = 3;
        assert!(!stats.run_succeeded(), "every file failed");

        stats.files_ok = 1;
        assert!(stats.run_succeeded(), "partial progress still succeeds");
    }
}
