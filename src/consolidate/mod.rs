//! Consolidation orchestration.
//!
//! One run moves through Scanning, ReadingFiles, Aggregating, Writing,
//! optional Cleaning, and Done. Individual file failures are recorded and
//! isolated; only a missing root or a failed master write aborts the run.
//! Source files are read in parallel but reassembled in scan order, and all
//! writing/cleaning is strictly sequential after the reads.

use std::path::Path;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::backup::BackupManager;
use crate::config::Settings;
use crate::domain::{ProcessingStats, SourceDocument, TableMap, TableStats};
use crate::error::ConsolidateError;
use crate::scan::DirectoryScanner;
use crate::sheet::SheetStore;

pub mod merge;
pub mod reader;
pub mod sanitize;
pub mod tracker;
pub mod writer;

pub use merge::build_batch;
pub use reader::SourceReader;
pub use sanitize::SourceSanitizer;
pub use tracker::MasterTracker;
pub use writer::MasterWriter;

pub struct Consolidator<'a> {
    store: &'a dyn SheetStore,
    settings: &'a Settings,
    show_progress: bool,
}

impl<'a> Consolidator<'a> {
    pub fn new(store: &'a dyn SheetStore, settings: &'a Settings) -> Self {
        Self { store, settings, show_progress: false }
    }

    /// Render a progress bar during the read phase (CLI runs only).
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn run(&self, root: &Path, master: &Path) -> Result<ProcessingStats, ConsolidateError> {
        let started = Instant::now();
        let mut stats = ProcessingStats::default();

        tracing::info!(root = %root.display(), master = %master.display(), "starting consolidation");

        // Scanning
        let files = DirectoryScanner::new(root, &self.settings.report_prefix)
            .include_subdirectories(self.settings.options.include_subdirectories)
            .scan()?;
        stats.files_found = files.len();

        if files.is_empty() {
            tracing::warn!("no report files found, nothing to do");
            stats.elapsed = started.elapsed();
            return Ok(stats);
        }

        // Snapshot the per-table maxima before anything writes.
        let tracker = MasterTracker::new(self.store, master, self.settings.tables.header_row);
        let last_sequences: TableMap<u64> =
            TableMap::from_fn(|kind| tracker.last_sequence(self.settings.sheet_name(kind)));

        let backups = BackupManager::new(self.settings.backup_path(root));
        let run_stamp = BackupManager::run_stamp();

        if self.settings.options.create_backups && self.store.exists(master) {
            if let Err(err) = backups.snapshot_master(master, &run_stamp) {
                tracing::error!(error = %err, "master backup failed, continuing without it");
                stats.cleanup_failures.push(format!("master backup: {err}"));
            }
        }

        // ReadingFiles: parallel reads, reassembled in scan order.
        let progress = if self.show_progress {
            let bar = ProgressBar::new(files.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("  reading [{bar:30}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let source_reader = SourceReader::new(self.store, self.settings);
        let results: Vec<Result<SourceDocument, ConsolidateError>> = files
            .par_iter()
            .map(|path| {
                let result = source_reader.read(path);
                progress.inc(1);
                result
            })
            .collect();
        progress.finish_and_clear();

        let mut documents = Vec::new();
        let mut cleaned_candidates = Vec::new();
        for (path, result) in files.iter().zip(results) {
            match result {
                Ok(document) => {
                    stats.files_ok += 1;
                    cleaned_candidates.push(path.clone());
                    documents.push(document);
                }
                Err(err) => {
                    stats.files_failed += 1;
                    tracing::error!(file = %path.display(), error = %err, "failed to process file");
                    stats.read_failures.push(format!("{}: {err}", file_name(path)));
                }
            }
        }

        if documents.is_empty() {
            tracing::error!("no file could be read");
            stats.elapsed = started.elapsed();
            return Ok(stats);
        }

        // Aggregating + allocating
        tracing::info!("consolidating data");
        let batch = build_batch(documents, &last_sequences);
        for (kind, table) in batch.tables.iter() {
            stats.tables[kind] =
                TableStats { rows_written: table.rows.len(), range: table.range };
            if let Some(range) = table.range {
                tracing::info!(
                    table = kind.label(),
                    rows = table.rows.len(),
                    first = range.first,
                    last = range.last,
                    "rows consolidated"
                );
            }
        }

        // Writing: fatal on failure, master left untouched by the atomic save.
        MasterWriter::new(self.store, self.settings).append_batch(master, &batch)?;

        // Cleaning
        if self.settings.options.clean_sources {
            tracing::info!("cleaning source files");
            let sanitizer = SourceSanitizer::new(self.store, self.settings);
            for path in &cleaned_candidates {
                if self.settings.options.create_backups {
                    if let Err(err) = backups.snapshot_source(path, &run_stamp) {
                        tracing::error!(file = %path.display(), error = %err, "source backup failed, skipping cleanup");
                        stats
                            .cleanup_failures
                            .push(format!("{}: {err}", file_name(path)));
                        continue;
                    }
                }
                if let Err(err) = sanitizer.sanitize_file(path) {
                    tracing::error!(file = %path.display(), error = %err, "cleanup failed");
                    stats.cleanup_failures.push(format!("{}: {err}", file_name(path)));
                }
            }
        }

        if self.settings.options.create_backups {
            if let Err(err) = backups.prune_older_than(self.settings.options.retention_days) {
                tracing::warn!(error = %err, "failed pruning old backups");
            }
        }

        stats.elapsed = started.elapsed();
        tracing::info!(
            ok = stats.files_ok,
            failed = stats.files_failed,
            rows = stats.total_rows_written(),
            "consolidation finished"
        );
        Ok(stats)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TableKind;
    use crate::sheet::mem::MemStore;
    use crate::sheet::WorkbookModel;
    use std::fs;
    use tempfile::TempDir;

    /// Settings pointed at a throwaway master path, no backups (the mem
    /// store has no real files to copy).
    fn test_settings() -> Settings {
        let mut settings = Settings::default();
        settings.options.create_backups = false;
        settings
    }

    /// Put an eligible file on disk (for the scanner) and its workbook
    /// model into the store (for the reader). Row 6 doubles as formula row
    /// and first data row, like the real report template.
    fn add_source(root: &Path, store: &MemStore, name: &str, prospects: &[&str]) {
        let path = root.join(name);
        fs::write(&path, b"placeholder").unwrap();

        let mut model = WorkbookModel::default();
        for sheet in ["BASE DE DATOS", "PLANEACION", "REPORTE"] {
            model.add_sheet(sheet);
        }
        model.set_formula("BASE DE DATOS", 6, 4, "C6&B6");
        for (i, value) in prospects.iter().enumerate() {
            model.set_text("BASE DE DATOS", 6 + i as u32, 2, value);
        }
        store.insert(path, model);
    }

    fn prospect_values(model: &WorkbookModel) -> Vec<(u64, String)> {
        let last = model.last_row("BASE DE DATOS").unwrap_or(5);
        (6..=last)
            .filter_map(|row| {
                let num = model.cell_number("BASE DE DATOS", row, 1)?;
                let name = model.cell_text("BASE DE DATOS", row, 2)?;
                Some((num as u64, name))
            })
            .collect()
    }

    #[test]
    fn test_empty_root_is_zero_progress_done() {
        let tmp = TempDir::new().unwrap();
        let store = MemStore::new();
        let settings = test_settings();
        let master = tmp.path().join("MAESTRO.xlsx");

        let stats = Consolidator::new(&store, &settings).run(tmp.path(), &master).unwrap();
        assert_eq!(stats.files_found, 0);
        assert_eq!(stats.files_ok, 0);
        assert!(stats.run_succeeded());
        assert!(!store.contains(&master));
    }

    #[test]
    fn test_missing_root_aborts() {
        let store = MemStore::new();
        let settings = test_settings();
        let result = Consolidator::new(&store, &settings)
            .run(Path::new("/no/such/root"), Path::new("/no/MAESTRO.xlsx"));
        assert!(matches!(result, Err(ConsolidateError::RootNotFound(_))));
    }

    #[test]
    fn test_consolidates_in_scan_order_with_fresh_sequences() {
        let tmp = TempDir::new().unwrap();
        let store = MemStore::new();
        let settings = test_settings();
        let master = tmp.path().join("MAESTRO.xlsx");

        add_source(tmp.path(), &store, "REPORTE SEMANAL 01.xlsx", &["a1", "a2"]);
        add_source(tmp.path(), &store, "REPORTE SEMANAL 02.xlsx", &["b1"]);

        let stats = Consolidator::new(&store, &settings).run(tmp.path(), &master).unwrap();
        assert_eq!(stats.files_found, 2);
        assert_eq!(stats.files_ok, 2);
        assert_eq!(stats.tables[TableKind::Prospects].rows_written, 3);

        let range = stats.tables[TableKind::Prospects].range.unwrap();
        assert_eq!((range.first, range.last), (1, 3));

        let model = store.get(&master).unwrap();
        let mut rows = prospect_values(&model);
        rows.sort();
        // Scan order within each file is preserved; the numbers are a
        // contiguous block starting at 1.
        assert_eq!(rows.iter().map(|(n, _)| *n).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_second_run_continues_sequences() {
        let tmp = TempDir::new().unwrap();
        let store = MemStore::new();
        let settings = test_settings();
        let master = tmp.path().join("MAESTRO.xlsx");

        add_source(tmp.path(), &store, "REPORTE SEMANAL 01.xlsx", &["a1", "a2"]);
        let consolidator = Consolidator::new(&store, &settings);
        let first = consolidator.run(tmp.path(), &master).unwrap();
        let first_range = first.tables[TableKind::Prospects].range.unwrap();

        // Same inputs again: the identifiers must continue, never reuse.
        let second = consolidator.run(tmp.path(), &master).unwrap();
        let second_range = second.tables[TableKind::Prospects].range.unwrap();

        assert_eq!(first_range.first, 1);
        assert_eq!(first_range.last, 2);
        assert_eq!(second_range.first, first_range.last + 1);
        assert_eq!(second_range.last, first_range.last + 2);
    }

    #[test]
    fn test_one_unreadable_file_does_not_stop_the_run() {
        let tmp = TempDir::new().unwrap();
        let store = MemStore::new();
        let settings = test_settings();
        let master = tmp.path().join("MAESTRO.xlsx");

        add_source(tmp.path(), &store, "REPORTE SEMANAL 01.xlsx", &["a1"]);
        add_source(tmp.path(), &store, "REPORTE SEMANAL 02.xlsx", &["b1"]);
        // On disk so the scanner finds it, but absent from the store: the
        // read fails like a corrupt workbook would.
        fs::write(tmp.path().join("REPORTE SEMANAL 03.xlsx"), b"x").unwrap();

        let stats = Consolidator::new(&store, &settings).run(tmp.path(), &master).unwrap();
        assert_eq!(stats.files_found, 3);
        assert_eq!(stats.files_ok, 2);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.read_failures.len(), 1);
        assert!(stats.read_failures[0].starts_with("REPORTE SEMANAL 03.xlsx:"));
        assert!(stats.run_succeeded());
        assert_eq!(stats.tables[TableKind::Prospects].rows_written, 2);
    }

    #[test]
    fn test_all_files_unreadable_ends_without_master() {
        let tmp = TempDir::new().unwrap();
        let store = MemStore::new();
        let settings = test_settings();
        let master = tmp.path().join("MAESTRO.xlsx");

        fs::write(tmp.path().join("REPORTE SEMANAL 01.xlsx"), b"x").unwrap();

        let stats = Consolidator::new(&store, &settings).run(tmp.path(), &master).unwrap();
        assert_eq!(stats.files_failed, 1);
        assert!(!stats.run_succeeded());
        assert!(!store.contains(&master));
    }

    #[test]
    fn test_cleaning_clears_sources_and_keeps_formulas() {
        let tmp = TempDir::new().unwrap();
        let store = MemStore::new();
        let mut settings = test_settings();
        settings.options.clean_sources = true;
        let master = tmp.path().join("MAESTRO.xlsx");

        add_source(tmp.path(), &store, "REPORTE SEMANAL 01.xlsx", &["a1", "a2", "a3"]);

        let stats = Consolidator::new(&store, &settings).run(tmp.path(), &master).unwrap();
        assert!(stats.cleanup_failures.is_empty());
        assert_eq!(stats.tables[TableKind::Prospects].rows_written, 3);

        let cleaned = store.get(&tmp.path().join("REPORTE SEMANAL 01.xlsx")).unwrap();
        assert_eq!(cleaned.last_row("BASE DE DATOS"), Some(6));
        assert!(cleaned.has_formula("BASE DE DATOS", 6, 4));
    }

    #[test]
    fn test_formula_loss_is_recorded_but_master_keeps_rows() {
        let tmp = TempDir::new().unwrap();
        let mut store = MemStore::new();
        store.break_formula_on_delete = Some((6, 4));
        let mut settings = test_settings();
        settings.options.clean_sources = true;
        let master = tmp.path().join("MAESTRO.xlsx");

        add_source(tmp.path(), &store, "REPORTE SEMANAL 01.xlsx", &["a1", "a2"]);

        let stats = Consolidator::new(&store, &settings).run(tmp.path(), &master).unwrap();
        // Consolidation itself succeeded; the cleanup failure is isolated.
        assert_eq!(stats.files_ok, 1);
        assert_eq!(stats.cleanup_failures.len(), 1);
        assert!(stats.cleanup_failures[0].contains("formulas lost"));
        assert!(store.contains(&master));

        // The source still holds its data rows: it was never reported clean.
        let source = store.get(&tmp.path().join("REPORTE SEMANAL 01.xlsx")).unwrap();
        assert_eq!(source.last_row("BASE DE DATOS"), Some(7));
    }
}
