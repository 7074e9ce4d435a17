//! Run report JSON generation.

use anyhow::Result;
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::config::Settings;
use crate::domain::{ProcessingStats, TABLE_KINDS};

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// Write a machine-readable summary of one consolidation run.
pub fn write_run_report(
    report_path: &Path,
    root: &Path,
    master: &Path,
    settings: &Settings,
    stats: &ProcessingStats,
    include_timestamp: bool,
) -> Result<()> {
    let tables: Map<String, Value> = TABLE_KINDS
        .iter()
        .map(|&kind| {
            let table = &stats.tables[kind];
            let value = json!({
                "sheet": settings.sheet_name(kind),
                "rows_written": table.rows_written,
                "first_num": table.range.map(|r| r.first),
                "last_num": table.range.map(|r| r.last),
            });
            (kind.label().to_string(), value)
        })
        .collect();

    let mut report = Map::new();
    report.insert("schema_version".to_string(), Value::String(REPORT_SCHEMA_VERSION.to_string()));
    if include_timestamp {
        report.insert(
            "generated_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
        );
    }
    report.insert(
        "stats".to_string(),
        json!({
            "files_found": stats.files_found,
            "files_ok": stats.files_ok,
            "files_failed": stats.files_failed,
            "read_failures": stats.read_failures,
            "cleanup_failures": stats.cleanup_failures,
            "elapsed_seconds": stats.elapsed.as_secs_f64(),
        }),
    );
    report.insert("tables".to_string(), Value::Object(tables));
    report.insert(
        "config".to_string(),
        json!({
            "root_dir": root.display().to_string(),
            "master_file": master.display().to_string(),
            "report_prefix": settings.report_prefix,
            "create_backups": settings.options.create_backups,
            "clean_sources": settings.options.clean_sources,
            "validate_duplicates": settings.options.validate_duplicates,
            "include_subdirectories": settings.options.include_subdirectories,
            "retention_days": settings.options.retention_days,
            "header_row": settings.tables.header_row,
            "formula_row": settings.tables.formula_row,
            "first_deletable_row": settings.tables.first_deletable_row,
        }),
    );
    report.insert("tool_version".to_string(), Value::String(env!("CARGO_PKG_VERSION").to_string()));

    if let Some(parent) = report_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(report_path, serde_json::to_string_pretty(&Value::Object(report))?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SequenceRange, TableKind, TableStats};
    use tempfile::TempDir;

    #[test]
    fn test_report_shape() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/report.json");

        let mut stats = ProcessingStats::default();
        stats.files_found = 2;
        stats.files_ok = 2;
        stats.tables[TableKind::Prospects] = TableStats {
            rows_written: 5,
            range: Some(SequenceRange { first: 11, last: 15 }),
        };

        let settings = Settings::default();
        write_run_report(
            &path,
            Path::new("/data"),
            Path::new("/data/MAESTRO.xlsx"),
            &settings,
            &stats,
            false,
        )
        .unwrap();

        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["schema_version"], "1.0");
        assert!(value.get("generated_at").is_none(), "timestamp disabled");
        assert_eq!(value["stats"]["files_ok"], 2);
        assert_eq!(value["tables"]["prospects"]["rows_written"], 5);
        assert_eq!(value["tables"]["prospects"]["first_num"], 11);
        assert_eq!(value["tables"]["planning"]["rows_written"], 0);
        assert_eq!(value["config"]["report_prefix"], "REPORTE SEMANAL");
    }
}
