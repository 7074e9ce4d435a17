//! Console presentation for the CLI.

use console::style;

use crate::domain::{ProcessingStats, TableKind, TABLE_KINDS};

pub fn banner() {
    println!("{}", style("=".repeat(56)).dim());
    println!(
        "{}",
        style("  CONSOLIDADOR DE REPORTES SEMANALES").bold().cyan()
    );
    println!("  incremental renumbering, append-only master");
    println!("{}", style("=".repeat(56)).dim());
}

pub fn show_config(root: &std::path::Path, master: &std::path::Path, clean_sources: bool) {
    println!();
    println!("Configuration:");
    println!("  Root directory:  {}", root.display());
    println!("  Master workbook: {}", master.display());
    println!("  Clean sources:   {}", if clean_sources { "yes" } else { "no" });
}

fn table_title(kind: TableKind) -> &'static str {
    match kind {
        TableKind::Prospects => "BASE DE DATOS",
        TableKind::Planning => "PLANEACION",
        TableKind::WeeklyActivity => "REPORTE",
    }
}

pub fn show_summary(stats: &ProcessingStats) {
    println!();
    println!("{}", style("Run summary").bold());
    println!(
        "  Files processed: {}/{}",
        stats.files_ok, stats.files_found
    );
    if stats.files_failed > 0 {
        println!(
            "  Files failed:    {}",
            style(stats.files_failed).red().bold()
        );
    }

    for kind in TABLE_KINDS {
        let table = &stats.tables[kind];
        match table.range {
            Some(range) => println!(
                "  {:<14} {} rows (NUM {}-{})",
                format!("{}:", table_title(kind)),
                table.rows_written,
                range.first,
                range.last
            ),
            None => println!("  {:<14} no rows", format!("{}:", table_title(kind))),
        }
    }

    if !stats.read_failures.is_empty() {
        println!();
        println!("{}", style("Read errors:").yellow());
        for failure in &stats.read_failures {
            println!("  - {failure}");
        }
    }
    if !stats.cleanup_failures.is_empty() {
        println!();
        println!("{}", style("Cleanup errors:").yellow());
        for failure in &stats.cleanup_failures {
            println!("  - {failure}");
        }
    }

    println!();
    println!("  Elapsed: {:.2}s", stats.elapsed.as_secs_f64());
}

pub fn show_success(message: &str) {
    println!("{} {message}", style("OK").green().bold());
}

pub fn show_error(message: &str) {
    eprintln!("{} {message}", style("ERROR").red().bold());
}
