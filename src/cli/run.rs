//! Run command implementation

use anyhow::Result;
use clap::Args;
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::config::{load_settings, merge_cli_with_settings, CliOverrides};
use crate::consolidate::Consolidator;
use crate::report::write_run_report;
use crate::sheet::XlsxStore;
use crate::ui;

#[derive(Args)]
pub struct RunArgs {
    /// Root directory scanned for weekly report files
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Master workbook path (relative paths resolve against the root)
    #[arg(short, long, value_name = "FILE")]
    pub master: Option<PathBuf>,

    /// Path to config file (consolidator.toml or .consolidator.yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Backup directory (relative paths resolve against the root)
    #[arg(long, value_name = "DIR")]
    pub backup_dir: Option<PathBuf>,

    /// File name prefix identifying report files
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Clear data rows from source files after consolidation
    #[arg(long)]
    pub clean: bool,

    /// Skip master and source backups
    #[arg(long)]
    pub no_backup: bool,

    /// Do not descend into subdirectories
    #[arg(long)]
    pub no_subdirs: bool,

    /// Prune backups older than this many days
    #[arg(long, value_name = "DAYS")]
    pub retention_days: Option<i64>,

    /// Write a JSON run report to this path
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Omit timestamps in the run report for reproducible diffs
    #[arg(long)]
    pub no_timestamp: bool,
}

pub fn run(args: RunArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config_anchor = match args.root.as_ref() {
        Some(root) if root.exists() => root.clone(),
        _ => cwd,
    };

    let file_settings = load_settings(&config_anchor, args.config.as_deref())?;
    let settings = merge_cli_with_settings(
        file_settings,
        CliOverrides {
            root_dir: args.root.clone(),
            master_file: args.master.clone(),
            backup_dir: args.backup_dir.clone(),
            report_prefix: args.prefix.clone(),
            create_backups: if args.no_backup { Some(false) } else { None },
            clean_sources: if args.clean { Some(true) } else { None },
            include_subdirectories: if args.no_subdirs { Some(false) } else { None },
            retention_days: args.retention_days,
        },
    );

    let Some(root) = settings.root_dir.clone() else {
        anyhow::bail!("A root directory must be given via --root or the config file");
    };
    let master = settings.master_path(&root);

    ui::banner();
    ui::show_config(&root, &master, settings.options.clean_sources);
    println!();

    let store = XlsxStore;
    let stats = Consolidator::new(&store, &settings)
        .with_progress(std::io::stdout().is_terminal())
        .run(&root, &master)?;

    ui::show_summary(&stats);

    if let Some(report_path) = args.report.as_deref() {
        write_run_report(report_path, &root, &master, &settings, &stats, !args.no_timestamp)?;
        println!("  Report: {}", report_path.display());
    }

    if stats.run_succeeded() {
        ui::show_success("consolidation completed");
        Ok(())
    } else {
        ui::show_error("consolidation finished with errors");
        anyhow::bail!("no file could be processed");
    }
}
