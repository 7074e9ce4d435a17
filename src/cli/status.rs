//! Status command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::config::{load_settings, merge_cli_with_settings, CliOverrides};
use crate::consolidate::MasterTracker;
use crate::domain::TABLE_KINDS;
use crate::sheet::{SheetStore, XlsxStore};

#[derive(Args)]
pub struct StatusArgs {
    /// Master workbook to inspect (defaults to the configured path)
    #[arg(value_name = "MASTER")]
    pub master: Option<PathBuf>,

    /// Root directory used to resolve a relative master path
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Path to config file
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let file_settings = load_settings(&cwd, args.config.as_deref())?;
    let settings = merge_cli_with_settings(
        file_settings,
        CliOverrides {
            root_dir: args.root.clone(),
            master_file: args.master.clone(),
            ..Default::default()
        },
    );

    let root = settings.root_dir.clone().unwrap_or(cwd);
    let master = settings.master_path(&root);

    println!("Master workbook: {}", master.display());
    let store = XlsxStore;
    if !store.exists(&master) {
        println!("  (does not exist yet; all sequences start at 1)");
    }

    let tracker = MasterTracker::new(&store, &master, settings.tables.header_row);
    for kind in TABLE_KINDS {
        let sheet = settings.sheet_name(kind);
        println!("  {:<16} last NUM = {}", sheet, tracker.last_sequence(sheet));
    }

    Ok(())
}
