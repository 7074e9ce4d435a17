//! Scan command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::config::{load_settings, merge_cli_with_settings, CliOverrides};
use crate::scan::DirectoryScanner;

#[derive(Args)]
pub struct ScanArgs {
    /// Root directory to scan
    #[arg(value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Path to config file
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// File name prefix identifying report files
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Do not descend into subdirectories
    #[arg(long)]
    pub no_subdirs: bool,
}

pub fn run(args: ScanArgs) -> Result<()> {
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
            report_prefix: args.prefix.clone(),
            include_subdirectories: if args.no_subdirs { Some(false) } else { None },
            ..Default::default()
        },
    );

    let Some(root) = settings.root_dir.clone() else {
        anyhow::bail!("A root directory must be given via the DIR argument or the config file");
    };

    let files = DirectoryScanner::new(&root, &settings.report_prefix)
        .include_subdirectories(settings.options.include_subdirectories)
        .scan()?;

    for file in &files {
        println!("{}", file.display());
    }
    println!();
    println!("{} eligible report file(s) under {}", files.len(), root.display());

    Ok(())
}
