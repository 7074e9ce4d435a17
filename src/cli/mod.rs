//! Command-line interface for report-consolidator
//!
//! Provides `run`, `scan` and `status` subcommands.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod run;
mod scan;
mod status;

/// Consolidate weekly report workbooks into one master spreadsheet
#[derive(Parser)]
#[command(name = "report-consolidator")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Consolidate report files into the master workbook
    Run(run::RunArgs),

    /// List eligible report files without touching anything
    Scan(scan::ScanArgs),

    /// Show the last sequence numbers stored in the master workbook
    Status(status::StatusArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Wire verbose flag to the tracing log level.
    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Run(args) => run::run(args),
        Commands::Scan(args) => scan::run(args),
        Commands::Status(args) => status::run(args),
    }
}
