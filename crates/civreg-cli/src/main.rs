//! civreg CLI - Civil registry statistics export
//!
//! Selects birth or death documents for a period, aggregates them by
//! municipality and writes the populated statistics workbook.

mod destination;
mod export;
mod settings;
mod source;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Datelike, Local};
use civreg_core::{CauseFilter, ExportRequest, ReportKind, SourceSelection, DEFAULT_TEENAGE_AGE};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::export::run_export;
use crate::settings::Settings;
use crate::source::JsonFileSource;

#[derive(Parser)]
#[command(name = "civreg")]
#[command(author, version, about = "Civil registry statistics export", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file with reference and template locations
    #[arg(long, value_name = "FILE", env = "CIVREG_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a statistics workbook
    Export(ExportArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Birth,
    Death,
}

impl From<Kind> for ReportKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Birth => ReportKind::Birth,
            Kind::Death => ReportKind::Death,
        }
    }
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Report kind
    #[arg(value_enum)]
    kind: Kind,

    /// JSON array of registry documents
    #[arg(long, value_name = "FILE")]
    records: PathBuf,

    /// Registration year (defaults to the current year)
    #[arg(long)]
    year: Option<i32>,

    #[arg(long, default_value_t = 1)]
    month_start: u32,

    #[arg(long, default_value_t = 12)]
    month_end: u32,

    /// Include partner documents
    #[arg(long)]
    partner: bool,

    /// Include LGU register documents
    #[arg(long)]
    lgu: bool,

    /// Destination folder or file
    #[arg(long, value_name = "PATH")]
    save_path: Option<PathBuf>,

    /// Mothers at or below this age count as teenage pregnancies
    #[arg(long, default_value_t = DEFAULT_TEENAGE_AGE)]
    teenage_age: i64,

    /// Restrict a death report to the given causes
    #[arg(long)]
    include_cause: bool,

    /// Cause of death search term (repeatable)
    #[arg(long = "cause", value_name = "TERM", action = clap::ArgAction::Append)]
    causes: Vec<String>,
}

impl ExportArgs {
    fn request(&self, current_year: i32) -> ExportRequest {
        let mut cause = CauseFilter::new(self.causes.iter().map(String::as_str));
        cause.enabled = self.include_cause;
        ExportRequest {
            month_start: self.month_start,
            month_end: self.month_end,
            sources: SourceSelection {
                partner: self.partner,
                lgu: self.lgu,
            },
            teenage_age: self.teenage_age,
            cause,
            save_path: self.save_path.clone(),
            ..ExportRequest::new(self.kind.into(), self.year.unwrap_or(current_year))
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Export(args) => {
            let now = Local::now().naive_local();
            let request = args.request(now.year());
            let source = JsonFileSource::new(&args.records);
            let path = run_export(&request, &settings, &source, now)?;
            println!("{}", path.display());
        }
    }

    Ok(())
}
