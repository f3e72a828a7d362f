//! Command-line options for `era5-download`.

use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Download hourly ERA5 data from the Copernicus Climate Data Store, one file
/// per day and dataset.
#[derive(Parser, Debug)]
#[command(name = "era5-download", version)]
pub struct Args {
    /// Configuration file (YAML, or TOML with a .toml extension)
    #[arg(short, long)]
    pub config: PathBuf,

    /// First day to download, YYYYMMDD
    #[arg(short, long = "start-date", alias = "start_date", value_parser = parse_date)]
    pub start_date: NaiveDate,

    /// Last day to download (inclusive), YYYYMMDD
    #[arg(short, long = "end-date", alias = "end_date", value_parser = parse_date)]
    pub end_date: NaiveDate,

    /// Output directory; overrides download.output_dir
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Download through the batched worker pool (default)
    ///
    /// Parallel is already the default; `-p` is accepted so existing
    /// download scripts keep working.
    #[arg(short, long, conflicts_with = "sequential")]
    pub parallel: bool,

    /// Download one file at a time
    #[arg(long)]
    pub sequential: bool,

    /// Requests submitted together in parallel mode; overrides download.batch_size
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub batch_size: Option<u16>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl Args {
    /// Parallel unless `--sequential` was given.
    pub fn use_parallel(&self) -> bool {
        !self.sequential
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y%m%d")
        .map_err(|e| format!("expected a date in YYYYMMDD format, got {:?} ({})", s, e))
}
