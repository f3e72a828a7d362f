mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use era5_core::{
    load_config, validate_config, CdsClient, CdsCredentials, DateRange, FetchOrchestrator,
    RunConfig, TaskStatus,
};

use cli::Args;

const DEFAULT_FILTER: &str = "info,reqwest=warn,hyper=warn";
const VERBOSE_FILTER: &str = "info,era5_core=debug,era5_download=debug,reqwest=warn,hyper=warn";

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.json_logs);

    if let Err(e) = run(args).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, json: bool) {
    let default_filter = if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(args: Args) -> Result<()> {
    info!("Starting the ERA5 data download");

    // Load configuration
    info!("Loading configuration from {:?}", args.config);
    let config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    validate_config(&config).context("Configuration validation failed")?;

    // Reject bad ranges before touching credentials or the filesystem
    let range = DateRange::new(args.start_date, args.end_date)?;

    let run_config = Arc::new(RunConfig::from_config(&config, args.output.as_deref())?);
    info!("Output directory: {:?}", run_config.output_root);

    let mut download = config.download.clone();
    if let Some(batch_size) = args.batch_size {
        download.batch_size = usize::from(batch_size);
    }

    let credentials = CdsCredentials::load(config.cds.credentials.as_deref())
        .context("Failed to load CDS API credentials")?;
    info!("Using CDS API at {}", credentials.url());
    let client = CdsClient::new(credentials, &config.cds).context("Failed to create CDS client")?;

    let orchestrator = FetchOrchestrator::new(Arc::new(client), &download);
    let report = orchestrator
        .run(range.start(), range.end(), run_config, args.use_parallel())
        .await?;

    if let Some(path) = &args.report {
        let json = serde_json::to_vec_pretty(&report).context("Failed to serialize run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write run report to {:?}", path))?;
        info!("Run report written to {:?}", path);
    }

    for outcome in report.failures() {
        if let TaskStatus::Failed { error, transient } = &outcome.status {
            warn!(
                transient,
                "Not downloaded: {} {} ({})", outcome.date, outcome.kind, error
            );
        }
    }

    info!(
        "Finished: {} of {} files downloaded, {} failed",
        report.succeeded(),
        report.total(),
        report.failed()
    );

    Ok(())
}
