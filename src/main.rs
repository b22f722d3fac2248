//! CLI entry point for the forecast rater.
//!
//! Fetches forecasts for every configured city, ranks the cities by how
//! favorable their weather is, and writes a CSV report.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use forecast_rater::{
    config::{CityConfig, Settings},
    fetch::{BasicClient, ForecastClient},
    pipeline::Pipeline,
    tasks::{
        fetching::{DEFAULT_MAX_WORKERS, Fetcher},
        pool::{DEFAULT_NUM_WORKERS, WorkerPool},
    },
};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "forecast_rater")]
#[command(about = "Rank cities by how favorable their weather forecast is", long_about = None)]
struct Cli {
    /// JSON file mapping city names to forecast URLs (built-in list if omitted)
    #[arg(long, value_name = "FILE")]
    cities: Option<PathBuf>,

    /// CSV file to write the report to
    #[arg(short, long, default_value = "report.csv")]
    output: PathBuf,

    /// Maximum number of concurrent forecast downloads
    #[arg(long, default_value_t = DEFAULT_MAX_WORKERS)]
    max_workers: usize,

    /// Number of calculation worker threads
    #[arg(long, default_value_t = DEFAULT_NUM_WORKERS)]
    num_workers: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    let settings = Settings::from_env();

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = Path::new(&settings.log_file_path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&settings.log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("forecast_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(settings.log_level()?.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    run(cli)
        .await
        .inspect_err(|e| error!(error = %format!("{e:#}"), "Forecast rating failed"))
}

async fn run(cli: Cli) -> Result<()> {
    let cities = match &cli.cities {
        Some(path) => CityConfig::load(path)?,
        None => CityConfig::default(),
    };
    if cities.is_empty() {
        warn!("City list is empty, the report will only contain a header");
    }
    info!(cities = cities.len(), "Fetching data");

    let timeout = Duration::from_secs(cli.timeout);
    let client = BasicClient::with_connect_timeout(timeout)?;
    let fetcher = Fetcher::new(ForecastClient::new(client))
        .with_max_workers(cli.max_workers)
        .with_timeout(timeout);
    let pipeline = Pipeline::new(fetcher, WorkerPool::new(cli.num_workers));

    let report = pipeline.run(cities.into_targets(), &cli.output).await?;

    info!(
        requested = report.requested,
        fetched = report.fetched,
        analyzed = report.analyzed,
        summarized = report.summarized,
        rows = report.rows,
        output = %cli.output.display(),
        "Finished rating cities"
    );
    if report.favorable.is_empty() {
        warn!("No city could be ranked");
    } else {
        info!(cities = ?report.favorable, "Most favorable for travel");
    }

    Ok(())
}
