//! Download command implementation

use crate::cli::catalog::{load_catalog, CatalogCommand};
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, FanOutSink, TracingSink};
use crate::downloader::config::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY};
use crate::downloader::{DownloadError, DownloadExecutor, RunConfig, RunSummary};
use crate::fetcher::smard_http::DEFAULT_ENDPOINT;
use crate::window::{TimeWindow, PORTAL_TIME_ZONE};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::CliError;

/// Layouts accepted for `--from` / `--to` besides a bare date
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Parse a window bound from `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM[:SS]`.
///
/// Bounds are wall-clock times in the run's timezone; a bare date means
/// midnight. No offset suffix is accepted since the zone comes from
/// `--timezone`.
pub fn parse_window_bound(input: &str) -> Result<NaiveDateTime, String> {
    let input = input.trim();

    for format in DATETIME_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(at);
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            format!("'{input}' is not a date (YYYY-MM-DD) or datetime (YYYY-MM-DDTHH:MM[:SS])")
        })
}

/// Parse and validate concurrency value
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// SMARD Downloader CLI
#[derive(Parser, Debug)]
#[command(name = "smard-downloader")]
#[command(about = "Download and merge SMARD energy-market time series", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download every catalog metric and write one merged table
    Download(DownloadArgs),

    /// List the metric catalog
    Catalog(CatalogCommand),
}

/// Download command arguments
#[derive(Parser, Debug)]
pub struct DownloadArgs {
    /// Window start, inclusive (YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS])
    #[arg(long, default_value = "2024-07-01", value_parser = parse_window_bound)]
    pub from: NaiveDateTime,

    /// Window end (YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS])
    #[arg(long, default_value = "2025-07-01", value_parser = parse_window_bound)]
    pub to: NaiveDateTime,

    /// Catalog JSON file (defaults to the built-in catalog)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Output file
    #[arg(long, conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Directory for the conventionally named output file (default: "data")
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Download-manager URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: u64,

    /// Metrics fetched at once (default: 1, max: 16)
    ///
    /// Columns keep catalog order regardless of this setting.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY, value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Timezone the window is interpreted in: an IANA name or "local"
    #[arg(long, default_value = PORTAL_TIME_ZONE.name())]
    pub timezone: String,

    /// Disable the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

impl DownloadArgs {
    /// Build the validated run configuration
    pub fn to_config(&self) -> Result<RunConfig, CliError> {
        let window = TimeWindow::new(self.from, self.to)?;
        let catalog = load_catalog(self.catalog.as_deref())?;

        let mut config = RunConfig::new(window, catalog)?
            .with_endpoint(self.endpoint.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))?
            .with_concurrency(self.concurrency)?
            .with_zone_name(&self.timezone)?;

        if let Some(output) = &self.output {
            config = config.with_output_path(output.clone());
        } else if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir);
        }

        Ok(config)
    }

    /// Execute the download
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let config = self.to_config()?;

        let progress = if self.no_progress {
            ProgressBar::hidden()
        } else {
            create_progress_bar(config.catalog.len())
        };
        let sink = FanOutSink::new()
            .with_sink(Arc::new(TracingSink))
            .with_sink(Arc::new(ProgressSink {
                bar: progress.clone(),
            }));

        info!(
            "Downloading {} metrics from {} to {} ({})",
            config.catalog.len(),
            config.window.from(),
            config.window.to(),
            config.zone
        );

        let executor = DownloadExecutor::smard(&config)?.with_sink(Arc::new(sink));
        let result = executor.run(&config).await;

        progress.finish_and_clear();

        match cli.output_format {
            OutputFormat::Json => output_json(&config, &result),
            OutputFormat::Human => output_human(&config, &result),
        }

        result.map(|_| ()).map_err(CliError::DownloadError)
    }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// Output result as a single JSON line
fn output_json(config: &RunConfig, result: &Result<RunSummary, DownloadError>) {
    let output = match result {
        Ok(summary) => serde_json::json!({
            "success": true,
            "from": config.window.from().to_string(),
            "to": config.window.to().to_string(),
            "timezone": config.zone.to_string(),
            "output_path": summary.output_path.display().to_string(),
            "rows": summary.rows,
            "columns": summary.columns,
            "succeeded": summary.succeeded,
            "failed": summary.failed,
        }),
        Err(e) => serde_json::json!({
            "success": false,
            "from": config.window.from().to_string(),
            "to": config.window.to().to_string(),
            "timezone": config.zone.to_string(),
            "output_path": serde_json::Value::Null,
            "error": e.to_string(),
        }),
    };

    println!("{output}");
}

/// Output result in human-readable format
fn output_human(config: &RunConfig, result: &Result<RunSummary, DownloadError>) {
    match result {
        Ok(summary) => {
            println!("\nDownload completed successfully!");
            println!("Window: {} ({})", config.window, config.zone);
            println!("Output: {}", summary.output_path.display());
            println!("Rows written: {}", summary.rows);
            println!("Columns: {}", summary.columns.join(", "));
            if !summary.failed.is_empty() {
                let failed: Vec<String> = summary.failed.iter().map(u64::to_string).collect();
                println!("Skipped metrics: {}", failed.join(", "));
            }
        }
        Err(e) => {
            eprintln!("\nDownload failed!");
            eprintln!("Error: {e}");
        }
    }
}

// ─── Progress bar ────────────────────────────────────────────────────────────

/// Advances a progress bar once per finished metric
struct ProgressSink {
    bar: ProgressBar,
}

impl DiagnosticSink for ProgressSink {
    fn emit(&self, event: &DiagnosticEvent) {
        if let DiagnosticEvent::FetchStarted { label, .. } = event {
            self.bar.set_message(format!("Fetching {label}"));
        } else if event.is_fetch_outcome() {
            self.bar.inc(1);
        }
    }
}

/// Create progress bar with style
fn create_progress_bar(metrics: usize) -> ProgressBar {
    let pb = ProgressBar::new(metrics as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
