//! Download orchestration
//!
//! The executor walks the metric catalog, fetches each metric, drops the
//! ones that fail, merges the rest and writes one table.
//!
//! # Quick Start
//!
//! ```no_run
//! use smard_downloader::downloader::{DownloadExecutor, RunConfig};
//! use smard_downloader::{MetricCatalog, TimeWindow};
//! use chrono::NaiveDate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let from = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let to = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//!
//! let config = RunConfig::new(TimeWindow::new(from, to)?, MetricCatalog::embedded()?)?
//!     .with_output_path("./smard.csv");
//! let summary = DownloadExecutor::smard(&config)?.run(&config).await?;
//! println!("{} rows, {} metrics failed", summary.rows, summary.failed.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Per-metric failures (network, HTTP status, malformed payload) never abort
//! a run; they are reported through [`crate::diagnostics`] and listed in
//! [`RunSummary::failed`]. A run aborts only when:
//! - the configuration is invalid ([`DownloadError::Config`])
//! - no metric produced data ([`DownloadError::EmptyResult`], nothing is written)
//! - the output cannot be written ([`DownloadError::Output`])

pub mod config;
pub mod executor;

pub use config::{ConfigError, RunConfig};
pub use executor::{DownloadExecutor, RunSummary};

use crate::fetcher::FetcherError;
use crate::merge::MergeError;
use crate::output::OutputError;

/// Download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Invalid run configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Fetcher could not be constructed
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// Every metric failed or returned no rows
    #[error("no metric returned data for {failed} requested metrics; nothing written")]
    EmptyResult {
        /// Metrics that were attempted
        failed: usize,
    },

    /// Successful series could not be combined
    #[error("merge error: {0}")]
    Merge(MergeError),

    /// Output could not be written
    #[error("output error: {0}")]
    Output(#[from] OutputError),
}
