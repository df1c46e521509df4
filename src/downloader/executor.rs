//! Download executor: fetch every catalog metric, merge, write

use crate::diagnostics::{DiagnosticEvent, SharedSink, TracingSink};
use crate::downloader::{DownloadError, RunConfig};
use crate::fetcher::{MetricFetcher, SmardFetcher};
use crate::merge::{merge_series, MergeError, MergedTable};
use crate::output::{CsvTableWriter, OutputWriter, TableWriter};
use crate::MetricSeries;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// File the merged table was written to
    pub output_path: PathBuf,
    /// Data rows written
    pub rows: usize,
    /// Value column labels, left to right
    pub columns: Vec<String>,
    /// Module ids that contributed a column
    pub succeeded: Vec<u64>,
    /// Module ids that were dropped
    pub failed: Vec<u64>,
}

/// Series gathered from the catalog, split by outcome
#[derive(Debug, Default)]
pub struct CollectedSeries {
    /// Non-empty series in catalog order
    pub series: Vec<MetricSeries>,
    /// Module ids that failed or returned no rows
    pub failed: Vec<u64>,
}

/// Orchestrates one download run
pub struct DownloadExecutor {
    fetcher: Arc<dyn MetricFetcher>,
    sink: SharedSink,
}

impl DownloadExecutor {
    /// Create an executor around any fetcher, reporting to `tracing`
    pub fn new(fetcher: Arc<dyn MetricFetcher>) -> Self {
        Self {
            fetcher,
            sink: Arc::new(TracingSink),
        }
    }

    /// Create an executor talking to the configured SMARD endpoint
    ///
    /// # Errors
    /// Returns [`DownloadError::Fetcher`] if the HTTP client cannot be built
    pub fn smard(config: &RunConfig) -> Result<Self, DownloadError> {
        let fetcher = SmardFetcher::new(config.endpoint.clone(), config.timeout)?;
        Ok(Self::new(Arc::new(fetcher)))
    }

    /// Report diagnostics to `sink` instead of `tracing`
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Fetch every catalog metric, dropping the ones that fail
    ///
    /// Up to `config.concurrency` requests are in flight; results keep
    /// catalog order.
    pub async fn collect_series(&self, config: &RunConfig) -> CollectedSeries {
        let window = config.window.resolve(&config.zone);
        debug!(
            from = window.timestamp_from,
            to = window.timestamp_to,
            zone = %config.zone,
            "Resolved window"
        );

        let outcomes: Vec<_> = stream::iter(config.catalog.iter())
            .map(|metric| async move {
                self.sink.emit(&DiagnosticEvent::FetchStarted {
                    module_id: metric.module_id,
                    label: metric.label.clone(),
                });

                let event;
                let outcome = match self.fetcher.fetch_series(metric, &window).await {
                    Ok(series) if series.is_empty() => {
                        event = DiagnosticEvent::EmptySeries {
                            module_id: metric.module_id,
                        };
                        Err(metric.module_id)
                    }
                    Ok(series) => {
                        event = DiagnosticEvent::SeriesLoaded {
                            module_id: metric.module_id,
                            rows: series.len(),
                            resolution: series.resolution.clone(),
                        };
                        Ok(series)
                    }
                    Err(e) => {
                        event = e.to_event(metric.module_id);
                        Err(metric.module_id)
                    }
                };
                self.sink.emit(&event);
                outcome
            })
            .buffered(config.concurrency.max(1))
            .collect()
            .await;

        let mut collected = CollectedSeries::default();
        for outcome in outcomes {
            match outcome {
                Ok(series) => collected.series.push(series),
                Err(module_id) => collected.failed.push(module_id),
            }
        }
        collected
    }

    /// Merge collected series, emitting the merge diagnostics
    ///
    /// # Errors
    /// Returns [`DownloadError::EmptyResult`] when there is nothing to merge
    pub fn merge(&self, collected: CollectedSeries) -> Result<MergedTable, DownloadError> {
        let count = collected.series.len();
        match merge_series(collected.series) {
            Ok(table) => {
                self.sink.emit(&DiagnosticEvent::MergeCompleted {
                    series: count,
                    rows: table.len(),
                });
                Ok(table)
            }
            Err(MergeError::NoSeries) => {
                self.sink.emit(&DiagnosticEvent::NoSeries);
                Err(DownloadError::EmptyResult {
                    failed: collected.failed.len(),
                })
            }
            Err(e) => Err(DownloadError::Merge(e)),
        }
    }

    /// Run the whole pipeline and write the merged table
    ///
    /// Nothing is written when no metric produced data.
    ///
    /// # Errors
    /// Returns [`DownloadError::EmptyResult`] on zero successes and
    /// [`DownloadError::Output`] if the file cannot be written
    pub async fn run(&self, config: &RunConfig) -> Result<RunSummary, DownloadError> {
        info!(
            window = %config.window,
            metrics = config.catalog.len(),
            endpoint = self.fetcher.endpoint(),
            "Starting download"
        );

        let collected = self.collect_series(config).await;
        let succeeded: Vec<u64> = collected
            .series
            .iter()
            .map(|series| series.metric.module_id)
            .collect();
        let failed = collected.failed.clone();

        let table = self.merge(collected)?;

        let mut writer = CsvTableWriter::new(&config.output_path)?;
        let rows = writer.write_table(&table)?;
        writer.close()?;

        self.sink.emit(&DiagnosticEvent::OutputWritten {
            path: config.output_path.display().to_string(),
            rows,
        });

        Ok(RunSummary {
            output_path: config.output_path.clone(),
            rows,
            columns: table.columns().to_vec(),
            succeeded,
            failed,
        })
    }
}
