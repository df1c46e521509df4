//! Structured run diagnostics
//!
//! Fetch and merge code reports what happened through a [`DiagnosticSink`]
//! instead of printing. The binary forwards events to `tracing`; tests and
//! embedders can collect them with [`MemorySink`].

use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Something worth reporting during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    /// Request for a metric is about to be sent
    FetchStarted {
        /// Module identifier
        module_id: u64,
        /// Catalog label
        label: String,
    },
    /// Metric downloaded and parsed
    SeriesLoaded {
        /// Module identifier
        module_id: u64,
        /// Parsed row count
        rows: usize,
        /// Resolution footer, if the payload had one
        resolution: Option<String>,
    },
    /// Payload parsed but held no rows; the metric is dropped
    EmptySeries {
        /// Module identifier
        module_id: u64,
    },
    /// Portal answered with a non-success status; the metric is dropped
    HttpStatus {
        /// Module identifier
        module_id: u64,
        /// HTTP status code
        status: u16,
    },
    /// Request could not be sent or timed out; the metric is dropped
    NetworkFailure {
        /// Module identifier
        module_id: u64,
        /// Transport error text
        message: String,
    },
    /// Payload did not have the expected structure; the metric is dropped
    MalformedPayload {
        /// Module identifier
        module_id: u64,
        /// What was wrong
        reason: String,
    },
    /// All series joined
    MergeCompleted {
        /// Number of series merged
        series: usize,
        /// Rows in the merged table
        rows: usize,
    },
    /// No metric produced data, nothing to merge
    NoSeries,
    /// Merged table written
    OutputWritten {
        /// Output file
        path: String,
        /// Data rows written
        rows: usize,
    },
}

impl DiagnosticEvent {
    /// Module the event refers to, if any
    pub fn module_id(&self) -> Option<u64> {
        match self {
            DiagnosticEvent::FetchStarted { module_id, .. }
            | DiagnosticEvent::SeriesLoaded { module_id, .. }
            | DiagnosticEvent::EmptySeries { module_id }
            | DiagnosticEvent::HttpStatus { module_id, .. }
            | DiagnosticEvent::NetworkFailure { module_id, .. }
            | DiagnosticEvent::MalformedPayload { module_id, .. } => Some(*module_id),
            DiagnosticEvent::MergeCompleted { .. }
            | DiagnosticEvent::NoSeries
            | DiagnosticEvent::OutputWritten { .. } => None,
        }
    }

    /// Whether the event means a metric was dropped
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            DiagnosticEvent::EmptySeries { .. }
                | DiagnosticEvent::HttpStatus { .. }
                | DiagnosticEvent::NetworkFailure { .. }
                | DiagnosticEvent::MalformedPayload { .. }
                | DiagnosticEvent::NoSeries
        )
    }

    /// Whether the event closes the fetch of one metric
    pub fn is_fetch_outcome(&self) -> bool {
        matches!(
            self,
            DiagnosticEvent::SeriesLoaded { .. }
                | DiagnosticEvent::EmptySeries { .. }
                | DiagnosticEvent::HttpStatus { .. }
                | DiagnosticEvent::NetworkFailure { .. }
                | DiagnosticEvent::MalformedPayload { .. }
        )
    }
}

/// Receiver of diagnostic events
pub trait DiagnosticSink: Send + Sync {
    /// Handle one event
    fn emit(&self, event: &DiagnosticEvent);
}

/// Shared sink handle
pub type SharedSink = Arc<dyn DiagnosticSink>;

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, event: &DiagnosticEvent) {
        match event {
            DiagnosticEvent::FetchStarted { module_id, label } => {
                info!(module_id, label = %label, "Fetching metric");
            }
            DiagnosticEvent::SeriesLoaded {
                module_id,
                rows,
                resolution,
            } => {
                info!(module_id, rows, "Metric loaded");
                if let Some(resolution) = resolution {
                    debug!(module_id, resolution = %resolution, "Resolution footer");
                }
            }
            DiagnosticEvent::EmptySeries { module_id } => {
                warn!(module_id, "Metric returned no rows, skipping");
            }
            DiagnosticEvent::HttpStatus { module_id, status } => {
                warn!(module_id, status, "Download failed with HTTP status, skipping");
            }
            DiagnosticEvent::NetworkFailure { module_id, message } => {
                warn!(module_id, error = %message, "Network failure, skipping");
            }
            DiagnosticEvent::MalformedPayload { module_id, reason } => {
                warn!(module_id, reason = %reason, "Invalid payload structure, skipping");
            }
            DiagnosticEvent::MergeCompleted { series, rows } => {
                info!(series, rows, "Series merged");
            }
            DiagnosticEvent::NoSeries => {
                warn!("No metric returned data");
            }
            DiagnosticEvent::OutputWritten { path, rows } => {
                info!(path = %path, rows, "Output written");
            }
        }
    }
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Events that dropped a metric
    pub fn failures(&self) -> Vec<DiagnosticEvent> {
        self.events()
            .into_iter()
            .filter(DiagnosticEvent::is_failure)
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, event: &DiagnosticEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
    }
}

/// Delivers every event to several sinks
#[derive(Default, Clone)]
pub struct FanOutSink {
    sinks: Vec<SharedSink>,
}

impl FanOutSink {
    /// Create an empty fan-out
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl DiagnosticSink for FanOutSink {
    fn emit(&self, event: &DiagnosticEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}
