//! # SMARD Downloader Library
//!
//! Downloads historical energy-market time series (generation by source,
//! consumption, day-ahead price) from the SMARD data portal and merges the
//! per-metric CSV payloads into one table aligned on the time interval.
//!
//! ## Quick Start
//!
//! ```no_run
//! use smard_downloader::downloader::{DownloadExecutor, RunConfig};
//! use smard_downloader::registry::MetricCatalog;
//! use smard_downloader::window::TimeWindow;
//! use chrono::NaiveDate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let from = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let to = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//!
//! let config = RunConfig::new(TimeWindow::new(from, to)?, MetricCatalog::embedded()?)?;
//! let executor = DownloadExecutor::smard(&config)?;
//! let summary = executor.run(&config).await?;
//! println!("wrote {} rows to {}", summary.rows, summary.output_path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`window`] - Calendar window to epoch milliseconds in the portal's timezone
//! - [`registry`] - Ordered catalog of module identifiers and column labels
//! - [`fetcher`] - HTTP download and CSV payload parsing, one metric at a time
//! - [`merge`] - Full outer join of all series on the interval columns
//! - [`output`] - Semicolon-separated writer and reader for the merged table
//! - [`downloader`] - Run configuration and orchestration
//! - [`diagnostics`] - Structured events emitted while a run progresses
//!
//! ## Failure Policy
//!
//! A metric that fails to download or parse contributes nothing; the run
//! carries on with the rest. Only "no metric succeeded" and output I/O
//! failures fail the whole run.

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// CLI command implementations
pub mod cli;

/// Structured run diagnostics
pub mod diagnostics;

/// Run configuration and orchestration
pub mod downloader;

/// Metric fetchers
pub mod fetcher;

/// Outer join of metric series
pub mod merge;

/// Merged table writers and readers
pub mod output;

/// Metric catalog
pub mod registry;

/// Time window resolution
pub mod window;

pub use merge::{merge_series, MergedRow, MergedTable};
pub use registry::MetricCatalog;
pub use window::{ResolvedWindow, TimeWindow, WindowZone};

/// Header of the interval-start column in SMARD payloads and in the output
pub const START_COLUMN: &str = "Datum von";

/// Header of the interval-end column in SMARD payloads and in the output
pub const END_COLUMN: &str = "Datum bis";

/// Cell contents read as "no observation": SMARD's placeholders plus the
/// output missing marker, so written tables read back unchanged
const SOURCE_MISSING_TOKENS: &[&str] = &["", "-", output::MISSING_MARKER];

/// Accepted timestamp layouts, German portal format first
const TIMESTAMP_FORMATS: &[&str] = &[
    "%d.%m.%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Accepted date-only layouts (daily resolution payloads)
const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%Y-%m-%d"];

/// One metric of the portal's catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricDescriptor {
    /// Opaque SMARD module identifier
    pub module_id: u64,
    /// Column header used in the merged output
    pub label: String,
}

impl MetricDescriptor {
    /// Create a descriptor
    pub fn new(module_id: u64, label: impl Into<String>) -> Self {
        Self {
            module_id,
            label: label.into(),
        }
    }
}

/// Interval boundary as delivered by the portal
///
/// Equality and hashing use the raw text, which is what rows are joined on.
/// [`IntervalStamp::at`] gives the parsed value used for ordering.
#[derive(Debug, Clone)]
pub struct IntervalStamp {
    raw: String,
    at: NaiveDateTime,
}

impl IntervalStamp {
    /// Parse a timestamp cell, keeping its original text
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();

        for format in TIMESTAMP_FORMATS {
            if let Ok(at) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Self {
                    raw: trimmed.to_string(),
                    at,
                });
            }
        }

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                if let Some(at) = date.and_hms_opt(0, 0, 0) {
                    return Ok(Self {
                        raw: trimmed.to_string(),
                        at,
                    });
                }
            }
        }

        Err(format!("Unrecognized timestamp: '{trimmed}'"))
    }

    /// Original text
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed calendar value
    pub fn at(&self) -> NaiveDateTime {
        self.at
    }
}

impl PartialEq for IntervalStamp {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for IntervalStamp {}

impl Hash for IntervalStamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl std::fmt::Display for IntervalStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// A metric observation, or the explicit absence of one
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MetricValue {
    /// Value text exactly as delivered (German number formatting)
    Value(String),
    /// No observation for this interval
    Missing,
}

impl MetricValue {
    /// Interpret a source cell; SMARD placeholders become [`MetricValue::Missing`]
    pub fn from_source(raw: &str) -> Self {
        let trimmed = raw.trim();
        if SOURCE_MISSING_TOKENS.contains(&trimmed) {
            MetricValue::Missing
        } else {
            MetricValue::Value(trimmed.to_string())
        }
    }

    /// Whether this is the missing marker
    pub fn is_missing(&self) -> bool {
        matches!(self, MetricValue::Missing)
    }

    /// Raw text, if present
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetricValue::Value(text) => Some(text),
            MetricValue::Missing => None,
        }
    }

    /// Parse a German-formatted number (`1.234,56`) into a decimal
    ///
    /// Returns `Ok(None)` for missing values.
    pub fn to_decimal(&self) -> Result<Option<Decimal>, String> {
        let Some(text) = self.as_str() else {
            return Ok(None);
        };

        let normalized = text.replace('.', "").replace(',', ".");
        Decimal::from_str(&normalized)
            .map(Some)
            .map_err(|e| format!("Invalid number '{text}': {e}"))
    }
}

/// One row of a metric series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRow {
    /// Interval start
    pub start: IntervalStamp,
    /// Interval end
    pub end: IntervalStamp,
    /// Observation
    pub value: MetricValue,
}

/// Parsed response for one metric
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    /// Metric this series belongs to
    pub metric: MetricDescriptor,
    /// Value column header as delivered by the portal
    pub source_column: String,
    /// Resolution footer line, if the payload carried one
    pub resolution: Option<String>,
    /// Rows in payload order
    pub rows: Vec<SeriesRow>,
}

impl MetricSeries {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the series has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
