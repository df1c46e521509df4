//! Run configuration and defaults

use crate::fetcher::smard_http::DEFAULT_ENDPOINT;
use crate::output::{default_output_path, DEFAULT_OUTPUT_DIR};
use crate::registry::MetricCatalog;
use crate::window::{TimeWindow, WindowZone};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Request timeout per metric.
/// A full year of hourly data is a few hundred KB; 60 seconds covers a slow portal.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Metrics fetched at once. Sequential unless asked otherwise.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Upper bound for parallel fetches
pub const MAX_CONCURRENCY: usize = 16;

/// Configuration errors, raised before any request is sent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Window start is not before its end
    #[error("invalid window: from {from} must be before to {to}")]
    InvertedWindow {
        /// Requested start
        from: NaiveDateTime,
        /// Requested end
        to: NaiveDateTime,
    },

    /// Catalog has no metrics
    #[error("metric catalog is empty")]
    EmptyCatalog,

    /// Two catalog entries share a module identifier
    #[error("duplicate module id in catalog: {0}")]
    DuplicateModuleId(u64),

    /// Two catalog entries share a label
    #[error("duplicate label in catalog: {0}")]
    DuplicateLabel(String),

    /// Catalog could not be read or parsed
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Concurrency outside `1..=MAX_CONCURRENCY`
    #[error("concurrency must be between 1 and {MAX_CONCURRENCY}, got {0}")]
    InvalidConcurrency(usize),

    /// Unknown timezone name
    #[error("invalid timezone: {0}")]
    InvalidTimeZone(String),

    /// Zero or otherwise unusable timeout
    #[error("invalid timeout: {0:?}")]
    InvalidTimeout(Duration),
}

/// Everything a download run needs
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Requested window, local wall-clock
    pub window: TimeWindow,
    /// Metrics to fetch, in column order
    pub catalog: MetricCatalog,
    /// Download-manager URL
    pub endpoint: String,
    /// Output file
    pub output_path: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
    /// Parallel fetches
    pub concurrency: usize,
    /// Zone the window is interpreted in
    pub zone: WindowZone,
}

impl RunConfig {
    /// Configuration with defaults for everything but window and catalog
    ///
    /// # Errors
    /// Returns [`ConfigError::EmptyCatalog`] for an empty catalog
    pub fn new(window: TimeWindow, catalog: MetricCatalog) -> Result<Self, ConfigError> {
        if catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        let output_path = default_output_path(Path::new(DEFAULT_OUTPUT_DIR), &window);

        Ok(Self {
            window,
            catalog,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            output_path,
            timeout: DEFAULT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            zone: WindowZone::default(),
        })
    }

    /// Set the download-manager URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the output file
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Put the conventionally named output file into `dir`
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_path = default_output_path(dir.as_ref(), &self.window);
        self
    }

    /// Set the per-request timeout
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidTimeout`] for a zero duration
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(timeout));
        }
        self.timeout = timeout;
        Ok(self)
    }

    /// Set how many metrics are fetched at once
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidConcurrency`] outside `1..=MAX_CONCURRENCY`
    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self, ConfigError> {
        if !(1..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(ConfigError::InvalidConcurrency(concurrency));
        }
        self.concurrency = concurrency;
        Ok(self)
    }

    /// Set the zone the window is interpreted in
    pub fn with_zone(mut self, zone: WindowZone) -> Self {
        self.zone = zone;
        self
    }

    /// Parse and set the zone (`local` or an IANA name)
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidTimeZone`] for unknown names
    pub fn with_zone_name(self, name: &str) -> Result<Self, ConfigError> {
        let zone = name.parse().map_err(ConfigError::InvalidTimeZone)?;
        Ok(self.with_zone(zone))
    }
}
