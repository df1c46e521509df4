//! Metric fetchers
//!
//! A fetcher turns one [`MetricDescriptor`] plus a [`ResolvedWindow`] into a
//! [`MetricSeries`]. Errors are returned to the caller, which decides how to
//! degrade; the download executor drops the metric and keeps going.

use crate::diagnostics::DiagnosticEvent;
use crate::window::ResolvedWindow;
use crate::{MetricDescriptor, MetricSeries};
use async_trait::async_trait;

pub mod smard;
pub mod smard_http;
pub mod smard_parser;

pub use smard::SmardFetcher;
pub use smard_http::{DownloadRequest, SmardHttpClient};
pub use smard_parser::SmardParser;

/// Fetcher errors; all of them are recoverable per metric
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Request could not be sent, or timed out
    #[error("network error: {0}")]
    NetworkError(String),

    /// Portal answered with a non-success status
    #[error("HTTP status {status}")]
    HttpStatusError {
        /// Status code
        status: u16,
    },

    /// Body is not the expected CSV layout
    #[error("malformed payload: {0}")]
    MalformedPayloadError(String),
}

impl FetcherError {
    /// Diagnostic reporting this error for `module_id`
    pub fn to_event(&self, module_id: u64) -> DiagnosticEvent {
        match self {
            FetcherError::NetworkError(message) => DiagnosticEvent::NetworkFailure {
                module_id,
                message: message.clone(),
            },
            FetcherError::HttpStatusError { status } => DiagnosticEvent::HttpStatus {
                module_id,
                status: *status,
            },
            FetcherError::MalformedPayloadError(reason) => DiagnosticEvent::MalformedPayload {
                module_id,
                reason: reason.clone(),
            },
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Source of metric series
#[async_trait]
pub trait MetricFetcher: Send + Sync {
    /// Download and parse one metric
    ///
    /// # Arguments
    /// * `metric` - Catalog entry to fetch
    /// * `window` - Requested window in epoch milliseconds
    ///
    /// # Errors
    /// Returns [`FetcherError`] on network, HTTP status or payload problems
    async fn fetch_series(
        &self,
        metric: &MetricDescriptor,
        window: &ResolvedWindow,
    ) -> FetcherResult<MetricSeries>;

    /// Endpoint the fetcher talks to
    fn endpoint(&self) -> &str;
}
