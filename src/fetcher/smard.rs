//! SMARD market-data fetcher

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::fetcher::smard_http::{DownloadRequest, SmardHttpClient};
use crate::fetcher::smard_parser::SmardParser;
use crate::fetcher::{FetcherResult, MetricFetcher};
use crate::window::ResolvedWindow;
use crate::{MetricDescriptor, MetricSeries};

/// Fetches one metric per request from the SMARD download manager
#[derive(Debug, Clone)]
pub struct SmardFetcher {
    http: SmardHttpClient,
}

impl SmardFetcher {
    /// Create a fetcher for `endpoint` with a request timeout
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> FetcherResult<Self> {
        Ok(Self {
            http: SmardHttpClient::new(endpoint, timeout)?,
        })
    }

    /// Create a fetcher around an existing HTTP client
    pub fn with_http_client(http: SmardHttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MetricFetcher for SmardFetcher {
    async fn fetch_series(
        &self,
        metric: &MetricDescriptor,
        window: &ResolvedWindow,
    ) -> FetcherResult<MetricSeries> {
        let request = DownloadRequest::for_module(metric.module_id, window);
        let body = self.http.download_csv(&request).await?;
        let series = SmardParser::parse(metric, &body)?;

        debug!(
            "Parsed module {} ('{}'): {} rows",
            metric.module_id,
            series.source_column,
            series.len()
        );

        Ok(series)
    }

    fn endpoint(&self) -> &str {
        self.http.endpoint()
    }
}
