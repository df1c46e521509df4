//! SMARD download-manager HTTP client
//!
//! One POST per metric with a fixed JSON form. No retries: a failed request
//! is reported and the metric is skipped.

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::fetcher::{FetcherError, FetcherResult};
use crate::window::ResolvedWindow;

/// Public market-data download endpoint
pub const DEFAULT_ENDPOINT: &str =
    "https://www.smard.de/nip-download-manager/nip/download/market-data";

const REQUEST_FORMAT: &str = "CSV";
const REQUEST_REGION: &str = "DE";
const REQUEST_TYPE: &str = "discrete";
const REQUEST_LANGUAGE: &str = "de";
const REQUEST_RESOLUTION: &str = "hour";

/// Request body expected by the download manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    /// Exactly one form per request
    pub request_form: Vec<RequestForm>,
}

/// One download form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestForm {
    /// Response format
    pub format: String,
    /// Requested modules
    #[serde(rename = "moduleIds")]
    pub module_ids: Vec<u64>,
    /// Country code
    pub region: String,
    /// Window start, epoch milliseconds
    pub timestamp_from: i64,
    /// Window end, epoch milliseconds
    pub timestamp_to: i64,
    /// Series type
    #[serde(rename = "type")]
    pub kind: String,
    /// Language of headers and number formatting
    pub language: String,
    /// Temporal resolution
    pub resolution: String,
}

impl DownloadRequest {
    /// Hourly CSV request for a single module in the DE region
    pub fn for_module(module_id: u64, window: &ResolvedWindow) -> Self {
        Self {
            request_form: vec![RequestForm {
                format: REQUEST_FORMAT.to_string(),
                module_ids: vec![module_id],
                region: REQUEST_REGION.to_string(),
                timestamp_from: window.timestamp_from,
                timestamp_to: window.timestamp_to,
                kind: REQUEST_TYPE.to_string(),
                language: REQUEST_LANGUAGE.to_string(),
                resolution: REQUEST_RESOLUTION.to_string(),
            }],
        }
    }
}

/// HTTP client for the download manager
#[derive(Debug, Clone)]
pub struct SmardHttpClient {
    client: Client,
    endpoint: String,
}

impl SmardHttpClient {
    /// Create a client with a request timeout
    ///
    /// # Errors
    /// Returns [`FetcherError::NetworkError`] if the TLS backend cannot be set up
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> FetcherResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetcherError::NetworkError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Wrap an existing reqwest client
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the form and return the CSV body
    ///
    /// # Errors
    /// - [`FetcherError::NetworkError`] if sending or reading fails (including timeout)
    /// - [`FetcherError::HttpStatusError`] for any non-2xx status
    /// - [`FetcherError::MalformedPayloadError`] if the body is not UTF-8
    pub async fn download_csv(&self, request: &DownloadRequest) -> FetcherResult<String> {
        debug!(
            "POST {} modules={:?}",
            self.endpoint,
            request
                .request_form
                .iter()
                .flat_map(|form| form.module_ids.iter())
                .collect::<Vec<_>>()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| FetcherError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!("Download manager answered {}", status);
            return Err(FetcherError::HttpStatusError {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetcherError::NetworkError(format!("Failed to read body: {e}")))?;

        debug!("Received {} bytes", bytes.len());

        String::from_utf8(bytes.to_vec()).map_err(|e| {
            FetcherError::MalformedPayloadError(format!("Response is not valid UTF-8: {e}"))
        })
    }
}
