//! CLI error types and conversions

use crate::downloader::{ConfigError, DownloadError};

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Download error
    #[error("download error: {0}")]
    DownloadError(#[from] DownloadError),
}
