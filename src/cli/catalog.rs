//! CLI command for listing the metric catalog

use crate::downloader::ConfigError;
use crate::registry::MetricCatalog;
use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use super::OutputFormat;

/// Load a catalog file, or the embedded catalog when no path is given
pub fn load_catalog(path: Option<&Path>) -> Result<MetricCatalog, ConfigError> {
    match path {
        Some(path) => MetricCatalog::from_path(path),
        None => MetricCatalog::embedded(),
    }
}

/// Catalog subcommand
#[derive(Debug, Args)]
pub struct CatalogCommand {
    /// Catalog JSON file (defaults to the built-in catalog)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "human")]
    pub format: OutputFormat,
}

impl CatalogCommand {
    /// Print the catalog
    pub fn execute(&self) -> Result<()> {
        let catalog = load_catalog(self.catalog.as_deref()).context("Failed to load catalog")?;

        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    catalog
                        .to_json()
                        .context("Failed to serialize catalog to JSON")?
                );
            }
            OutputFormat::Human => {
                println!("{} metrics:\n", catalog.len());
                for metric in catalog.iter() {
                    println!("{:>8} | {}", metric.module_id, metric.label);
                }
            }
        }

        Ok(())
    }
}
