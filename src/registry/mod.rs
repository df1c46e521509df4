//! Metric catalog
//!
//! Ordered mapping from SMARD module identifiers to output column labels.
//! Catalog order is both the fetch order and the left-to-right column order
//! of the merged table.

use crate::downloader::config::ConfigError;
use crate::MetricDescriptor;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Embedded default catalog
const CATALOG_JSON: &str = include_str!("catalog.json");

/// Default catalog instance (loaded once)
static EMBEDDED: Lazy<Result<MetricCatalog, ConfigError>> =
    Lazy::new(|| MetricCatalog::from_json(CATALOG_JSON));

/// On-disk catalog layout; unknown top-level keys are rejected
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawCatalog {
    #[serde(default)]
    schema_version: Option<String>,
    metrics: Vec<MetricDescriptor>,
}

/// Validated, immutable metric catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricCatalog {
    metrics: Vec<MetricDescriptor>,
}

impl MetricCatalog {
    /// Build a catalog from descriptors in the given order
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if the list is empty or repeats an id or label
    pub fn new(metrics: Vec<MetricDescriptor>) -> Result<Self, ConfigError> {
        if metrics.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        let mut ids = HashSet::new();
        let mut labels = HashSet::new();
        for metric in &metrics {
            if !ids.insert(metric.module_id) {
                return Err(ConfigError::DuplicateModuleId(metric.module_id));
            }
            if metric.label.trim().is_empty() {
                return Err(ConfigError::InvalidCatalog(format!(
                    "module {} has an empty label",
                    metric.module_id
                )));
            }
            if !labels.insert(metric.label.as_str()) {
                return Err(ConfigError::DuplicateLabel(metric.label.clone()));
            }
        }

        Ok(Self { metrics })
    }

    /// Copy of the catalog compiled into the binary
    ///
    /// # Errors
    /// Only fails if the embedded JSON is broken
    pub fn embedded() -> Result<Self, ConfigError> {
        EMBEDDED.as_ref().map(Clone::clone).map_err(Clone::clone)
    }

    /// Parse a catalog from JSON (`{"metrics": [{"module_id": .., "label": ..}]}`)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawCatalog = serde_json::from_str(json)
            .map_err(|e| ConfigError::InvalidCatalog(format!("Failed to parse catalog: {e}")))?;
        Self::new(raw.metrics)
    }

    /// Load a catalog file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidCatalog(format!(
                "Failed to read catalog {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json)
    }

    /// Serialize to the same JSON layout [`MetricCatalog::from_json`] accepts
    pub fn to_json(&self) -> Result<String, ConfigError> {
        let raw = RawCatalog {
            schema_version: Some("1.0".to_string()),
            metrics: self.metrics.clone(),
        };
        serde_json::to_string_pretty(&raw)
            .map_err(|e| ConfigError::InvalidCatalog(format!("Failed to serialize catalog: {e}")))
    }

    /// Descriptors in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.metrics.iter()
    }

    /// Descriptors as a slice
    pub fn metrics(&self) -> &[MetricDescriptor] {
        &self.metrics
    }

    /// Number of metrics
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Always false for a validated catalog
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Look up a descriptor by module id
    pub fn get(&self, module_id: u64) -> Option<&MetricDescriptor> {
        self.metrics.iter().find(|m| m.module_id == module_id)
    }

    /// Column labels in catalog order
    pub fn labels(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.label.as_str()).collect()
    }
}
