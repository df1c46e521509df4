//! Output file naming
//!
//! Files are named after the requested window:
//! `data/smard_20240701-20250701_merged.csv`.

use crate::window::TimeWindow;
use std::path::{Path, PathBuf};

/// Directory used when no output path is configured
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Conventional output path for a window inside `dir`
pub fn default_output_path(dir: &Path, window: &TimeWindow) -> PathBuf {
    dir.join(format!(
        "smard_{}-{}_merged.csv",
        window.from().format("%Y%m%d"),
        window.to().format("%Y%m%d")
    ))
}
