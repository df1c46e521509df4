//! Merged table writers and readers

use crate::MergedTable;

pub mod csv;
pub mod path;

pub use self::csv::{read_table, CsvTableWriter};
pub use path::{default_output_path, DEFAULT_OUTPUT_DIR};

/// Field separator of the output file
pub const OUTPUT_SEPARATOR: u8 = b';';

/// Text written for [`crate::MetricValue::Missing`]
///
/// Distinct from `0`, from an empty cell and from SMARD's own `-` placeholder.
pub const MISSING_MARKER: &str = "NA";

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// File content does not form a merged table
    #[error("parse error: {0}")]
    ParseError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer
pub trait OutputWriter {
    /// Flush any buffered data to disk
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Writer for merged tables
pub trait TableWriter: OutputWriter {
    /// Write header and all rows; returns the number of data rows written
    fn write_table(&mut self, table: &MergedTable) -> OutputResult<usize>;
}
