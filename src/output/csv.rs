//! Semicolon-separated writer and reader for merged tables

use crate::merge::{MergedRow, MergedTable};
use crate::{IntervalStamp, MetricValue};
use csv::{ReaderBuilder, Writer, WriterBuilder};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{
    OutputError, OutputResult, OutputWriter, TableWriter, MISSING_MARKER, OUTPUT_SEPARATOR,
};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// CSV writer for merged tables
pub struct CsvTableWriter {
    writer: Writer<BufWriter<File>>,
    path: PathBuf,
    rows_written: usize,
}

impl CsvTableWriter {
    /// Create the output file, and its parent directory if needed
    ///
    /// # Errors
    /// Returns [`OutputError::IoError`] if the directory or file cannot be created
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Self::new_with_buffer_size(path, DEFAULT_BUFFER_SIZE)
    }

    /// Create the output file with a custom write buffer size
    pub fn new_with_buffer_size<P: AsRef<Path>>(
        path: P,
        buffer_size: usize,
    ) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV writer: path={}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    OutputError::IoError(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {}", e)))?;

        let buf_writer = BufWriter::with_capacity(buffer_size, file);
        let csv_writer = WriterBuilder::new()
            .delimiter(OUTPUT_SEPARATOR)
            .from_writer(buf_writer);

        Ok(Self {
            writer: csv_writer,
            path: path.to_path_buf(),
            rows_written: 0,
        })
    }

    /// Number of data rows written so far
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Output file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_row(&mut self, row: &MergedRow) -> OutputResult<()> {
        let mut record = Vec::with_capacity(row.values.len() + 2);
        record.push(row.start.as_str());
        record.push(row.end.as_str());
        record.extend(
            row.values
                .iter()
                .map(|value| value.as_str().unwrap_or(MISSING_MARKER)),
        );

        self.writer
            .write_record(&record)
            .map_err(|e| OutputError::CsvError(format!("Failed to write row: {}", e)))?;
        self.rows_written += 1;
        Ok(())
    }
}

impl TableWriter for CsvTableWriter {
    fn write_table(&mut self, table: &MergedTable) -> OutputResult<usize> {
        self.writer
            .write_record(table.headers())
            .map_err(|e| OutputError::CsvError(format!("Failed to write header: {}", e)))?;

        for row in table.rows() {
            self.write_row(row)?;
        }

        debug!("Wrote {} rows to {}", table.len(), self.path.display());
        Ok(table.len())
    }
}

impl OutputWriter for CsvTableWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {}", e)))
    }

    fn close(mut self) -> OutputResult<()> {
        self.flush()?;

        let buf_writer = self.writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get inner writer: {}", e))
        })?;

        let file = buf_writer.into_inner().map_err(|e| {
            OutputError::IoError(format!("Failed to get file handle: {}", e))
        })?;

        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {}", e)))?;

        info!(
            "CSV writer closed successfully: {} rows written",
            self.rows_written
        );
        Ok(())
    }
}

/// Read a file produced by [`CsvTableWriter`] back into a table
///
/// # Errors
/// Returns [`OutputError`] if the file cannot be read or does not have the
/// two interval columns followed by value columns
pub fn read_table<P: AsRef<Path>>(path: P) -> OutputResult<MergedTable> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .delimiter(OUTPUT_SEPARATOR)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| OutputError::IoError(format!("Failed to open {}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| OutputError::CsvError(format!("Failed to read header: {}", e)))?
        .clone();

    let mut names = headers.iter();
    let (Some(start_column), Some(end_column)) = (names.next(), names.next()) else {
        return Err(OutputError::ParseError(
            "Header must start with the two interval columns".to_string(),
        ));
    };
    let columns: Vec<String> = names.map(str::to_string).collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| OutputError::CsvError(format!("Failed to read row {}: {}", index + 1, e)))?;

        let stamp = |field: usize| {
            IntervalStamp::parse(record.get(field).unwrap_or_default())
                .map_err(|e| OutputError::ParseError(format!("Row {}: {}", index + 1, e)))
        };
        let start = stamp(0)?;
        let end = stamp(1)?;
        let values = record
            .iter()
            .skip(2)
            .map(|cell| {
                if cell == MISSING_MARKER {
                    MetricValue::Missing
                } else {
                    MetricValue::Value(cell.to_string())
                }
            })
            .collect();

        rows.push(MergedRow { start, end, values });
    }

    MergedTable::new(start_column, end_column, columns, rows)
        .map_err(|e| OutputError::ParseError(e.to_string()))
}
