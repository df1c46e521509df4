//! SMARD CSV payload parser
//!
//! Payload layout (language `de`):
//!
//! ```text
//! Datum von;Datum bis;Wind Onshore [MWh] Originalauflösungen
//! 01.07.2024 00:00;01.07.2024 01:00;5.123,25
//! 01.07.2024 01:00;01.07.2024 02:00;-
//! Stündlich aus Originalauflösungen berechnet
//! ```
//!
//! The last line is a resolution footer, not data. Values keep their German
//! formatting; `-` and empty cells become [`MetricValue::Missing`].

use crate::fetcher::{FetcherError, FetcherResult};
use crate::{
    IntervalStamp, MetricDescriptor, MetricSeries, MetricValue, SeriesRow, END_COLUMN,
    START_COLUMN,
};
use csv::{ReaderBuilder, StringRecord, Trim};

/// Field separator of SMARD CSV payloads
pub const FIELD_SEPARATOR: u8 = b';';

/// Words that only appear in the resolution footer
const FOOTER_KEYWORDS: &[&str] = &[
    "Originalauflösungen",
    "Viertelstunde",
    "Stündlich",
    "Auflösung",
];

/// Stateless parser for download-manager CSV bodies
pub struct SmardParser;

impl SmardParser {
    /// Parse a payload into a series for `metric`
    ///
    /// # Errors
    /// Returns [`FetcherError::MalformedPayloadError`] if the interval columns or
    /// the value column are absent, or a row has an unreadable timestamp
    pub fn parse(metric: &MetricDescriptor, body: &str) -> FetcherResult<MetricSeries> {
        let body = body.trim_start_matches('\u{feff}');
        let (table, resolution) = Self::split_footer(body);

        let mut reader = ReaderBuilder::new()
            .delimiter(FIELD_SEPARATOR)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(table.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| FetcherError::MalformedPayloadError(format!("Unreadable header: {e}")))?
            .clone();

        let (start_idx, end_idx, value_idx) = Self::locate_columns(&headers)?;
        let source_column = headers.get(value_idx).unwrap_or_default().to_string();

        let mut rows = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                FetcherError::MalformedPayloadError(format!("Unreadable row {}: {e}", index + 1))
            })?;

            if record.iter().all(str::is_empty) {
                continue;
            }

            let start = Self::parse_stamp(&record, start_idx, index)?;
            let end = Self::parse_stamp(&record, end_idx, index)?;
            let value = record
                .get(value_idx)
                .map(MetricValue::from_source)
                .unwrap_or(MetricValue::Missing);

            rows.push(SeriesRow { start, end, value });
        }

        Ok(MetricSeries {
            metric: metric.clone(),
            source_column,
            resolution,
            rows,
        })
    }

    /// Separate the trailing resolution or provenance footer from the table
    ///
    /// The last non-empty line is kept as data only when it is a separated
    /// record with an interval timestamp in one of its fields; anything else
    /// is the footer. A payload that is only a header has no footer.
    pub fn split_footer(body: &str) -> (&str, Option<String>) {
        let trimmed = body.trim_end();
        let Some(newline) = trimmed.rfind('\n') else {
            return (trimmed, None);
        };

        let last_line = trimmed[newline + 1..].trim();
        if Self::is_footer(last_line) {
            (&trimmed[..newline], Some(last_line.to_string()))
        } else {
            (trimmed, None)
        }
    }

    fn is_footer(line: &str) -> bool {
        if FOOTER_KEYWORDS.iter().any(|keyword| line.contains(keyword)) {
            return true;
        }
        let is_record = line.contains(FIELD_SEPARATOR as char)
            && line
                .split(FIELD_SEPARATOR as char)
                .any(|field| IntervalStamp::parse(field).is_ok());
        !is_record
    }

    /// Indices of interval start, interval end and the value column
    fn locate_columns(headers: &StringRecord) -> FetcherResult<(usize, usize, usize)> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let (Some(start_idx), Some(end_idx)) = (position(START_COLUMN), position(END_COLUMN))
        else {
            return Err(FetcherError::MalformedPayloadError(format!(
                "Expected columns '{START_COLUMN}' and '{END_COLUMN}', got {:?}",
                headers.iter().collect::<Vec<_>>()
            )));
        };

        let value_idx = headers
            .iter()
            .enumerate()
            .position(|(idx, name)| idx != start_idx && idx != end_idx && !name.is_empty())
            .ok_or_else(|| {
                FetcherError::MalformedPayloadError("Payload has no value column".to_string())
            })?;

        Ok((start_idx, end_idx, value_idx))
    }

    fn parse_stamp(record: &StringRecord, idx: usize, row: usize) -> FetcherResult<IntervalStamp> {
        let cell = record.get(idx).unwrap_or_default();
        IntervalStamp::parse(cell)
            .map_err(|e| FetcherError::MalformedPayloadError(format!("Row {}: {e}", row + 1)))
    }
}
