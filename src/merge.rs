//! Outer join of metric series
//!
//! Series are joined left to right on the `(Datum von, Datum bis)` pair.
//! Rows present on only one side survive with [`MetricValue::Missing`] on the
//! other. A key that repeats within one series (the doubled hour at the
//! autumn DST switch) is matched by occurrence: the second `02:00` on the left
//! pairs with the second `02:00` on the right, never with both.
//!
//! After the last join the table is stably sorted by parsed interval start.

use crate::{IntervalStamp, MetricSeries, MetricValue, SeriesRow, END_COLUMN, START_COLUMN};
use std::collections::HashMap;

/// Merge errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MergeError {
    /// Nothing to merge: every series was empty or absent
    #[error("no series to merge")]
    NoSeries,

    /// Two series share a column label
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    /// A row does not have one value per column
    #[error("row {row} has {actual} values, expected {expected}")]
    ShapeMismatch {
        /// Row position
        row: usize,
        /// Column count
        expected: usize,
        /// Values found
        actual: usize,
    },
}

/// Result type for merge operations
pub type MergeResult<T> = Result<T, MergeError>;

/// (start text, end text, occurrence of that pair so far)
type JoinKey = (String, String, usize);

/// One row of the merged table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRow {
    /// Interval start
    pub start: IntervalStamp,
    /// Interval end
    pub end: IntervalStamp,
    /// One value per value column, in column order
    pub values: Vec<MetricValue>,
}

/// Wide table keyed by interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedTable {
    start_column: String,
    end_column: String,
    columns: Vec<String>,
    rows: Vec<MergedRow>,
}

impl MergedTable {
    /// Assemble a table from parts, checking every row's width
    ///
    /// # Errors
    /// Returns [`MergeError::ShapeMismatch`] or [`MergeError::DuplicateColumn`]
    pub fn new(
        start_column: impl Into<String>,
        end_column: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<MergedRow>,
    ) -> MergeResult<Self> {
        for (idx, column) in columns.iter().enumerate() {
            if columns[..idx].contains(column) {
                return Err(MergeError::DuplicateColumn(column.clone()));
            }
        }
        for (row, merged) in rows.iter().enumerate() {
            if merged.values.len() != columns.len() {
                return Err(MergeError::ShapeMismatch {
                    row,
                    expected: columns.len(),
                    actual: merged.values.len(),
                });
            }
        }

        Ok(Self {
            start_column: start_column.into(),
            end_column: end_column.into(),
            columns,
            rows,
        })
    }

    /// Single-column table holding one series, in payload order
    pub fn from_series(series: MetricSeries) -> Self {
        let rows = series
            .rows
            .into_iter()
            .map(|SeriesRow { start, end, value }| MergedRow {
                start,
                end,
                values: vec![value],
            })
            .collect();

        Self {
            start_column: START_COLUMN.to_string(),
            end_column: END_COLUMN.to_string(),
            columns: vec![series.metric.label],
            rows,
        }
    }

    /// Full outer join with another series, appended as the rightmost column
    ///
    /// Existing rows keep their order; keys only the new series has are
    /// appended in its order.
    ///
    /// # Errors
    /// Returns [`MergeError::DuplicateColumn`] if the label is already present
    pub fn outer_join(mut self, series: MetricSeries) -> MergeResult<Self> {
        let label = series.metric.label;
        if self.columns.contains(&label) {
            return Err(MergeError::DuplicateColumn(label));
        }

        let width = self.columns.len();
        let mut index: HashMap<JoinKey, usize> = HashMap::with_capacity(self.rows.len());
        let mut seen_left = HashMap::new();
        for (position, row) in self.rows.iter_mut().enumerate() {
            row.values.push(MetricValue::Missing);
            index.insert(occurrence_key(&mut seen_left, &row.start, &row.end), position);
        }

        let mut seen_right = HashMap::new();
        for SeriesRow { start, end, value } in series.rows {
            let key = occurrence_key(&mut seen_right, &start, &end);
            match index.get(&key).and_then(|&pos| self.rows.get_mut(pos)) {
                Some(row) => {
                    if let Some(slot) = row.values.last_mut() {
                        *slot = value;
                    }
                }
                None => {
                    let mut values = vec![MetricValue::Missing; width];
                    values.push(value);
                    self.rows.push(MergedRow { start, end, values });
                }
            }
        }

        self.columns.push(label);
        Ok(self)
    }

    /// Stable sort by parsed interval start
    pub fn sort_by_start(&mut self) {
        self.rows.sort_by_key(|row| row.start.at());
    }

    /// Header of the start column
    pub fn start_column(&self) -> &str {
        &self.start_column
    }

    /// Header of the end column
    pub fn end_column(&self) -> &str {
        &self.end_column
    }

    /// Value column labels, left to right
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Full header row: key columns then value columns
    pub fn headers(&self) -> Vec<&str> {
        let mut headers = Vec::with_capacity(self.columns.len() + 2);
        headers.push(self.start_column.as_str());
        headers.push(self.end_column.as_str());
        headers.extend(self.columns.iter().map(String::as_str));
        headers
    }

    /// Rows in table order
    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a value column
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// All values of one column, in row order
    pub fn column_values(&self, label: &str) -> Option<Vec<&MetricValue>> {
        let idx = self.column_index(label)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.values.get(idx))
                .collect(),
        )
    }
}

fn occurrence_key(
    seen: &mut HashMap<(String, String), usize>,
    start: &IntervalStamp,
    end: &IntervalStamp,
) -> JoinKey {
    let counter = seen
        .entry((start.as_str().to_string(), end.as_str().to_string()))
        .or_insert(0);
    let key = (
        start.as_str().to_string(),
        end.as_str().to_string(),
        *counter,
    );
    *counter += 1;
    key
}

/// Merge series left to right, then sort by interval start
///
/// Empty series are skipped. With a single series the result is that series,
/// sorted.
///
/// # Errors
/// Returns [`MergeError::NoSeries`] if no series has rows
pub fn merge_series(series: Vec<MetricSeries>) -> MergeResult<MergedTable> {
    let mut non_empty = series.into_iter().filter(|s| !s.is_empty());
    let first = non_empty.next().ok_or(MergeError::NoSeries)?;

    let mut table = MergedTable::from_series(first);
    for next in non_empty {
        table = table.outer_join(next)?;
    }

    table.sort_by_start();
    Ok(table)
}
