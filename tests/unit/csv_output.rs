//! Unit tests for the merged-table writer

use smard_downloader::output::{read_table, CsvTableWriter, OutputWriter, TableWriter};
use smard_downloader::{merge_series, IntervalStamp, MetricDescriptor, MetricSeries, MetricValue, SeriesRow};
use tempfile::TempDir;

fn series(id: u64, label: &str, rows: &[(&str, &str, &str)]) -> MetricSeries {
    MetricSeries {
        metric: MetricDescriptor::new(id, label),
        source_column: label.to_string(),
        resolution: None,
        rows: rows
            .iter()
            .map(|(start, end, value)| SeriesRow {
                start: IntervalStamp::parse(start).unwrap(),
                end: IntervalStamp::parse(end).unwrap(),
                value: MetricValue::from_source(value),
            })
            .collect(),
    }
}

#[test]
fn test_write_then_read_is_exact() {
    let table = merge_series(vec![
        series(
            1004067,
            "Wind Onshore [MW]",
            &[
                ("01.07.2024 00:00", "01.07.2024 01:00", "4.210,5"),
                ("01.07.2024 01:00", "01.07.2024 02:00", "-"),
                ("01.07.2024 02:00", "01.07.2024 03:00", "0"),
            ],
        ),
        series(
            8004169,
            "Deutschland/Luxemburg [€/MWh]",
            &[
                ("01.07.2024 01:00", "01.07.2024 02:00", "-0,01"),
                ("01.07.2024 03:00", "01.07.2024 04:00", "101,20"),
            ],
        ),
    ])
    .unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out").join("merged.csv");
    let mut writer = CsvTableWriter::new(&path).unwrap();
    assert_eq!(writer.write_table(&table).unwrap(), 4);
    writer.close().unwrap();

    let reread = read_table(&path).unwrap();
    assert_eq!(reread, table);

    let missing = reread
        .rows()
        .iter()
        .flat_map(|row| row.values.iter())
        .filter(|v| v.is_missing())
        .count();
    assert_eq!(missing, 4);
}

#[test]
fn test_missing_marker_is_not_zero_or_empty() {
    let table = merge_series(vec![series(
        1,
        "A",
        &[
            ("01.07.2024 00:00", "01.07.2024 01:00", ""),
            ("01.07.2024 01:00", "01.07.2024 02:00", "0"),
        ],
    )])
    .unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a.csv");
    let mut writer = CsvTableWriter::new(&path).unwrap();
    writer.write_table(&table).unwrap();
    writer.close().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[1], "01.07.2024 00:00;01.07.2024 01:00;NA");
    assert_eq!(lines[2], "01.07.2024 01:00;01.07.2024 02:00;0");
}

#[test]
fn test_literal_na_source_cell_round_trips() {
    let table = merge_series(vec![series(
        1004071,
        "Erdgas [MW]",
        &[
            ("01.07.2024 00:00", "01.07.2024 01:00", "NA"),
            ("01.07.2024 01:00", "01.07.2024 02:00", "1.020,75"),
        ],
    )])
    .unwrap();
    assert!(table.rows()[0].values[0].is_missing());

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("na.csv");
    let mut writer = CsvTableWriter::new(&path).unwrap();
    writer.write_table(&table).unwrap();
    writer.close().unwrap();

    assert_eq!(read_table(&path).unwrap(), table);
}
