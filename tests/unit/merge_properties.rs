//! Outer-join properties of the merger

use smard_downloader::{
    merge_series, IntervalStamp, MetricDescriptor, MetricSeries, MetricValue, SeriesRow,
};

/// Hourly row starting at `hour` on 1 July 2024
fn hourly(hour: u32, value: &str) -> SeriesRow {
    SeriesRow {
        start: IntervalStamp::parse(&format!("01.07.2024 {hour:02}:00")).unwrap(),
        end: IntervalStamp::parse(&format!("01.07.2024 {:02}:00", hour + 1)).unwrap(),
        value: MetricValue::from_source(value),
    }
}

fn series(id: u64, rows: Vec<SeriesRow>) -> MetricSeries {
    let label = format!("Metric {id}");
    MetricSeries {
        metric: MetricDescriptor::new(id, label.clone()),
        source_column: label,
        resolution: None,
        rows,
    }
}

#[test]
fn test_disjoint_keys_keep_every_row() {
    let left = series(1, vec![hourly(0, "1"), hourly(1, "2")]);
    let right = series(2, vec![hourly(5, "3"), hourly(6, "4"), hourly(7, "5")]);

    let table = merge_series(vec![left, right]).unwrap();

    assert_eq!(table.len(), 5);
    for row in table.rows() {
        let present = row.values.iter().filter(|v| !v.is_missing()).count();
        assert_eq!(present, 1, "exactly one side populated per row");
    }
}

#[test]
fn test_identical_keys_fill_both_sides() {
    let left = series(1, (0..4).map(|h| hourly(h, "1")).collect());
    let right = series(2, (0..4).map(|h| hourly(h, "2")).collect());

    let table = merge_series(vec![left, right]).unwrap();

    assert_eq!(table.len(), 4);
    assert!(table
        .rows()
        .iter()
        .all(|row| row.values.iter().all(|v| !v.is_missing())));
}

#[test]
fn test_output_sorted_for_any_input_order() {
    let orders: [[u32; 4]; 3] = [[3, 1, 0, 2], [0, 1, 2, 3], [2, 3, 1, 0]];

    for order in orders {
        let left = series(1, order.iter().map(|h| hourly(*h, "1")).collect());
        let right = series(2, order.iter().rev().map(|h| hourly(*h + 2, "2")).collect());

        let table = merge_series(vec![left, right]).unwrap();
        let starts: Vec<_> = table.rows().iter().map(|row| row.start.at()).collect();
        let mut sorted = starts.clone();
        sorted.sort();

        assert_eq!(starts, sorted, "order {order:?}");
        assert_eq!(table.len(), 6);
    }
}

#[test]
fn test_dropping_a_metric_leaves_others_unchanged() {
    let first = series(1, vec![hourly(0, "10"), hourly(1, "11")]);
    let second = series(2, vec![hourly(1, "20"), hourly(2, "21")]);
    let third = series(3, vec![hourly(0, "30"), hourly(3, "31")]);

    let all = merge_series(vec![first.clone(), second, third.clone()]).unwrap();
    let without_second = merge_series(vec![first, third]).unwrap();

    for label in ["Metric 1", "Metric 3"] {
        let keyed = |table: &smard_downloader::MergedTable| -> Vec<(String, MetricValue)> {
            let idx = table.column_index(label).unwrap();
            table
                .rows()
                .iter()
                .filter(|row| !row.values[idx].is_missing())
                .map(|row| (row.start.to_string(), row.values[idx].clone()))
                .collect()
        };
        assert_eq!(keyed(&all), keyed(&without_second), "column {label}");
    }
    assert_eq!(without_second.columns(), ["Metric 1", "Metric 3"]);
}

#[test]
fn test_repeated_dst_hour_pairs_by_occurrence() {
    // 27.10.2024 02:00 occurs twice in Europe/Berlin
    let stamp = |s: &str| IntervalStamp::parse(s).unwrap();
    let doubled = |value_a: &str, value_b: &str| {
        vec![
            SeriesRow {
                start: stamp("27.10.2024 02:00"),
                end: stamp("27.10.2024 03:00"),
                value: MetricValue::from_source(value_a),
            },
            SeriesRow {
                start: stamp("27.10.2024 02:00"),
                end: stamp("27.10.2024 03:00"),
                value: MetricValue::from_source(value_b),
            },
        ]
    };

    let table = merge_series(vec![series(1, doubled("a1", "a2")), series(2, doubled("b1", "b2"))])
        .unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[0].values[0].as_str(), Some("a1"));
    assert_eq!(table.rows()[0].values[1].as_str(), Some("b1"));
    assert_eq!(table.rows()[1].values[0].as_str(), Some("a2"));
    assert_eq!(table.rows()[1].values[1].as_str(), Some("b2"));
}

#[test]
fn test_single_series_is_passed_through_sorted() {
    let only = series(1, vec![hourly(2, "c"), hourly(0, "a"), hourly(1, "b")]);

    let table = merge_series(vec![only]).unwrap();

    let values: Vec<_> = table
        .column_values("Metric 1")
        .unwrap()
        .into_iter()
        .filter_map(MetricValue::as_str)
        .collect();
    assert_eq!(values, ["a", "b", "c"]);
}
