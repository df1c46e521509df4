//! Unit tests for the SMARD payload parser

use smard_downloader::fetcher::{FetcherError, SmardParser};
use smard_downloader::{MetricDescriptor, MetricValue};

const PRICE_PAYLOAD: &str = "Datum von;Datum bis;Deutschland/Luxemburg [€/MWh] Originalauflösungen\n\
01.07.2024 00:00;01.07.2024 01:00;78,31\n\
01.07.2024 01:00;01.07.2024 02:00;-3,12\n\
01.07.2024 02:00;01.07.2024 03:00;\n\
01.07.2024 03:00;01.07.2024 04:00;-\n\
Stündlich aus Originalauflösungen berechnet\n";

fn price() -> MetricDescriptor {
    MetricDescriptor::new(8004169, "Deutschland/Luxemburg [€/MWh]")
}

#[test]
fn test_parse_price_payload() {
    let series = SmardParser::parse(&price(), PRICE_PAYLOAD).unwrap();

    assert_eq!(series.len(), 4);
    assert_eq!(
        series.source_column,
        "Deutschland/Luxemburg [€/MWh] Originalauflösungen"
    );
    assert_eq!(
        series.resolution.as_deref(),
        Some("Stündlich aus Originalauflösungen berechnet")
    );
    assert_eq!(series.rows[0].start.as_str(), "01.07.2024 00:00");
    assert_eq!(series.rows[0].end.as_str(), "01.07.2024 01:00");
}

#[test]
fn test_negative_zero_and_missing_are_distinct() {
    let series = SmardParser::parse(&price(), PRICE_PAYLOAD).unwrap();

    assert_eq!(series.rows[1].value, MetricValue::Value("-3,12".to_string()));
    assert_eq!(series.rows[2].value, MetricValue::Missing);
    assert_eq!(series.rows[3].value, MetricValue::Missing);
    assert_eq!(
        series.rows[1].value.to_decimal().unwrap(),
        Some("-3.12".parse().unwrap())
    );
}

#[test]
fn test_header_only_payload_is_empty() {
    let body = "Datum von;Datum bis;Erdgas [MWh] Originalauflösungen\n\
Stündlich aus Originalauflösungen berechnet\n";
    let series = SmardParser::parse(&MetricDescriptor::new(1004071, "Erdgas [MW]"), body).unwrap();

    assert!(series.is_empty());
    assert!(series.resolution.is_some());
}

#[test]
fn test_missing_interval_columns_rejected() {
    let result = SmardParser::parse(&price(), "<html>Service unavailable</html>");
    assert!(matches!(
        result,
        Err(FetcherError::MalformedPayloadError(_))
    ));
}

#[test]
fn test_payload_without_footer() {
    let body = "Datum von;Datum bis;Verbrauch [MWh]\n\
01.07.2024 00:00;01.07.2024 01:00;41.502,00\n";
    let series = SmardParser::parse(&MetricDescriptor::new(5000410, "Verbrauch [MW]"), body).unwrap();

    assert_eq!(series.len(), 1);
    assert!(series.resolution.is_none());
}

#[test]
fn test_split_footer_quarter_hour() {
    let body = "Datum von;Datum bis;X\n01.07.2024 00:00;01.07.2024 00:15;1\nViertelstündlich\n";
    let (table, footer) = SmardParser::split_footer(body);

    assert!(table.ends_with("01.07.2024 00:15;1"));
    assert_eq!(footer.as_deref(), Some("Viertelstündlich"));
}
