//! Unit tests for the metric catalog

use smard_downloader::downloader::ConfigError;
use smard_downloader::MetricCatalog;
use tempfile::TempDir;

#[test]
fn test_embedded_catalog_order_and_labels() {
    let catalog = MetricCatalog::embedded().unwrap();

    let ids: Vec<u64> = catalog.iter().map(|m| m.module_id).collect();
    assert_eq!(ids, vec![1004067, 1004068, 1004071, 5000410, 8004169]);
    assert_eq!(
        catalog.labels(),
        vec![
            "Wind Onshore [MW]",
            "Photovoltaik [MW]",
            "Erdgas [MW]",
            "Verbrauch [MW]",
            "Deutschland/Luxemburg [€/MWh]",
        ]
    );
}

#[test]
fn test_catalog_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("catalog.json");
    let catalog = MetricCatalog::embedded().unwrap();

    std::fs::write(&path, catalog.to_json().unwrap()).unwrap();
    let loaded = MetricCatalog::from_path(&path).unwrap();

    assert_eq!(loaded, catalog);
}

#[test]
fn test_custom_catalog_keeps_file_order() {
    let json = r#"{"metrics": [
        {"module_id": 5000410, "label": "Load"},
        {"module_id": 1004067, "label": "Wind"}
    ]}"#;
    let catalog = MetricCatalog::from_json(json).unwrap();

    assert_eq!(catalog.labels(), vec!["Load", "Wind"]);
    assert_eq!(catalog.get(1004067).map(|m| m.label.as_str()), Some("Wind"));
    assert!(catalog.get(42).is_none());
}

#[test]
fn test_missing_catalog_file() {
    let dir = TempDir::new().unwrap();
    let result = MetricCatalog::from_path(&dir.path().join("absent.json"));

    assert!(matches!(result, Err(ConfigError::InvalidCatalog(_))));
}
