//! Integration tests for logging and tracing

use smard_downloader::diagnostics::{DiagnosticEvent, DiagnosticSink, TracingSink};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// In-memory log target shared with the subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

/// Run `f` with a scoped plain-text subscriber and return what it logged
fn capture_plain(filter: &str, f: impl FnOnce()) -> String {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    logs.contents()
}

/// Run `f` with a scoped JSON subscriber and return what it logged
fn capture_json(filter: &str, f: impl FnOnce()) -> String {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    logs.contents()
}

fn all_events() -> Vec<DiagnosticEvent> {
    vec![
        DiagnosticEvent::FetchStarted {
            module_id: 1004067,
            label: "Wind Onshore [MW]".to_string(),
        },
        DiagnosticEvent::SeriesLoaded {
            module_id: 1004067,
            rows: 8760,
            resolution: Some("Stündlich aus Originalauflösungen berechnet".to_string()),
        },
        DiagnosticEvent::EmptySeries { module_id: 1 },
        DiagnosticEvent::HttpStatus {
            module_id: 2,
            status: 500,
        },
        DiagnosticEvent::NetworkFailure {
            module_id: 3,
            message: "timed out".to_string(),
        },
        DiagnosticEvent::MalformedPayload {
            module_id: 4,
            reason: "no header".to_string(),
        },
        DiagnosticEvent::MergeCompleted {
            series: 2,
            rows: 8760,
        },
        DiagnosticEvent::NoSeries,
        DiagnosticEvent::OutputWritten {
            path: "data/out.csv".to_string(),
            rows: 8760,
        },
    ]
}

#[test]
fn test_tracing_sink_logs_one_line_per_event() {
    let events = all_events();
    let output = capture_plain("smard_downloader=info", || {
        for event in &events {
            TracingSink.emit(event);
        }
    });

    // The resolution footer is debug-level and filtered out at info
    assert_eq!(output.lines().count(), events.len());
    assert!(!output.contains("Resolution footer"));
    assert!(output.contains("Download failed with HTTP status"));
    assert!(output.contains("module_id=2"));
    assert!(output.contains("status=500"));
    assert!(output.contains("error=timed out"));
    assert!(output.contains("path=data/out.csv"));
}

#[test]
fn test_debug_filter_includes_resolution_footer() {
    let output = capture_plain("smard_downloader=debug", || {
        TracingSink.emit(&DiagnosticEvent::SeriesLoaded {
            module_id: 1004067,
            rows: 24,
            resolution: Some("Stündlich".to_string()),
        });
    });

    assert_eq!(output.lines().count(), 2);
    assert!(output.contains("Resolution footer"));
    assert!(output.contains("DEBUG"));
}

#[test]
fn test_filter_for_other_crate_silences_diagnostics() {
    let output = capture_plain("reqwest=trace", || {
        for event in &all_events() {
            TracingSink.emit(event);
        }
    });

    assert!(output.is_empty());
}

#[test]
fn test_tracing_json_format() {
    let output = capture_json("smard_downloader=info", || {
        TracingSink.emit(&DiagnosticEvent::HttpStatus {
            module_id: 1004068,
            status: 503,
        });
    });

    let line: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
    assert_eq!(line["level"], "WARN");
    assert_eq!(line["fields"]["module_id"], 1004068);
    assert_eq!(line["fields"]["status"], 503);
    assert_eq!(
        line["fields"]["message"],
        "Download failed with HTTP status, skipping"
    );
}

#[test]
fn test_env_filter_level_hints() {
    assert_eq!(
        EnvFilter::new("smard_downloader=info").max_level_hint(),
        Some(LevelFilter::INFO)
    );
    assert_eq!(
        EnvFilter::new("smard_downloader::fetcher=trace,reqwest=warn").max_level_hint(),
        Some(LevelFilter::TRACE)
    );
}
