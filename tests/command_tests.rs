use graph_trace::commands::{execute_build, next_timestamp, validate_trace_file, BuildArgs};
use graph_trace::output::{read_trace, TraceMode};
use graph_trace::trace::{EventType, Timestamp};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DUMP: &str = r#"{"events": [
    {"event_time": 1000, "event_type": "OPEN", "node_id": 1, "input_ts": 5, "thread_id": 10},
    {"event_time": 1100, "event_type": "OPEN", "node_id": 1, "input_ts": 5, "thread_id": 10, "is_finish": true},
    {"event_time": 1200, "event_type": "PROCESS", "node_id": 1, "input_ts": 6},
    {"event_time": 1300, "event_type": "PROCESS", "node_id": 1, "input_ts": 6, "packet_ts": 6, "stream_id": "frames", "is_finish": true},
    {"event_time": 1400, "event_type": "PROCESS", "node_id": 2, "input_ts": 6, "packet_ts": 6, "stream_id": "frames", "packet_data_id": 4096},
    {"event_time": 1500, "event_type": "PROCESS", "node_id": 2, "input_ts": 6, "is_finish": true}
]}"#;

fn write_dump(dir: &Path) -> std::path::PathBuf {
    let input = dir.join("events.json");
    fs::write(&input, DUMP).unwrap();
    input
}

#[test]
fn test_build_trace_document() {
    let dir = TempDir::new().unwrap();
    let args = BuildArgs {
        input: write_dump(dir.path()),
        output_json: dir.path().join("out").join("trace.json"),
        ..Default::default()
    };

    let document = execute_build(args.clone()).unwrap();
    assert_eq!(document.mode, TraceMode::Trace);
    assert_eq!(document.traces.len(), 1);
    assert_eq!(document.record_count(), 3);

    let trace = &document.traces[0];
    assert_eq!(trace.base_time, 1000);
    assert_eq!(trace.base_timestamp, 5);
    assert_eq!(trace.stream_name, vec!["".to_string(), "frames".to_string()]);
    assert_eq!(trace.calculator_trace[0].event_type, EventType::Open);

    let consumer = &trace.calculator_trace[2];
    assert_eq!(consumer.input_trace[0].start_time, Some(300));
    assert_eq!(consumer.input_trace[0].finish_time, Some(400));
    assert_eq!(consumer.input_trace[0].packet_timestamp, 1);

    let written = read_trace(&args.output_json).unwrap();
    assert_eq!(written, document);
    validate_trace_file(args.output_json).unwrap();
}

#[test]
fn test_build_log_document() {
    let dir = TempDir::new().unwrap();
    let args = BuildArgs {
        input: write_dump(dir.path()),
        output_json: dir.path().join("log.json"),
        mode: TraceMode::Log,
        ..Default::default()
    };

    let document = execute_build(args).unwrap();
    assert_eq!(document.mode, TraceMode::Log);
    assert_eq!(document.record_count(), 6);
}

#[test]
fn test_build_split_windows_share_origin() {
    let dir = TempDir::new().unwrap();
    let args = BuildArgs {
        input: write_dump(dir.path()),
        output_json: dir.path().join("windows.json"),
        window_micros: Some(250),
        ..Default::default()
    };

    let document = execute_build(args).unwrap();
    // [1000, 1250) [1250, 1500) [1500, 1501)
    assert_eq!(document.traces.len(), 3);
    assert!(document.traces.iter().all(|trace| trace.base_time == 1000));
    assert_eq!(document.record_count(), 5);
}

#[test]
fn test_build_explicit_window() {
    let dir = TempDir::new().unwrap();
    let args = BuildArgs {
        input: write_dump(dir.path()),
        output_json: dir.path().join("window.json"),
        mode: TraceMode::Log,
        begin: Some("1200".to_string()),
        end: Some("1970-01-01T00:00:00.0014Z".to_string()),
        ..Default::default()
    };

    let document = execute_build(args).unwrap();
    assert_eq!(document.record_count(), 2);
    assert_eq!(document.traces[0].base_time, 1200);
}

#[test]
fn test_build_with_bounded_buffer() {
    let dir = TempDir::new().unwrap();
    let args = BuildArgs {
        input: write_dump(dir.path()),
        output_json: dir.path().join("tail.json"),
        mode: TraceMode::Log,
        buffer_capacity: Some(2),
        ..Default::default()
    };

    let document = execute_build(args).unwrap();
    assert_eq!(document.record_count(), 2);
    assert_eq!(document.traces[0].base_time, 1400);
}

#[test]
fn test_build_missing_input() {
    let dir = TempDir::new().unwrap();
    let args = BuildArgs {
        input: dir.path().join("missing.json"),
        output_json: dir.path().join("trace.json"),
        ..Default::default()
    };
    assert!(execute_build(args).is_err());
}

#[test]
fn test_next_timestamp() {
    let dir = TempDir::new().unwrap();
    let input = write_dump(dir.path());

    assert_eq!(next_timestamp(&input, "1250").unwrap(), Timestamp::new(7));
    assert!(next_timestamp(&input, "later").is_err());
}

#[test]
fn test_validate_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{\"version\": 1}").unwrap();
    assert!(validate_trace_file(path).is_err());
}
