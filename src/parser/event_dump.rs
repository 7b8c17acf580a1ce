//! Parser for runtime event dumps.
//!
//! Turns the raw JSON written by the runtime's exporter into `TraceEvent`s.
//! Individual malformed records are skipped with a warning; the dump only
//! fails as a whole when it has records and none of them parse.

use crate::trace::{StreamName, TraceEvent};
use crate::utils::config::EVENT_FIELD_NAMES;
use crate::utils::error::ParseError;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Detected layout of an event dump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    /// A JSON array of events
    Array,
    /// An object holding the event array under a known field
    Wrapped,
    /// One JSON event per line
    JsonLines,
}

/// Parse an event dump
///
/// **Public** - main entry point for parsing
///
/// # Arguments
/// * `raw` - Dump contents
///
/// # Returns
/// Events in dump order, with equal stream names sharing one allocation
///
/// # Errors
/// * `ParseError::InvalidFormat` - No event array found, or every record failed
pub fn parse_events(raw: &str) -> Result<Vec<TraceEvent>, ParseError> {
    let (records, format) = detect_dump_format(raw)?;
    debug!("Event dump is {:?} with {} records", format, records.len());

    let mut events = parse_records(&records)?;
    canonicalize_streams(&mut events);
    Ok(events)
}

/// Read and parse an event dump file
///
/// **Public** - used by commands
pub fn read_events(input_path: impl AsRef<Path>) -> Result<Vec<TraceEvent>, ParseError> {
    let input_path = input_path.as_ref();
    debug!("Reading events from: {}", input_path.display());

    let raw = std::fs::read_to_string(input_path)?;
    parse_events(&raw)
}

/// Split a dump into raw JSON records
///
/// **Private** - internal helper for parse_events
fn detect_dump_format(raw: &str) -> Result<(Vec<serde_json::Value>, DumpFormat), ParseError> {
    let trimmed = raw.trim_start();
    if trimmed.is_empty() {
        return Ok((Vec::new(), DumpFormat::Array));
    }

    // A whole-document parse distinguishes an array or a wrapper from JSON Lines
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Array(records)) => Ok((records, DumpFormat::Array)),
        Ok(serde_json::Value::Object(obj)) => {
            for field in EVENT_FIELD_NAMES {
                if let Some(serde_json::Value::Array(records)) = obj.get(*field) {
                    return Ok((records.clone(), DumpFormat::Wrapped));
                }
            }
            if obj.contains_key("event_time") {
                // A single event is a one-line JSON Lines dump
                return Ok((
                    vec![serde_json::Value::Object(obj)],
                    DumpFormat::JsonLines,
                ));
            }
            Err(ParseError::InvalidFormat(format!(
                "No event array found (expected one of: {})",
                EVENT_FIELD_NAMES.join(", ")
            )))
        }
        Ok(other) => Err(ParseError::InvalidFormat(format!(
            "Dump must be a JSON array or object, found {}",
            other
        ))),
        Err(_) => split_json_lines(raw).map(|records| (records, DumpFormat::JsonLines)),
    }
}

/// Split JSON Lines into records
///
/// **Private** - blank lines are ignored, a malformed line is skipped
fn split_json_lines(raw: &str) -> Result<Vec<serde_json::Value>, ParseError> {
    let mut records = Vec::new();
    let mut failed = 0usize;

    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!("Failed to parse line {}: {}", index + 1, e);
                failed += 1;
            }
        }
    }

    if records.is_empty() && failed > 0 {
        return Err(ParseError::InvalidFormat(
            "Dump is neither JSON nor JSON Lines".to_string(),
        ));
    }
    Ok(records)
}

/// Convert raw records to events
///
/// **Private** - internal parsing logic
fn parse_records(records: &[serde_json::Value]) -> Result<Vec<TraceEvent>, ParseError> {
    let mut events = Vec::with_capacity(records.len());

    for (index, record) in records.iter().enumerate() {
        match serde_json::from_value::<TraceEvent>(record.clone()) {
            Ok(event) => events.push(event),
            Err(e) => {
                // Log but don't fail - some records may be malformed
                warn!("Failed to parse event {}: {}", index, e);
            }
        }
    }

    if events.is_empty() && !records.is_empty() {
        return Err(ParseError::InvalidFormat(
            "All events failed to parse".to_string(),
        ));
    }

    Ok(events)
}

/// Make events with equal stream names share one `Arc<str>`
///
/// **Public** - the id interner resolves shared allocations without
/// comparing strings
pub fn canonicalize_streams(events: &mut [TraceEvent]) {
    let mut canonical: HashMap<StreamName, StreamName> = HashMap::new();
    for event in events.iter_mut() {
        if let Some(stream) = event.stream_id.as_mut() {
            let shared = canonical
                .entry(Arc::clone(stream))
                .or_insert_with(|| Arc::clone(stream));
            *stream = Arc::clone(shared);
        }
    }
    debug!("Canonicalized {} stream names", canonical.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{EventType, Timestamp};

    #[test]
    fn test_parse_array_dump() {
        let raw = r#"[
            {"event_time": 100, "event_type": "PROCESS", "node_id": 1, "input_ts": 5},
            {"event_time": 200, "event_type": 2, "node_id": 1, "input_ts": 5, "is_finish": true}
        ]"#;
        let events = parse_events(raw).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, EventType::Process);
        assert!(events[1].is_finish);
        assert_eq!(events[0].input_ts, Timestamp::new(5));
    }

    #[test]
    fn test_parse_wrapped_dump() {
        let raw = r#"{"events": [{"event_time": 100, "event_type": "OPEN"}]}"#;
        let (records, format) = detect_dump_format(raw).unwrap();
        assert_eq!(format, DumpFormat::Wrapped);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_parse_json_lines_dump() {
        let raw = "{\"event_time\": 100, \"event_type\": \"OPEN\"}\n\n{\"event_time\": 150, \"event_type\": \"CLOSE\"}\n";
        let (records, format) = detect_dump_format(raw).unwrap();
        assert_eq!(format, DumpFormat::JsonLines);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let raw = r#"[{"event_time": "not a number"}, {"event_time": 100}]"#;
        let events = parse_events(raw).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Unknown);
    }

    #[test]
    fn test_all_records_malformed() {
        let raw = r#"[{"node_id": 1}, {"node_id": 2}]"#;
        assert!(matches!(parse_events(raw), Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_unknown_wrapper() {
        assert!(parse_events(r#"{"spans": []}"#).is_err());
        assert!(parse_events("42").is_err());
    }

    #[test]
    fn test_empty_dump() {
        assert!(parse_events("").unwrap().is_empty());
        assert!(parse_events("[]").unwrap().is_empty());
    }

    #[test]
    fn test_stream_names_are_shared() {
        let raw = r#"[
            {"event_time": 100, "event_type": "PROCESS", "stream_id": "frames"},
            {"event_time": 200, "event_type": "PROCESS", "stream_id": "frames"}
        ]"#;
        let events = parse_events(raw).unwrap();
        let first = events[0].stream_id.as_ref().unwrap();
        let second = events[1].stream_id.as_ref().unwrap();
        assert!(Arc::ptr_eq(first, second));
    }
}
