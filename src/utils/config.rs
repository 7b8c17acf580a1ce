//! Configuration and constants for the trace builder and CLI.

/// Current trace document schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Initial capacity reserved for a window snapshot
pub const SNAPSHOT_RESERVE: usize = 10_000;

/// Default number of events retained by a `TraceBuffer`
pub const DEFAULT_BUFFER_CAPACITY: usize = 20_000;

/// Default number of calculators shown in the text summary
pub const DEFAULT_TOP_NODES: usize = 20;

// Field names for event arrays inside an object dump (exporters disagree on naming)
pub const EVENT_FIELD_NAMES: &[&str] = &["events", "trace_events", "traceEvents", "trace"];
