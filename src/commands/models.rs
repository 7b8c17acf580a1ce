use crate::output::TraceMode;
use crate::utils::config::DEFAULT_TOP_NODES;
use std::path::PathBuf;

/// Arguments for the build command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct BuildArgs {
    /// Event dump to read
    pub input: PathBuf,

    /// Output path for the JSON trace document
    pub output_json: PathBuf,

    /// Aggregated trace or flat log
    pub mode: TraceMode,

    /// Window start, RFC 3339 or unix microseconds (None = first event)
    pub begin: Option<String>,

    /// Window end, exclusive (None = just after the last event)
    pub end: Option<String>,

    /// Split the range into successive windows of this many microseconds
    pub window_micros: Option<i64>,

    /// Replay the dump through a buffer retaining only this many events
    pub buffer_capacity: Option<usize>,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Number of calculators shown in the summary
    pub top_nodes: usize,
}

impl Default for BuildArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("events.json"),
            output_json: PathBuf::from("trace.json"),
            mode: TraceMode::Trace,
            begin: None,
            end: None,
            window_micros: None,
            buffer_capacity: None,
            print_summary: false,
            top_nodes: DEFAULT_TOP_NODES,
        }
    }
}
