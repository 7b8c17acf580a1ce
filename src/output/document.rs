//! Trace document schema.
//!
//! This is the structure of the JSON files we write to disk. The schema is
//! versioned to allow future evolution.

use crate::trace::GraphTrace;
use crate::utils::config::SCHEMA_VERSION;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which builder operation produced the traces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    /// One record per calculator task
    Trace,
    /// One record per event
    Log,
}

impl fmt::Display for TraceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceMode::Trace => f.write_str("trace"),
            TraceMode::Log => f.write_str("log"),
        }
    }
}

/// Top-level document written to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceDocument {
    /// Schema version for compatibility checking
    pub version: String,

    pub mode: TraceMode,

    /// Start of the covered time range (inclusive)
    pub window_begin: DateTime<Utc>,

    /// End of the covered time range (exclusive)
    pub window_end: DateTime<Utc>,

    /// One trace per window, in window order
    pub traces: Vec<GraphTrace>,

    /// Timestamp when the document was generated
    pub generated_at: String,
}

impl TraceDocument {
    pub fn new(
        mode: TraceMode,
        window_begin: DateTime<Utc>,
        window_end: DateTime<Utc>,
        traces: Vec<GraphTrace>,
    ) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            mode,
            window_begin,
            window_end,
            traces,
            generated_at: Utc::now().to_rfc3339(),
        }
    }

    /// Total calculator records across all windows
    pub fn record_count(&self) -> usize {
        self.traces
            .iter()
            .map(|trace| trace.calculator_trace.len())
            .sum()
    }
}
