//! Reconstructed trace structure.
//!
//! Times are microseconds relative to `GraphTrace::base_time`; timestamps are
//! relative to `GraphTrace::base_timestamp`. Optional fields are omitted from
//! JSON when they could not be resolved.

use super::event::EventType;
use serde::{Deserialize, Serialize};

/// Root of a reconstructed trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphTrace {
    /// Unix microseconds represented as 0
    pub base_time: i64,

    /// Logical timestamp represented as 0
    pub base_timestamp: i64,

    /// One record per task (aggregated) or per event (log)
    #[serde(default)]
    pub calculator_trace: Vec<CalculatorTrace>,

    /// Stream names indexed by interned stream id
    #[serde(default)]
    pub stream_name: Vec<String>,
}

/// One calculator task, or one raw event in log mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatorTrace {
    pub node_id: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_timestamp: Option<i64>,

    pub event_type: EventType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_trace: Vec<StreamTrace>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_trace: Vec<StreamTrace>,

    pub thread_id: i32,
}

impl CalculatorTrace {
    /// Busy time of the task, when both ends were observed
    pub fn duration(&self) -> Option<i64> {
        match (self.start_time, self.finish_time) {
            (Some(start), Some(finish)) => Some(finish - start),
            _ => None,
        }
    }
}

/// One packet observed at a task boundary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamTrace {
    /// When the producer finished with the packet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,

    /// When the consumer started on the packet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<i64>,

    pub packet_timestamp: i64,

    /// Interned stream id
    pub stream_id: i32,

    /// Interned packet payload id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet_id: Option<i32>,
}

impl StreamTrace {
    /// Handoff latency from producer to consumer, when resolved
    pub fn latency(&self) -> Option<i64> {
        match (self.start_time, self.finish_time) {
            (Some(start), Some(finish)) => Some(finish - start),
            _ => None,
        }
    }
}
