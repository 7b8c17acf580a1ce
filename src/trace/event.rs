//! Instrumentation records emitted by the graph runtime.
//!
//! A `TraceEvent` is the unit the runtime appends to its trace buffer each
//! time a calculator changes state or a packet crosses a stream. Everything
//! downstream (snapshot, correlation, assembly) consumes these records
//! read-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shared stream name. Events for the same stream should share one
/// allocation so the interner can resolve them by handle.
pub type StreamName = Arc<str>;

/// Kind of instrumentation record.
///
/// The declaration order is fixed: classifier tables are indexed by
/// `ordinal()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", from = "EventTypeRepr")]
pub enum EventType {
    #[default]
    Unknown,
    Open,
    Process,
    Close,
    NotReady,
    ReadyForProcess,
    ReadyForClose,
    Throttled,
    Unthrottled,
    CpuTaskUser,
    CpuTaskSystem,
    GpuTask,
    DspTask,
    TpuTask,
}

impl EventType {
    /// Every event type, in ordinal order
    pub const ALL: [EventType; 14] = [
        EventType::Unknown,
        EventType::Open,
        EventType::Process,
        EventType::Close,
        EventType::NotReady,
        EventType::ReadyForProcess,
        EventType::ReadyForClose,
        EventType::Throttled,
        EventType::Unthrottled,
        EventType::CpuTaskUser,
        EventType::CpuTaskSystem,
        EventType::GpuTask,
        EventType::DspTask,
        EventType::TpuTask,
    ];

    /// Position of this type in the fixed enumeration
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Map a raw ordinal to an event type.
    ///
    /// Ordinals outside the enumeration are `Unknown`.
    pub fn from_ordinal(ordinal: i64) -> Self {
        usize::try_from(ordinal)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .unwrap_or(EventType::Unknown)
    }

    /// Map a name (any case, `-` or `_` separated) to an event type.
    ///
    /// Unrecognised names are `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name.to_uppercase().replace('-', "_").as_str() {
            "OPEN" => Self::Open,
            "PROCESS" => Self::Process,
            "CLOSE" => Self::Close,
            "NOT_READY" => Self::NotReady,
            "READY_FOR_PROCESS" => Self::ReadyForProcess,
            "READY_FOR_CLOSE" => Self::ReadyForClose,
            "THROTTLED" => Self::Throttled,
            "UNTHROTTLED" => Self::Unthrottled,
            "CPU_TASK_USER" => Self::CpuTaskUser,
            "CPU_TASK_SYSTEM" => Self::CpuTaskSystem,
            "GPU_TASK" => Self::GpuTask,
            "DSP_TASK" => Self::DspTask,
            "TPU_TASK" => Self::TpuTask,
            _ => Self::Unknown,
        }
    }

    /// Canonical upper-case name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Open => "OPEN",
            Self::Process => "PROCESS",
            Self::Close => "CLOSE",
            Self::NotReady => "NOT_READY",
            Self::ReadyForProcess => "READY_FOR_PROCESS",
            Self::ReadyForClose => "READY_FOR_CLOSE",
            Self::Throttled => "THROTTLED",
            Self::Unthrottled => "UNTHROTTLED",
            Self::CpuTaskUser => "CPU_TASK_USER",
            Self::CpuTaskSystem => "CPU_TASK_SYSTEM",
            Self::GpuTask => "GPU_TASK",
            Self::DspTask => "DSP_TASK",
            Self::TpuTask => "TPU_TASK",
        }
    }
}

impl std::str::FromStr for EventType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Dumps carry the event type either as a name or as its ordinal.
#[derive(Deserialize)]
#[serde(untagged)]
enum EventTypeRepr {
    Ordinal(i64),
    Name(String),
}

impl From<EventTypeRepr> for EventType {
    fn from(repr: EventTypeRepr) -> Self {
        match repr {
            EventTypeRepr::Ordinal(ordinal) => EventType::from_ordinal(ordinal),
            EventTypeRepr::Name(name) => EventType::from_name(&name),
        }
    }
}

/// Logical time of a packet or input set.
///
/// The extremes of the `i64` range are reserved for special values; only
/// `MIN..=MAX` are ordinary range values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const UNSET: Self = Self(i64::MIN);
    pub const UNSTARTED: Self = Self(i64::MIN + 1);
    pub const PRE_STREAM: Self = Self(i64::MIN + 2);
    pub const MIN: Self = Self(i64::MIN + 3);
    pub const MAX: Self = Self(i64::MAX - 3);
    pub const POST_STREAM: Self = Self(i64::MAX - 2);
    pub const ONE_OVER_POST_STREAM: Self = Self(i64::MAX - 1);
    pub const DONE: Self = Self(i64::MAX);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    /// True for the reserved values outside `MIN..=MAX`
    pub const fn is_special(self) -> bool {
        self.0 < Self::MIN.0 || self.0 > Self::MAX.0
    }

    pub const fn is_range_value(self) -> bool {
        !self.is_special()
    }

    /// The timestamp one logical tick later (saturating at `DONE`)
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::UNSET
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::UNSET => f.write_str("Timestamp::Unset"),
            Self::UNSTARTED => f.write_str("Timestamp::Unstarted"),
            Self::PRE_STREAM => f.write_str("Timestamp::PreStream"),
            Self::MIN => f.write_str("Timestamp::Min"),
            Self::MAX => f.write_str("Timestamp::Max"),
            Self::POST_STREAM => f.write_str("Timestamp::PostStream"),
            Self::ONE_OVER_POST_STREAM => f.write_str("Timestamp::OneOverPostStream"),
            Self::DONE => f.write_str("Timestamp::Done"),
            Self(value) => write!(f, "{}", value),
        }
    }
}

/// Opaque handle of a packet payload, as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PacketDataId(pub u64);

/// One instrumentation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Wall-clock instant the event was recorded
    #[serde(with = "chrono::serde::ts_microseconds")]
    pub event_time: DateTime<Utc>,

    /// Calculator instance involved
    #[serde(default)]
    pub node_id: i32,

    /// Timestamp of the input set being processed
    #[serde(default)]
    pub input_ts: Timestamp,

    /// Timestamp of the packet crossing a stream
    #[serde(default)]
    pub packet_ts: Timestamp,

    #[serde(default)]
    pub event_type: EventType,

    /// Stream the packet travels on, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<StreamName>,

    /// Payload the packet refers to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet_data_id: Option<PacketDataId>,

    #[serde(default)]
    pub thread_id: i32,

    /// True when the event closes a timed span, false when it opens one
    #[serde(default)]
    pub is_finish: bool,
}

impl TraceEvent {
    /// Create an event with unset timestamps and no stream
    pub fn new(event_type: EventType, event_time: DateTime<Utc>) -> Self {
        Self {
            event_time,
            node_id: 0,
            input_ts: Timestamp::UNSET,
            packet_ts: Timestamp::UNSET,
            event_type,
            stream_id: None,
            packet_data_id: None,
            thread_id: 0,
            is_finish: false,
        }
    }

    pub fn with_node(mut self, node_id: i32) -> Self {
        self.node_id = node_id;
        self
    }

    pub fn with_input_ts(mut self, input_ts: impl Into<Timestamp>) -> Self {
        self.input_ts = input_ts.into();
        self
    }

    pub fn with_packet_ts(mut self, packet_ts: impl Into<Timestamp>) -> Self {
        self.packet_ts = packet_ts.into();
        self
    }

    pub fn with_stream(mut self, stream: &StreamName) -> Self {
        self.stream_id = Some(Arc::clone(stream));
        self
    }

    pub fn with_packet_data(mut self, packet_data_id: PacketDataId) -> Self {
        self.packet_data_id = Some(packet_data_id);
        self
    }

    pub fn with_thread(mut self, thread_id: i32) -> Self {
        self.thread_id = thread_id;
        self
    }

    pub fn with_finish(mut self, is_finish: bool) -> Self {
        self.is_finish = is_finish;
        self
    }

    /// Event time as microseconds since the unix epoch
    pub fn event_micros(&self) -> i64 {
        self.event_time.timestamp_micros()
    }
}
