//! Trace reconstruction engine.
//!
//! This module handles:
//! - Interning stream names and packet handles into compact ids
//! - Classifying event types
//! - Snapshotting a time window of the event buffer
//! - Correlating task events and stream hops
//! - Assembling aggregated traces and flat event logs

pub mod builder;
pub mod classifier;
pub mod correlator;
pub mod event;
pub mod interner;
pub mod schema;
pub mod snapshot;

// Re-export main types
pub use builder::TraceBuilder;
pub use classifier::{carries_packet_detail, wants_stream_trace};
pub use correlator::{Correlator, HopId, TaskId};
pub use event::{EventType, PacketDataId, StreamName, Timestamp, TraceEvent};
pub use interner::{AddressIdMap, StringIdMap};
pub use schema::{CalculatorTrace, GraphTrace, StreamTrace};
pub use snapshot::{snapshot_window, timestamp_after, TraceOrigin};
