//! Per event-type capability tables.
//!
//! Order of both tables:
//!   UNKNOWN, OPEN, PROCESS, CLOSE,
//!   NOT_READY, READY_FOR_PROCESS, READY_FOR_CLOSE, THROTTLED, UNTHROTTLED,
//!   CPU_TASK_USER, CPU_TASK_SYSTEM, GPU_TASK, DSP_TASK, TPU_TASK

use super::event::EventType;

/// Whether the event type is logged with packet details (a task event).
const PACKET_EVENTS: [bool; 14] = [
    false, true, true, true, //
    false, false, false, false, false, //
    true, true, true, true, true,
];

/// Whether the event type produces stream-hop records.
const STREAM_EVENTS: [bool; 14] = [
    false, true, true, true, //
    false, false, false, false, false, //
    true, true, false, false, false,
];

/// True if events of this type belong to a calculator task
pub fn carries_packet_detail(event_type: EventType) -> bool {
    PACKET_EVENTS
        .get(event_type.ordinal())
        .copied()
        .unwrap_or(false)
}

/// True if events of this type should produce a `StreamTrace`
pub fn wants_stream_trace(event_type: EventType) -> bool {
    STREAM_EVENTS
        .get(event_type.ordinal())
        .copied()
        .unwrap_or(false)
}
