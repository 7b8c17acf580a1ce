//! Grouping of snapshot events into calculator tasks and stream hops.
//!
//! A task is one calculator invocation: every event for the same node,
//! input timestamp and event type. A hop is one packet crossing one stream;
//! the finishing event of the producing task marks when the packet left, so
//! a consuming task can look up when its input was handed over.

use super::classifier::carries_packet_detail;
use super::event::{EventType, Timestamp, TraceEvent};
use super::interner::StringIdMap;
use log::debug;
use std::collections::HashMap;

/// Identifies one calculator invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    pub node_id: i32,
    pub input_ts: Timestamp,
    pub event_type: EventType,
}

impl TaskId {
    pub fn of(event: &TraceEvent) -> Self {
        Self {
            node_id: event.node_id,
            input_ts: event.input_ts,
            event_type: event.event_type,
        }
    }
}

/// Identifies one packet transit across one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HopId {
    /// Interned stream id
    pub stream_id: i32,
    pub packet_ts: Timestamp,
    pub event_type: EventType,
}

impl HopId {
    pub fn of(event: &TraceEvent, stream_ids: &mut StringIdMap) -> Self {
        Self {
            stream_id: stream_ids.intern(event.stream_id.as_ref()),
            packet_ts: event.packet_ts,
            event_type: event.event_type,
        }
    }
}

/// Task and hop indices over one snapshot.
///
/// Entries are positions in the snapshot the indices were built from.
#[derive(Debug, Default)]
pub struct Correlator {
    task_events: HashMap<TaskId, Vec<usize>>,
    hop_events: HashMap<HopId, usize>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild both indices for `snapshot`.
    ///
    /// A later finishing event for a hop replaces an earlier one.
    pub fn index(&mut self, snapshot: &[TraceEvent], stream_ids: &mut StringIdMap) {
        self.clear();
        for (position, event) in snapshot.iter().enumerate() {
            if !carries_packet_detail(event.event_type) {
                continue;
            }
            let hop_id = HopId::of(event, stream_ids);
            if event.is_finish {
                self.hop_events.insert(hop_id, position);
            }
            self.task_events
                .entry(TaskId::of(event))
                .or_default()
                .push(position);
        }
        debug!(
            "Indexed {} tasks and {} stream hops",
            self.task_events.len(),
            self.hop_events.len()
        );
    }

    /// Snapshot positions of a task's events, in snapshot order
    pub fn task_events(&self, task_id: &TaskId) -> &[usize] {
        self.task_events
            .get(task_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Snapshot position of the event that produced the packet for a hop
    pub fn find_output_event(&self, hop_id: &HopId) -> Option<usize> {
        self.hop_events.get(hop_id).copied()
    }

    pub fn task_count(&self) -> usize {
        self.task_events.len()
    }

    pub fn hop_count(&self) -> usize {
        self.hop_events.len()
    }

    /// Drop both indices
    pub fn clear(&mut self) {
        self.task_events.clear();
        self.hop_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::event::StreamName;
    use chrono::DateTime;
    use std::sync::Arc;

    fn process(micros: i64, node_id: i32, input_ts: i64) -> TraceEvent {
        TraceEvent::new(
            EventType::Process,
            DateTime::from_timestamp_micros(micros).unwrap(),
        )
        .with_node(node_id)
        .with_input_ts(input_ts)
    }

    #[test]
    fn test_groups_events_by_task() {
        let snapshot = vec![
            process(10, 1, 5),
            process(20, 2, 5),
            process(30, 1, 5).with_finish(true),
            process(40, 1, 6),
        ];
        let mut stream_ids = StringIdMap::new();
        let mut correlator = Correlator::new();
        correlator.index(&snapshot, &mut stream_ids);

        assert_eq!(correlator.task_count(), 3);
        assert_eq!(correlator.task_events(&TaskId::of(&snapshot[0])), &[0, 2]);
        assert_eq!(correlator.task_events(&TaskId::of(&snapshot[1])), &[1]);
    }

    #[test]
    fn test_scheduling_events_are_not_indexed() {
        let snapshot = vec![TraceEvent::new(
            EventType::ReadyForProcess,
            DateTime::from_timestamp_micros(10).unwrap(),
        )
        .with_finish(true)];
        let mut correlator = Correlator::new();
        correlator.index(&snapshot, &mut StringIdMap::new());

        assert_eq!(correlator.task_count(), 0);
        assert_eq!(correlator.hop_count(), 0);
    }

    #[test]
    fn test_last_finishing_event_wins() {
        let stream: StreamName = Arc::from("frames");
        let snapshot = vec![
            process(10, 1, 5).with_stream(&stream).with_packet_ts(5).with_finish(true),
            process(20, 2, 5).with_stream(&stream).with_packet_ts(5).with_finish(true),
        ];
        let mut stream_ids = StringIdMap::new();
        let mut correlator = Correlator::new();
        correlator.index(&snapshot, &mut stream_ids);

        let consumer = process(30, 3, 5).with_stream(&stream).with_packet_ts(5);
        let hop = HopId::of(&consumer, &mut stream_ids);
        assert_eq!(correlator.find_output_event(&hop), Some(1));
    }

    #[test]
    fn test_streams_interned_in_snapshot_order() {
        let consumed: StreamName = Arc::from("b");
        let produced: StreamName = Arc::from("a");
        let snapshot = vec![
            process(10, 2, 5).with_stream(&consumed).with_packet_ts(5),
            process(20, 1, 5)
                .with_stream(&produced)
                .with_packet_ts(5)
                .with_finish(true),
        ];
        let mut stream_ids = StringIdMap::new();
        Correlator::new().index(&snapshot, &mut stream_ids);

        assert_eq!(stream_ids.names(), vec!["", "b", "a"]);
    }

    #[test]
    fn test_clear() {
        let snapshot = vec![process(10, 1, 5).with_finish(true)];
        let mut correlator = Correlator::new();
        correlator.index(&snapshot, &mut StringIdMap::new());
        correlator.clear();

        assert_eq!(correlator.task_count(), 0);
        assert_eq!(correlator.hop_count(), 0);
        assert!(correlator.task_events(&TaskId::of(&snapshot[0])).is_empty());
    }
}
