//! Builds a `GraphTrace` from a window of buffered events.
//!
//! Two output modes share the same groundwork (snapshot, origin, interning):
//! - `create_trace` folds all events of a calculator task into one record
//!   and resolves when each input packet was handed over.
//! - `create_log` emits one record per event, unfolded.

use super::classifier::{carries_packet_detail, wants_stream_trace};
use super::correlator::{Correlator, HopId, TaskId};
use super::event::{Timestamp, TraceEvent};
use super::interner::{AddressIdMap, StringIdMap};
use super::schema::{CalculatorTrace, GraphTrace, StreamTrace};
use super::snapshot::{snapshot_window, timestamp_after, TraceOrigin};
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashSet;

/// Trace reconstruction engine.
///
/// Keeps the id tables and the time origin across calls so that successive
/// windows share one id space and one time scale. Methods take `&mut self`;
/// share a builder between threads behind a `Mutex`.
#[derive(Debug, Default)]
pub struct TraceBuilder {
    correlator: Correlator,
    stream_ids: StringIdMap,
    packet_data_ids: AddressIdMap,
    /// Fixed by the first non-empty snapshot
    origin: Option<TraceOrigin>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// First input timestamp after the events recorded before `begin_time`
    pub fn timestamp_after<'a, I>(buffer: I, begin_time: DateTime<Utc>) -> Timestamp
    where
        I: IntoIterator<Item = &'a TraceEvent>,
    {
        timestamp_after(buffer, begin_time)
    }

    /// Aggregated trace of `[begin_time, end_time)`: one record per task
    pub fn create_trace<'a, I>(
        &mut self,
        buffer: I,
        begin_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> GraphTrace
    where
        I: IntoIterator<Item = &'a TraceEvent>,
    {
        let snapshot = snapshot_window(buffer, begin_time, end_time);
        let origin = self.establish_origin(&snapshot);
        self.correlator.index(&snapshot, &mut self.stream_ids);

        let mut assembler = Assembler {
            snapshot: &snapshot,
            correlator: &self.correlator,
            stream_ids: &mut self.stream_ids,
            packet_data_ids: &mut self.packet_data_ids,
            origin,
        };

        let mut calculator_trace = Vec::new();
        let mut task_ids = HashSet::new();
        for event in &snapshot {
            if !carries_packet_detail(event.event_type) {
                calculator_trace.push(assembler.build_event_log(event));
                continue;
            }
            let task_id = TaskId::of(event);
            if task_ids.insert(task_id) {
                calculator_trace.push(assembler.build_calculator_trace(&task_id));
            }
        }

        debug!(
            "Built {} calculator traces from {} events ({} tasks)",
            calculator_trace.len(),
            snapshot.len(),
            task_ids.len()
        );
        self.finish(origin, calculator_trace)
    }

    /// Flat log of `[begin_time, end_time)`: one record per event
    pub fn create_log<'a, I>(
        &mut self,
        buffer: I,
        begin_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> GraphTrace
    where
        I: IntoIterator<Item = &'a TraceEvent>,
    {
        let snapshot = snapshot_window(buffer, begin_time, end_time);
        let origin = self.establish_origin(&snapshot);

        let mut assembler = Assembler {
            snapshot: &snapshot,
            correlator: &self.correlator,
            stream_ids: &mut self.stream_ids,
            packet_data_ids: &mut self.packet_data_ids,
            origin,
        };
        let calculator_trace: Vec<CalculatorTrace> = snapshot
            .iter()
            .map(|event| assembler.build_event_log(event))
            .collect();

        debug!("Logged {} events", calculator_trace.len());
        self.finish(origin, calculator_trace)
    }

    /// Drop the task and hop indices of the last aggregated window.
    ///
    /// Id tables and the time origin are kept.
    pub fn clear(&mut self) {
        self.correlator.clear();
    }

    /// Forget everything: indices, id tables and the time origin.
    pub fn reset(&mut self) {
        self.correlator.clear();
        self.stream_ids.clear();
        self.packet_data_ids.clear();
        self.origin = None;
    }

    /// The origin in use, once a non-empty window has fixed it
    pub fn origin(&self) -> Option<TraceOrigin> {
        self.origin
    }

    /// Stream names indexed by interned id
    pub fn stream_names(&self) -> Vec<String> {
        self.stream_ids.names()
    }

    fn establish_origin(&mut self, snapshot: &[TraceEvent]) -> TraceOrigin {
        if let Some(origin) = self.origin {
            return origin;
        }
        match TraceOrigin::from_snapshot(snapshot) {
            Some(origin) => {
                debug!(
                    "Trace origin fixed at {}us, timestamp {}",
                    origin.base_time, origin.base_timestamp
                );
                self.origin = Some(origin);
                origin
            }
            None => TraceOrigin::default(),
        }
    }

    fn finish(&self, origin: TraceOrigin, calculator_trace: Vec<CalculatorTrace>) -> GraphTrace {
        GraphTrace {
            base_time: origin.base_time,
            base_timestamp: origin.base_timestamp,
            calculator_trace,
            stream_name: self.stream_ids.names(),
        }
    }
}

/// Per-call view over the snapshot and the builder's tables.
struct Assembler<'a> {
    snapshot: &'a [TraceEvent],
    correlator: &'a Correlator,
    stream_ids: &'a mut StringIdMap,
    packet_data_ids: &'a mut AddressIdMap,
    origin: TraceOrigin,
}

impl Assembler<'_> {
    fn input_timestamp(&self, ts: Timestamp) -> Option<i64> {
        (ts != Timestamp::UNSET).then(|| self.origin.log_timestamp(ts))
    }

    /// Fold every event of one task into a single record.
    fn build_calculator_trace(&mut self, task_id: &TaskId) -> CalculatorTrace {
        let snapshot = self.snapshot;
        let correlator = self.correlator;
        let positions = correlator.task_events(task_id);
        let mut result = CalculatorTrace::default();

        if let Some(first) = positions.first().map(|&position| &snapshot[position]) {
            result.node_id = first.node_id;
            result.event_type = first.event_type;
            result.input_timestamp = self.input_timestamp(first.input_ts);
            result.thread_id = first.thread_id;
        }

        let mut start_time: Option<DateTime<Utc>> = None;
        let mut finish_time: Option<DateTime<Utc>> = None;
        for &position in positions {
            let event = &snapshot[position];
            let slot = if event.is_finish {
                &mut finish_time
            } else {
                &mut start_time
            };
            *slot = Some(slot.map_or(event.event_time, |time| time.min(event.event_time)));

            if wants_stream_trace(event.event_type) && event.stream_id.is_some() {
                let stream_trace = self.build_stream_trace(event);
                if event.is_finish {
                    result.output_trace.push(stream_trace);
                } else {
                    result.input_trace.push(stream_trace);
                }
            }
        }

        result.start_time = start_time.map(|time| self.origin.log_time(time));
        result.finish_time = finish_time.map(|time| self.origin.log_time(time));
        result
    }

    /// Stream record for one task event, resolving the producer for inputs.
    fn build_stream_trace(&mut self, event: &TraceEvent) -> StreamTrace {
        let stream_id = self.stream_ids.intern(event.stream_id.as_ref());
        let packet_timestamp = self.origin.log_timestamp(event.packet_ts);
        if event.is_finish {
            return StreamTrace {
                stream_id,
                packet_timestamp,
                ..StreamTrace::default()
            };
        }

        let hop_id = HopId::of(event, self.stream_ids);
        let start_time = self
            .correlator
            .find_output_event(&hop_id)
            .map(|position| self.origin.log_time(self.snapshot[position].event_time));

        StreamTrace {
            start_time,
            finish_time: Some(self.origin.log_time(event.event_time)),
            packet_timestamp,
            stream_id,
            packet_id: Some(self.packet_data_ids.intern(event.packet_data_id)),
        }
    }

    /// One record for one event, without folding or hop resolution.
    fn build_event_log(&mut self, event: &TraceEvent) -> CalculatorTrace {
        let time = Some(self.origin.log_time(event.event_time));
        let mut result = CalculatorTrace {
            node_id: event.node_id,
            input_timestamp: self.input_timestamp(event.input_ts),
            event_type: event.event_type,
            thread_id: event.thread_id,
            ..CalculatorTrace::default()
        };
        if event.is_finish {
            result.finish_time = time;
        } else {
            result.start_time = time;
        }

        if wants_stream_trace(event.event_type) && event.stream_id.is_some() {
            let stream_trace = StreamTrace {
                stream_id: self.stream_ids.intern(event.stream_id.as_ref()),
                packet_timestamp: self.origin.log_timestamp(event.packet_ts),
                packet_id: Some(self.packet_data_ids.intern(event.packet_data_id)),
                ..StreamTrace::default()
            };
            if event.is_finish {
                result.output_trace.push(stream_trace);
            } else {
                result.input_trace.push(stream_trace);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::event::EventType;

    fn at(micros: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(micros).unwrap()
    }

    #[test]
    fn test_open_task_folds_into_one_record() {
        let buffer = vec![
            TraceEvent::new(EventType::Open, at(1_000))
                .with_node(1)
                .with_input_ts(5)
                .with_thread(10),
            TraceEvent::new(EventType::Open, at(1_100))
                .with_node(1)
                .with_input_ts(5)
                .with_thread(10)
                .with_finish(true),
        ];
        let mut builder = TraceBuilder::new();
        let trace = builder.create_trace(&buffer, at(0), at(10_000));

        assert_eq!(trace.base_time, 1_000);
        assert_eq!(trace.base_timestamp, 5);
        assert_eq!(trace.calculator_trace.len(), 1);

        let task = &trace.calculator_trace[0];
        assert_eq!(task.node_id, 1);
        assert_eq!(task.thread_id, 10);
        assert_eq!(task.input_timestamp, Some(0));
        assert_eq!(task.start_time, Some(0));
        assert_eq!(task.finish_time, Some(100));
        assert!(task.input_trace.is_empty());
        assert!(task.output_trace.is_empty());
        assert_eq!(trace.stream_name, vec!["".to_string()]);
    }

    #[test]
    fn test_first_empty_window_does_not_fix_origin() {
        let mut builder = TraceBuilder::new();
        let empty = builder.create_log(&Vec::<TraceEvent>::new(), at(0), at(10));
        assert_eq!(empty.base_time, 0);
        assert_eq!(empty.base_timestamp, 0);
        assert!(builder.origin().is_none());

        let buffer = vec![TraceEvent::new(EventType::Process, at(500)).with_input_ts(9)];
        let trace = builder.create_log(&buffer, at(0), at(1_000));
        assert_eq!(trace.base_time, 500);
        assert_eq!(trace.base_timestamp, 9);
    }

    #[test]
    fn test_reset_forgets_origin_and_names() {
        let stream = std::sync::Arc::from("audio");
        let buffer = vec![TraceEvent::new(EventType::Process, at(500))
            .with_input_ts(9)
            .with_stream(&stream)];
        let mut builder = TraceBuilder::new();
        builder.create_log(&buffer, at(0), at(1_000));
        assert_eq!(builder.stream_names().len(), 2);

        builder.clear();
        assert!(builder.origin().is_some());
        assert_eq!(builder.stream_names().len(), 2);

        builder.reset();
        assert!(builder.origin().is_none());
        assert_eq!(builder.stream_names(), vec!["".to_string()]);
    }
}
