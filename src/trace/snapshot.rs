//! Window snapshots of the shared event buffer and the trace time origin.

use super::event::{Timestamp, TraceEvent};
use crate::utils::config::SNAPSHOT_RESERVE;
use chrono::{DateTime, Utc};
use log::debug;

/// Copy the events with `begin_time <= event_time < end_time`, in buffer order.
pub fn snapshot_window<'a, I>(
    buffer: I,
    begin_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Vec<TraceEvent>
where
    I: IntoIterator<Item = &'a TraceEvent>,
{
    let mut snapshot = Vec::with_capacity(SNAPSHOT_RESERVE);
    snapshot.extend(
        buffer
            .into_iter()
            .filter(|event| event.event_time >= begin_time && event.event_time < end_time)
            .cloned(),
    );
    debug!(
        "Snapshot of {} events in [{}, {})",
        snapshot.len(),
        begin_time.to_rfc3339(),
        end_time.to_rfc3339()
    );
    snapshot
}

/// The first input timestamp not yet covered before `begin_time`.
///
/// The buffer is time ordered, so the scan stops at the first event at or
/// after `begin_time`.
pub fn timestamp_after<'a, I>(buffer: I, begin_time: DateTime<Utc>) -> Timestamp
where
    I: IntoIterator<Item = &'a TraceEvent>,
{
    buffer
        .into_iter()
        .take_while(|event| event.event_time < begin_time)
        .map(|event| event.input_ts)
        .fold(Timestamp::MIN, Timestamp::max)
        .next()
}

/// The wall-clock time and logical timestamp reported as 0 in a trace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceOrigin {
    /// Unix microseconds
    pub base_time: i64,
    pub base_timestamp: i64,
}

impl TraceOrigin {
    /// Origin of a snapshot, or `None` if it holds no events.
    ///
    /// Special timestamps take no part in the minimum; a snapshot with no
    /// range timestamps gets a base timestamp of 0.
    pub fn from_snapshot(snapshot: &[TraceEvent]) -> Option<Self> {
        let base_time = snapshot.iter().map(TraceEvent::event_micros).min()?;
        let base_timestamp = snapshot
            .iter()
            .flat_map(|event| [event.input_ts, event.packet_ts])
            .filter(|ts| ts.is_range_value())
            .map(Timestamp::value)
            .min()
            .unwrap_or(0);

        Some(Self {
            base_time,
            base_timestamp,
        })
    }

    /// Microseconds relative to the base time
    pub fn log_time(&self, time: DateTime<Utc>) -> i64 {
        time.timestamp_micros().saturating_sub(self.base_time)
    }

    /// Logical time relative to the base timestamp
    pub fn log_timestamp(&self, ts: Timestamp) -> i64 {
        ts.value().saturating_sub(self.base_timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::event::EventType;

    fn at(micros: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(micros).unwrap()
    }

    fn event(micros: i64, input_ts: i64) -> TraceEvent {
        TraceEvent::new(EventType::Process, at(micros)).with_input_ts(input_ts)
    }

    #[test]
    fn test_snapshot_is_half_open() {
        let buffer = vec![event(100, 1), event(200, 2), event(300, 3)];
        let snapshot = snapshot_window(&buffer, at(100), at(300));
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].event_micros(), 100);
        assert_eq!(snapshot[1].event_micros(), 200);
    }

    #[test]
    fn test_snapshot_keeps_buffer_order() {
        let buffer = vec![event(250, 1), event(150, 2), event(200, 3)];
        let snapshot = snapshot_window(&buffer, at(0), at(1000));
        let times: Vec<i64> = snapshot.iter().map(TraceEvent::event_micros).collect();
        assert_eq!(times, vec![250, 150, 200]);
    }

    #[test]
    fn test_timestamp_after() {
        let buffer = vec![event(100, 7), event(200, 4), event(300, 50)];
        assert_eq!(timestamp_after(&buffer, at(250)), Timestamp::new(8));
        assert_eq!(timestamp_after(&buffer, at(1000)), Timestamp::new(51));
    }

    #[test]
    fn test_timestamp_after_without_earlier_events() {
        let buffer = vec![event(100, 7)];
        assert_eq!(timestamp_after(&buffer, at(100)), Timestamp::MIN.next());
        assert_eq!(timestamp_after(&Vec::<TraceEvent>::new(), at(100)), Timestamp::MIN.next());
    }

    #[test]
    fn test_origin_ignores_special_timestamps() {
        let snapshot = vec![
            event(500, 20).with_packet_ts(Timestamp::POST_STREAM),
            event(400, 30).with_packet_ts(15),
            TraceEvent::new(EventType::NotReady, at(450)),
        ];
        let origin = TraceOrigin::from_snapshot(&snapshot).unwrap();
        assert_eq!(origin.base_time, 400);
        assert_eq!(origin.base_timestamp, 15);
    }

    #[test]
    fn test_origin_of_empty_snapshot() {
        assert!(TraceOrigin::from_snapshot(&[]).is_none());

        let unset_only = vec![TraceEvent::new(EventType::Throttled, at(10))];
        let origin = TraceOrigin::from_snapshot(&unset_only).unwrap();
        assert_eq!(origin.base_timestamp, 0);
    }

    #[test]
    fn test_relative_values() {
        let origin = TraceOrigin {
            base_time: 1_000,
            base_timestamp: 10,
        };
        assert_eq!(origin.log_time(at(1_250)), 250);
        assert_eq!(origin.log_timestamp(Timestamp::new(12)), 2);
    }

    #[test]
    fn test_relative_time_saturates_at_range_ends() {
        let early = at(-8_000_000_000_000_000_000);
        let late = at(8_000_000_000_000_000_000);

        let from_early = TraceOrigin {
            base_time: early.timestamp_micros(),
            base_timestamp: 0,
        };
        assert_eq!(from_early.log_time(late), i64::MAX);

        let from_late = TraceOrigin {
            base_time: late.timestamp_micros(),
            base_timestamp: 0,
        };
        assert_eq!(from_late.log_time(early), i64::MIN);
    }
}
