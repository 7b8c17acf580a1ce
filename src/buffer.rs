//! Bounded event buffer shared between the runtime and the trace builder.
//!
//! Worker threads append through `&self`; once the buffer is full the oldest
//! event is dropped. Readers take a `snapshot()` copy, so a trace window is
//! built from a stable range even while workers keep appending.

use crate::trace::TraceEvent;
use crate::utils::config::DEFAULT_BUFFER_CAPACITY;
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

#[derive(Debug)]
pub struct TraceBuffer {
    capacity: usize,
    events: RwLock<VecDeque<TraceEvent>>,
}

impl TraceBuffer {
    /// Create a buffer holding at most `capacity` events (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append an event, evicting the oldest one when full
    pub fn push(&self, event: TraceEvent) {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Copy of the buffered events, oldest first
    pub fn snapshot(&self) -> Vec<TraceEvent> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        events.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for TraceBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl Extend<TraceEvent> for TraceBuffer {
    fn extend<T: IntoIterator<Item = TraceEvent>>(&mut self, iter: T) {
        for event in iter {
            self.push(event);
        }
    }
}
