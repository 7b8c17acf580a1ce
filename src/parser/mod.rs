//! Event dump parsing.
//!
//! This module handles:
//! - Reading raw JSON event dumps written by the graph runtime
//! - Detecting the dump layout (array, wrapped array, JSON Lines)
//! - Sharing stream name allocations between events

pub mod event_dump;

// Re-export main functions
pub use event_dump::{canonicalize_streams, parse_events, read_events, DumpFormat};
