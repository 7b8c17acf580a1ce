//! Graph Trace
//!
//! Trace reconstruction for calculator dataflow graphs. A running graph
//! records timestamped events (calculator open/process/close, packet
//! adds, stream readiness) into a bounded buffer; this crate turns a time
//! window of those events into either an aggregated per-task trace or a
//! flat per-event log, with times and packet timestamps relative to a
//! fixed origin and stream names interned to small integers.
//!
//! This crate provides the core implementation for the
//! `graph-trace` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! graph-trace build --input events.json --output trace.json --summary
//! graph-trace --help
//! ```

pub mod aggregator;
pub mod buffer;
pub mod commands;
pub mod output;
pub mod parser;
pub mod trace;
pub mod utils;
