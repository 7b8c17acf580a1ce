//! Aggregation of reconstructed traces into timing statistics.
//!
//! This module turns a `GraphTrace` into:
//! - Per-calculator busy time (hottest calculators first)
//! - Stream handoff latency distribution
//! - A text summary for the terminal

pub mod metrics;

// Re-export main types and functions
pub use metrics::{
    calculate_hop_latency, calculate_node_stats, generate_text_summary, LatencyDistribution,
    NodeStats,
};
