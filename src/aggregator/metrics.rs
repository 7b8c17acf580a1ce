//! Calculate timing metrics from reconstructed traces.
//!
//! Calculators with the largest total busy time are the primary targets for
//! optimization; slow stream handoffs point at scheduling or throttling.

use crate::trace::{EventType, GraphTrace};
use log::debug;
use std::collections::HashMap;

/// Busy time of one calculator for one event type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStats {
    pub node_id: i32,
    pub event_type: EventType,

    /// Tasks with both a start and a finish time
    pub task_count: u64,

    /// Sum of task durations in microseconds
    pub total_micros: i64,

    /// Longest single task in microseconds
    pub max_micros: i64,
}

impl NodeStats {
    /// Mean task duration in microseconds
    pub fn mean_micros(&self) -> i64 {
        self.total_micros / self.task_count.max(1) as i64
    }
}

/// Calculate per-calculator busy time
///
/// **Public** - main entry point for metrics calculation
///
/// # Arguments
/// * `trace` - Aggregated trace from `TraceBuilder::create_trace`
///
/// # Returns
/// One entry per (node, event type) with at least one complete task,
/// sorted by total busy time (descending)
pub fn calculate_node_stats(trace: &GraphTrace) -> Vec<NodeStats> {
    let mut by_node: HashMap<(i32, EventType), NodeStats> = HashMap::new();

    for task in &trace.calculator_trace {
        let Some(duration) = task.duration() else {
            continue;
        };
        let stats = by_node
            .entry((task.node_id, task.event_type))
            .or_insert_with(|| NodeStats {
                node_id: task.node_id,
                event_type: task.event_type,
                task_count: 0,
                total_micros: 0,
                max_micros: 0,
            });
        stats.task_count += 1;
        stats.total_micros += duration;
        stats.max_micros = stats.max_micros.max(duration);
    }

    let mut stats: Vec<NodeStats> = by_node.into_values().collect();
    stats.sort_by(|a, b| {
        b.total_micros
            .cmp(&a.total_micros)
            .then(a.node_id.cmp(&b.node_id))
            .then(a.event_type.ordinal().cmp(&b.event_type.ordinal()))
    });

    debug!("Calculated stats for {} calculators", stats.len());
    stats
}

/// Stream handoff latency statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyDistribution {
    /// Input packets whose producer was found
    pub resolved_hops: usize,

    /// Input packets whose producer was not in the window
    pub unresolved_hops: usize,

    pub mean_micros: f64,
    pub median_micros: i64,
    pub max_micros: i64,
}

/// Calculate producer-to-consumer latency over all input stream traces
///
/// **Public** - provides summary statistics
pub fn calculate_hop_latency(trace: &GraphTrace) -> LatencyDistribution {
    let mut latencies = Vec::new();
    let mut unresolved_hops = 0;

    for stream_trace in trace
        .calculator_trace
        .iter()
        .flat_map(|task| task.input_trace.iter())
    {
        match stream_trace.latency() {
            Some(latency) => latencies.push(latency),
            None => unresolved_hops += 1,
        }
    }

    if latencies.is_empty() {
        return LatencyDistribution {
            unresolved_hops,
            ..LatencyDistribution::default()
        };
    }

    latencies.sort_unstable();
    let total: i64 = latencies.iter().sum();

    LatencyDistribution {
        resolved_hops: latencies.len(),
        unresolved_hops,
        mean_micros: total as f64 / latencies.len() as f64,
        median_micros: latencies[latencies.len() / 2],
        max_micros: latencies[latencies.len() - 1],
    }
}

impl LatencyDistribution {
    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Hops: {} resolved, {} unresolved | Mean: {:.1}us | Median: {}us | Max: {}us",
            self.resolved_hops,
            self.unresolved_hops,
            self.mean_micros,
            self.median_micros,
            self.max_micros
        )
    }
}

/// Render the hottest calculators as a text table
///
/// **Public** - used by the build command with `--summary`
pub fn generate_text_summary(stats: &[NodeStats], max_lines: usize) -> String {
    let mut lines = Vec::new();
    let total: i64 = stats.iter().map(|s| s.total_micros).sum::<i64>().max(1);

    lines.push("  CALCULATOR BUSY TIME".to_string());
    lines.push(format!(
        "  {:<8} {:<18} {:>8} {:>12} {:>10} {:>10} {:>7}",
        "NODE", "EVENT", "TASKS", "TOTAL(us)", "MEAN(us)", "MAX(us)", "%"
    ));
    lines.push(format!("  {}", "-".repeat(79)));

    for node in stats.iter().take(max_lines) {
        let percentage = (node.total_micros as f64 / total as f64) * 100.0;
        lines.push(format!(
            "  {:<8} {:<18} {:>8} {:>12} {:>10} {:>10} {:>6.1}%",
            node.node_id,
            node.event_type.name(),
            node.task_count,
            node.total_micros,
            node.mean_micros(),
            node.max_micros,
            percentage
        ));
    }

    if stats.len() > max_lines {
        lines.push(String::new());
        lines.push(format!(
            "   (Showing top {} of {} calculators)",
            max_lines,
            stats.len()
        ));
    }

    lines.join("\n")
}
