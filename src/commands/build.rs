//! Build command implementation.
//!
//! The build command:
//! 1. Reads the event dump
//! 2. Resolves the time window(s)
//! 3. Builds one trace (or log) per window with a single builder
//! 4. Writes the trace document

use super::models::BuildArgs;
use crate::aggregator::{calculate_hop_latency, calculate_node_stats, generate_text_summary};
use crate::buffer::TraceBuffer;
use crate::output::{validate_path, write_trace, TraceDocument, TraceMode};
use crate::parser::read_events;
use crate::trace::{GraphTrace, Timestamp, TraceBuilder, TraceEvent};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use std::path::Path;
use std::time::Instant;

/// Execute the build command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Unreadable or malformed event dump
/// * Unparseable window bounds
/// * File write errors
pub fn execute_build(args: BuildArgs) -> Result<TraceDocument> {
    let start_time = Instant::now();

    info!("Building {} from: {}", args.mode, args.input.display());

    // Step 1: Read events
    info!("Step 1/4: Reading events...");
    let events = load_events(&args.input, args.buffer_capacity)?;
    debug!("Loaded {} events", events.len());

    // Step 2: Resolve window
    info!("Step 2/4: Resolving time window...");
    let (begin, end) = resolve_window(&events, args.begin.as_deref(), args.end.as_deref())?;
    if end <= begin {
        warn!("Window is empty: {} .. {}", begin.to_rfc3339(), end.to_rfc3339());
    }
    let windows = split_windows(begin, end, args.window_micros);
    debug!("Processing {} windows", windows.len());

    // Step 3: Build traces
    info!("Step 3/4: Building {} window(s)...", windows.len());
    let mut builder = TraceBuilder::new();
    let traces: Vec<GraphTrace> = windows
        .iter()
        .map(|&(window_begin, window_end)| match args.mode {
            TraceMode::Trace => builder.create_trace(&events, window_begin, window_end),
            TraceMode::Log => builder.create_log(&events, window_begin, window_end),
        })
        .collect();

    // Step 4: Write output
    info!("Step 4/4: Writing trace document...");
    let document = TraceDocument::new(args.mode, begin, end, traces);
    write_trace(&document, &args.output_json).context("Failed to write trace JSON")?;

    info!(
        "✓ Trace written to: {} ({} records)",
        args.output_json.display(),
        document.record_count()
    );

    if args.print_summary {
        print_summary(&document, args.top_nodes);
    }

    let elapsed = start_time.elapsed();
    info!("Build completed in {:.2}s", elapsed.as_secs_f64());

    Ok(document)
}

/// Read the dump, optionally replaying it through a bounded buffer
///
/// **Private** - internal helper for execute_build
fn load_events(input: &Path, buffer_capacity: Option<usize>) -> Result<Vec<TraceEvent>> {
    let events = read_events(input)
        .with_context(|| format!("Failed to read events from {}", input.display()))?;

    let Some(capacity) = buffer_capacity else {
        return Ok(events);
    };

    let total = events.len();
    let mut buffer = TraceBuffer::new(capacity);
    buffer.extend(events);
    if total > buffer.len() {
        warn!(
            "Buffer capacity {} retained {} of {} events",
            buffer.capacity(),
            buffer.len(),
            total
        );
    }
    Ok(buffer.snapshot())
}

/// Resolve explicit or event-derived window bounds
///
/// **Private** - defaults cover every event in the dump
fn resolve_window(
    events: &[TraceEvent],
    begin: Option<&str>,
    end: Option<&str>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let begin = match begin {
        Some(raw) => parse_time(raw).context("Invalid --begin")?,
        None => events
            .iter()
            .map(|event| event.event_time)
            .min()
            .unwrap_or(DateTime::UNIX_EPOCH),
    };
    let end = match end {
        Some(raw) => parse_time(raw).context("Invalid --end")?,
        None => events
            .iter()
            .map(|event| {
                event
                    .event_time
                    .checked_add_signed(Duration::microseconds(1))
                    .unwrap_or(event.event_time)
            })
            .max()
            .unwrap_or(begin),
    };
    Ok((begin, end))
}

/// Split `[begin, end)` into consecutive windows
///
/// **Public** - successive windows share one builder, so they share one
/// time origin
pub fn split_windows(
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
    window_micros: Option<i64>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let Some(step) = window_micros.filter(|&step| step > 0) else {
        return vec![(begin, end)];
    };

    let step = Duration::microseconds(step);
    let mut windows = Vec::new();
    let mut window_begin = begin;
    while window_begin < end {
        let window_end = window_begin
            .checked_add_signed(step)
            .map_or(end, |next| next.min(end));
        windows.push((window_begin, window_end));
        window_begin = window_end;
    }
    if windows.is_empty() {
        windows.push((begin, end));
    }
    windows
}

/// Parse a time given as unix microseconds or RFC 3339
///
/// **Public** - shared by every command taking a time argument
pub fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(micros) = raw.parse::<i64>() {
        return DateTime::from_timestamp_micros(micros)
            .with_context(|| format!("Time out of range: {}", raw));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|time| time.with_timezone(&Utc))
        .with_context(|| format!("Expected unix microseconds or RFC 3339, got '{}'", raw))
}

/// First input timestamp not covered by events before `begin`
///
/// **Public** - backs the `next-timestamp` command
pub fn next_timestamp(input: &Path, begin: &str) -> Result<Timestamp> {
    let events = read_events(input)
        .with_context(|| format!("Failed to read events from {}", input.display()))?;
    let begin = parse_time(begin).context("Invalid --begin")?;
    Ok(TraceBuilder::timestamp_after(&events, begin))
}

/// Validate build arguments
///
/// **Public** - can be called before execute_build for early validation
pub fn validate_args(args: &BuildArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    validate_path(&args.output_json)?;

    if let Some(begin) = &args.begin {
        parse_time(begin).context("Invalid --begin")?;
    }
    if let Some(end) = &args.end {
        parse_time(end).context("Invalid --end")?;
    }

    if matches!(args.window_micros, Some(step) if step <= 0) {
        anyhow::bail!("window size must be greater than 0");
    }

    if args.buffer_capacity == Some(0) {
        anyhow::bail!("buffer capacity must be greater than 0");
    }

    if args.top_nodes == 0 {
        anyhow::bail!("top_nodes must be greater than 0");
    }

    Ok(())
}

/// Print per-window timing summary
///
/// **Private** - internal helper for execute_build
fn print_summary(document: &TraceDocument, top_nodes: usize) {
    if document.mode == TraceMode::Log {
        warn!("Summary needs aggregated traces; rerun with --mode trace");
        return;
    }

    for (index, trace) in document.traces.iter().enumerate() {
        let stats = calculate_node_stats(trace);
        let latency = calculate_hop_latency(trace);

        println!("\n{}", "=".repeat(80));
        println!("TRACE SUMMARY (window {} of {})", index + 1, document.traces.len());
        println!("{}", "=".repeat(80));
        println!(
            "Base Time:  {}",
            DateTime::from_timestamp_micros(trace.base_time)
                .map(|time| time.to_rfc3339())
                .unwrap_or_else(|| trace.base_time.to_string())
        );
        println!("Records:    {}", trace.calculator_trace.len());
        println!("Streams:    {}", trace.stream_name.len().saturating_sub(1));
        println!("{}", latency.summary());
        println!("\n{}", generate_text_summary(&stats, top_nodes));
        println!("{}", "=".repeat(80));
    }
}
