use anyhow::Result;
use std::path::PathBuf;
use crate::output::read_trace;
use crate::utils::config::SCHEMA_VERSION;

/// Validate a trace document JSON file
pub fn validate_trace_file(file_path: PathBuf) -> Result<()> {
    println!("Validating trace: {}", file_path.display());

    let document = read_trace(&file_path)?;

    if document.version != SCHEMA_VERSION {
        anyhow::bail!(
            "Unsupported schema version {} (expected {})",
            document.version,
            SCHEMA_VERSION
        );
    }

    println!("✓ Valid trace JSON");
    println!("  Version: {}", document.version);
    println!("  Mode: {}", document.mode);
    println!("  Window: {} .. {}", document.window_begin.to_rfc3339(), document.window_end.to_rfc3339());
    println!("  Windows: {}", document.traces.len());
    println!("  Calculator Records: {}", document.record_count());

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Graph Trace Document Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  mode: string               - 'trace' (per task) or 'log' (per event)");
        println!("  window_begin: string       - Covered range start (RFC 3339)");
        println!("  window_end: string         - Covered range end, exclusive");
        println!("  traces: array              - One graph trace per window");
        println!("    base_time: number        - Unix micros represented as 0");
        println!("    base_timestamp: number   - Packet timestamp represented as 0");
        println!("    calculator_trace: array  - Task or event records");
        println!("      node_id: number        - Calculator id");
        println!("      event_type: string     - OPEN, PROCESS, CLOSE, ...");
        println!("      input_timestamp: number? - Relative input timestamp");
        println!("      start_time: number?    - Relative start (us)");
        println!("      finish_time: number?   - Relative finish (us)");
        println!("      input_trace: array     - Packets consumed");
        println!("      output_trace: array    - Packets produced");
        println!("      thread_id: number      - Executing thread");
        println!("    stream_name: array       - Stream names indexed by stream_id");
        println!("  generated_at: string       - ISO 8601 timestamp");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Graph Trace v{}", env!("CARGO_PKG_VERSION"));
    println!("Trace Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Trace reconstruction and profiling for calculator dataflow graphs.");
}
