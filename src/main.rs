//! Graph Trace CLI
//!
//! Builds calculator traces and event logs from recorded graph events.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use graph_trace::commands::{
    display_schema, display_version, execute_build, next_timestamp, validate_args,
    validate_trace_file, BuildArgs,
};
use graph_trace::output::TraceMode;
use graph_trace::utils::config::DEFAULT_TOP_NODES;

/// Graph Trace - trace reconstruction for calculator graphs
#[derive(Parser, Debug)]
#[command(name = "graph-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a trace or event log from an event dump
    Build {
        /// Event dump (JSON array, wrapped object, or JSON lines)
        #[arg(short, long, env = "GRAPH_TRACE_INPUT")]
        input: PathBuf,

        /// Output path for the JSON trace document
        #[arg(short, long, default_value = "trace.json")]
        output: PathBuf,

        /// One record per task (trace) or per event (log)
        #[arg(short, long, value_enum, default_value_t = TraceMode::Trace)]
        mode: TraceMode,

        /// Window start, RFC 3339 or unix microseconds
        #[arg(long)]
        begin: Option<String>,

        /// Window end (exclusive), RFC 3339 or unix microseconds
        #[arg(long)]
        end: Option<String>,

        /// Split the range into windows of this many microseconds
        #[arg(long)]
        window_us: Option<i64>,

        /// Keep only the most recent N events, as a bounded recorder would
        #[arg(long)]
        buffer_capacity: Option<usize>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Number of calculators listed in the summary
        #[arg(long, default_value_t = DEFAULT_TOP_NODES)]
        top_nodes: usize,
    },

    /// Print the first input timestamp not yet covered before a time
    NextTimestamp {
        /// Event dump to scan
        #[arg(short, long, env = "GRAPH_TRACE_INPUT")]
        input: PathBuf,

        /// Window start, RFC 3339 or unix microseconds
        #[arg(short, long)]
        begin: String,
    },

    /// Validate a trace JSON file
    Validate {
        /// Path to trace JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Build {
            input,
            output,
            mode,
            begin,
            end,
            window_us,
            buffer_capacity,
            summary,
            top_nodes,
        } => {
            let args = BuildArgs {
                input,
                output_json: output,
                mode,
                begin,
                end,
                window_micros: window_us,
                buffer_capacity,
                print_summary: summary,
                top_nodes,
            };

            // Validate args first
            validate_args(&args)?;

            execute_build(args)?;
        }

        Commands::NextTimestamp { input, begin } => {
            let timestamp = next_timestamp(&input, &begin)?;
            println!("{}", timestamp);
        }

        Commands::Validate { file } => {
            validate_trace_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
