//! Output writers for trace documents.
//!
//! This module handles:
//! - The versioned document wrapping one or more `GraphTrace`s
//! - Writing and reading documents as pretty JSON

pub mod document;
pub mod json;

// Re-export main types and functions
pub use document::{TraceDocument, TraceMode};
pub use json::{read_trace, trace_to_string, validate_path, write_trace};
