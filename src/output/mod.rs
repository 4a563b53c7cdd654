//! Output writers for request tree reports.
//!
//! This module handles:
//! - The versioned JSON report schema
//! - Writing and reading reports on disk
//! - Plain-text tree rendering

pub mod json;
pub mod report;
pub mod text;

// Re-export main functions
pub use json::{read_report, report_to_string, write_report};
pub use report::{to_report, Report};
pub use text::{format_bytes, render_tree};
