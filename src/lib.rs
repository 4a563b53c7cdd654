//! Request Tree
//!
//! Reconstructs the causal dependency tree of the network requests a
//! browser issues while loading a page: which request triggered which,
//! through HTML parsing, script execution, redirects and nested frames,
//! annotated with status, encoded size and timing.
//!
//! ## Getting Started
//!
//! ```ignore
//! use request_tree::graph::{assemble, AssemblerConfig};
//! use request_tree::parser::parse_capture_str;
//!
//! let capture = parse_capture_str(&std::fs::read_to_string("capture.json")?)?;
//! let assembly = assemble(&capture.requests, &capture.join, &AssemblerConfig::new())?;
//! println!("{} requests", assembly.tree.total_requests);
//! ```
//!
//! The `request-tree` CLI wraps the same pipeline and writes a JSON report.

pub mod aggregator;
pub mod commands;
pub mod graph;
pub mod output;
pub mod parser;
pub mod utils;
