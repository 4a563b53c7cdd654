//! Aggregation over completed request trees.
//!
//! This module derives from a finished tree:
//! - Request count, byte total and frame id set
//! - Per resource type breakdown
//! - Heavy request chains (largest fetches and what caused them)

pub mod chains;
pub mod metrics;

// Re-export main types and functions
pub use chains::{calculate_heavy_chains, RequestChain};
pub use metrics::{aggregate, resource_breakdown, summary_line, TreeMetrics, TypeSummary};
