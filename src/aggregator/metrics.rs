//! Tree-level aggregates.
//!
//! Totals are folded over a completed tree in one walk. Unknown sizes
//! count as zero here but stay visible on the nodes themselves.

use crate::graph::tree::Node;
use crate::parser::schema::ResourceType;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Totals over every attached node, root included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeMetrics {
    pub total_requests: usize,
    pub total_bytes: u64,
    pub frame_ids: BTreeSet<String>,
}

/// Count and bytes for one resource type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSummary {
    pub count: u64,
    pub bytes: u64,

    /// Nodes of this type with no joined response
    pub unknown_size: u64,
}

/// Fold request count, byte total and frame ids over the tree
pub fn aggregate(root: &Node) -> TreeMetrics {
    let mut metrics = TreeMetrics::default();

    for node in root.iter() {
        metrics.total_requests += 1;
        metrics.total_bytes += node.counted_bytes();
        if !node.frame_id.is_empty() {
            metrics.frame_ids.insert(node.frame_id.clone());
        }
    }

    debug!(
        "Aggregated {} requests, {} bytes across {} frames",
        metrics.total_requests,
        metrics.total_bytes,
        metrics.frame_ids.len()
    );

    metrics
}

/// Per resource type breakdown of the tree
pub fn resource_breakdown(root: &Node) -> BTreeMap<ResourceType, TypeSummary> {
    let mut by_type: BTreeMap<ResourceType, TypeSummary> = BTreeMap::new();

    for node in root.iter() {
        let summary = by_type.entry(node.resource_type).or_default();
        summary.count += 1;
        summary.bytes += node.counted_bytes();
        if !node.is_size_known() {
            summary.unknown_size += 1;
        }
    }

    by_type
}

/// Human-readable one line summary
pub fn summary_line(metrics: &TreeMetrics) -> String {
    format!(
        "Requests: {} | Bytes: {} | Frames: {}",
        metrics.total_requests,
        metrics.total_bytes,
        metrics.frame_ids.len()
    )
}
