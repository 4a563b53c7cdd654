//! Report schema written to disk.
//!
//! Schema is versioned to allow future evolution.

use crate::aggregator::{calculate_heavy_chains, resource_breakdown, RequestChain, TypeSummary};
use crate::graph::{Assembly, Orphan, Tree};
use crate::parser::schema::{MalformedEvent, ResourceType};
use crate::utils::config::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level report structure written to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Schema version for compatibility checking
    pub version: String,

    /// Where the capture came from (file path or label)
    pub source: String,

    /// Timestamp when the report was generated
    pub generated_at: String,

    pub tree: Tree,

    /// Requests that could not be attached
    pub orphans: Vec<Orphan>,

    pub skipped_events: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub malformed_sample: Vec<MalformedEvent>,

    pub resource_breakdown: BTreeMap<ResourceType, TypeSummary>,

    /// Largest fetches with their causal chain
    pub heavy_chains: Vec<RequestChain>,
}

/// Build a report from an assembly
pub fn to_report(source: &str, assembly: Assembly, heavy_chains: usize) -> Report {
    use chrono::Utc;

    let Assembly { tree, diagnostics } = assembly;
    let breakdown = resource_breakdown(&tree.root);
    let chains = calculate_heavy_chains(&tree.root, tree.total_bytes, heavy_chains);

    Report {
        version: SCHEMA_VERSION.to_string(),
        source: source.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        tree,
        orphans: diagnostics.orphans,
        skipped_events: diagnostics.skipped,
        malformed_sample: diagnostics.malformed,
        resource_breakdown: breakdown,
        heavy_chains: chains,
    }
}
