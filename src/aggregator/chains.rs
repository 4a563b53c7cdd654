//! Causal request chains.
//!
//! A chain is the path of URLs from the root to one node, e.g.
//! `page.html > app.js > hero.jpg`. Ranking chains by the size of their
//! last node answers "what triggered this large fetch".

use crate::graph::tree::Node;
use log::debug;
use serde::{Deserialize, Serialize};

/// Root-to-node path with the size of the final node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestChain {
    /// URLs from the root down to the node
    pub urls: Vec<String>,

    /// Encoded size of the last node
    pub encoded_bytes: i64,

    /// Share of the tree's total bytes
    pub percentage: f64,
}

impl RequestChain {
    pub fn target(&self) -> Option<&str> {
        self.urls.last().map(String::as_str)
    }

    /// Render as `a > b > c`
    pub fn to_line(&self) -> String {
        self.urls.join(" > ")
    }
}

/// Chains for the `top_n` largest nodes, largest first.
///
/// Nodes of unknown or zero size are skipped. Equal sizes keep tree
/// pre-order.
pub fn calculate_heavy_chains(root: &Node, total_bytes: u64, top_n: usize) -> Vec<RequestChain> {
    let mut chains = Vec::new();
    let mut path: Vec<&str> = Vec::new();
    let mut stack: Vec<(&Node, usize)> = vec![(root, 0)];

    while let Some((node, depth)) = stack.pop() {
        // Returning from a subtree: drop the frames below this depth
        path.truncate(depth);
        path.push(node.url.as_str());

        if node.encoded_bytes > 0 {
            chains.push(create_chain(&path, node.encoded_bytes, total_bytes));
        }

        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }

    // Stable sort keeps pre-order among ties
    chains.sort_by(|a, b| b.encoded_bytes.cmp(&a.encoded_bytes));
    chains.truncate(top_n);

    debug!("Selected {} heavy chains", chains.len());

    chains
}

fn create_chain(path: &[&str], encoded_bytes: i64, total_bytes: u64) -> RequestChain {
    let percentage = if total_bytes > 0 {
        (encoded_bytes as f64 / total_bytes as f64) * 100.0
    } else {
        0.0
    };

    RequestChain {
        urls: path.iter().map(|url| url.to_string()).collect(),
        encoded_bytes,
        percentage,
    }
}
