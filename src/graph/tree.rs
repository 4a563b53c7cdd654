//! Request tree nodes and the arena used while building them.

use super::join::JoinTable;
use crate::parser::schema::{RedirectResponse, RequestEvent, ResourceType};
use crate::utils::config::UNKNOWN_BYTES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One captured request and the requests it caused
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub request_id: String,
    pub url: String,
    pub method: String,
    pub resource_type: ResourceType,

    /// HTTP status, absent if no response was joined
    pub status: Option<u16>,

    /// Encoded body size, `UNKNOWN_BYTES` if no response was joined
    pub encoded_bytes: i64,

    /// Content-Length header as sent, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<i64>,

    pub elapsed_ms: Option<f64>,
    pub frame_id: String,

    /// In arrival order
    pub children: Vec<Node>,
}

impl Node {
    pub fn from_event(event: &RequestEvent) -> Self {
        Self {
            request_id: event.request_id.clone(),
            url: event.url.clone(),
            method: event.method.clone(),
            resource_type: event.resource_type,
            status: None,
            encoded_bytes: UNKNOWN_BYTES,
            content_length: None,
            elapsed_ms: None,
            frame_id: event.frame_id.clone(),
            children: Vec::new(),
        }
    }

    pub fn is_size_known(&self) -> bool {
        self.encoded_bytes != UNKNOWN_BYTES
    }

    /// Bytes counted towards totals; the unknown sentinel counts as 0
    pub fn counted_bytes(&self) -> u64 {
        u64::try_from(self.encoded_bytes).unwrap_or(0)
    }

    pub fn child(&self, url: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.url == url)
    }

    /// Pre-order walk over this node and all descendants
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }

    /// Path from this node down to the first descendant with `url`.
    ///
    /// The returned chain starts with `self` and ends with the match.
    pub fn chain_to(&self, url: &str) -> Option<Vec<&Node>> {
        if self.url == url {
            return Some(vec![self]);
        }
        self.children.iter().find_map(|child| {
            child.chain_to(url).map(|mut chain| {
                chain.insert(0, self);
                chain
            })
        })
    }

    /// True if following `urls` child by child from this node succeeds.
    /// The first URL must be this node's own.
    pub fn has_chain<S: AsRef<str>>(&self, urls: &[S]) -> bool {
        let Some((first, rest)) = urls.split_first() else {
            return false;
        };
        if self.url != first.as_ref() {
            return false;
        }
        let mut pointer = self;
        for url in rest {
            match pointer.child(url.as_ref()) {
                Some(next) => pointer = next,
                None => return false,
            }
        }
        true
    }
}

/// Pre-order iterator over a subtree
pub struct NodeIter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Completed request tree with aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    pub root: Node,
    pub total_requests: usize,
    pub total_bytes: u64,
    pub frame_ids: BTreeSet<String>,
}

/// Index of a node inside a `NodeArena`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
struct PendingNode {
    node: Node,
    children: Vec<NodeId>,
    /// Response that redirected away from this node
    hop_response: Option<RedirectResponse>,
}

/// Append-only node storage used during assembly.
///
/// Children always get a larger id than their parent, so the owned tree
/// can be built bottom-up without recursion.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<PendingNode>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root node
    pub fn seed(&mut self, event: &RequestEvent) -> NodeId {
        self.push(event)
    }

    /// Create a node for `event` as the last child of `parent`
    pub fn attach(&mut self, parent: NodeId, event: &RequestEvent) -> NodeId {
        let id = self.push(event);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Remember the redirect response produced by `hop`.
    /// The first recorded response is kept.
    pub fn record_hop(&mut self, hop: NodeId, response: &RedirectResponse) {
        let pending = &mut self.nodes[hop.0];
        if pending.hop_response.is_none() {
            pending.hop_response = Some(response.clone());
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0].node
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Fill status, size and timing on every node.
    ///
    /// Redirect hops take their fields from the redirect response; all
    /// other nodes from the join table. Nodes with neither stay unknown.
    pub fn apply_responses(&mut self, join: &JoinTable) {
        for pending in &mut self.nodes {
            let node = &mut pending.node;
            if let Some(hop) = &pending.hop_response {
                node.status = Some(hop.status);
                node.encoded_bytes = hop.encoded_bytes;
                node.content_length = hop.content_length_header;
                node.elapsed_ms = hop.elapsed_ms();
            } else if let Some(response) = join.lookup(&node.request_id) {
                node.status = Some(response.status);
                node.encoded_bytes = response.encoded_bytes;
                node.content_length = response.content_length_header;
                node.elapsed_ms = Some(response.elapsed_ms());
            }
        }
    }

    /// Consume the arena into the owned tree under the seeded root
    pub fn into_root(self) -> Option<Node> {
        let mut built: Vec<Option<Node>> = Vec::with_capacity(self.nodes.len());
        built.resize_with(self.nodes.len(), || None);

        for (index, pending) in self.nodes.into_iter().enumerate().rev() {
            let mut node = pending.node;
            node.children = pending
                .children
                .iter()
                .filter_map(|child| built[child.0].take())
                .collect();
            built[index] = Some(node);
        }

        built.into_iter().next().flatten()
    }

    fn push(&mut self, event: &RequestEvent) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(PendingNode {
            node: Node::from_event(event),
            children: Vec::new(),
            hop_response: None,
        });
        id
    }
}
