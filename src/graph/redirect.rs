//! Redirect hop linking.
//!
//! A redirected request is threaded under the hop that redirected it, so a
//! chain reads `original -> 302 -> 302 -> final` instead of siblings.

use super::resolver::{pointer_key, PointerTable};
use super::tree::{NodeArena, NodeId};
use crate::parser::schema::RequestEvent;
use std::collections::HashMap;

/// Latest node created for each request id
#[derive(Debug, Clone, Default)]
pub struct RequestIndex {
    latest: HashMap<String, NodeId>,
}

impl RequestIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, request_id: &str, id: NodeId) {
        self.latest.insert(request_id.to_string(), id);
    }

    pub fn get(&self, request_id: &str) -> Option<NodeId> {
        self.latest.get(request_id).copied()
    }
}

/// True when `event` continues a redirect from a hop we already track
pub fn is_redirect_continuation(event: &RequestEvent, pointers: &PointerTable) -> bool {
    event
        .redirected_from_response
        .as_ref()
        .is_some_and(|hop| pointers.contains(&hop.url))
}

/// Node that produced the redirect `event` continues.
///
/// The latest node of the same request at the hop URL wins, so a URL
/// fetched twice keeps each redirect under its own hop. The pointer table
/// covers a landed request that got a new id.
pub fn find_hop(
    event: &RequestEvent,
    requests: &RequestIndex,
    pointers: &PointerTable,
    arena: &NodeArena,
) -> Option<NodeId> {
    let hop_url = &event.redirected_from_response.as_ref()?.url;

    requests
        .get(&event.request_id)
        .filter(|id| pointer_key(&arena.node(*id).url) == pointer_key(hop_url))
        .or_else(|| pointers.get(hop_url))
}

/// Attach `event` under the hop that redirected to it.
///
/// The hop node keeps the redirect status; the new node takes over the
/// pointer entry for its URL. Returns `None` when `event` is not a
/// continuation.
pub fn link_redirect(
    event: &RequestEvent,
    requests: &mut RequestIndex,
    pointers: &mut PointerTable,
    arena: &mut NodeArena,
) -> Option<NodeId> {
    let hop_response = event.redirected_from_response.as_ref()?;
    let hop = find_hop(event, requests, pointers, arena)?;

    arena.record_hop(hop, hop_response);
    let id = arena.attach(hop, event);
    pointers.supersede(&event.url, id);
    requests.record(&event.request_id, id);

    Some(id)
}
