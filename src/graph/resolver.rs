//! Initiator resolution against the URL pointer table.
//!
//! A request's parent is found by looking up the URL its initiator names:
//! the parsing document for parser initiators, or the innermost call
//! frame that is itself a tracked resource for script initiators.

use super::tree::NodeId;
use crate::parser::schema::Initiator;
use crate::utils::config::{DATA_URI_HEADER_CHARS, DATA_URI_KEY_CHARS};
use crate::utils::error::OrphanReason;
use std::borrow::Cow;
use std::collections::HashMap;

/// URL to node lookup scoped to one reconstruction run
#[derive(Debug, Clone, Default)]
pub struct PointerTable {
    entries: HashMap<String, NodeId>,
}

impl PointerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<NodeId> {
        self.entries.get(pointer_key(url).as_ref()).copied()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.get(url).is_some()
    }

    /// Point `url` at `id` unless it already points somewhere.
    /// Returns whether the entry was set.
    pub fn insert(&mut self, url: &str, id: NodeId) -> bool {
        use std::collections::hash_map::Entry;

        match self.entries.entry(pointer_key(url).into_owned()) {
            Entry::Vacant(slot) => {
                slot.insert(id);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Point `url` at `id`, replacing any earlier entry (redirects only)
    pub fn supersede(&mut self, url: &str, id: NodeId) {
        self.entries.insert(pointer_key(url).into_owned(), id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Key used for `url` in the pointer table.
///
/// Data URIs are cut to at most `DATA_URI_HEADER_CHARS` of their header
/// plus the first `DATA_URI_KEY_CHARS` payload characters; every other
/// URL is used as is.
pub fn pointer_key(url: &str) -> Cow<'_, str> {
    if !is_data_uri(url) {
        return Cow::Borrowed(url);
    }

    match url.split_once(',') {
        Some((header, payload)) => {
            let mut key: String = header.chars().take(DATA_URI_HEADER_CHARS).collect();
            key.push(',');
            key.extend(payload.chars().take(DATA_URI_KEY_CHARS));
            Cow::Owned(key)
        }
        None => Cow::Owned(url.chars().take("data:".len() + DATA_URI_KEY_CHARS).collect()),
    }
}

pub fn is_data_uri(url: &str) -> bool {
    url.get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Find the node that caused a request with this initiator.
///
/// # Errors
/// * `OrphanReason::OrphanedInitiator` - no referenced URL is tracked
/// * `OrphanReason::AmbiguousInitiator` - `Other` initiators never resolve here
pub fn resolve_parent(
    initiator: &Initiator,
    pointers: &PointerTable,
) -> Result<NodeId, OrphanReason> {
    match initiator {
        Initiator::Parser { url } => pointers.get(url).ok_or_else(|| {
            OrphanReason::OrphanedInitiator {
                urls: vec![url.clone()],
            }
        }),

        // Innermost frame first; outer frames cover inline and eval'd code
        Initiator::Script { call_frames } => call_frames
            .iter()
            .find_map(|frame| pointers.get(&frame.url))
            .ok_or_else(|| OrphanReason::OrphanedInitiator {
                urls: call_frames.iter().map(|frame| frame.url.clone()).collect(),
            }),

        Initiator::Other => Err(OrphanReason::AmbiguousInitiator),
    }
}
