//! Tree assembler.
//!
//! Drives reconstruction over the ordered request sequence:
//! 1. Seed the root from the first valid event
//! 2. Link redirect continuations under their hop
//! 3. Resolve every other event's parent from its initiator
//! 4. Record unresolvable events as orphans
//! 5. Join responses onto nodes
//! 6. Aggregate totals

use super::join::JoinTable;
use super::redirect::{is_redirect_continuation, link_redirect, RequestIndex};
use super::resolver::{pointer_key, resolve_parent, PointerTable};
use super::tree::{NodeArena, NodeId, Tree};
use crate::aggregator::metrics::aggregate;
use crate::parser::schema::{Initiator, MalformedEvent, RequestEvent};
use crate::utils::config::MAX_MALFORMED_SAMPLES;
use crate::utils::error::{EventError, GraphError, OrphanReason};
use log::debug;
use serde::{Deserialize, Serialize};

/// Assembler options
#[derive(Debug, Clone, Default)]
pub struct AssemblerConfig {
    /// Attach `Other`-initiated requests under their frame's document
    /// node instead of orphaning them
    pub frame_fallback: bool,
}

impl AssemblerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame_fallback(mut self, enabled: bool) -> Self {
        self.frame_fallback = enabled;
        self
    }
}

/// A request that could not be attached to the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Orphan {
    pub event: RequestEvent,
    pub reason: OrphanReason,
}

/// Per-event problems collected during one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub orphans: Vec<Orphan>,

    /// Count of malformed events that were skipped
    pub skipped: usize,

    /// Bounded sample of the skipped events
    pub malformed: Vec<MalformedEvent>,
}

impl Diagnostics {
    pub fn record_malformed(&mut self, index: usize, error: EventError) {
        self.skipped += 1;
        if self.malformed.len() < MAX_MALFORMED_SAMPLES {
            self.malformed.push(MalformedEvent { index, error });
        }
    }

    /// Merge records rejected before assembly (e.g. by the capture parser).
    /// Earlier rejects come first in the sample.
    pub fn absorb_rejected(&mut self, skipped: usize, mut sample: Vec<MalformedEvent>) {
        self.skipped += skipped;
        sample.append(&mut self.malformed);
        sample.truncate(MAX_MALFORMED_SAMPLES);
        self.malformed = sample;
    }

    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty() && self.skipped == 0
    }
}

/// Result of a successful reconstruction
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub tree: Tree,
    pub diagnostics: Diagnostics,
}

/// Build the request tree from an ordered request sequence.
///
/// Per-event problems land in `Assembly::diagnostics`; processing always
/// continues past them.
///
/// # Errors
/// * `GraphError::EmptyCapture` - no valid event to use as the root
/// * `GraphError::DuplicateRoot` - a second top-level navigation of the root URL
pub fn assemble(
    requests: &[RequestEvent],
    join: &JoinTable,
    config: &AssemblerConfig,
) -> Result<Assembly, GraphError> {
    let mut assembler = TreeAssembler::new(config);
    let mut events = requests.iter().enumerate();

    // The first valid event is the root
    loop {
        let (index, event) = events.next().ok_or(GraphError::EmptyCapture)?;
        match event.validate() {
            Ok(()) => {
                assembler.seed(event);
                break;
            }
            Err(e) => assembler.diagnostics.record_malformed(index, e),
        }
    }

    for (index, event) in events {
        match event.validate() {
            Ok(()) => assembler.process(event)?,
            Err(e) => {
                debug!("Skipping malformed event {}: {}", index, e);
                assembler.diagnostics.record_malformed(index, e);
            }
        }
    }

    assembler.finish(join)
}

struct TreeAssembler<'a> {
    config: &'a AssemblerConfig,
    arena: NodeArena,
    pointers: PointerTable,
    requests: RequestIndex,
    diagnostics: Diagnostics,
    root_key: String,
}

impl<'a> TreeAssembler<'a> {
    fn new(config: &'a AssemblerConfig) -> Self {
        Self {
            config,
            arena: NodeArena::new(),
            pointers: PointerTable::new(),
            requests: RequestIndex::new(),
            diagnostics: Diagnostics::default(),
            root_key: String::new(),
        }
    }

    fn seed(&mut self, event: &RequestEvent) {
        debug!("Seeding tree with root {}", event.url);
        let root = self.arena.seed(event);
        self.pointers.insert(&event.url, root);
        self.requests.record(&event.request_id, root);
        self.root_key = pointer_key(&event.url).into_owned();
    }

    fn process(&mut self, event: &RequestEvent) -> Result<(), GraphError> {
        if is_redirect_continuation(event, &self.pointers)
            && link_redirect(
                event,
                &mut self.requests,
                &mut self.pointers,
                &mut self.arena,
            )
            .is_some()
        {
            return Ok(());
        }

        if matches!(event.initiator, Initiator::Other)
            && event.redirected_from_response.is_none()
            && pointer_key(&event.url) == self.root_key.as_str()
        {
            return Err(GraphError::DuplicateRoot {
                request_id: event.request_id.clone(),
                url: event.url.clone(),
            });
        }

        match resolve_parent(&event.initiator, &self.pointers) {
            Ok(parent) => self.attach(parent, event),
            Err(reason) => match self.frame_parent(event) {
                Some(parent) => self.attach(parent, event),
                None => {
                    debug!("Orphaned request {} ({}): {}", event.request_id, event.url, reason);
                    self.diagnostics.orphans.push(Orphan {
                        event: event.clone(),
                        reason,
                    });
                }
            },
        }

        Ok(())
    }

    fn attach(&mut self, parent: NodeId, event: &RequestEvent) {
        let id = self.arena.attach(parent, event);
        self.pointers.insert(&event.url, id);
        self.requests.record(&event.request_id, id);
    }

    /// Document node of the frame that issued an `Other`-initiated request
    fn frame_parent(&self, event: &RequestEvent) -> Option<NodeId> {
        if !self.config.frame_fallback || !matches!(event.initiator, Initiator::Other) {
            return None;
        }
        let parent = self.pointers.get(event.document_url.as_deref()?)?;
        // A document never becomes its own parent
        if self.arena.node(parent).url == event.url {
            return None;
        }
        Some(parent)
    }

    fn finish(mut self, join: &JoinTable) -> Result<Assembly, GraphError> {
        self.arena.apply_responses(join);
        debug!(
            "Assembled {} nodes, {} orphans, {} skipped",
            self.arena.len(),
            self.diagnostics.orphans.len(),
            self.diagnostics.skipped
        );

        let root = self.arena.into_root().ok_or(GraphError::EmptyCapture)?;
        let metrics = aggregate(&root);

        Ok(Assembly {
            tree: Tree {
                root,
                total_requests: metrics.total_requests,
                total_bytes: metrics.total_bytes,
                frame_ids: metrics.frame_ids,
            },
            diagnostics: self.diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::{RedirectResponse, ResponseEvent};

    const ROOT: &str = "http://site/a.html";

    fn root() -> RequestEvent {
        RequestEvent::new("root", ROOT, Initiator::Other).with_frame("main")
    }

    #[test]
    fn test_empty_capture_is_fatal() {
        let result = assemble(&[], &JoinTable::new(), &AssemblerConfig::new());
        assert_eq!(result.unwrap_err(), GraphError::EmptyCapture);
    }

    #[test]
    fn test_malformed_root_is_skipped() {
        let events = vec![
            RequestEvent::new("", "http://broken/", Initiator::Other),
            root(),
        ];
        let assembly = assemble(&events, &JoinTable::new(), &AssemblerConfig::new()).unwrap();
        assert_eq!(assembly.tree.root.url, ROOT);
        assert_eq!(assembly.diagnostics.skipped, 1);
        assert_eq!(assembly.diagnostics.malformed[0].index, 0);
    }

    #[test]
    fn test_duplicate_root_is_fatal() {
        let events = vec![root(), RequestEvent::new("again", ROOT, Initiator::Other)];
        let result = assemble(&events, &JoinTable::new(), &AssemblerConfig::new());
        assert!(matches!(result, Err(GraphError::DuplicateRoot { .. })));
    }

    #[test]
    fn test_root_redirect_is_not_duplicate() {
        let events = vec![
            root(),
            RequestEvent::new("root", "http://site/b.html", Initiator::Other)
                .with_redirect_from(RedirectResponse::new(ROOT, 301)),
        ];
        let assembly = assemble(&events, &JoinTable::new(), &AssemblerConfig::new()).unwrap();
        assert_eq!(assembly.tree.total_requests, 2);
        assert_eq!(assembly.tree.root.status, Some(301));
    }

    #[test]
    fn test_frame_fallback_attaches_other_initiators() {
        let events = vec![
            root(),
            RequestEvent::new("font", "http://site/f.woff", Initiator::Other)
                .with_document_url(ROOT),
        ];
        let join = JoinTable::new();

        let strict = assemble(&events, &join, &AssemblerConfig::new()).unwrap();
        assert_eq!(strict.tree.total_requests, 1);
        assert_eq!(strict.diagnostics.orphans.len(), 1);
        assert_eq!(
            strict.diagnostics.orphans[0].reason,
            OrphanReason::AmbiguousInitiator
        );

        let config = AssemblerConfig::new().with_frame_fallback(true);
        let lenient = assemble(&events, &join, &config).unwrap();
        assert_eq!(lenient.tree.total_requests, 2);
        assert!(lenient.diagnostics.is_clean());
    }

    #[test]
    fn test_pointer_not_overwritten_by_refetch() {
        let events = vec![
            root(),
            RequestEvent::new("1", "http://site/x.js", Initiator::parser(ROOT)),
            RequestEvent::new("2", "http://site/frame.html", Initiator::parser(ROOT)),
            RequestEvent::new("3", "http://site/x.js", Initiator::parser("http://site/frame.html")),
            RequestEvent::new("4", "http://site/y.json", Initiator::script(["http://site/x.js"])),
        ];
        let assembly = assemble(&events, &JoinTable::new(), &AssemblerConfig::new()).unwrap();
        let root = &assembly.tree.root;
        assert!(root.has_chain(&[ROOT, "http://site/x.js", "http://site/y.json"]));
        assert_eq!(assembly.tree.total_requests, 5);
    }

    #[test]
    fn test_unjoined_nodes_keep_sentinel() {
        let events = vec![
            root(),
            RequestEvent::new("1", "http://site/a.js", Initiator::parser(ROOT)),
        ];
        let join: JoinTable = vec![ResponseEvent::new("root", 200, 300)].into_iter().collect();
        let assembly = assemble(&events, &join, &AssemblerConfig::new()).unwrap();

        assert_eq!(assembly.tree.total_bytes, 300);
        assert_eq!(assembly.tree.root.children[0].encoded_bytes, -1);
        assert_eq!(assembly.tree.root.children[0].status, None);
    }
}
