//! Capture parsing and event schema definitions.
//!
//! This module handles:
//! - Typed request/response/redirect event records
//! - Parsing normalized captures and raw DevTools network logs
//! - Rejecting malformed records without aborting the parse

pub mod capture;
pub mod schema;

// Re-export main types
pub use capture::{parse_capture, parse_capture_str, ParsedCapture};
pub use schema::{
    CallFrame, Initiator, MalformedEvent, RedirectResponse, RequestEvent, ResourceType,
    ResponseEvent,
};
