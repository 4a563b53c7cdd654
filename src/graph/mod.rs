//! Event-to-graph resolution engine.
//!
//! This module turns an ordered request sequence plus a response join
//! table into one rooted request tree:
//! - Join table (request id -> latest response)
//! - Initiator resolver over the URL pointer table
//! - Redirect linker threading hop chains
//! - Tree assembler driving the run and collecting diagnostics

pub mod assembler;
pub mod join;
pub mod redirect;
pub mod resolver;
pub mod tree;

// Re-export main types and functions
pub use assembler::{assemble, Assembly, AssemblerConfig, Diagnostics, Orphan};
pub use join::JoinTable;
pub use resolver::{pointer_key, resolve_parent, PointerTable};
pub use tree::{Node, NodeId, Tree};
