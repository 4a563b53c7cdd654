//! Configuration and constants for the engine and CLI.

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Sentinel for a node whose response was never joined
pub const UNKNOWN_BYTES: i64 = -1;

// Data URIs are keyed by their header plus this many payload characters.
// Inline fonts and images can be megabytes long.
pub const DATA_URI_KEY_CHARS: usize = 20;

/// Longest data URI header (text before the first comma) kept in a key
pub const DATA_URI_HEADER_CHARS: usize = 64;

/// How many malformed events are kept as samples in diagnostics
pub const MAX_MALFORMED_SAMPLES: usize = 10;

/// Default number of heavy request chains in a report
pub const DEFAULT_HEAVY_CHAINS: usize = 10;

// DevTools protocol method names we consume from a raw network log
pub const METHOD_REQUEST_WILL_BE_SENT: &str = "Network.requestWillBeSent";
pub const METHOD_RESPONSE_RECEIVED: &str = "Network.responseReceived";
pub const METHOD_LOADING_FINISHED: &str = "Network.loadingFinished";

// Fields that may hold the event list in a wrapped DevTools log
pub const EVENT_FIELD_NAMES: &[&str] = &["events", "log", "messages"];
