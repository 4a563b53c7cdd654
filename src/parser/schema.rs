//! Typed event records emitted by the browser's network instrumentation.
//!
//! These are the inputs of the reconstruction engine. They are immutable
//! once captured; the JSON shape (camelCase) is also the "normalized
//! capture" file format.

use crate::utils::config::UNKNOWN_BYTES;
use crate::utils::error::EventError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// DevTools resource type tag, passed through unchanged onto nodes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceType {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    TextTrack,
    Xhr,
    Fetch,
    Prefetch,
    EventSource,
    WebSocket,
    Manifest,
    SignedExchange,
    Ping,
    CspViolationReport,
    Preflight,
    #[default]
    Other,
}

impl ResourceType {
    /// Name as reported by the DevTools protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Stylesheet => "Stylesheet",
            Self::Image => "Image",
            Self::Media => "Media",
            Self::Font => "Font",
            Self::Script => "Script",
            Self::TextTrack => "TextTrack",
            Self::Xhr => "XHR",
            Self::Fetch => "Fetch",
            Self::Prefetch => "Prefetch",
            Self::EventSource => "EventSource",
            Self::WebSocket => "WebSocket",
            Self::Manifest => "Manifest",
            Self::SignedExchange => "SignedExchange",
            Self::Ping => "Ping",
            Self::CspViolationReport => "CSPViolationReport",
            Self::Preflight => "Preflight",
            Self::Other => "Other",
        }
    }
}

impl std::str::FromStr for ResourceType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "document" => Self::Document,
            "stylesheet" => Self::Stylesheet,
            "image" => Self::Image,
            "media" => Self::Media,
            "font" => Self::Font,
            "script" => Self::Script,
            "texttrack" => Self::TextTrack,
            "xhr" => Self::Xhr,
            "fetch" => Self::Fetch,
            "prefetch" => Self::Prefetch,
            "eventsource" => Self::EventSource,
            "websocket" => Self::WebSocket,
            "manifest" => Self::Manifest,
            "signedexchange" => Self::SignedExchange,
            "ping" => Self::Ping,
            "cspviolationreport" => Self::CspViolationReport,
            "preflight" => Self::Preflight,
            _ => Self::Other,
        })
    }
}

impl From<String> for ResourceType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl From<ResourceType> for String {
    fn from(value: ResourceType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One frame of a script initiator's call stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFrame {
    pub url: String,

    #[serde(default, alias = "lineNumber")]
    pub line: u32,
}

impl CallFrame {
    pub fn new(url: impl Into<String>, line: u32) -> Self {
        Self {
            url: url.into(),
            line,
        }
    }
}

/// What caused a request to be issued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Initiator {
    /// Discovered while parsing the document at `url`
    Parser { url: String },

    /// Issued by executing script; frames are innermost first
    Script {
        #[serde(rename = "callFrames", default)]
        call_frames: Vec<CallFrame>,
    },

    /// No structural link (preloads, speculative fetches, navigations)
    #[serde(other)]
    Other,
}

impl Initiator {
    pub fn parser(url: impl Into<String>) -> Self {
        Self::Parser { url: url.into() }
    }

    /// Script initiator from innermost-first frame URLs
    pub fn script<I, S>(frame_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Script {
            call_frames: frame_urls
                .into_iter()
                .map(|url| CallFrame::new(url, 0))
                .collect(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parser { .. } => "parser",
            Self::Script { .. } => "script",
            Self::Other => "other",
        }
    }
}

/// The response that caused a redirect hop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectResponse {
    /// URL of the hop that answered with a redirect
    pub url: String,

    pub status: u16,

    #[serde(default = "unknown_bytes")]
    pub encoded_bytes: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length_header: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_baseline: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl RedirectResponse {
    pub fn new(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status,
            encoded_bytes: UNKNOWN_BYTES,
            content_length_header: None,
            timing_baseline: None,
            timestamp: None,
        }
    }

    pub fn elapsed_ms(&self) -> Option<f64> {
        match (self.timing_baseline, self.timestamp) {
            (Some(start), Some(end)) => Some(elapsed_between(start, end)),
            _ => None,
        }
    }
}

/// Browser-level "about to send" notification for one request attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEvent {
    pub request_id: String,

    pub url: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default)]
    pub resource_type: ResourceType,

    #[serde(default)]
    pub frame_id: String,

    #[serde(default = "other_initiator")]
    pub initiator: Initiator,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirected_from_response: Option<RedirectResponse>,

    /// URL of the document owning the frame that issued the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,

    /// Monotonic send time in seconds
    #[serde(default)]
    pub timestamp: f64,
}

impl RequestEvent {
    pub fn new(request_id: impl Into<String>, url: impl Into<String>, initiator: Initiator) -> Self {
        Self {
            request_id: request_id.into(),
            url: url.into(),
            method: default_method(),
            resource_type: ResourceType::Other,
            frame_id: String::new(),
            initiator,
            redirected_from_response: None,
            document_url: None,
            timestamp: 0.0,
        }
    }

    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = resource_type;
        self
    }

    pub fn with_frame(mut self, frame_id: impl Into<String>) -> Self {
        self.frame_id = frame_id.into();
        self
    }

    pub fn with_document_url(mut self, document_url: impl Into<String>) -> Self {
        self.document_url = Some(document_url.into());
        self
    }

    pub fn with_redirect_from(mut self, response: RedirectResponse) -> Self {
        self.redirected_from_response = Some(response);
        self
    }

    /// Reject events that cannot take part in reconstruction
    pub fn validate(&self) -> Result<(), EventError> {
        if self.request_id.trim().is_empty() {
            return Err(EventError::MissingField("requestId".to_string()));
        }
        if self.url.trim().is_empty() {
            return Err(EventError::MissingField("url".to_string()));
        }
        if self.method.trim().is_empty() {
            return Err(EventError::MissingField("method".to_string()));
        }
        if let Initiator::Parser { url } = &self.initiator {
            if url.trim().is_empty() {
                return Err(EventError::MissingField("initiator.url".to_string()));
            }
        }
        if let Some(redirect) = &self.redirected_from_response {
            if redirect.url.trim().is_empty() {
                return Err(EventError::MissingField(
                    "redirectedFromResponse.url".to_string(),
                ));
            }
        }
        if !self.timestamp.is_finite() {
            return Err(EventError::InvalidField {
                field: "timestamp".to_string(),
                reason: format!("not a finite number: {}", self.timestamp),
            });
        }
        Ok(())
    }
}

/// Final response for a request, joined by request id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEvent {
    pub request_id: String,

    pub status: u16,

    #[serde(default = "unknown_bytes")]
    pub encoded_bytes: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length_header: Option<i64>,

    /// Time the request started, in seconds
    #[serde(default)]
    pub timing_baseline: f64,

    /// Time the response finished loading, in seconds
    #[serde(default)]
    pub timestamp: f64,
}

impl ResponseEvent {
    pub fn new(request_id: impl Into<String>, status: u16, encoded_bytes: i64) -> Self {
        Self {
            request_id: request_id.into(),
            status,
            encoded_bytes,
            content_length_header: None,
            timing_baseline: 0.0,
            timestamp: 0.0,
        }
    }

    pub fn with_timing(mut self, baseline: f64, timestamp: f64) -> Self {
        self.timing_baseline = baseline;
        self.timestamp = timestamp;
        self
    }

    pub fn elapsed_ms(&self) -> f64 {
        elapsed_between(self.timing_baseline, self.timestamp)
    }
}

/// An event that was rejected and skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedEvent {
    /// Position of the record in its input sequence
    pub index: usize,
    pub error: EventError,
}

fn elapsed_between(start: f64, end: f64) -> f64 {
    ((end - start) * 1000.0).max(0.0)
}

fn default_method() -> String {
    "GET".to_string()
}

fn unknown_bytes() -> i64 {
    UNKNOWN_BYTES
}

fn other_initiator() -> Initiator {
    Initiator::Other
}
