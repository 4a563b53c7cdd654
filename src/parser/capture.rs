//! Capture file parser.
//!
//! Turns a captured network log into typed request events and a filled
//! join table. Two input shapes are detected:
//! - the normalized `{ "requests": [...], "responses": [...] }` capture
//! - a raw DevTools log of `{ "method": ..., "params": ... }` records

use super::schema::{
    CallFrame, Initiator, MalformedEvent, RedirectResponse, RequestEvent, ResourceType,
    ResponseEvent,
};
use crate::graph::join::JoinTable;
use crate::utils::config::{
    EVENT_FIELD_NAMES, MAX_MALFORMED_SAMPLES, METHOD_LOADING_FINISHED, METHOD_REQUEST_WILL_BE_SENT,
    METHOD_RESPONSE_RECEIVED, UNKNOWN_BYTES,
};
use crate::utils::error::{EventError, ParseError};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

/// Detected capture format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureFormat {
    /// Our own camelCase request/response lists
    Normalized,
    /// DevTools protocol network events
    DevToolsLog,
}

/// Parsed capture ready for assembly
#[derive(Debug, Clone, Default)]
pub struct ParsedCapture {
    /// Request events in arrival order
    pub requests: Vec<RequestEvent>,

    /// Responses keyed by request id
    pub join: JoinTable,

    /// Number of records that were skipped
    pub skipped: usize,

    /// Bounded sample of the skipped records
    pub malformed: Vec<MalformedEvent>,
}

impl ParsedCapture {
    fn reject(&mut self, index: usize, error: EventError) {
        warn!("Skipping malformed record {}: {}", index, error);
        self.skipped += 1;
        if self.malformed.len() < MAX_MALFORMED_SAMPLES {
            self.malformed.push(MalformedEvent { index, error });
        }
    }
}

/// Parse a raw capture document
///
/// # Errors
/// * `ParseError::InvalidFormat` - neither shape matched, or every request record was malformed
pub fn parse_capture(raw: &Value) -> Result<ParsedCapture, ParseError> {
    let (records, format) = detect_capture_format(raw)?;
    debug!("Detected capture format: {:?}", format);

    let capture = match format {
        CaptureFormat::Normalized => parse_normalized(raw)?,
        CaptureFormat::DevToolsLog => parse_devtools_log(records)?,
    };

    if capture.requests.is_empty() && capture.skipped > 0 {
        return Err(ParseError::InvalidFormat(
            "All request records failed to parse".to_string(),
        ));
    }

    debug!(
        "Parsed {} requests, {} responses, {} skipped",
        capture.requests.len(),
        capture.join.len(),
        capture.skipped
    );

    Ok(capture)
}

/// Parse a capture from a JSON string
pub fn parse_capture_str(raw: &str) -> Result<ParsedCapture, ParseError> {
    let value: Value = serde_json::from_str(raw)?;
    parse_capture(&value)
}

fn detect_capture_format(raw: &Value) -> Result<(&[Value], CaptureFormat), ParseError> {
    match raw {
        Value::Object(obj) if obj.get("requests").is_some_and(Value::is_array) => {
            Ok((&[][..], CaptureFormat::Normalized))
        }
        Value::Object(obj) => EVENT_FIELD_NAMES
            .iter()
            .find_map(|field| obj.get(*field).and_then(Value::as_array))
            .map(|events| (events.as_slice(), CaptureFormat::DevToolsLog))
            .ok_or_else(|| {
                ParseError::InvalidFormat(
                    "Capture object has neither a requests list nor an events list".to_string(),
                )
            }),
        Value::Array(events) => Ok((events.as_slice(), CaptureFormat::DevToolsLog)),
        _ => Err(ParseError::InvalidFormat(
            "Capture must be a JSON object or array".to_string(),
        )),
    }
}

fn parse_normalized(raw: &Value) -> Result<ParsedCapture, ParseError> {
    let mut capture = ParsedCapture::default();

    let requests = raw
        .get("requests")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::InvalidFormat("Missing requests list".to_string()))?;

    for (index, value) in requests.iter().enumerate() {
        match serde_json::from_value::<RequestEvent>(value.clone()) {
            Ok(event) => match event.validate() {
                Ok(()) => capture.requests.push(event),
                Err(e) => capture.reject(index, e),
            },
            Err(e) => capture.reject(index, invalid("request", e)),
        }
    }

    // Responses are optional; a capture cut short may carry none
    if let Some(responses) = raw.get("responses").and_then(Value::as_array) {
        for (index, value) in responses.iter().enumerate() {
            match serde_json::from_value::<ResponseEvent>(value.clone()) {
                Ok(response) => capture.join.record_response(response),
                Err(e) => capture.reject(index, invalid("response", e)),
            }
        }
    }

    Ok(capture)
}

fn parse_devtools_log(records: &[Value]) -> Result<ParsedCapture, ParseError> {
    let mut capture = ParsedCapture::default();

    for (index, record) in records.iter().enumerate() {
        let Some(method) = record.get("method").and_then(Value::as_str) else {
            capture.reject(index, EventError::MissingField("method".to_string()));
            continue;
        };
        let params = record.get("params").cloned().unwrap_or(Value::Null);

        match method {
            METHOD_REQUEST_WILL_BE_SENT => match decode_request(params) {
                Ok(event) => capture.requests.push(event),
                Err(e) => capture.reject(index, e),
            },
            METHOD_RESPONSE_RECEIVED => match decode_response(params) {
                Ok(response) => capture.join.record_response(response),
                Err(e) => capture.reject(index, e),
            },
            METHOD_LOADING_FINISHED => {
                match serde_json::from_value::<LoadingFinishedParams>(params) {
                    Ok(finished) => {
                        let updated = capture.join.update(&finished.request_id, |response| {
                            response.encoded_bytes = finished.encoded_data_length.round() as i64;
                            response.timestamp = finished.timestamp;
                        });
                        if !updated {
                            debug!(
                                "loadingFinished for {} without a response",
                                finished.request_id
                            );
                        }
                    }
                    Err(e) => capture.reject(index, invalid(METHOD_LOADING_FINISHED, e)),
                }
            }
            _ => {}
        }
    }

    Ok(capture)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WillBeSentParams {
    request_id: String,
    request: DevToolsRequest,
    #[serde(default, rename = "type")]
    resource_type: Option<String>,
    #[serde(default)]
    frame_id: Option<String>,
    #[serde(default, rename = "documentURL")]
    document_url: Option<String>,
    #[serde(default)]
    initiator: Option<DevToolsInitiator>,
    #[serde(default)]
    redirect_response: Option<DevToolsResponse>,
    #[serde(default)]
    timestamp: f64,
}

#[derive(Debug, Deserialize)]
struct DevToolsRequest {
    url: String,
    #[serde(default = "default_method")]
    method: String,
}

#[derive(Debug, Deserialize)]
struct DevToolsInitiator {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    stack: Option<DevToolsStack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DevToolsStack {
    #[serde(default)]
    call_frames: Vec<DevToolsCallFrame>,
    #[serde(default)]
    parent: Option<Box<DevToolsStack>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DevToolsCallFrame {
    #[serde(default)]
    url: String,
    #[serde(default)]
    line_number: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DevToolsResponse {
    url: String,
    status: u16,
    #[serde(default)]
    headers: serde_json::Map<String, Value>,
    #[serde(default)]
    encoded_data_length: Option<f64>,
    #[serde(default)]
    timing: Option<DevToolsTiming>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DevToolsTiming {
    request_time: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseReceivedParams {
    request_id: String,
    #[serde(default)]
    timestamp: f64,
    response: DevToolsResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadingFinishedParams {
    request_id: String,
    timestamp: f64,
    encoded_data_length: f64,
}

fn decode_request(params: Value) -> Result<RequestEvent, EventError> {
    let params: WillBeSentParams =
        serde_json::from_value(params).map_err(|e| invalid(METHOD_REQUEST_WILL_BE_SENT, e))?;

    let initiator = match params.initiator {
        Some(initiator) => convert_initiator(initiator)?,
        None => Initiator::Other,
    };

    let redirected_from_response = params.redirect_response.map(|response| RedirectResponse {
        content_length_header: content_length(&response.headers),
        encoded_bytes: response
            .encoded_data_length
            .map_or(UNKNOWN_BYTES, |len| len.round() as i64),
        timing_baseline: response.timing.as_ref().map(|t| t.request_time),
        timestamp: Some(params.timestamp),
        url: response.url,
        status: response.status,
    });

    let event = RequestEvent {
        request_id: params.request_id,
        url: params.request.url,
        method: params.request.method,
        resource_type: params
            .resource_type
            .map(ResourceType::from)
            .unwrap_or_default(),
        frame_id: params.frame_id.unwrap_or_default(),
        initiator,
        redirected_from_response,
        document_url: params.document_url,
        timestamp: params.timestamp,
    };
    event.validate()?;
    Ok(event)
}

fn decode_response(params: Value) -> Result<ResponseEvent, EventError> {
    let params: ResponseReceivedParams =
        serde_json::from_value(params).map_err(|e| invalid(METHOD_RESPONSE_RECEIVED, e))?;
    let response = params.response;

    Ok(ResponseEvent {
        request_id: params.request_id,
        status: response.status,
        encoded_bytes: response
            .encoded_data_length
            .map_or(UNKNOWN_BYTES, |len| len.round() as i64),
        content_length_header: content_length(&response.headers),
        timing_baseline: response
            .timing
            .map_or(params.timestamp, |t| t.request_time),
        timestamp: params.timestamp,
    })
}

fn convert_initiator(initiator: DevToolsInitiator) -> Result<Initiator, EventError> {
    match initiator.kind.as_str() {
        "parser" => match initiator.url {
            Some(url) if !url.is_empty() => Ok(Initiator::Parser { url }),
            _ => Err(EventError::MissingField("initiator.url".to_string())),
        },
        "script" => Ok(Initiator::Script {
            call_frames: flatten_stack(initiator.stack),
        }),
        _ => Ok(Initiator::Other),
    }
}

/// Flatten a stack and its async parents, innermost first.
/// Frames without a URL (inline or eval'd code) are dropped.
fn flatten_stack(stack: Option<DevToolsStack>) -> Vec<CallFrame> {
    let mut frames = Vec::new();
    let mut current = stack;

    while let Some(stack) = current {
        frames.extend(
            stack
                .call_frames
                .into_iter()
                .filter(|frame| !frame.url.is_empty())
                .map(|frame| CallFrame::new(frame.url, frame.line_number)),
        );
        current = stack.parent.map(|parent| *parent);
    }

    frames
}

/// Case-insensitive Content-Length lookup; header values may be strings or numbers
fn content_length(headers: &serde_json::Map<String, Value>) -> Option<i64> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| match value {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_i64(),
            _ => None,
        })
}

fn invalid(field: &str, error: serde_json::Error) -> EventError {
    EventError::InvalidField {
        field: field.to_string(),
        reason: error.to_string(),
    }
}

fn default_method() -> String {
    "GET".to_string()
}
