//! Join table pairing request ids with their latest response.

use crate::parser::schema::ResponseEvent;
use std::collections::HashMap;

/// Responses keyed by request id.
///
/// Only the latest response per id is kept. Responses may be recorded in
/// any order relative to request processing.
#[derive(Debug, Clone, Default)]
pub struct JoinTable {
    responses: HashMap<String, ResponseEvent>,
}

impl JoinTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a response under its request id, replacing any earlier one
    pub fn record_response(&mut self, response: ResponseEvent) {
        self.responses.insert(response.request_id.clone(), response);
    }

    pub fn lookup(&self, request_id: &str) -> Option<&ResponseEvent> {
        self.responses.get(request_id)
    }

    /// Modify a recorded response in place. Returns false if none exists.
    pub fn update<F>(&mut self, request_id: &str, f: F) -> bool
    where
        F: FnOnce(&mut ResponseEvent),
    {
        match self.responses.get_mut(request_id) {
            Some(response) => {
                f(response);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

impl FromIterator<ResponseEvent> for JoinTable {
    fn from_iter<T: IntoIterator<Item = ResponseEvent>>(iter: T) -> Self {
        let mut table = Self::new();
        for response in iter {
            table.record_response(response);
        }
        table
    }
}
