//! Canned-response transport for tests and offline runs.

use super::http::decode_body;
use super::provider::{FetchError, Transport};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves fixed responses keyed by exact URL and records every request.
///
/// Unknown URLs answer HTTP 404, like the live API does for unknown slugs.
#[derive(Default)]
pub struct StaticTransport {
    responses: HashMap<String, Result<Value, FetchError>>,
    requests: Mutex<Vec<String>>,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with a JSON value.
    pub fn with_json(mut self, url: impl Into<String>, body: Value) -> Self {
        self.responses.insert(url.into(), Ok(body));
        self
    }

    /// Answer `url` with a raw body, decoded the same way the HTTP transport does.
    pub fn with_body(mut self, url: impl Into<String>, body: &str) -> Self {
        let url = url.into();
        let decoded = decode_body(&url, body);
        self.responses.insert(url, decoded);
        self
    }

    /// Answer `url` with a non-2xx status.
    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        let url = url.into();
        let err = FetchError::HttpStatus {
            status,
            url: url.clone(),
        };
        self.responses.insert(url, Err(err));
        self
    }

    /// Answer `url` with an arbitrary error.
    pub fn with_error(mut self, url: impl Into<String>, err: FetchError) -> Self {
        self.responses.insert(url.into(), Err(err));
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// How many times `url` was requested.
    pub fn count_for(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|u| *u == url)
            .count()
    }
}

impl Transport for StaticTransport {
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_string());

        match self.responses.get(url) {
            Some(resp) => resp.clone(),
            None => Err(FetchError::HttpStatus {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}
