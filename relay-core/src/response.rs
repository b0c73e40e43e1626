//! Response writer shared between the pipeline and handlers.

use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde_json::Value;

#[derive(Debug)]
struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    ended: bool,
}

/// Buffered response writer exposing the pipeline's writing surface:
/// `status`, `set_header`, `json`, `end`, `writable_ended`.
///
/// Cloning yields a handle to the same response, so a handler writing
/// directly and the pipeline observe identical state. Writes are terminal:
/// once the response has ended, later `status`/`set_header`/`json`/`end`
/// calls are ignored, which is what guarantees exactly one terminal write
/// per request.
#[derive(Debug, Clone)]
pub struct ResponseWriter {
    state: Arc<Mutex<ResponseState>>,
}

impl ResponseWriter {
    /// Create a writer with status 200 and no headers or body.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ResponseState {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: Bytes::new(),
                ended: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ResponseState> {
        // A poisoned lock still holds usable response state.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Set the status code for the eventual response.
    pub fn status(&self, status: StatusCode) -> &Self {
        let mut state = self.lock();
        if !state.ended {
            state.status = status;
        }
        self
    }

    /// Set a response header.
    pub fn set_header(&self, name: HeaderName, value: HeaderValue) -> &Self {
        let mut state = self.lock();
        if !state.ended {
            state.headers.insert(name, value);
        }
        self
    }

    /// Write `value` as the JSON body and end the response.
    pub fn json(&self, value: &Value) {
        let mut state = self.lock();
        if state.ended {
            return;
        }
        state
            .headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        state.body = Bytes::from(value.to_string());
        state.ended = true;
    }

    /// End the response with no body.
    pub fn end(&self) {
        self.lock().ended = true;
    }

    /// Whether a terminal write has happened.
    #[must_use]
    pub fn writable_ended(&self) -> bool {
        self.lock().ended
    }

    /// Status currently recorded.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.lock().status
    }

    /// Convert into the final response.
    #[must_use]
    pub fn into_response(self) -> http::Response<Bytes> {
        let state = self.lock();
        let mut response = http::Response::new(state.body.clone());
        *response.status_mut() = state.status;
        *response.headers_mut() = state.headers.clone();
        response
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}
