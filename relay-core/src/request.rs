//! Inbound request snapshot and query-string decoding.

use bytes::Bytes;
use http::{header, HeaderMap, Method, Uri};
use indexmap::IndexMap;
use serde_json::Value;

use crate::signal::{fail_with_code, Failure};

/// An inbound HTTP request as seen by the endpoint pipeline.
///
/// An owned snapshot of the parts the pipeline needs: method, URI, headers,
/// the raw body, and the query mapping parsed once at construction. Immutable
/// while a request is in flight; the pipeline shares it via `Arc`.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    query: IndexMap<String, String>,
}

impl ApiRequest {
    /// Build a request from its parts, parsing the URI query string.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        let query = parse_query(uri.query().unwrap_or(""));
        Self {
            method,
            uri,
            headers,
            body,
            query,
        }
    }

    /// Merge an externally-routed parameter (e.g. a path capture) into the
    /// query mapping. Replaces any value the query string already carried
    /// for the key.
    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The named header's value, if present and valid UTF-8.
    #[must_use]
    pub fn header_str(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Query mapping, in first-seen key order.
    #[must_use]
    pub fn query(&self) -> &IndexMap<String, String> {
        &self.query
    }

    /// Query mapping as a JSON object.
    #[must_use]
    pub fn query_value(&self) -> Value {
        Value::Object(
            self.query
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect(),
        )
    }

    /// Lenient default interpretation of the raw body, applied when a method
    /// definition configures no body parser.
    ///
    /// Empty body → `Null`; `application/json` content type → parsed JSON;
    /// anything else → the body as a (lossy) UTF-8 JSON string.
    ///
    /// # Errors
    /// Returns a 400 [`Failure`] when a JSON-typed body does not parse.
    pub fn body_json(&self) -> Result<Value, Failure> {
        if self.body.is_empty() {
            return Ok(Value::Null);
        }
        if self.has_json_content_type() {
            serde_json::from_slice(&self.body)
                .map_err(|e| fail_with_code(400, format!("Invalid JSON body: {e}")))
        } else {
            Ok(Value::String(
                String::from_utf8_lossy(&self.body).into_owned(),
            ))
        }
    }

    fn has_json_content_type(&self) -> bool {
        self.header_str(header::CONTENT_TYPE)
            .and_then(|value| value.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
    }
}

impl From<http::Request<Bytes>> for ApiRequest {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::new(parts.method, parts.uri, parts.headers, body)
    }
}

/// Parse a raw query string into an ordered key/value mapping.
///
/// Keys keep first-seen order; a repeated key keeps its last value.
/// Percent-escapes are decoded and `+` is treated as a space; malformed
/// escapes pass through untouched. Never fails on arbitrary input.
#[must_use]
pub fn parse_query(raw: &str) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    for pair in raw.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key, value),
            None => (pair, ""),
        };
        let key = decode_component(key);
        if key.is_empty() {
            continue;
        }
        map.insert(key, decode_component(value));
    }
    map
}

fn decode_component(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
