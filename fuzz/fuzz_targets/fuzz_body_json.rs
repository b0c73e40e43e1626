//! Fuzz target: lenient default body interpretation.
//!
//! Arbitrary bytes flow in as a JSON-typed request body; errors are
//! expected and fine, panics are not.

#![no_main]

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, Uri};
use libfuzzer_sys::fuzz_target;
use relay_core::ApiRequest;

fuzz_target!(|data: &[u8]| {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let req = ApiRequest::new(
        Method::POST,
        Uri::from_static("/fuzz"),
        headers,
        Bytes::copy_from_slice(data),
    );
    let _ = req.body_json();
});
