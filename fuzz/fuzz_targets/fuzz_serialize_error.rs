//! Fuzz target: default error serialization.
//!
//! Arbitrary messages must always serialize to a JSON object.

#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_core::{mini_serialize_error, EndpointError};

fuzz_target!(|data: &[u8]| {
    let message = String::from_utf8_lossy(data).into_owned();
    let serialized = mini_serialize_error(&EndpointError::internal(message));
    let value = serde_json::to_value(serialized).expect("serialization must not fail");
    assert!(value.is_object());
});
