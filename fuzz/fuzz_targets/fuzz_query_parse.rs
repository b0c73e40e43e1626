//! Fuzz target: query-string decoding.
//!
//! Verifies that arbitrary byte sequences fed to the query parser never
//! cause panics, UB, or unbounded resource consumption.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        let _ = relay_core::parse_query(raw);
    }
});
