//! Fuzz target for URI classification.
//!
//! This fuzzer feeds arbitrary UTF-8 strings to the remote/local path
//! classifier and file name extraction.

#![no_main]

use libfuzzer_sys::fuzz_target;
use marshalkit::storage::path::fuzz_classify_path;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    let _ = fuzz_classify_path(input);
});
