#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Object-store schemes the local store maps onto disk.
pub fn arb_store_scheme() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("s3"), Just("gs"), Just("gcs"), Just("abfs"), Just("az")]
}

/// A `/`-separated key of 1..4 safe segments.
pub fn arb_key() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9][a-z0-9_-]{0,11}", 1..4).prop_map(|parts| parts.join("/"))
}

/// A remote URI in a store scheme.
pub fn arb_remote_uri() -> impl Strategy<Value = String> {
    (arb_store_scheme(), arb_key()).prop_map(|(scheme, key)| format!("{scheme}://{key}"))
}

/// A file name with an extension.
pub fn arb_file_name() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9_]{0,15}", "[a-z]{1,4}").prop_map(|(stem, ext)| format!("{stem}.{ext}"))
}
