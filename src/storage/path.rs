//! Remote/local path classification and fresh path minting.
//!
//! A path is "remote" when it starts with a recognized URI scheme. That
//! includes `file://`: a `file://` path is treated as already being in its
//! final position and is never copied, even though it resolves locally.

use std::path::{Path, PathBuf};

/// Scheme prefixes that mark a path as remote.
pub const REMOTE_SCHEMES: &[&str] = &[
    "s3", "gs", "gcs", "abfs", "abfss", "az", "http", "https", "file",
];

/// Returns true if `path` starts with a recognized `scheme://` prefix.
pub fn is_remote(path: &str) -> bool {
    split_uri(path).is_some()
}

/// Splits a remote URI into `(scheme, rest)`.
///
/// Returns `None` for local paths and for unknown schemes.
pub fn split_uri(path: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = path.split_once("://")?;
    REMOTE_SCHEMES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(scheme))
        .then_some((scheme, rest))
}

/// Mints a fresh remote path under `prefix`.
///
/// The last component of `hint` (if any) is kept so the object keeps a
/// recognizable name in the store.
pub fn random_remote_path(prefix: &str, hint: Option<&str>) -> String {
    let mut path = format!("{}/{}", prefix.trim_end_matches('/'), random_token());
    if let Some(name) = hint.and_then(file_name_of) {
        path.push('/');
        path.push_str(name);
    }
    path
}

/// Mints a fresh local path under `sandbox`. Nothing is created on disk.
pub fn random_local_path(sandbox: &Path, hint: Option<&str>) -> PathBuf {
    let mut path = sandbox.join(random_token());
    if let Some(name) = hint.and_then(file_name_of) {
        path.push(name);
    }
    path
}

/// 32 lowercase hex characters.
fn random_token() -> String {
    format!("{:032x}", rand::random::<u128>())
}

fn file_name_of(hint: &str) -> Option<&str> {
    let stripped = match split_uri(hint) {
        Some((_, rest)) => rest,
        None => hint,
    };
    stripped
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
}

/// Fuzz-only entrypoint for URI classification.
#[cfg(feature = "fuzzing")]
pub fn fuzz_classify_path(input: &str) -> bool {
    let remote = is_remote(input);
    let _ = file_name_of(input);
    remote == split_uri(input).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_store_and_http_paths_are_remote() {
        for path in [
            "s3://bucket/key",
            "gs://bucket/key",
            "http://example.com/a.csv",
            "https://example.com/a.csv",
            "abfs://container/blob",
        ] {
            assert!(is_remote(path), "{path} should be remote");
        }
    }

    #[test]
    fn file_scheme_counts_as_remote() {
        assert!(is_remote("file:///tmp/local_file"));
    }

    #[test]
    fn plain_paths_are_local() {
        for path in ["/tmp/x.csv", "relative/x.csv", "C:\\data\\x.csv", "", "weird:/x"] {
            assert!(!is_remote(path), "{path:?} should be local");
        }
    }

    #[test]
    fn unknown_scheme_is_local() {
        assert!(!is_remote("ftp://host/file"));
    }

    #[test]
    fn remote_paths_are_fresh_and_keep_the_name() {
        let a = random_remote_path("s3://bucket/raw/", Some("/tmp/data.csv"));
        let b = random_remote_path("s3://bucket/raw", Some("/tmp/data.csv"));
        assert_ne!(a, b);
        assert!(a.starts_with("s3://bucket/raw/"));
        assert!(a.ends_with("/data.csv"));
        assert!(!a.contains("raw//"));
    }

    #[test]
    fn remote_path_without_hint_has_no_name() {
        let path = random_remote_path("gs://b", None);
        let token = path.strip_prefix("gs://b/").expect("prefix");
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn local_path_uses_name_of_remote_hint() {
        let sandbox = Path::new("/sandbox");
        let path = random_local_path(sandbox, Some("s3://b/k/report.pdf"));
        assert!(path.starts_with(sandbox));
        assert_eq!(path.file_name().unwrap(), "report.pdf");
        assert!(!path.exists());
    }
}
