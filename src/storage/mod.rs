//! Storage collaborator interface.
//!
//! Transformers never talk to a blob store directly. They go through a
//! [`FileAccess`] implementation, which knows how to classify paths, mint
//! fresh ones and copy data in and out of the store.

mod local;
pub mod path;

pub use local::{LocalFileAccess, StoreConfig};
pub use path::is_remote;

use crate::error::MarshalError;

/// Blob-store client used by the transformers.
///
/// All calls are synchronous; failures are returned as-is and never retried.
pub trait FileAccess: Send + Sync {
    /// Whether `path` is remote (see [`path::is_remote`]).
    fn is_remote(&self, path: &str) -> bool {
        path::is_remote(path)
    }

    /// A fresh remote destination, optionally named after `hint`.
    fn random_remote_path(&self, hint: Option<&str>) -> String;

    /// A fresh local path, optionally named after `hint`.
    fn random_local_path(&self, hint: Option<&str>) -> String;

    /// Copies local (or `file://`) data at `source` to `dest` in the store.
    fn put_data(&self, source: &str, dest: &str, multipart: bool) -> Result<(), MarshalError>;

    /// Copies stored data at `source` to the local path `dest`.
    fn get_data(&self, source: &str, dest: &str, multipart: bool) -> Result<(), MarshalError>;
}
