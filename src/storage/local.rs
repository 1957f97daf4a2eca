//! Filesystem-backed store.
//!
//! Object-store URIs are mapped onto a local directory tree:
//! `s3://bucket/key` lives at `{store_root}/s3/bucket/key`. This gives the
//! transformers a real store to talk to in tests and from the CLI without
//! any network transport.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::path::{random_local_path, random_remote_path, split_uri};
use super::FileAccess;
use crate::error::MarshalError;

/// Where the local store keeps its data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory that backs every object-store URI.
    pub store_root: PathBuf,

    /// Prefix under which fresh remote paths are minted.
    pub raw_output_prefix: String,

    /// Directory under which fresh local paths are minted.
    pub sandbox: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from(".marshalkit/store"),
            raw_output_prefix: "s3://marshalkit-data/raw".to_string(),
            sandbox: std::env::temp_dir().join("marshalkit"),
        }
    }
}

/// [`FileAccess`] over the local filesystem.
#[derive(Clone, Debug)]
pub struct LocalFileAccess {
    config: StoreConfig,
}

impl LocalFileAccess {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Filesystem location backing `path`.
    ///
    /// # Errors
    /// `http(s)://` URIs have no local backing and are rejected as
    /// unsupported.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, MarshalError> {
        match split_uri(path) {
            None => Ok(PathBuf::from(path)),
            Some((scheme, rest)) => match scheme.to_ascii_lowercase().as_str() {
                "file" => Ok(PathBuf::from(rest)),
                "http" | "https" => Err(MarshalError::Unsupported(format!(
                    "no transport for '{path}'"
                ))),
                scheme => Ok(self.config.store_root.join(scheme).join(rest)),
            },
        }
    }

    fn copy(&self, source: &str, dest: &str, multipart: bool) -> Result<(), MarshalError> {
        let from = self.resolve(source)?;
        let to = self.resolve(dest)?;
        tracing::debug!(source, dest, multipart, "copying data");

        let result = if multipart {
            copy_tree(&from, &to)
        } else {
            copy_file(&from, &to)
        };
        result.map_err(|source_err| MarshalError::Transfer {
            source_path: source.to_string(),
            dest_path: dest.to_string(),
            source: source_err,
        })
    }
}

impl FileAccess for LocalFileAccess {
    fn random_remote_path(&self, hint: Option<&str>) -> String {
        random_remote_path(&self.config.raw_output_prefix, hint)
    }

    fn random_local_path(&self, hint: Option<&str>) -> String {
        random_local_path(&self.config.sandbox, hint)
            .to_string_lossy()
            .into_owned()
    }

    fn put_data(&self, source: &str, dest: &str, multipart: bool) -> Result<(), MarshalError> {
        self.copy(source, dest, multipart)
    }

    fn get_data(&self, source: &str, dest: &str, multipart: bool) -> Result<(), MarshalError> {
        self.copy(source, dest, multipart)
    }
}

fn copy_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(from).follow_links(true) {
        let entry = entry.map_err(std::io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(std::io::Error::other)?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}
