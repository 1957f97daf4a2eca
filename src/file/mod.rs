//! File references and their transformer.
//!
//! A [`FileRef`] is the in-process handle for a single blob. It wraps a local
//! path and, when it was produced from a remote literal, a deferred download
//! action that materializes the blob at that path the first time the path is
//! dereferenced.
//!
//! Whether a file is uploaded when it becomes a literal depends on:
//!
//! - the declared type: `File` uploads, plain `Path` never does;
//! - the path itself: remote paths (including `file://`) are never copied;
//! - the value's [`RemoteDestination`]: `Never` disables the upload, `Path`
//!   picks the destination instead of a fresh random one.

mod transformer;

pub use transformer::FileTransformer;

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::MarshalError;

/// Deferred fetch that materializes a file at its local path.
pub type DownloadAction = Arc<dyn Fn() -> Result<(), MarshalError> + Send + Sync>;

/// Format tag refining a file type, e.g. `csv`. Empty means any format.
///
/// Leading `~` and `.` are stripped, so `".csv"` and `"csv"` are the same tag.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FileFormat(String);

impl FileFormat {
    pub fn new(tag: impl AsRef<str>) -> Self {
        let tag = tag
            .as_ref()
            .trim()
            .trim_start_matches(['~', '.']);
        Self(tag.to_string())
    }

    /// The "any format" tag.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn is_any(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FileFormat {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for FileFormat {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a file should go when it is turned into a literal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RemoteDestination {
    /// Upload to a freshly minted remote path if an upload is needed.
    #[default]
    Auto,
    /// Upload to this exact location if an upload is needed.
    Path(String),
    /// Never upload; the literal records the path as-is.
    Never,
}

/// A lazily-downloading handle to a single file.
pub struct FileRef {
    path: String,
    format: FileFormat,
    download: Option<DownloadAction>,
    downloaded: Mutex<bool>,
    remote_destination: RemoteDestination,
    remote_source: Option<String>,
}

impl FileRef {
    /// A file at `path` with no download action.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: FileFormat::any(),
            download: None,
            downloaded: Mutex::new(false),
            remote_destination: RemoteDestination::Auto,
            remote_source: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<FileFormat>) -> Self {
        self.format = format.into();
        self
    }

    /// Defers materialization of the file until its path is first used.
    pub fn with_download_action(
        mut self,
        action: impl Fn() -> Result<(), MarshalError> + Send + Sync + 'static,
    ) -> Self {
        self.download = Some(Arc::new(action));
        self
    }

    /// Uploads to `dest` instead of a random remote path.
    pub fn with_remote_destination(mut self, dest: impl Into<String>) -> Self {
        self.remote_destination = RemoteDestination::Path(dest.into());
        self
    }

    /// Disables uploading entirely.
    pub fn never_upload(mut self) -> Self {
        self.remote_destination = RemoteDestination::Never;
        self
    }

    pub(crate) fn with_remote_source(mut self, uri: impl Into<String>) -> Self {
        self.remote_source = Some(uri.into());
        self
    }

    /// The path as given, without triggering any download.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The local path, materializing the file first if needed.
    ///
    /// The download action runs at most once per instance, even when called
    /// from several threads. If it fails the error is returned and the next
    /// call tries again.
    pub fn local_path(&self) -> Result<&Path, MarshalError> {
        let mut downloaded = self
            .downloaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !*downloaded {
            if let Some(action) = &self.download {
                action()?;
            }
            *downloaded = true;
        }
        Ok(Path::new(&self.path))
    }

    /// Runs the download action eagerly.
    ///
    /// This does not mark the file as downloaded, so a later
    /// [`local_path`](Self::local_path) still runs the action once more.
    ///
    /// # Errors
    /// Returns [`MarshalError::InvalidState`] if the file has no download
    /// action.
    pub fn trigger_download(&self) -> Result<(), MarshalError> {
        match &self.download {
            Some(action) => action(),
            None => Err(MarshalError::InvalidState(format!(
                "attempting to trigger download on non-downloadable file {}",
                self.path
            ))),
        }
    }

    pub fn is_downloadable(&self) -> bool {
        self.download.is_some()
    }

    pub fn downloaded(&self) -> bool {
        *self
            .downloaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn format(&self) -> &FileFormat {
        &self.format
    }

    pub fn remote_destination(&self) -> &RemoteDestination {
        &self.remote_destination
    }

    /// The remote URI this file was decoded from, if any.
    pub fn remote_source(&self) -> Option<&str> {
        self.remote_source.as_deref()
    }
}

impl Clone for FileRef {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            format: self.format.clone(),
            download: self.download.clone(),
            downloaded: Mutex::new(self.downloaded()),
            remote_destination: self.remote_destination.clone(),
            remote_source: self.remote_source.clone(),
        }
    }
}

impl PartialEq for FileRef {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
            && self.remote_destination == other.remote_destination
            && self.format == other.format
    }
}

impl fmt::Debug for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileRef")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("downloadable", &self.download.is_some())
            .field("downloaded", &self.downloaded())
            .field("remote_destination", &self.remote_destination)
            .field("remote_source", &self.remote_source)
            .finish()
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
