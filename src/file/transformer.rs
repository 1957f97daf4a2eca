//! Conversion between file values and blob literals.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{FileFormat, FileRef, RemoteDestination};
use crate::engine::{AnyValue, DeclaredType, TypeTransformer};
use crate::error::MarshalError;
use crate::literal::{Blob, BlobMetadata, BlobType, Literal, LiteralType};
use crate::storage::FileAccess;

/// Turns [`FileRef`]s and plain paths into blob literals and back.
///
/// Claims `DeclaredType::File(_)` and, as an alias, `DeclaredType::Path`.
pub struct FileTransformer {
    file_access: Arc<dyn FileAccess>,
}

/// Where the upload decision landed for one value.
struct Upload<'a> {
    source: &'a str,
    destination: Option<&'a str>,
    required: bool,
}

impl FileTransformer {
    pub fn new(file_access: Arc<dyn FileAccess>) -> Self {
        Self { file_access }
    }

    /// Blob type for a format tag. Always single-object.
    pub fn blob_type(format: &FileFormat) -> BlobType {
        BlobType::single(format.as_str())
    }

    /// `LiteralType::Blob` for a format tag.
    pub fn literal_type_of(format: &FileFormat) -> LiteralType {
        LiteralType::Blob(Self::blob_type(format))
    }

    /// Encodes a file value as a blob literal.
    ///
    /// Accepted values are [`FileRef`], `PathBuf`, `String` and
    /// `&'static str`.
    ///
    /// # Errors
    /// - [`MarshalError::InvalidArgument`] for an absent value or a path that
    ///   is not an existing regular file.
    /// - [`MarshalError::TypeMismatch`] for any other value type, or a
    ///   declared type this transformer does not handle.
    /// - Whatever the store returns when the upload fails.
    pub fn encode(
        &self,
        value: Option<&dyn Any>,
        declared: &DeclaredType,
    ) -> Result<Literal, MarshalError> {
        let format = match declared {
            DeclaredType::File(format) => format.clone(),
            DeclaredType::Path => FileFormat::any(),
            other => {
                return Err(MarshalError::type_mismatch(
                    "FileRef or Path",
                    other.to_string(),
                ))
            }
        };
        let simple_declared = matches!(declared, DeclaredType::Path);
        let metadata = BlobMetadata::from(Self::blob_type(&format));

        let value = value.ok_or_else(|| {
            MarshalError::InvalidArgument("an absent value cannot be converted to a file".into())
        })?;

        if let Some(file) = value.downcast_ref::<FileRef>() {
            // A value decoded from a literal and handed back unchanged keeps
            // its original URI.
            if let Some(remote_source) = file.remote_source() {
                return Ok(blob_literal(metadata, remote_source));
            }

            let source = file.path();
            let mut required = !self.file_access.is_remote(source);
            let destination = match file.remote_destination() {
                RemoteDestination::Never => {
                    required = false;
                    None
                }
                RemoteDestination::Path(dest) => Some(dest.as_str()),
                RemoteDestination::Auto => None,
            };
            if simple_declared {
                tracing::warn!(
                    path = source,
                    "converting a FileRef but only Path was declared; skipping upload"
                );
                required = false;
            }

            let plan = Upload {
                source,
                destination,
                required,
            };
            return self.finish(plan, Some(file), metadata);
        }

        let source = path_like(value).ok_or_else(|| {
            MarshalError::type_mismatch("FileRef, PathBuf or string path", "another type")
        })?;
        let remote = self.file_access.is_remote(source);
        if !remote && !Path::new(source).is_file() {
            return Err(MarshalError::InvalidArgument(format!(
                "cannot convert {source}: not an existing file"
            )));
        }

        let plan = Upload {
            source,
            destination: None,
            required: !remote && !simple_declared,
        };
        self.finish(plan, None, metadata)
    }

    fn finish(
        &self,
        plan: Upload<'_>,
        file: Option<&FileRef>,
        metadata: BlobMetadata,
    ) -> Result<Literal, MarshalError> {
        if !plan.required {
            return Ok(blob_literal(metadata, plan.source));
        }

        let destination = match plan.destination {
            Some(dest) => dest.to_string(),
            None => self.file_access.random_remote_path(Some(plan.source)),
        };
        let source = match file {
            Some(file) => file.local_path()?.to_string_lossy().into_owned(),
            None => plan.source.to_string(),
        };
        self.file_access.put_data(&source, &destination, false)?;
        tracing::debug!(source = %source, destination = %destination, "uploaded file");

        Ok(blob_literal(metadata, &destination))
    }

    /// Decodes a blob literal into a [`FileRef`] of the given format.
    ///
    /// Remote URIs get a fresh local path and a download action that fetches
    /// the blob on first use; local URIs are wrapped as-is.
    pub fn decode_file(
        &self,
        literal: &Literal,
        format: &FileFormat,
    ) -> Result<FileRef, MarshalError> {
        let uri = blob_uri(literal)?;

        if !self.file_access.is_remote(uri) {
            return Ok(FileRef::new(uri).with_format(format.clone()));
        }

        let local_path = self.file_access.random_local_path(Some(uri));
        let access = Arc::clone(&self.file_access);
        let source = uri.to_string();
        let dest = local_path.clone();

        Ok(FileRef::new(local_path)
            .with_format(format.clone())
            .with_download_action(move || access.get_data(&source, &dest, false))
            .with_remote_source(uri))
    }

    /// Decodes a blob literal into the expected type.
    ///
    /// `Path` yields a `PathBuf` of the URI with no download machinery;
    /// `File(format)` yields a [`FileRef`].
    pub fn decode(
        &self,
        literal: &Literal,
        expected: &DeclaredType,
    ) -> Result<AnyValue, MarshalError> {
        match expected {
            DeclaredType::Path => Ok(Box::new(PathBuf::from(blob_uri(literal)?))),
            DeclaredType::File(format) => Ok(Box::new(self.decode_file(literal, format)?)),
            other => Err(MarshalError::type_mismatch("FileRef or Path", other.to_string())),
        }
    }
}

impl TypeTransformer for FileTransformer {
    fn name(&self) -> &str {
        "FileRef"
    }

    fn handles(&self, declared: &DeclaredType) -> bool {
        matches!(declared, DeclaredType::File(_) | DeclaredType::Path)
    }

    fn literal_type(&self, declared: &DeclaredType) -> Result<LiteralType, MarshalError> {
        match declared {
            DeclaredType::File(format) => Ok(Self::literal_type_of(format)),
            DeclaredType::Path => Ok(Self::literal_type_of(&FileFormat::any())),
            other => Err(MarshalError::type_mismatch("FileRef or Path", other.to_string())),
        }
    }

    fn to_literal(
        &self,
        value: Option<&dyn Any>,
        declared: &DeclaredType,
    ) -> Result<Literal, MarshalError> {
        self.encode(value, declared)
    }

    fn to_native(
        &self,
        literal: &Literal,
        expected: &DeclaredType,
    ) -> Result<AnyValue, MarshalError> {
        self.decode(literal, expected)
    }
}

fn blob_literal(metadata: BlobMetadata, uri: &str) -> Literal {
    Literal::Blob(Blob {
        metadata,
        uri: uri.to_string(),
    })
}

fn blob_uri(literal: &Literal) -> Result<&str, MarshalError> {
    literal
        .as_blob()
        .map(|blob| blob.uri.as_str())
        .ok_or_else(|| MarshalError::type_mismatch("blob literal", literal.kind_name()))
}

fn path_like(value: &dyn Any) -> Option<&str> {
    if let Some(path) = value.downcast_ref::<PathBuf>() {
        return path.to_str();
    }
    if let Some(path) = value.downcast_ref::<String>() {
        return Some(path.as_str());
    }
    value.downcast_ref::<&'static str>().copied()
}
