//! The structured dataset value.

use std::any::Any;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::schema::DatasetSchema;
use super::transformer::StructuredDatasetTransformer;
use super::{DatasetFormat, HandlerKey};
use crate::engine::{downcast_value, TypeKey};
use crate::error::MarshalError;

/// Custom fetch of a dataset from its remote path to a local path.
pub type DatasetDownloader = Arc<dyn Fn(&str, &Path) -> Result<(), MarshalError> + Send + Sync>;

/// An in-memory table of any registered type, tagged with its type.
pub struct Dataframe {
    key: TypeKey,
    value: Box<dyn Any + Send + Sync>,
}

impl Dataframe {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            value: Box::new(value),
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn as_any(&self) -> &dyn Any {
        self.value.as_ref()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for Dataframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dataframe({})", self.key)
    }
}

/// Tabular data plus where it lives and how it is stored.
///
/// Built by user code around an in-memory frame or a local file, or by the
/// transformer around a remote path when a literal is decoded. Decoded values
/// are not materialized until [`open_as`](Self::open_as) is called.
pub struct StructuredDataset {
    dataframe: Option<Dataframe>,
    local_path: Option<String>,
    remote_path: Option<String>,
    format: DatasetFormat,
    schema: DatasetSchema,
    downloader: Option<DatasetDownloader>,
}

impl StructuredDataset {
    fn empty() -> Self {
        Self {
            dataframe: None,
            local_path: None,
            remote_path: None,
            format: DatasetFormat::default(),
            schema: DatasetSchema::default(),
            downloader: None,
        }
    }

    /// Wraps an in-memory frame.
    pub fn from_dataframe<T: Any + Send + Sync>(dataframe: T) -> Self {
        Self {
            dataframe: Some(Dataframe::new(dataframe)),
            ..Self::empty()
        }
    }

    /// Wraps data already encoded in a local file.
    pub fn from_local_path(path: impl Into<String>) -> Self {
        Self {
            local_path: Some(path.into()),
            ..Self::empty()
        }
    }

    /// Refers to persisted data without materializing it.
    pub fn from_remote(uri: impl Into<String>, format: DatasetFormat) -> Self {
        Self {
            remote_path: Some(uri.into()),
            format,
            ..Self::empty()
        }
    }

    /// Destination to persist to instead of a fresh remote path.
    pub fn with_remote_path(mut self, uri: impl Into<String>) -> Self {
        self.remote_path = Some(uri.into());
        self
    }

    pub fn with_format(mut self, format: DatasetFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_schema(mut self, schema: DatasetSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_downloader(
        mut self,
        downloader: impl Fn(&str, &Path) -> Result<(), MarshalError> + Send + Sync + 'static,
    ) -> Self {
        self.downloader = Some(Arc::new(downloader));
        self
    }

    pub fn dataframe(&self) -> Option<&Dataframe> {
        self.dataframe.as_ref()
    }

    pub fn local_path(&self) -> Option<&str> {
        self.local_path.as_deref()
    }

    pub fn remote_path(&self) -> Option<&str> {
        self.remote_path.as_deref()
    }

    pub fn format(&self) -> DatasetFormat {
        self.format
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    /// Materializes the persisted data as a `T`.
    ///
    /// # Errors
    /// - [`MarshalError::InvalidState`] if there is no remote path.
    /// - [`MarshalError::Unsupported`] if no handler chain reaches `T`.
    pub fn open_as<T: Any>(
        &self,
        transformer: &StructuredDatasetTransformer,
    ) -> Result<T, MarshalError> {
        let uri = self.remote_path.as_deref().ok_or_else(|| {
            MarshalError::InvalidState("dataset has no remote path to open".into())
        })?;
        let value = transformer.download(
            &HandlerKey::Format(self.format),
            &HandlerKey::Type(TypeKey::of::<T>()),
            uri,
        )?;
        downcast_value(value, self.format.name())
    }

    /// Fetches the persisted data to `local` with the custom downloader.
    ///
    /// # Errors
    /// [`MarshalError::InvalidState`] without a downloader or remote path.
    pub fn download_to(&self, local: &Path) -> Result<(), MarshalError> {
        match (&self.downloader, self.remote_path.as_deref()) {
            (Some(downloader), Some(uri)) => downloader(uri, local),
            (None, _) => Err(MarshalError::InvalidState(
                "dataset has no downloader".into(),
            )),
            (_, None) => Err(MarshalError::InvalidState(
                "dataset has no remote path to download".into(),
            )),
        }
    }
}

impl fmt::Debug for StructuredDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredDataset")
            .field("dataframe", &self.dataframe)
            .field("local_path", &self.local_path)
            .field("remote_path", &self.remote_path)
            .field("format", &self.format)
            .field("schema", &self.schema)
            .field("downloader", &self.downloader.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn dataframe_keeps_its_type() {
        let dataset = StructuredDataset::from_dataframe(vec![1i64, 2, 3]);
        let frame = dataset.dataframe().unwrap();
        assert_eq!(frame.key(), TypeKey::of::<Vec<i64>>());
        assert_eq!(frame.downcast_ref::<Vec<i64>>().unwrap().len(), 3);
        assert!(frame.downcast_ref::<Vec<i32>>().is_none());
    }

    #[test]
    fn remote_dataset_defaults() {
        let dataset = StructuredDataset::from_remote("s3://b/k", DatasetFormat::BigQuery);
        assert_eq!(dataset.remote_path(), Some("s3://b/k"));
        assert_eq!(dataset.format(), DatasetFormat::BigQuery);
        assert!(dataset.dataframe().is_none());
        assert!(dataset.local_path().is_none());
        assert!(dataset.schema().is_empty());
    }

    #[test]
    fn download_to_uses_downloader() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = calls.clone();
        let dataset = StructuredDataset::from_remote("s3://b/k", DatasetFormat::Parquet)
            .with_downloader(move |uri, local| {
                seen.lock().unwrap().push((uri.to_string(), local.to_path_buf()));
                Ok(())
            });

        dataset.download_to(Path::new("/tmp/out")).unwrap();
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            &[("s3://b/k".to_string(), Path::new("/tmp/out").to_path_buf())]
        );
    }

    #[test]
    fn download_to_without_downloader_is_invalid() {
        let dataset = StructuredDataset::from_remote("s3://b/k", DatasetFormat::Parquet);
        let err = dataset.download_to(Path::new("/tmp/out")).unwrap_err();
        assert!(matches!(err, MarshalError::InvalidState(_)));
    }
}
