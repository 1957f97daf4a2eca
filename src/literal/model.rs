//! Literal values.

use serde::{Deserialize, Serialize};

use super::types::{BlobDimensionality, BlobType, DatasetColumn, StructuredDatasetType};

/// A single file-like object in a blob store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub metadata: BlobMetadata,
    pub uri: String,
}

/// Format metadata attached to every blob literal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    #[serde(default)]
    pub format: String,

    #[serde(default)]
    pub dimensionality: BlobDimensionality,
}

impl BlobMetadata {
    pub fn new(format: impl Into<String>, dimensionality: BlobDimensionality) -> Self {
        Self {
            format: format.into(),
            dimensionality,
        }
    }

    /// The blob type this metadata describes.
    pub fn blob_type(&self) -> BlobType {
        BlobType {
            format: self.format.clone(),
            dimensionality: self.dimensionality,
        }
    }
}

impl From<BlobType> for BlobMetadata {
    fn from(blob_type: BlobType) -> Self {
        Self {
            format: blob_type.format,
            dimensionality: blob_type.dimensionality,
        }
    }
}

/// Tabular data persisted at a URI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDatasetLiteral {
    pub uri: String,
    pub metadata: StructuredDatasetMetadata,
}

/// Storage format and column schema of a structured dataset literal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDatasetMetadata {
    /// Storage format name, e.g. `PARQUET`.
    pub format: String,

    #[serde(default)]
    pub structured_dataset_type: StructuredDatasetType,
}

impl StructuredDatasetMetadata {
    pub fn columns(&self) -> &[DatasetColumn] {
        &self.structured_dataset_type.columns
    }
}

/// A portable value understood by the workflow engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Blob(Blob),
    StructuredDataset(StructuredDatasetLiteral),
}

impl Literal {
    /// Short name of the literal kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Blob(_) => "blob",
            Literal::StructuredDataset(_) => "structured_dataset",
        }
    }

    /// Location of the payload.
    pub fn uri(&self) -> &str {
        match self {
            Literal::Blob(blob) => &blob.uri,
            Literal::StructuredDataset(sd) => &sd.uri,
        }
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Literal::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn as_structured_dataset(&self) -> Option<&StructuredDatasetLiteral> {
        match self {
            Literal::StructuredDataset(sd) => Some(sd),
            _ => None,
        }
    }
}
