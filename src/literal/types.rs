//! Literal type descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar kinds a dataset column can be declared with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimpleType {
    Integer,
    Float,
    String,
    Boolean,
    Datetime,
    Duration,
}

impl SimpleType {
    pub fn name(&self) -> &'static str {
        match self {
            SimpleType::Integer => "INTEGER",
            SimpleType::Float => "FLOAT",
            SimpleType::String => "STRING",
            SimpleType::Boolean => "BOOLEAN",
            SimpleType::Datetime => "DATETIME",
            SimpleType::Duration => "DURATION",
        }
    }
}

impl fmt::Display for SimpleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a blob is a single object or a prefix holding many parts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlobDimensionality {
    #[default]
    Single,
    Multipart,
}

/// Type descriptor for blob literals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobType {
    /// Format tag, empty for "any format".
    #[serde(default)]
    pub format: String,

    #[serde(default)]
    pub dimensionality: BlobDimensionality,
}

impl BlobType {
    /// A single-object blob type with the given format tag.
    pub fn single(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            dimensionality: BlobDimensionality::Single,
        }
    }
}

/// One named column of a structured dataset type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetColumn {
    pub name: String,
    pub literal_type: LiteralType,
}

impl DatasetColumn {
    pub fn new(name: impl Into<String>, literal_type: LiteralType) -> Self {
        Self {
            name: name.into(),
            literal_type,
        }
    }
}

/// Type descriptor for structured dataset literals.
///
/// An empty column list means the schema is unknown, not that the dataset
/// has no columns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructuredDatasetType {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<DatasetColumn>,
}

/// Describes the shape of a literal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralType {
    Simple(SimpleType),
    Blob(BlobType),
    #[serde(rename = "structured_dataset_type")]
    StructuredDataset(StructuredDatasetType),
    /// Homogeneous list of the inner type.
    #[serde(rename = "collection_type")]
    Collection(Box<LiteralType>),
    /// String-keyed map whose values have the inner type.
    #[serde(rename = "map_value_type")]
    Map(Box<LiteralType>),
}

impl LiteralType {
    pub fn simple(kind: SimpleType) -> Self {
        LiteralType::Simple(kind)
    }

    pub fn collection_of(inner: LiteralType) -> Self {
        LiteralType::Collection(Box::new(inner))
    }

    pub fn map_of(value: LiteralType) -> Self {
        LiteralType::Map(Box::new(value))
    }
}

impl fmt::Display for LiteralType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralType::Simple(kind) => write!(f, "{kind}"),
            LiteralType::Blob(blob) if blob.format.is_empty() => f.write_str("blob"),
            LiteralType::Blob(blob) => write!(f, "blob[{}]", blob.format),
            LiteralType::StructuredDataset(sd) => {
                write!(f, "structured_dataset[{} column(s)]", sd.columns.len())
            }
            LiteralType::Collection(inner) => write!(f, "list<{inner}>"),
            LiteralType::Map(value) => write!(f, "map<string, {value}>"),
        }
    }
}
