//! Portable literal model.
//!
//! Literals are the store-agnostic values exchanged with the workflow engine.
//! A file travels as a [`Blob`] (a URI plus format metadata), a table travels
//! as a [`StructuredDatasetLiteral`] (a URI, a storage format and a column
//! schema). Literal types describe the shape of a literal without carrying a
//! value, and are what a task interface declares.
//!
//! # Example
//!
//! ```
//! use marshalkit::literal::{Blob, BlobDimensionality, BlobMetadata, Literal};
//!
//! let literal = Literal::Blob(Blob {
//!     metadata: BlobMetadata::new("csv", BlobDimensionality::Single),
//!     uri: "s3://bucket/key.csv".into(),
//! });
//! assert_eq!(literal.uri(), "s3://bucket/key.csv");
//! ```

pub mod io_json;
mod model;
mod types;

pub use model::{Blob, BlobMetadata, Literal, StructuredDatasetLiteral, StructuredDatasetMetadata};
pub use types::{
    BlobDimensionality, BlobType, DatasetColumn, LiteralType, SimpleType, StructuredDatasetType,
};
