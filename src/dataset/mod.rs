//! Structured datasets: tabular values and their transformer.
//!
//! Converting a dataframe to a literal is split into two stages, and so is
//! the way back:
//!
//! ```text
//! value   -> encoding handler  -> persistence handler -> literal
//! literal -> retrieval handler -> decoding handler    -> value
//! ```
//!
//! A direct handler can cover both stages for one `(from, to)` pair. When
//! none exists the transformer bridges through the intermediate format, an
//! Arrow [`RecordBatch`](arrow::record_batch::RecordBatch). N storage
//! formats and M frame types then need N + M handlers rather than N × M.

mod handlers;
pub mod parquet;
mod schema;
mod transformer;
mod value;

pub use handlers::{Handler, HandlerKey, HandlerKind, HandlerRegistry, HandlerRegistryBuilder};
pub use schema::{
    arrow_literal_type, column_literal_type, guess_column_type, ColumnType, DatasetSchema,
};
pub use transformer::StructuredDatasetTransformer;
pub use value::{DatasetDownloader, Dataframe, StructuredDataset};

use std::fmt;
use std::str::FromStr;

use crate::error::MarshalError;

/// Storage format of a persisted dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DatasetFormat {
    #[default]
    Parquet,
    BigQuery,
}

impl DatasetFormat {
    /// Name used in literal metadata.
    pub fn name(&self) -> &'static str {
        match self {
            DatasetFormat::Parquet => "PARQUET",
            DatasetFormat::BigQuery => "BIGQUERY",
        }
    }

    /// Parses a format name as written in literal metadata.
    ///
    /// # Errors
    /// [`MarshalError::InvalidArgument`] for unknown names.
    pub fn value_of(name: &str) -> Result<Self, MarshalError> {
        match name {
            "PARQUET" => Ok(DatasetFormat::Parquet),
            "BIGQUERY" => Ok(DatasetFormat::BigQuery),
            other => Err(MarshalError::InvalidArgument(format!(
                "'DatasetFormat' not found for '{other}'"
            ))),
        }
    }
}

impl FromStr for DatasetFormat {
    type Err = MarshalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::value_of(s)
    }
}

impl fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
