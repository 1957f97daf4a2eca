//! Conversion between tabular values and structured dataset literals.

use std::any::Any;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;

use super::handlers::{HandlerKey, HandlerRegistry};
use super::schema::{arrow_schema_columns, guess_column_type, DatasetSchema};
use super::value::StructuredDataset;
use super::DatasetFormat;
use crate::engine::{downcast_value, AnyValue, DeclaredType, TypeTransformer};
use crate::error::MarshalError;
use crate::literal::{
    Literal, LiteralType, StructuredDatasetLiteral, StructuredDatasetMetadata,
    StructuredDatasetType,
};
use crate::storage::FileAccess;

/// Turns [`StructuredDataset`]s and registered frame types into structured
/// dataset literals and back, using the handlers in its registry.
pub struct StructuredDatasetTransformer {
    registry: HandlerRegistry,
    file_access: Arc<dyn FileAccess>,
}

impl StructuredDatasetTransformer {
    pub fn new(registry: HandlerRegistry, file_access: Arc<dyn FileAccess>) -> Self {
        Self {
            registry,
            file_access,
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// The format two-hop conversions pass through.
    pub fn intermediate_format() -> HandlerKey {
        HandlerKey::of::<RecordBatch>()
    }

    /// Encodes a dataset or bare frame as a structured dataset literal.
    ///
    /// # Errors
    /// - [`MarshalError::InvalidArgument`] for an absent value, or a dataset
    ///   with neither a local path nor a dataframe.
    /// - [`MarshalError::TypeMismatch`] for a bare value of an unregistered
    ///   type or of a type other than the declared native one, and when a
    ///   declared column disagrees with the data.
    /// - [`MarshalError::Unsupported`] when no handler chain can persist the
    ///   frame, or a column type has no literal counterpart.
    pub fn encode(
        &self,
        value: Option<&dyn Any>,
        declared: &DeclaredType,
    ) -> Result<Literal, MarshalError> {
        let value = value.ok_or_else(|| {
            MarshalError::InvalidArgument(
                "an absent value cannot be converted to a structured dataset".into(),
            )
        })?;
        let declared_schema = match declared {
            DeclaredType::StructuredDataset(schema) => Some(schema),
            _ => None,
        };

        match value.downcast_ref::<StructuredDataset>() {
            Some(dataset) => self.encode_dataset(dataset, declared_schema),
            None => self.encode_frame(value, declared),
        }
    }

    fn encode_dataset(
        &self,
        dataset: &StructuredDataset,
        declared_schema: Option<&DatasetSchema>,
    ) -> Result<Literal, MarshalError> {
        let uri = match dataset.remote_path() {
            Some(uri) => uri.to_string(),
            None => self.file_access.random_remote_path(None),
        };
        let format = dataset.format();
        let frame = dataset.dataframe();
        let schema = if dataset.schema().is_empty() {
            declared_schema
        } else {
            Some(dataset.schema())
        };
        let dataset_type = dataset_type(schema, frame.map(|frame| frame.as_any()))?;

        if let Some(local_path) = dataset.local_path() {
            self.file_access.put_data(local_path, &uri, false)?;
        } else if let Some(frame) = frame {
            self.upload(
                &HandlerKey::Type(frame.key()),
                &HandlerKey::Format(format),
                &uri,
                frame.as_any(),
            )?;
        } else {
            return Err(MarshalError::InvalidArgument(
                "structured dataset has neither a local path nor a dataframe".into(),
            ));
        }
        Ok(dataset_literal(uri, format, dataset_type))
    }

    fn encode_frame(
        &self,
        value: &dyn Any,
        declared: &DeclaredType,
    ) -> Result<Literal, MarshalError> {
        let (key, declared_schema) = match declared {
            DeclaredType::Native(key) if key.matches(value) => (*key, None),
            DeclaredType::Native(key) => {
                let found = self
                    .registry
                    .type_key_of(value)
                    .map_or_else(|| "an unregistered value".to_string(), |k| k.to_string());
                return Err(MarshalError::type_mismatch(key.to_string(), found));
            }
            DeclaredType::StructuredDataset(schema) => {
                let key = self.registry.type_key_of(value).ok_or_else(|| {
                    MarshalError::type_mismatch(
                        "StructuredDataset or a registered dataframe type",
                        "an unregistered value",
                    )
                })?;
                (key, Some(schema))
            }
            other => {
                return Err(MarshalError::type_mismatch(
                    "StructuredDataset or a registered dataframe type",
                    other.to_string(),
                ))
            }
        };

        let dataset_type = dataset_type(declared_schema, Some(value))?;
        let uri = self.file_access.random_remote_path(None);
        let format = DatasetFormat::Parquet;
        self.upload(
            &HandlerKey::Type(key),
            &HandlerKey::Format(format),
            &uri,
            value,
        )?;
        Ok(dataset_literal(uri, format, dataset_type))
    }

    /// Decodes a structured dataset literal.
    ///
    /// An expected `StructuredDataset` yields a lazy [`StructuredDataset`]
    /// carrying only the uri, format and declared schema. An expected
    /// native frame type is materialized through [`download`](Self::download).
    pub fn decode(
        &self,
        literal: &Literal,
        expected: &DeclaredType,
    ) -> Result<AnyValue, MarshalError> {
        let dataset = literal.as_structured_dataset().ok_or_else(|| {
            MarshalError::type_mismatch("structured_dataset literal", literal.kind_name())
        })?;
        let format = DatasetFormat::value_of(&dataset.metadata.format)?;
        let uri = dataset.uri.as_str();

        match expected {
            DeclaredType::StructuredDataset(schema) => Ok(Box::new(
                StructuredDataset::from_remote(uri, format).with_schema(schema.clone()),
            )),
            DeclaredType::Native(key) => {
                self.download(&HandlerKey::Format(format), &HandlerKey::Type(*key), uri)
            }
            other => Err(MarshalError::type_mismatch(
                "StructuredDataset or a registered dataframe type",
                other.to_string(),
            )),
        }
    }

    /// Decodes and downcasts in one step.
    pub fn decode_as<T: Any>(&self, literal: &Literal) -> Result<T, MarshalError> {
        let value = self.decode(literal, &DeclaredType::native::<T>())?;
        downcast_value(value, literal.kind_name())
    }

    /// Reads the data at `uri` from `from` into a `to` value.
    ///
    /// Uses a direct retrieval handler when one exists, otherwise retrieves
    /// into the intermediate format and decodes from there.
    ///
    /// # Errors
    /// [`MarshalError::Unsupported`] if neither route exists.
    pub fn download(
        &self,
        from: &HandlerKey,
        to: &HandlerKey,
        uri: &str,
    ) -> Result<AnyValue, MarshalError> {
        if let Some(retrieve) = self.registry.retrieval(from, to) {
            tracing::debug!(%from, %to, uri, "retrieving dataset");
            return retrieve(uri);
        }

        let intermediate = Self::intermediate_format();
        match (
            self.registry.retrieval(from, &intermediate),
            self.registry.decoding(&intermediate, to),
        ) {
            (Some(retrieve), Some(decode)) => {
                tracing::debug!(%from, %to, uri, "retrieving dataset through {intermediate}");
                decode(retrieve(uri)?)
            }
            _ => Err(MarshalError::Unsupported(format!(
                "download of {to} from {from} is not implemented"
            ))),
        }
    }

    /// Writes `value`, of type `from`, as `to` at `uri`.
    ///
    /// Uses a direct persistence handler when one exists, otherwise encodes
    /// into the intermediate format and persists that.
    ///
    /// # Errors
    /// [`MarshalError::Unsupported`] if neither route exists.
    pub fn upload(
        &self,
        from: &HandlerKey,
        to: &HandlerKey,
        uri: &str,
        value: &dyn Any,
    ) -> Result<(), MarshalError> {
        if let Some(persist) = self.registry.persistence(from, to) {
            tracing::debug!(%from, %to, uri, "persisting dataset");
            return persist(value, uri);
        }

        let intermediate = Self::intermediate_format();
        match (
            self.registry.encoding(from, &intermediate),
            self.registry.persistence(&intermediate, to),
        ) {
            (Some(encode), Some(persist)) => {
                tracing::debug!(%from, %to, uri, "persisting dataset through {intermediate}");
                let table = encode(value)?;
                persist(&*table, uri)
            }
            _ => Err(MarshalError::Unsupported(format!(
                "upload of {to} from {from} is not implemented"
            ))),
        }
    }

    /// Rebuilds a declared dataset type from its literal type.
    ///
    /// # Errors
    /// - [`MarshalError::InvalidArgument`] if `literal_type` is not a
    ///   structured dataset type.
    /// - [`MarshalError::Unsupported`] for any non-simple column.
    pub fn guess_type(&self, literal_type: &LiteralType) -> Result<DeclaredType, MarshalError> {
        let LiteralType::StructuredDataset(dataset_type) = literal_type else {
            return Err(MarshalError::InvalidArgument(format!(
                "cannot reverse {literal_type} into a structured dataset"
            )));
        };
        let schema = dataset_type
            .columns
            .iter()
            .map(|column| Ok((column.name.clone(), guess_column_type(&column.literal_type)?)))
            .collect::<Result<DatasetSchema, MarshalError>>()?;
        Ok(DeclaredType::StructuredDataset(schema))
    }
}

impl TypeTransformer for StructuredDatasetTransformer {
    fn name(&self) -> &str {
        "StructuredDataset"
    }

    fn handles(&self, declared: &DeclaredType) -> bool {
        match declared {
            DeclaredType::StructuredDataset(_) => true,
            DeclaredType::Native(key) => self.registry.is_registered(&HandlerKey::Type(*key)),
            _ => false,
        }
    }

    fn literal_type(&self, declared: &DeclaredType) -> Result<LiteralType, MarshalError> {
        match declared {
            DeclaredType::StructuredDataset(schema) => {
                Ok(LiteralType::StructuredDataset(schema.to_dataset_type()?))
            }
            DeclaredType::Native(_) => Ok(LiteralType::StructuredDataset(
                StructuredDatasetType::default(),
            )),
            other => Err(MarshalError::type_mismatch(
                "StructuredDataset or a registered dataframe type",
                other.to_string(),
            )),
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

/// Column descriptor for an encoded value.
///
/// A `RecordBatch` frame is inspected for its physical columns. When a
/// schema is declared as well, every declared column must be present in the
/// batch with the same literal type; extra physical columns are allowed.
/// An empty declared schema counts as absent, so the batch's own columns
/// are reported.
fn dataset_type(
    declared: Option<&DatasetSchema>,
    frame: Option<&dyn Any>,
) -> Result<StructuredDatasetType, MarshalError> {
    let declared = declared
        .filter(|schema| !schema.is_empty())
        .map(DatasetSchema::to_dataset_type)
        .transpose()?;
    let inferred = frame
        .and_then(|frame| frame.downcast_ref::<RecordBatch>())
        .map(|batch| arrow_schema_columns(batch.schema().as_ref()))
        .transpose()?;

    match (declared, inferred) {
        (Some(declared), Some(inferred)) => {
            for column in &declared.columns {
                match inferred.iter().find(|found| found.name == column.name) {
                    Some(found) if found.literal_type == column.literal_type => {}
                    Some(found) => {
                        return Err(MarshalError::type_mismatch(
                            format!("column '{}' of type {}", column.name, column.literal_type),
                            found.literal_type.to_string(),
                        ))
                    }
                    None => {
                        return Err(MarshalError::type_mismatch(
                            format!("column '{}'", column.name),
                            "no such column in the data",
                        ))
                    }
                }
            }
            Ok(declared)
        }
        (Some(declared), None) => Ok(declared),
        (None, Some(columns)) => Ok(StructuredDatasetType { columns }),
        (None, None) => Ok(StructuredDatasetType::default()),
    }
}

fn dataset_literal(
    uri: String,
    format: DatasetFormat,
    structured_dataset_type: StructuredDatasetType,
) -> Literal {
    Literal::StructuredDataset(StructuredDatasetLiteral {
        uri,
        metadata: StructuredDatasetMetadata {
            format: format.name().to_string(),
            structured_dataset_type,
        },
    })
}
