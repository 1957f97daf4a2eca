//! Host type dispatch.
//!
//! The [`TypeEngine`] owns a list of [`TypeTransformer`]s and hands each
//! conversion to the first transformer that claims the declared type. Values
//! cross this boundary type-erased (`&dyn Any` in, [`AnyValue`] out); callers
//! that know the concrete type use [`TypeEngine::to_native_as`].

mod declared;

pub use declared::{DeclaredType, TypeKey};

use std::any::Any;
use std::sync::Arc;

use crate::dataset::{parquet, HandlerRegistryBuilder, StructuredDatasetTransformer};
use crate::error::MarshalError;
use crate::file::FileTransformer;
use crate::literal::{Literal, LiteralType};
use crate::storage::FileAccess;

/// A type-erased value produced by decoding a literal.
pub type AnyValue = Box<dyn Any + Send>;

/// Converts between in-process values and literals for a family of types.
pub trait TypeTransformer: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Whether this transformer should handle `declared`.
    fn handles(&self, declared: &DeclaredType) -> bool;

    /// Literal type a task interface declares for `declared`.
    fn literal_type(&self, declared: &DeclaredType) -> Result<LiteralType, MarshalError>;

    /// Encodes `value` (absent values are rejected) as a literal.
    fn to_literal(
        &self,
        value: Option<&dyn Any>,
        declared: &DeclaredType,
    ) -> Result<Literal, MarshalError>;

    /// Decodes `literal` into a value of the `expected` type.
    fn to_native(&self, literal: &Literal, expected: &DeclaredType)
        -> Result<AnyValue, MarshalError>;
}

/// Dispatches conversions to registered transformers.
#[derive(Default)]
pub struct TypeEngine {
    transformers: Vec<Arc<dyn TypeTransformer>>,
}

impl TypeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine with the file transformer and a dataset transformer that
    /// knows the default Parquet handlers.
    pub fn with_defaults(file_access: Arc<dyn FileAccess>) -> Self {
        let mut handlers = HandlerRegistryBuilder::new();
        parquet::register_parquet_handlers(&mut handlers, Arc::clone(&file_access));

        let mut engine = Self::new();
        engine.register(Arc::new(FileTransformer::new(Arc::clone(&file_access))));
        engine.register(Arc::new(StructuredDatasetTransformer::new(
            handlers.build(),
            file_access,
        )));
        engine
    }

    /// Adds a transformer. Earlier registrations win when two claim the
    /// same declared type.
    pub fn register(&mut self, transformer: Arc<dyn TypeTransformer>) -> &mut Self {
        tracing::debug!(name = transformer.name(), "registered transformer");
        self.transformers.push(transformer);
        self
    }

    /// The transformer that claims `declared`.
    ///
    /// # Errors
    /// [`MarshalError::Unsupported`] if no transformer claims it.
    pub fn transformer_for(
        &self,
        declared: &DeclaredType,
    ) -> Result<&dyn TypeTransformer, MarshalError> {
        self.transformers
            .iter()
            .find(|t| t.handles(declared))
            .map(|t| t.as_ref())
            .ok_or_else(|| {
                MarshalError::Unsupported(format!("no transformer handles {declared}"))
            })
    }

    pub fn literal_type(&self, declared: &DeclaredType) -> Result<LiteralType, MarshalError> {
        self.transformer_for(declared)?.literal_type(declared)
    }

    pub fn to_literal(
        &self,
        value: Option<&dyn Any>,
        declared: &DeclaredType,
    ) -> Result<Literal, MarshalError> {
        let transformer = self.transformer_for(declared)?;
        tracing::debug!(transformer = transformer.name(), %declared, "encoding value");
        transformer.to_literal(value, declared)
    }

    pub fn to_native(
        &self,
        literal: &Literal,
        expected: &DeclaredType,
    ) -> Result<AnyValue, MarshalError> {
        let transformer = self.transformer_for(expected)?;
        tracing::debug!(transformer = transformer.name(), %expected, "decoding literal");
        transformer.to_native(literal, expected)
    }

    /// Decodes and downcasts in one step.
    ///
    /// # Errors
    /// [`MarshalError::TypeMismatch`] if the transformer produced something
    /// other than `T`.
    pub fn to_native_as<T: Any>(
        &self,
        literal: &Literal,
        expected: &DeclaredType,
    ) -> Result<T, MarshalError> {
        let value = self.to_native(literal, expected)?;
        downcast_value(value, &expected.to_string())
    }
}

/// Unboxes an [`AnyValue`] into `T`.
pub(crate) fn downcast_value<T: Any>(value: AnyValue, found: &str) -> Result<T, MarshalError> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| MarshalError::type_mismatch(TypeKey::of::<T>().short_name(), found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileRef;
    use crate::literal::{BlobType, LiteralType};
    use crate::storage::{LocalFileAccess, StoreConfig};
    use arrow::record_batch::RecordBatch;

    fn engine(root: &std::path::Path) -> TypeEngine {
        TypeEngine::with_defaults(Arc::new(LocalFileAccess::new(StoreConfig {
            store_root: root.join("store"),
            raw_output_prefix: "s3://bucket/raw".into(),
            sandbox: root.join("sandbox"),
        })))
    }

    #[test]
    fn file_types_route_to_file_transformer() {
        let engine = engine(std::path::Path::new("/unused"));
        assert_eq!(
            engine.transformer_for(&DeclaredType::file("csv")).unwrap().name(),
            "FileRef"
        );
        assert_eq!(
            engine.transformer_for(&DeclaredType::Path).unwrap().name(),
            "FileRef"
        );
        assert_eq!(
            engine.literal_type(&DeclaredType::file("csv")).unwrap(),
            LiteralType::Blob(BlobType::single("csv"))
        );
    }

    #[test]
    fn registered_frame_types_route_to_dataset_transformer() {
        let engine = engine(std::path::Path::new("/unused"));
        let name = engine
            .transformer_for(&DeclaredType::native::<RecordBatch>())
            .unwrap()
            .name()
            .to_string();
        assert_eq!(name, "StructuredDataset");
        assert!(engine
            .transformer_for(&DeclaredType::dataset())
            .is_ok());
    }

    #[test]
    fn unknown_native_type_is_unsupported() {
        let engine = engine(std::path::Path::new("/unused"));
        let err = engine
            .transformer_for(&DeclaredType::native::<Vec<u8>>())
            .err()
            .unwrap();
        assert!(matches!(err, MarshalError::Unsupported(_)));
    }

    #[test]
    fn to_native_as_reports_wrong_target() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(dir.path());
        let literal = engine
            .to_literal(
                Some(&FileRef::new("/data/x").never_upload()),
                &DeclaredType::file(""),
            )
            .unwrap();

        let err = engine
            .to_native_as::<String>(&literal, &DeclaredType::file(""))
            .unwrap_err();
        assert!(matches!(err, MarshalError::TypeMismatch { .. }));
    }
}
