//! Declared types: what a task signature says a value is.
//!
//! Rust has no runtime subclasses, so the format tag of a file type and the
//! column schema of a dataset type travel as data next to the base type.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::dataset::DatasetSchema;
use crate::file::FileFormat;

/// Identity of an in-memory Rust type, usable as a map key.
///
/// Equality and hashing use only the [`TypeId`]; the name is kept for
/// messages.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// The key for `T`.
    #[inline]
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type path, e.g. `arrow_array::record_batch::RecordBatch`.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Whether `value` is an instance of this type.
    pub fn matches(&self, value: &dyn Any) -> bool {
        Any::type_id(value) == self.id
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.short_name())
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A type as declared in a task interface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeclaredType {
    /// A file reference with a format tag (empty = any format).
    File(FileFormat),
    /// A plain filesystem path. Never uploaded and never downloaded.
    Path,
    /// The generic dataset wrapper with an optional column schema.
    StructuredDataset(DatasetSchema),
    /// A concrete in-memory type such as an Arrow `RecordBatch`.
    Native(TypeKey),
}

impl DeclaredType {
    /// `File` with the given format tag.
    pub fn file(format: impl Into<FileFormat>) -> Self {
        DeclaredType::File(format.into())
    }

    /// `StructuredDataset` without a column schema.
    pub fn dataset() -> Self {
        DeclaredType::StructuredDataset(DatasetSchema::default())
    }

    /// `Native` for `T`.
    pub fn native<T: Any>() -> Self {
        DeclaredType::Native(TypeKey::of::<T>())
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclaredType::File(format) if format.is_any() => f.write_str("FileRef"),
            DeclaredType::File(format) => write!(f, "FileRef[{format}]"),
            DeclaredType::Path => f.write_str("Path"),
            DeclaredType::StructuredDataset(schema) if schema.is_empty() => {
                f.write_str("StructuredDataset")
            }
            DeclaredType::StructuredDataset(schema) => {
                write!(f, "StructuredDataset[{} column(s)]", schema.len())
            }
            DeclaredType::Native(key) => write!(f, "{key}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn type_keys_compare_by_type() {
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
        assert_ne!(TypeKey::of::<String>(), TypeKey::of::<Vec<u8>>());
    }

    #[test]
    fn type_key_hash() {
        let mut set = HashSet::new();
        set.insert(TypeKey::of::<u32>());
        set.insert(TypeKey::of::<u64>());
        set.insert(TypeKey::of::<u32>());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn short_name_strips_module_path() {
        assert_eq!(TypeKey::of::<String>().short_name(), "String");
        assert_eq!(TypeKey::of::<Vec<String>>().short_name(), "Vec");
    }

    #[test]
    fn matches_checks_runtime_type() {
        let value: Box<dyn Any> = Box::new(42u8);
        assert!(TypeKey::of::<u8>().matches(value.as_ref()));
        assert!(!TypeKey::of::<i8>().matches(value.as_ref()));
    }

    #[test]
    fn display_names_format_tag() {
        assert_eq!(DeclaredType::file("csv").to_string(), "FileRef[csv]");
        assert_eq!(DeclaredType::file("").to_string(), "FileRef");
    }
}
