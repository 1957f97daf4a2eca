//! Column schemas and the supported-type tables.
//!
//! Two tables map into literal types: one for declared (semantic) column
//! types, one for Arrow physical types. A third maps simple literal types
//! back to a canonical semantic type. Anything outside these tables is
//! rejected as unsupported.

use std::fmt;

use arrow::datatypes::{DataType, Schema};

use crate::error::MarshalError;
use crate::literal::{DatasetColumn, LiteralType, SimpleType, StructuredDatasetType};

/// Semantic type of a declared dataset column.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
    Boolean,
    String,
    Datetime,
    Duration,
    /// List whose elements have the inner type.
    List(Box<ColumnType>),
    /// String-keyed map whose values have the inner type.
    Map(Box<ColumnType>),
    /// Raw bytes. No literal counterpart.
    Bytes,
    /// Fixed-point decimal. No literal counterpart.
    Decimal { precision: u8, scale: i8 },
}

impl ColumnType {
    pub fn list_of(inner: ColumnType) -> Self {
        ColumnType::List(Box::new(inner))
    }

    pub fn map_of(value: ColumnType) -> Self {
        ColumnType::Map(Box::new(value))
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Int8 => f.write_str("int8"),
            ColumnType::Int16 => f.write_str("int16"),
            ColumnType::Int32 => f.write_str("int32"),
            ColumnType::Int64 => f.write_str("int64"),
            ColumnType::UInt32 => f.write_str("uint32"),
            ColumnType::UInt64 => f.write_str("uint64"),
            ColumnType::Float16 => f.write_str("float16"),
            ColumnType::Float32 => f.write_str("float32"),
            ColumnType::Float64 => f.write_str("float64"),
            ColumnType::Boolean => f.write_str("bool"),
            ColumnType::String => f.write_str("string"),
            ColumnType::Datetime => f.write_str("datetime"),
            ColumnType::Duration => f.write_str("duration"),
            ColumnType::List(inner) => write!(f, "list<{inner}>"),
            ColumnType::Map(value) => write!(f, "map<string, {value}>"),
            ColumnType::Bytes => f.write_str("bytes"),
            ColumnType::Decimal { precision, scale } => write!(f, "decimal({precision}, {scale})"),
        }
    }
}

/// Ordered column names and their declared types.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DatasetSchema {
    columns: Vec<(String, ColumnType)>,
}

impl DatasetSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column, keeping declaration order.
    pub fn with_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push((name.into(), column_type));
        self
    }

    pub fn columns(&self) -> &[(String, ColumnType)] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Literal descriptor with every column mapped through the table.
    pub fn to_dataset_type(&self) -> Result<StructuredDatasetType, MarshalError> {
        let columns = self
            .columns
            .iter()
            .map(|(name, column_type)| {
                Ok(DatasetColumn::new(name.clone(), column_literal_type(column_type)?))
            })
            .collect::<Result<Vec<_>, MarshalError>>()?;
        Ok(StructuredDatasetType { columns })
    }
}

impl<S: Into<String>> FromIterator<(S, ColumnType)> for DatasetSchema {
    fn from_iter<I: IntoIterator<Item = (S, ColumnType)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(name, column_type)| (name.into(), column_type))
                .collect(),
        }
    }
}

/// Literal type of a declared column type.
///
/// # Errors
/// [`MarshalError::Unsupported`] for types outside the table.
pub fn column_literal_type(column_type: &ColumnType) -> Result<LiteralType, MarshalError> {
    let simple = match column_type {
        ColumnType::Int8
        | ColumnType::Int16
        | ColumnType::Int32
        | ColumnType::Int64
        | ColumnType::UInt32
        | ColumnType::UInt64 => SimpleType::Integer,
        ColumnType::Float16 | ColumnType::Float32 | ColumnType::Float64 => SimpleType::Float,
        ColumnType::Boolean => SimpleType::Boolean,
        ColumnType::String => SimpleType::String,
        ColumnType::Datetime => SimpleType::Datetime,
        ColumnType::Duration => SimpleType::Duration,
        ColumnType::List(inner) => {
            return Ok(LiteralType::collection_of(column_literal_type(inner)?));
        }
        ColumnType::Map(value) => return Ok(LiteralType::map_of(column_literal_type(value)?)),
        ColumnType::Bytes | ColumnType::Decimal { .. } => {
            return Err(MarshalError::Unsupported(format!(
                "column type {column_type} is not supported by structured datasets"
            )));
        }
    };
    Ok(LiteralType::simple(simple))
}

/// Literal type of an Arrow physical type.
///
/// # Errors
/// [`MarshalError::Unsupported`] for types outside the table.
pub fn arrow_literal_type(data_type: &DataType) -> Result<LiteralType, MarshalError> {
    let simple = match data_type {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt32
        | DataType::UInt64 => SimpleType::Integer,
        DataType::Float16 | DataType::Float32 | DataType::Float64 => SimpleType::Float,
        DataType::Boolean => SimpleType::Boolean,
        DataType::Utf8 | DataType::LargeUtf8 => SimpleType::String,
        DataType::Timestamp(_, _) => SimpleType::Datetime,
        DataType::Duration(_) => SimpleType::Duration,
        DataType::List(field) | DataType::LargeList(field) => {
            return Ok(LiteralType::collection_of(arrow_literal_type(
                field.data_type(),
            )?));
        }
        DataType::Map(entries, _) => {
            // Map entries are a struct of (key, value).
            let value = match entries.data_type() {
                DataType::Struct(fields) if fields.len() == 2 => fields[1].data_type(),
                other => {
                    return Err(MarshalError::Unsupported(format!(
                        "map entries of type {other}"
                    )))
                }
            };
            return Ok(LiteralType::map_of(arrow_literal_type(value)?));
        }
        other => {
            return Err(MarshalError::Unsupported(format!(
                "arrow type {other} is not supported by structured datasets"
            )));
        }
    };
    Ok(LiteralType::simple(simple))
}

/// Columns of an Arrow schema, in order.
pub(crate) fn arrow_schema_columns(schema: &Schema) -> Result<Vec<DatasetColumn>, MarshalError> {
    schema
        .fields()
        .iter()
        .map(|field| {
            Ok(DatasetColumn::new(
                field.name().clone(),
                arrow_literal_type(field.data_type())?,
            ))
        })
        .collect()
}

/// Canonical semantic type for a simple column literal type.
///
/// # Errors
/// [`MarshalError::Unsupported`] for anything but simple types; nested
/// collections cannot be inverted.
pub fn guess_column_type(literal_type: &LiteralType) -> Result<ColumnType, MarshalError> {
    match literal_type {
        LiteralType::Simple(SimpleType::Integer) => Ok(ColumnType::Int64),
        LiteralType::Simple(SimpleType::Float) => Ok(ColumnType::Float64),
        LiteralType::Simple(SimpleType::String) => Ok(ColumnType::String),
        LiteralType::Simple(SimpleType::Boolean) => Ok(ColumnType::Boolean),
        LiteralType::Simple(SimpleType::Datetime) => Ok(ColumnType::Datetime),
        LiteralType::Simple(SimpleType::Duration) => Ok(ColumnType::Duration),
        other => Err(MarshalError::Unsupported(format!(
            "unknown structured dataset column type {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Fields, TimeUnit};
    use std::sync::Arc;

    #[test]
    fn integer_family_maps_to_integer() {
        for column_type in [ColumnType::Int8, ColumnType::Int32, ColumnType::UInt64] {
            assert_eq!(
                column_literal_type(&column_type).unwrap(),
                LiteralType::simple(SimpleType::Integer)
            );
        }
    }

    #[test]
    fn nested_declared_types_recurse() {
        let column_type = ColumnType::map_of(ColumnType::list_of(ColumnType::Float32));
        assert_eq!(
            column_literal_type(&column_type).unwrap(),
            LiteralType::map_of(LiteralType::collection_of(LiteralType::simple(
                SimpleType::Float
            )))
        );
    }

    #[test]
    fn unsupported_declared_types_fail() {
        let err = column_literal_type(&ColumnType::list_of(ColumnType::Bytes)).unwrap_err();
        assert!(matches!(err, MarshalError::Unsupported(_)));
    }

    #[test]
    fn arrow_types_map_through_table() {
        assert_eq!(
            arrow_literal_type(&DataType::Timestamp(TimeUnit::Microsecond, None)).unwrap(),
            LiteralType::simple(SimpleType::Datetime)
        );
        assert_eq!(
            arrow_literal_type(&DataType::Duration(TimeUnit::Second)).unwrap(),
            LiteralType::simple(SimpleType::Duration)
        );
        let list = DataType::List(Arc::new(Field::new("item", DataType::Utf8, true)));
        assert_eq!(
            arrow_literal_type(&list).unwrap(),
            LiteralType::collection_of(LiteralType::simple(SimpleType::String))
        );
    }

    #[test]
    fn arrow_map_uses_value_type() {
        let entries = Field::new(
            "entries",
            DataType::Struct(Fields::from(vec![
                Field::new("key", DataType::Utf8, false),
                Field::new("value", DataType::Boolean, true),
            ])),
            false,
        );
        let map = DataType::Map(Arc::new(entries), false);
        assert_eq!(
            arrow_literal_type(&map).unwrap(),
            LiteralType::map_of(LiteralType::simple(SimpleType::Boolean))
        );
    }

    #[test]
    fn unsupported_arrow_types_fail() {
        let err = arrow_literal_type(&DataType::Binary).unwrap_err();
        assert!(matches!(err, MarshalError::Unsupported(_)));
    }

    #[test]
    fn guess_inverts_simple_types() {
        assert_eq!(
            guess_column_type(&LiteralType::simple(SimpleType::Integer)).unwrap(),
            ColumnType::Int64
        );
        assert_eq!(
            guess_column_type(&LiteralType::simple(SimpleType::Duration)).unwrap(),
            ColumnType::Duration
        );
    }

    #[test]
    fn guess_rejects_collections() {
        let nested = LiteralType::collection_of(LiteralType::simple(SimpleType::Integer));
        assert!(matches!(
            guess_column_type(&nested).unwrap_err(),
            MarshalError::Unsupported(_)
        ));
    }

    #[test]
    fn schema_keeps_declaration_order() {
        let schema: DatasetSchema = [("b", ColumnType::String), ("a", ColumnType::Int64)]
            .into_iter()
            .collect();
        assert_eq!(schema.column_names().collect::<Vec<_>>(), vec!["b", "a"]);
        let dataset_type = schema.to_dataset_type().unwrap();
        assert_eq!(dataset_type.columns[0].name, "b");
        assert_eq!(
            dataset_type.columns[1].literal_type,
            LiteralType::simple(SimpleType::Integer)
        );
    }
}
