//! JSON serialization for literals.
//!
//! Literals are written as externally tagged JSON objects, e.g.
//! `{"blob": {"metadata": {...}, "uri": "s3://..."}}`. This is the format the
//! CLI prints and reads, and it is handy for inspecting what a transformer
//! produced.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::model::Literal;
use crate::error::MarshalError;

/// Reads a literal from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_literal_json(path: &Path) -> Result<Literal, MarshalError> {
    let file = File::open(path).map_err(MarshalError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| MarshalError::LiteralJsonParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes a literal to a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_literal_json(path: &Path, literal: &Literal) -> Result<(), MarshalError> {
    let file = File::create(path).map_err(MarshalError::Io)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, literal).map_err(|source| {
        MarshalError::LiteralJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Reads a literal from a JSON string.
pub fn from_json_str(json: &str) -> Result<Literal, serde_json::Error> {
    serde_json::from_str(json)
}

/// Reads a literal from raw bytes without requiring UTF-8 up front.
pub fn from_json_slice(bytes: &[u8]) -> Result<Literal, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Writes a literal to a pretty-printed JSON string.
pub fn to_json_string(literal: &Literal) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(literal)
}
