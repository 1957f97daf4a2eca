//! Default Parquet handlers.
//!
//! Persistence writes a `RecordBatch` to a scratch file in the sandbox and
//! hands it to the store; retrieval does the reverse. The scratch file is
//! removed once the transfer finishes. Every other frame type
//! reaches Parquet through these two by way of the intermediate format.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use super::handlers::{Handler, HandlerKey, HandlerRegistryBuilder};
use super::DatasetFormat;
use crate::error::MarshalError;
use crate::storage::FileAccess;

const SCRATCH_FILE_NAME: &str = "00000.parquet";

/// Registers `RecordBatch -> PARQUET` persistence and `PARQUET ->
/// RecordBatch` retrieval, both going through `file_access`.
pub fn register_parquet_handlers(
    builder: &mut HandlerRegistryBuilder,
    file_access: Arc<dyn FileAccess>,
) {
    let store = Arc::clone(&file_access);
    builder.register(
        HandlerKey::of::<RecordBatch>(),
        DatasetFormat::Parquet,
        Handler::persistence(move |batch: &RecordBatch, uri| {
            let local = store.random_local_path(Some(SCRATCH_FILE_NAME));
            let written = write_parquet_file(Path::new(&local), batch)
                .and_then(|()| store.put_data(&local, uri, false));
            discard_scratch(Path::new(&local));
            written
        }),
    );

    let store = file_access;
    builder.register(
        DatasetFormat::Parquet,
        HandlerKey::of::<RecordBatch>(),
        Handler::retrieval(move |uri| {
            let local = store.random_local_path(Some(SCRATCH_FILE_NAME));
            let read = store
                .get_data(uri, &local, false)
                .and_then(|()| read_parquet_file(Path::new(&local)));
            discard_scratch(Path::new(&local));
            read
        }),
    );
}

/// Writes `batch` as a single-row-group Parquet file, creating parent
/// directories as needed.
pub fn write_parquet_file(path: &Path, batch: &RecordBatch) -> Result<(), MarshalError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .map_err(|e| parquet_error(path, e))?;
    writer.write(batch).map_err(|e| parquet_error(path, e))?;
    writer.close().map_err(|e| parquet_error(path, e))?;
    Ok(())
}

/// Reads a Parquet file into one `RecordBatch`.
///
/// A file without rows yields an empty batch with the file's schema.
pub fn read_parquet_file(path: &Path) -> Result<RecordBatch, MarshalError> {
    let file = fs::File::open(path)?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| parquet_error(path, e))?;
    let schema = Arc::clone(builder.schema());
    let reader = builder.build().map_err(|e| parquet_error(path, e))?;

    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    if batches.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    Ok(concat_batches(&schema, &batches)?)
}

/// Removes a scratch file and, if it is left empty, its token directory.
fn discard_scratch(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "could not remove scratch file");
        }
    }
    if let Some(parent) = path.parent() {
        let _ = fs::remove_dir(parent);
    }
}

fn parquet_error(path: &Path, error: parquet::errors::ParquetError) -> MarshalError {
    MarshalError::Parquet {
        uri: path.display().to_string(),
        message: error.to_string(),
    }
}
