//! File values through the engine and a local store.

mod common;

use std::any::Any;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use common::{write_file, RecordingFileAccess};
use marshalkit::engine::{DeclaredType, TypeEngine};
use marshalkit::file::FileRef;
use marshalkit::literal::{Blob, BlobMetadata, BlobDimensionality, Literal};
use marshalkit::storage::FileAccess;
use marshalkit::MarshalError;

fn engine(store: &Arc<RecordingFileAccess>) -> TypeEngine {
    let access: Arc<dyn FileAccess> = store.clone();
    TypeEngine::with_defaults(access)
}

fn blob(uri: &str, format: &str) -> Literal {
    Literal::Blob(Blob {
        metadata: BlobMetadata::new(format, BlobDimensionality::Single),
        uri: uri.to_string(),
    })
}

#[test]
fn local_file_is_uploaded_once_to_fresh_path() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingFileAccess::new(dir.path());
    let engine = engine(&store);
    let src = write_file(&dir.path().join("in/report.csv"), b"a,b\n1,2\n");

    let value: &dyn Any = &FileRef::new(src.to_string_lossy());
    let literal = engine
        .to_literal(Some(value), &DeclaredType::file("csv"))
        .unwrap();

    assert_eq!(store.puts(), 1);
    let blob = literal.as_blob().unwrap();
    assert!(blob.uri.starts_with("s3://test-bucket/raw/"));
    assert!(blob.uri.ends_with("/report.csv"));
    assert_eq!(blob.metadata.format, "csv");
    assert_eq!(fs::read(store.resolve(&blob.uri)).unwrap(), b"a,b\n1,2\n");
}

#[test]
fn remote_strings_pass_through_without_upload() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingFileAccess::new(dir.path());
    let engine = engine(&store);

    for uri in ["s3://bucket/key.csv", "file:///srv/data/key.csv"] {
        let value: &dyn Any = &uri.to_string();
        let literal = engine
            .to_literal(Some(value), &DeclaredType::file("csv"))
            .unwrap();
        assert_eq!(literal.uri(), uri);
    }
    assert_eq!(store.puts(), 0);
}

#[test]
fn path_declared_values_are_not_uploaded() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingFileAccess::new(dir.path());
    let engine = engine(&store);
    let src = write_file(&dir.path().join("plain.bin"), b"\x00\x01");

    let value: &dyn Any = &src;
    let literal = engine.to_literal(Some(value), &DeclaredType::Path).unwrap();

    assert_eq!(store.puts(), 0);
    assert_eq!(literal.uri(), src.to_str().unwrap());
}

#[test]
fn missing_local_file_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingFileAccess::new(dir.path());
    let engine = engine(&store);

    let value: &dyn Any = &dir.path().join("does-not-exist.txt");
    let err = engine
        .to_literal(Some(value), &DeclaredType::file("txt"))
        .unwrap_err();
    assert!(matches!(err, MarshalError::InvalidArgument(_)));

    let err = engine
        .to_literal(None, &DeclaredType::file("txt"))
        .unwrap_err();
    assert!(matches!(err, MarshalError::InvalidArgument(_)));
}

#[test]
fn local_file_roundtrips_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingFileAccess::new(dir.path());
    let engine = engine(&store);
    let bytes = b"some bytes that travel through the store".to_vec();
    let src = write_file(&dir.path().join("payload.dat"), &bytes);

    let value: &dyn Any = &FileRef::new(src.to_string_lossy());
    let literal = engine
        .to_literal(Some(value), &DeclaredType::file("dat"))
        .unwrap();
    let decoded: FileRef = engine
        .to_native_as(&literal, &DeclaredType::file("dat"))
        .unwrap();

    assert_eq!(decoded.remote_source(), Some(literal.uri()));
    assert!(!decoded.downloaded());
    assert_eq!(fs::read(decoded.local_path().unwrap()).unwrap(), bytes);
    assert!(decoded.downloaded());
}

#[test]
fn decoded_remote_file_downloads_lazily_and_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingFileAccess::new(dir.path());
    let engine = engine(&store);
    write_file(&store.resolve("s3://b/k"), b"remote");

    let decoded: FileRef = engine
        .to_native_as(&blob("s3://b/k", "csv"), &DeclaredType::file("csv"))
        .unwrap();

    assert_eq!(decoded.remote_source(), Some("s3://b/k"));
    assert_eq!(decoded.format().as_str(), "csv");
    assert!(!decoded.downloaded());
    assert!(decoded.path().starts_with(dir.path().join("sandbox").to_str().unwrap()));
    assert_eq!(store.gets(), 0);

    let first = decoded.local_path().unwrap().to_path_buf();
    let second = decoded.local_path().unwrap().to_path_buf();
    assert_eq!(first, second);
    assert_eq!(store.gets(), 1);
    assert_eq!(fs::read(first).unwrap(), b"remote");
}

#[test]
fn reencoding_decoded_file_keeps_its_source() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingFileAccess::new(dir.path());
    let engine = engine(&store);

    let decoded: FileRef = engine
        .to_native_as(&blob("s3://b/original.csv", "csv"), &DeclaredType::file("csv"))
        .unwrap();
    let value: &dyn Any = &decoded;
    let literal = engine
        .to_literal(Some(value), &DeclaredType::file("csv"))
        .unwrap();

    assert_eq!(literal.uri(), "s3://b/original.csv");
    assert_eq!(store.puts(), 0);
    assert_eq!(store.gets(), 0);
}

#[test]
fn path_target_gets_uri_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingFileAccess::new(dir.path());
    let engine = engine(&store);

    let path: PathBuf = engine
        .to_native_as(&blob("s3://b/k", ""), &DeclaredType::Path)
        .unwrap();
    assert_eq!(path, PathBuf::from("s3://b/k"));
    assert_eq!(store.gets(), 0);
}

#[test]
fn failed_download_surfaces_transfer_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = RecordingFileAccess::new(dir.path());
    let engine = engine(&store);

    let decoded: FileRef = engine
        .to_native_as(&blob("s3://b/missing", ""), &DeclaredType::file(""))
        .unwrap();
    let err = decoded.local_path().unwrap_err();

    assert!(matches!(err, MarshalError::Transfer { .. }));
    assert!(!decoded.downloaded());
}
