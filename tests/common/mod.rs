#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use marshalkit::storage::{FileAccess, LocalFileAccess, StoreConfig};
use marshalkit::MarshalError;

pub fn store_config(root: &Path) -> StoreConfig {
    StoreConfig {
        store_root: root.join("store"),
        raw_output_prefix: "s3://test-bucket/raw".to_string(),
        sandbox: root.join("sandbox"),
    }
}

pub fn write_file(path: &Path, contents: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write file");
    path.to_path_buf()
}

/// A local store that counts every transfer it is asked to make.
pub struct RecordingFileAccess {
    inner: LocalFileAccess,
    puts: AtomicUsize,
    gets: AtomicUsize,
}

impl RecordingFileAccess {
    pub fn new(root: &Path) -> Arc<Self> {
        Arc::new(Self {
            inner: LocalFileAccess::new(store_config(root)),
            puts: AtomicUsize::new(0),
            gets: AtomicUsize::new(0),
        })
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn resolve(&self, uri: &str) -> PathBuf {
        self.inner.resolve(uri).expect("resolve uri")
    }
}

impl FileAccess for RecordingFileAccess {
    fn random_remote_path(&self, hint: Option<&str>) -> String {
        self.inner.random_remote_path(hint)
    }

    fn random_local_path(&self, hint: Option<&str>) -> String {
        self.inner.random_local_path(hint)
    }

    fn put_data(&self, source: &str, dest: &str, multipart: bool) -> Result<(), MarshalError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put_data(source, dest, multipart)
    }

    fn get_data(&self, source: &str, dest: &str, multipart: bool) -> Result<(), MarshalError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_data(source, dest, multipart)
    }
}
