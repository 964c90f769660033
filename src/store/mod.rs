//! # Document store (memory + disk)
//!
//! Owns the in-memory document map and the on-disk directory of per-document
//! JSON files. Durability ordering is disk-first, memory-second: a failed
//! disk write or remove never touches memory, preserving "a document exists
//! in memory iff its file exists on disk" (data model invariant 1).
//!
//! This module does *not* know about the `_rev` consistency check or the
//! per-key locking queue — those are the engine facade's job (§4.6/§4.7 of
//! the spec). `DocumentStore` is the plain memory+disk half of §4.4.


use crate::document::Document;
use crate::filename::{filename, parse_filename, DOCUMENT_EXTENSION};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, error};

/// Errors raised by the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Disk I/O failure, tagged with the file it happened on.
    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// A stored file's contents did not parse as JSON.
    #[error("failed to parse document at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A stored file parsed as JSON but was not an object.
    #[error("document at {} is not a JSON object", path.display())]
    NotAnObject { path: PathBuf },

    /// The configured directory could not be enumerated.
    #[error("failed to read directory {}: {source}", path.display())]
    Directory { path: PathBuf, source: io::Error },
}

/// The filesystem operations the document store consumes, factored behind
/// a trait (mirroring the teacher's pluggable-strategy pattern) so tests
/// can substitute an in-memory or fault-injecting adapter.
pub trait FileSystemAdapter: Send + Sync {
    /// List the regular files directly inside `dir` (non-recursive).
    fn read_directory(&self, dir: &Path) -> Result<Vec<PathBuf>, StoreError>;

    /// Read a document file's full UTF-8 contents.
    fn read_document_file(&self, path: &Path) -> Result<String, StoreError>;

    /// Replace a document file's contents as a single atomic-from-the-
    /// reader's-perspective operation.
    fn write_document_file(&self, path: &Path, contents: &str) -> Result<(), StoreError>;

    /// Remove a document file. Missing files are not an error (delete is
    /// idempotent at the engine layer).
    fn remove_document_file(&self, path: &Path) -> Result<(), StoreError>;
}

/// The real filesystem adapter: plain files, written via write-temp +
/// rename for atomicity from the reader's perspective, optionally
/// `fsync`'d before the rename is considered durable.
pub struct DefaultFileSystem {
    fsync_on_write: bool,
}

impl DefaultFileSystem {
    pub fn new(fsync_on_write: bool) -> Self {
        Self { fsync_on_write }
    }

    fn io_err(path: &Path, source: io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl FileSystemAdapter for DefaultFileSystem {
    fn read_directory(&self, dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
        let entries = fs::read_dir(dir).map_err(|e| StoreError::Directory {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Directory {
                path: dir.to_path_buf(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_file() {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    fn read_document_file(&self, path: &Path) -> Result<String, StoreError> {
        fs::read_to_string(path).map_err(|e| Self::io_err(path, e))
    }

    fn write_document_file(&self, path: &Path, contents: &str) -> Result<(), StoreError> {
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut f = fs::File::create(&tmp_path).map_err(|e| Self::io_err(&tmp_path, e))?;
            use std::io::Write;
            f.write_all(contents.as_bytes())
                .map_err(|e| Self::io_err(&tmp_path, e))?;
            if self.fsync_on_write {
                f.sync_all().map_err(|e| Self::io_err(&tmp_path, e))?;
            }
        }
        fs::rename(&tmp_path, path).map_err(|e| Self::io_err(path, e))
    }

    fn remove_document_file(&self, path: &Path) -> Result<(), StoreError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_err(path, e)),
        }
    }
}

/// Owns the in-memory document map and the backing directory. Cheap to
/// clone (an `Arc`-backed handle).
pub struct DocumentStore {
    directory: PathBuf,
    fs: Arc<dyn FileSystemAdapter>,
    load_batch_size: usize,
    documents: RwLock<HashMap<String, Document>>,
}

impl DocumentStore {
    pub fn new(directory: PathBuf, fs: Arc<dyn FileSystemAdapter>, load_batch_size: usize) -> Self {
        Self {
            directory,
            fs,
            load_batch_size: load_batch_size.max(1),
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Enumerate the configured directory and populate the in-memory map.
    /// Batches of [`Self::load_batch_size`] files are parsed in parallel
    /// internally; batches run sequentially relative to each other. Any
    /// single file's load error is fatal to the whole load.
    pub fn load(&self) -> Result<(), StoreError> {
        let entries = self.fs.read_directory(&self.directory)?;
        let candidates: Vec<(String, PathBuf)> = entries
            .into_iter()
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?.to_string();
                if !name.ends_with(DOCUMENT_EXTENSION) {
                    return None;
                }
                let key = parse_filename(&name)?;
                Some((key, path))
            })
            .collect();

        debug!(count = candidates.len(), dir = %self.directory.display(), "loading documents");

        let mut loaded = HashMap::with_capacity(candidates.len());
        for batch in candidates.chunks(self.load_batch_size) {
            let parsed: Vec<Result<(String, Document), StoreError>> = batch
                .par_iter()
                .map(|(key, path)| {
                    let body = self.fs.read_document_file(path)?;
                    let value: serde_json::Value =
                        serde_json::from_str(&body).map_err(|source| StoreError::Parse {
                            path: path.clone(),
                            source,
                        })?;
                    let doc = Document::from_value(value).ok_or_else(|| StoreError::NotAnObject {
                        path: path.clone(),
                    })?;
                    Ok((key.clone(), doc))
                })
                .collect();

            for result in parsed {
                let (key, doc) = result.inspect_err(|e| {
                    error!(error = %e, "load failed");
                })?;
                loaded.insert(key, doc);
            }
        }

        *self.documents.write().unwrap_or_else(|e| e.into_inner()) = loaded;
        Ok(())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(filename(key))
    }

    /// Deep copy of the stored document for `key`, or `None`.
    pub fn get(&self, key: &str) -> Option<Document> {
        self.documents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Write `doc` for `key` to disk first, then update the memory map.
    /// On disk failure memory is left untouched.
    pub fn write(&self, key: &str, doc: &Document) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let body = serde_json::to_string_pretty(&doc.as_value()).expect("Value always serializes");
        self.fs.write_document_file(&path, &body)?;
        self.documents
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), doc.clone());
        debug!(key, path = %path.display(), "wrote document");
        Ok(())
    }

    /// Remove `key`'s file first (missing is fine), then its memory entry.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        self.fs.remove_document_file(&path)?;
        self.documents
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        debug!(key, path = %path.display(), "removed document");
        Ok(())
    }

    /// Snapshot of every primary key currently in memory, in arbitrary
    /// order (ordering is always recomputed at query time).
    pub fn keys(&self) -> Vec<String> {
        self.documents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    /// Snapshot of every `(key, document)` pair currently in memory, in
    /// arbitrary order — used by the view indexer.
    pub fn snapshot(&self) -> Vec<(String, Document)> {
        self.documents
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
